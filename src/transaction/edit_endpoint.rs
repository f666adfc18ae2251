//! Endpoint for updating transactions.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    Error, UserId,
    app_state::lock_connection,
    database_id::TransactionId,
    extract::JsonBody,
    transaction::{Transaction, TransactionState, TransactionUpdate, update_transaction},
};

/// Apply a partial update to a transaction, e.g. to mark it as paid.
///
/// Edits to generated transactions are kept, reconciliation never overwrites them.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
    JsonBody(update): JsonBody<TransactionUpdate>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_transaction(transaction_id, &user_id, update, &connection).map(Json)
}
