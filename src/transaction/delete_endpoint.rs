//! Endpoint for deleting transactions.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error, UserId,
    app_state::lock_connection,
    database_id::TransactionId,
    transaction::{TransactionState, delete_transaction},
};

/// Delete a transaction owned by the authenticated user.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_transaction(transaction_id, &user_id, &connection)?;

    tracing::debug!("user {user_id} deleted transaction {transaction_id}");

    Ok(StatusCode::NO_CONTENT)
}
