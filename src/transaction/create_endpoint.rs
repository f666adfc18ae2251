//! Endpoint for creating manual transactions.

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::Deserialize;
use time::Date;

use crate::{
    Cents, Error, TransactionType, UserId,
    app_state::lock_connection,
    database_id::CategoryId,
    extract::JsonBody,
    transaction::{Transaction, TransactionState, create_transaction},
};

/// The request body for a new manual transaction.
///
/// Generated transactions are created by reconciliation or by materializing a
/// recurring template, so the template ID cannot be set here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTransactionRequest {
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The decimal amount, e.g. `12.34`.
    pub amount: Cents,
    /// When the transaction happened.
    pub date: Date,
    /// What the transaction was for.
    pub description: String,
    /// The category to file the transaction under.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Whether the transaction has been paid.
    #[serde(default)]
    pub is_paid: bool,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Create a manual transaction for the authenticated user.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    JsonBody(request): JsonBody<NewTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let builder = Transaction::build(
        request.transaction_type,
        request.amount,
        request.date,
        &request.description,
    )
    .category_id(request.category_id)
    .is_paid(request.is_paid)
    .notes(request.notes);

    let connection = lock_connection(&state.db_connection)?;
    let transaction = create_transaction(&user_id, builder, &connection)?;

    tracing::debug!("user {user_id} created transaction {}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)))
}
