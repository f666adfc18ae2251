//! Endpoints for reading transactions.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::{
    Error, UserId,
    app_state::lock_connection,
    database_id::TransactionId,
    extract::QueryParams,
    period::PeriodQuery,
    transaction::{
        Transaction, TransactionState, find_transactions, get_transaction, get_transactions,
    },
};

/// The response body for the transaction list.
#[derive(Debug, Serialize)]
pub struct TransactionList {
    transactions: Vec<Transaction>,
}

/// List the authenticated user's transactions.
///
/// With `year` and `month` only that month's transactions are returned, in
/// date order. Without them all transactions are returned, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    QueryParams(query): QueryParams<PeriodQuery>,
) -> Result<Json<TransactionList>, Error> {
    let period = query.optional_period()?;
    let connection = lock_connection(&state.db_connection)?;

    let transactions = match period {
        Some(period) => find_transactions(&user_id, period, None, &connection)?,
        None => get_transactions(&user_id, &connection)?,
    };

    Ok(Json(TransactionList { transactions }))
}

/// Get a single transaction owned by the authenticated user.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(transaction_id, &user_id, &connection).map(Json)
}
