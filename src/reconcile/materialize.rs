//! Generating a template's transaction for a month with an amount supplied by the user.
//!
//! Reconciliation skips variable amount templates. Once the user knows the
//! amount, e.g. when the power bill arrives, they materialize the template for
//! that month here.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    Cents, Error, Period, UserId,
    app_state::lock_connection,
    database_id::TemplateId,
    extract::JsonBody,
    recurrence::{ExpansionError, expand},
    template::{TemplateAmount, get_template},
    transaction::{Transaction, create_transaction},
};

use super::ReconcileState;

/// Generate the transaction of template `template_id` for `period`.
///
/// `amount` is required for variable amount templates and overrides the
/// template amount for fixed ones.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the template does not exist or belongs to another user,
/// - [Error::OutsideTemplateWindow] if the template is inactive or does not apply in `period`,
/// - [Error::AmountRequired] if the template has a variable amount and no amount was given,
/// - [Error::NonPositiveAmount] if the given amount is not positive,
/// - [Error::DuplicateGeneratedTransaction] if the month already has a transaction from the template,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn materialize_template(
    template_id: TemplateId,
    user_id: &UserId,
    period: Period,
    amount: Option<Cents>,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let template = get_template(template_id, user_id, connection)?;

    let draft = expand(&template, period)
        .map_err(|error| match error {
            ExpansionError::InvalidDayOfMonth { day_of_month, .. } => {
                Error::InvalidDayOfMonth(day_of_month)
            }
            ExpansionError::InvalidDate { reason, .. } => Error::InvalidDate(reason),
        })?
        .ok_or(Error::OutsideTemplateWindow {
            template_id,
            period,
        })?;

    let amount = match (amount, draft.amount) {
        (Some(amount), _) => amount.ensure_positive()?,
        (None, TemplateAmount::Fixed(amount)) => amount,
        (None, TemplateAmount::Variable) => return Err(Error::AmountRequired(template_id)),
    };

    create_transaction(user_id, draft.with_amount(amount), connection)
}

/// The request body for materializing a template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MaterializeRequest {
    /// The calendar year of the month to generate.
    pub year: i32,
    /// The month number in `1..=12`.
    pub month: u8,
    /// The decimal amount, required for variable amount templates.
    #[serde(default)]
    pub amount: Option<Cents>,
}

/// Generate a template's transaction for a month, responding with 201 and the transaction.
pub async fn materialize_endpoint(
    State(state): State<ReconcileState>,
    Extension(user_id): Extension<UserId>,
    Path(template_id): Path<TemplateId>,
    JsonBody(request): JsonBody<MaterializeRequest>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let period = Period::new(request.year, request.month)?;
    let connection = lock_connection(&state.db_connection)?;

    let transaction =
        materialize_template(template_id, &user_id, period, request.amount, &connection)?;

    tracing::info!(
        "user {user_id} materialized template {template_id} for {period} as transaction {}",
        transaction.id
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}
