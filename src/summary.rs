//! Monthly totals per transaction type and per category.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, params};
use serde::Serialize;

use crate::{
    AppState, Cents, Error, Period, TransactionType, UserId,
    app_state::lock_connection,
    database_id::CategoryId,
    extract::QueryParams,
    period::PeriodQuery,
};

/// Which transactions count towards monthly totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryPolicy {
    /// Whether transactions that have not been paid yet are included.
    pub include_unpaid: bool,
}

impl Default for SummaryPolicy {
    /// Unpaid transactions are included, so the summary shows what the month
    /// will look like once everything is paid.
    fn default() -> Self {
        Self {
            include_unpaid: true,
        }
    }
}

/// Income and expense totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeTotals {
    /// Total income.
    pub income: Cents,
    /// Total expenses.
    pub expense: Cents,
}

/// The total of one category and transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    /// The category, or `None` for uncategorised transactions.
    pub category_id: Option<CategoryId>,
    /// The transaction type being summed.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The sum of the amounts.
    pub total: Cents,
}

/// The totals of a user's transactions in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    /// The month being summarised.
    #[serde(flatten)]
    pub period: Period,
    /// Totals per transaction type.
    pub by_type: TypeTotals,
    /// Totals per category and type, uncategorised first.
    pub by_category: Vec<CategoryTotal>,
}

/// Sum the amounts of the user's transactions in `period`.
///
/// Sums are computed over integer cents in the database.
///
/// # Errors
///
/// Returns [Error::TotalOutOfRange] if a total is larger than [Cents::MAX],
/// since it could no longer be rendered exactly.
pub fn aggregate(
    user_id: &UserId,
    period: Period,
    policy: SummaryPolicy,
    connection: &Connection,
) -> Result<MonthlySummary, Error> {
    let by_category: Vec<CategoryTotal> = connection
        .prepare(
            "SELECT category_id, type, SUM(amount_cents)
             FROM \"transaction\"
             WHERE user_id = ?1 AND year = ?2 AND month = ?3 AND (?4 OR is_paid = 1)
             GROUP BY category_id, type
             ORDER BY category_id ASC, type ASC",
        )?
        .query_map(
            params![
                user_id,
                period.year(),
                period.month(),
                policy.include_unpaid
            ],
            |row| {
                Ok(CategoryTotal {
                    category_id: row.get(0)?,
                    transaction_type: row.get(1)?,
                    total: row.get(2)?,
                })
            },
        )?
        .collect::<Result<_, _>>()?;

    let by_type = by_category
        .iter()
        .try_fold(TypeTotals::default(), |mut totals, category_total| {
            let total = match category_total.transaction_type {
                TransactionType::Income => &mut totals.income,
                TransactionType::Expense => &mut totals.expense,
            };
            *total = total.checked_add(category_total.total)?;
            Some(totals)
        })
        .ok_or(Error::TotalOutOfRange)?;

    Ok(MonthlySummary {
        period,
        by_type,
        by_category,
    })
}

/// The state needed for the summary endpoint.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, used to find the current month.
    pub local_timezone: String,
    /// Which transactions count towards the totals.
    pub policy: SummaryPolicy,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            policy: state.summary_policy,
        }
    }
}

/// Get the summary of the month given by `year` and `month`, defaulting to the current month.
pub async fn get_summary_endpoint(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserId>,
    QueryParams(query): QueryParams<PeriodQuery>,
) -> Result<Json<MonthlySummary>, Error> {
    let period = query.period_or_current(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    aggregate(&user_id, period, state.policy, &connection).map(Json)
}
