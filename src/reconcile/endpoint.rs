//! The reconciliation trigger endpoint.

use axum::{Extension, Json, extract::State};

use crate::{
    Error, UserId,
    app_state::lock_connection,
    extract::QueryParams,
    period::PeriodQuery,
    reconcile::{ReconcileState, ReconciliationSummary, reconcile},
};

/// Reconcile the month given by the `year` and `month` query parameters, or
/// the current month in the server's timezone if they are omitted.
///
/// Calling this repeatedly for the same month is safe, later calls report
/// every template as skipped.
pub async fn reconcile_endpoint(
    State(state): State<ReconcileState>,
    Extension(user_id): Extension<UserId>,
    QueryParams(query): QueryParams<PeriodQuery>,
) -> Result<Json<ReconciliationSummary>, Error> {
    let period = query.period_or_current(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    reconcile(&*connection, &user_id, period).map(Json)
}
