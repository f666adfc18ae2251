//! Reconciliation: turning recurring templates into the transactions of a month.

mod endpoint;
mod engine;
mod materialize;

pub use endpoint::reconcile_endpoint;
pub use engine::{LedgerStore, ReconciliationSummary, TemplateFailure, reconcile};
pub use materialize::{MaterializeRequest, materialize_endpoint, materialize_template};

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

/// The state needed to reconcile months and materialize templates.
#[derive(Debug, Clone)]
pub struct ReconcileState {
    /// The database connection holding the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, used to find the current month.
    pub local_timezone: String,
}

impl FromRef<AppState> for ReconcileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
