//! Income records, e.g. pay cheques, entered as decimal amounts.

mod core;
mod endpoints;

pub use core::{Income, NewIncome, create_income, create_income_table, delete_income, get_incomes};
pub use endpoints::{create_income_endpoint, delete_income_endpoint, list_incomes_endpoint};

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

/// The state needed by the income endpoints.
#[derive(Debug, Clone)]
pub struct IncomeState {
    /// The database connection for managing incomes.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for IncomeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
