//! Category management for grouping income and expenses.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod guard;
mod list;

pub use create::create_category_endpoint;
pub use db::{
    create_category, create_category_table, ensure_category_owned, get_categories, get_category,
    map_category_write_error, update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryName, CategoryUpdate, Color, Icon, NewCategory};
pub use edit::update_category_endpoint;
pub use guard::{CategoryReferences, can_delete, count_references, delete_category};
pub use list::{get_category_endpoint, list_categories_endpoint};

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
