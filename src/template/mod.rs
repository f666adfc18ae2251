//! Recurring templates: definitions of transactions that repeat every month.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::create_template_endpoint;
pub use db::{
    create_template, create_template_table, deactivate_template, find_active_templates,
    get_template, get_templates, update_template,
};
pub use delete::deactivate_template_endpoint;
pub use domain::{NewTemplate, RecurringTemplate, TemplateAmount, TemplateUpdate};
pub use edit::update_template_endpoint;
pub use list::{get_template_endpoint, list_templates_endpoint};

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

/// The state needed by the recurring template endpoints.
#[derive(Debug, Clone)]
pub struct TemplateState {
    /// The database connection for managing templates.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TemplateState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
