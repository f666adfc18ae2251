//! Fintrack is a web service for tracking personal finances.
//!
//! Users record categories, incomes and transactions, and describe repeating
//! bills or pay cheques as recurring templates. Reconciling a month turns every
//! active template into at most one concrete transaction for that month, and
//! the monthly summary sums the resulting ledger per type and per category.
//!
//! This library provides a JSON REST API. Authentication is delegated to an
//! external provider which hands out an encrypted `user_id` cookie.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use time::Date;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod database_id;
mod db;
mod endpoints;
mod extract;
mod income;
mod logging;
mod money;
mod period;
mod reconcile;
mod recurrence;
mod routing;
mod summary;
mod template;
mod timezone;
mod transaction;
mod transaction_type;
mod user;

pub use app_state::{AppState, ServerConfig};
pub use auth::{DEFAULT_COOKIE_DURATION, set_auth_cookie};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use money::Cents;
pub use period::Period;
pub use reconcile::{LedgerStore, ReconciliationSummary, reconcile};
pub use recurrence::{ExpansionError, TransactionDraft, expand};
pub use routing::build_router;
pub use summary::SummaryPolicy;
pub use timezone::get_local_offset;
pub use transaction_type::TransactionType;
pub use user::UserId;

use crate::database_id::{CategoryId, TemplateId};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// Also returned when the resource exists but belongs to another user, so
    /// that clients cannot probe for other users' data.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The request did not carry a valid auth cookie.
    #[error("authentication is required")]
    Unauthorized,

    /// A decimal currency amount could not be parsed.
    #[error("\"{0}\" is not a valid currency amount")]
    InvalidAmount(String),

    /// An amount that must be positive was zero or negative.
    #[error("the amount must be greater than zero, got {0}")]
    NonPositiveAmount(Cents),

    /// A year/month pair does not name a calendar month.
    #[error("{year}-{month} is not a valid year and month")]
    InvalidPeriod {
        /// The requested year.
        year: i32,
        /// The requested month number.
        month: u8,
    },

    /// A date could not be constructed.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// A recurring template day of month outside `1..=31`.
    #[error("the day of month must be between 1 and 31, got {0}")]
    InvalidDayOfMonth(u8),

    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// A category name longer than the allowed number of graphemes.
    #[error("category name cannot be longer than {0} characters")]
    CategoryNameTooLong(usize),

    /// A category color that is not a `#RRGGBB` hex string.
    #[error("\"{0}\" is not a color of the form #RRGGBB")]
    InvalidColor(String),

    /// A category icon longer than the allowed number of graphemes.
    #[error("category icon cannot be longer than {0} characters")]
    IconTooLong(usize),

    /// An empty string was used as a transaction, template or income description.
    #[error("description cannot be empty")]
    EmptyDescription,

    /// A recurring template whose end date precedes its start date.
    #[error("the end date {end} is before the start date {start}")]
    EndDateBeforeStartDate {
        /// The template start date.
        start: Date,
        /// The offending end date.
        end: Date,
    },

    /// The category ID does not refer to a category owned by the user.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// A variable amount template was materialized without an amount.
    #[error("the recurring template {0} has a variable amount, an amount must be supplied")]
    AmountRequired(TemplateId),

    /// A template was materialized for a month in which it does not apply.
    #[error("the recurring template {template_id} does not apply to {period}")]
    OutsideTemplateWindow {
        /// The template that was expanded.
        template_id: TemplateId,
        /// The month the template was expanded for.
        period: Period,
    },

    /// Tried to delete a category that is still referenced.
    ///
    /// Categories referenced by transactions or recurring templates cannot be
    /// deleted since that would rewrite historical reports.
    #[error(
        "the category is used by {transactions} transaction(s) and {templates} recurring template(s)"
    )]
    CategoryInUse {
        /// The number of transactions that reference the category.
        transactions: u32,
        /// The number of recurring templates that reference the category.
        templates: u32,
    },

    /// A transaction for the same template and month already exists.
    #[error("a transaction has already been generated for this template and month")]
    DuplicateGeneratedTransaction,

    /// The request body could not be parsed.
    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    /// The query string could not be parsed.
    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Stored amounts add up to more than [Cents::MAX].
    #[error("the total amount is too large to be represented")]
    TotalOutOfRange,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

/// The broad class of an [Error], sent to clients so they can react without
/// parsing the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The resource is absent or owned by another user.
    NotFound,
    /// Malformed or out of range input.
    ValidationError,
    /// The request clashes with existing data.
    Conflict,
    /// No valid auth cookie.
    Unauthorized,
    /// A fault on the server side, details are only logged.
    InternalError,
}

impl Error {
    /// The machine-checkable kind of the error, sent to clients alongside the message.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound => ErrorKind::NotFound,
            Error::Unauthorized => ErrorKind::Unauthorized,
            Error::CategoryInUse { .. } | Error::DuplicateGeneratedTransaction => {
                ErrorKind::Conflict
            }
            Error::InvalidAmount(_)
            | Error::NonPositiveAmount(_)
            | Error::InvalidPeriod { .. }
            | Error::InvalidDate(_)
            | Error::InvalidDayOfMonth(_)
            | Error::EmptyCategoryName
            | Error::CategoryNameTooLong(_)
            | Error::InvalidColor(_)
            | Error::IconTooLong(_)
            | Error::EmptyDescription
            | Error::EndDateBeforeStartDate { .. }
            | Error::InvalidCategory(_)
            | Error::AmountRequired(_)
            | Error::OutsideTemplateWindow { .. }
            | Error::InvalidRequestBody(_)
            | Error::InvalidQuery(_) => ErrorKind::ValidationError,
            Error::InvalidTimezone(_)
            | Error::DatabaseLockError
            | Error::TotalOutOfRange
            | Error::SqlError(_) => ErrorKind::InternalError,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.contains("recurring_template_id") => Error::DuplicateGeneratedTransaction,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequestBody(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidQuery(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Any errors that are not handled above are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorBody {
                kind: self.kind(),
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod test_utils;
