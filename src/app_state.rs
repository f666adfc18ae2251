//! Shared server state: the ledger connection plus the settings every handler reads.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};

use crate::{Error, db::initialize, summary::SummaryPolicy, timezone::get_local_offset};

/// Settings the server is started with.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Secret the cookie encryption key is derived from.
    pub cookie_secret: String,
    /// Canonical timezone name used to decide the current month, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// Which transactions count towards monthly summaries.
    pub summary_policy: SummaryPolicy,
}

/// State shared by all request handlers.
///
/// Feature modules take the parts they need through their own `FromRef<AppState>` states.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Encrypts and decrypts the private auth cookie.
    pub cookie_key: Key,
    /// A timezone name already checked against the timezone database.
    pub local_timezone: String,
    /// Which transactions count towards monthly summaries.
    pub summary_policy: SummaryPolicy,
    /// The single ledger connection, serialised behind a mutex.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Build the state from `config`, creating the ledger tables on `db_connection`
    /// if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidTimezone] if `config.local_timezone` is not a known
    /// timezone, or an [Error::SqlError] if the tables could not be created.
    pub fn new(db_connection: Connection, config: ServerConfig) -> Result<Self, Error> {
        if get_local_offset(&config.local_timezone).is_none() {
            return Err(Error::InvalidTimezone(config.local_timezone));
        }

        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: derive_cookie_key(&config.cookie_secret),
            local_timezone: config.local_timezone,
            summary_policy: config.summary_policy,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the 64 byte cookie key from the SHA-512 digest of `secret`.
pub fn derive_cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret))
}

/// Lock the ledger connection for the duration of one request.
///
/// # Errors
///
/// Returns [Error::DatabaseLockError] if the mutex was poisoned by a panicking handler.
pub fn lock_connection(
    db_connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}
