//! Authentication for the JSON API.
//!
//! Sessions are issued by an external provider, which stores the user ID in
//! an encrypted private cookie. This module only reads that cookie.

mod cookie;
mod middleware;

pub use cookie::{DEFAULT_COOKIE_DURATION, set_auth_cookie};
pub use middleware::{AuthState, auth_guard};

#[cfg(test)]
pub use cookie::COOKIE_USER_ID;
