//! Reading and writing the encrypted auth cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserId};

pub const COOKIE_USER_ID: &str = "user_id";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::days(1);

/// Add an auth cookie to the cookie jar, indicating that a user is logged in and authenticated.
///
/// The cookie expires `duration` from the current time. You can use
/// [DEFAULT_COOKIE_DURATION] for the default duration.
///
/// Returns the cookie jar with the cookie added.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: &UserId,
    duration: Duration,
) -> PrivateCookieJar {
    let expiry = OffsetDateTime::now_utc() + duration;

    jar.add(
        Cookie::build((COOKIE_USER_ID, user_id.as_str().to_owned()))
            .expires(expiry)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the user ID from the auth cookie in `jar`.
///
/// # Errors
///
/// Returns [Error::Unauthorized] if the cookie is missing, could not be
/// decrypted, or holds a user ID that is empty or only whitespace.
pub(crate) fn get_user_id_from_auth_cookie(jar: &PrivateCookieJar) -> Result<UserId, Error> {
    let cookie = jar.get(COOKIE_USER_ID).ok_or(Error::Unauthorized)?;
    let user_id = cookie.value().trim();

    if user_id.is_empty() {
        return Err(Error::Unauthorized);
    }

    Ok(UserId::new(user_id))
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key, SameSite},
    };
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use crate::{Error, UserId};

    use super::{
        COOKIE_USER_ID, DEFAULT_COOKIE_DURATION, get_user_id_from_auth_cookie, set_auth_cookie,
    };

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        let key = Key::from(&hash);

        PrivateCookieJar::new(key)
    }

    #[test]
    fn can_set_cookie() {
        let jar = set_auth_cookie(get_jar(), &UserId::new("alice"), DEFAULT_COOKIE_DURATION);

        let cookie = jar.get(COOKIE_USER_ID).unwrap();

        assert_eq!(cookie.value(), "alice");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        let expiry = cookie.expires_datetime().unwrap();
        assert!(
            (expiry - (OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION)).abs()
                < Duration::seconds(1)
        );
    }

    #[test]
    fn get_user_id_from_cookie_succeeds() {
        let user_id = UserId::new("alice");
        let jar = set_auth_cookie(get_jar(), &user_id, DEFAULT_COOKIE_DURATION);

        assert_eq!(get_user_id_from_auth_cookie(&jar), Ok(user_id));
    }

    #[test]
    fn missing_cookie_is_unauthorized() {
        assert_eq!(
            get_user_id_from_auth_cookie(&get_jar()),
            Err(Error::Unauthorized)
        );
    }

    #[test]
    fn empty_user_id_is_unauthorized() {
        for value in ["", " ", "\t \n"] {
            let jar = get_jar().add(Cookie::new(COOKIE_USER_ID, value));

            assert_eq!(
                get_user_id_from_auth_cookie(&jar),
                Err(Error::Unauthorized),
                "got a user for the cookie value {value:?}"
            );
        }
    }

    #[test]
    fn user_id_is_trimmed() {
        let jar = get_jar().add(Cookie::new(COOKIE_USER_ID, " alice\t"));

        assert_eq!(
            get_user_id_from_auth_cookie(&jar),
            Ok(UserId::new("alice"))
        );
    }
}
