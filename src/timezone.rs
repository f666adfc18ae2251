//! Helpers for resolving "now" in the server's configured timezone.

use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::{Error, Period};

/// Get the current UTC offset of the canonical timezone, e.g. "Pacific/Auckland".
///
/// Returns `None` if the timezone name is not recognised.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The calendar month that "today" falls in for `canonical_timezone`.
///
/// # Errors
///
/// Returns an [Error::InvalidTimezone] if the timezone name is not recognised.
pub fn current_period(canonical_timezone: &str) -> Result<Period, Error> {
    let offset = get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezone(canonical_timezone.to_owned()))?;

    Ok(Period::from(OffsetDateTime::now_utc().to_offset(offset).date()))
}

/// The current UTC time truncated to whole seconds, used for row timestamps.
pub fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();

    now.replace_nanosecond(0).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use crate::{
        Error, Period,
        timezone::{current_period, get_local_offset, now_utc},
    };

    #[test]
    fn utc_has_zero_offset() {
        assert_eq!(get_local_offset("Etc/UTC").map(|o| o.is_utc()), Some(true));
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            current_period("Mars/Olympus_Mons"),
            Err(Error::InvalidTimezone("Mars/Olympus_Mons".to_owned()))
        );
    }

    #[test]
    fn current_period_in_utc_matches_today() {
        let want = Period::from(OffsetDateTime::now_utc().date());

        assert_eq!(current_period("Etc/UTC"), Ok(want));
    }

    #[test]
    fn now_has_no_subsecond_component() {
        assert_eq!(now_utc().nanosecond(), 0);
    }
}
