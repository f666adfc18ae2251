//! Calendar month buckets used to group transactions.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{Error, timezone::current_period};

/// The earliest year a period may refer to.
pub const MIN_YEAR: i32 = 1;
/// The latest year a period may refer to.
pub const MAX_YEAR: i32 = 9999;

/// A calendar month in a specific year, e.g. March 2024.
///
/// Transactions store their period alongside their date so that monthly
/// queries can hit an index. The period of a transaction is always derived from
/// its date with [Period::from], never written independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    year: i32,
    month: u8,
}

impl Period {
    /// Create a period from a year and a month number in `1..=12`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidPeriod] if `month` is not in `1..=12` or
    /// `year` is outside [MIN_YEAR] to [MAX_YEAR].
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        if !(1..=12).contains(&month) || !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(Error::InvalidPeriod { year, month });
        }

        Ok(Self { year, month })
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month number in `1..=12`.
    pub fn month(&self) -> u8 {
        self.month
    }

    fn calendar_month(&self) -> Result<Month, Error> {
        Month::try_from(self.month).map_err(|_| Error::InvalidPeriod {
            year: self.year,
            month: self.month,
        })
    }

    /// The number of days in this month, accounting for leap years.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidPeriod] if the month number is not in `1..=12`,
    /// which [Period::new] already rules out.
    pub fn days_in_month(&self) -> Result<u8, Error> {
        Ok(self.calendar_month()?.length(self.year))
    }

    /// The date of `day` within this month, clamped to the last day of the month.
    ///
    /// For example, day 31 in February 2024 is 2024-02-29. A naive date
    /// construction would either fail or roll over into March.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidDate] if the date cannot be represented.
    pub fn clamped_date(&self, day: u8) -> Result<Date, Error> {
        let month = self.calendar_month()?;
        let day = day.clamp(1, month.length(self.year));

        Date::from_calendar_date(self.year, month, day).map_err(|error| {
            Error::InvalidDate(format!("{}-{:02}-{day:02}: {error}", self.year, self.month))
        })
    }
}

impl From<Date> for Period {
    fn from(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Optional `year` and `month` query parameters selecting a period.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PeriodQuery {
    /// The calendar year.
    pub year: Option<i32>,
    /// The month number in `1..=12`.
    pub month: Option<u8>,
}

impl PeriodQuery {
    /// The requested period, or `None` if neither year nor month was given.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidQuery] if only one of year and month is given, or
    /// an [Error::InvalidPeriod] if they do not name a calendar month.
    pub fn optional_period(&self) -> Result<Option<Period>, Error> {
        match (self.year, self.month) {
            (Some(year), Some(month)) => Period::new(year, month).map(Some),
            (None, None) => Ok(None),
            _ => Err(Error::InvalidQuery(
                "year and month must be given together".to_owned(),
            )),
        }
    }

    /// The requested period, defaulting to the current month in `local_timezone`.
    ///
    /// # Errors
    ///
    /// See [PeriodQuery::optional_period], also returns an [Error::InvalidTimezone]
    /// if the default is needed and `local_timezone` is not recognised.
    pub fn period_or_current(&self, local_timezone: &str) -> Result<Period, Error> {
        match self.optional_period()? {
            Some(period) => Ok(period),
            None => current_period(local_timezone),
        }
    }
}
