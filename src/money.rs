//! Integer money amounts and the decimal currency boundary.
//!
//! Amounts are stored and summed as integer cents. Decimal values (e.g. `12.34`)
//! only exist at the HTTP boundary, where they are converted with
//! [Cents::parse_decimal] and rendered with [Cents]'s `Display` implementation.

use std::fmt::{self, Display};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};

use crate::Error;

/// An amount of money in integer minor currency units (cents).
///
/// Serializes to a JSON number with at most two decimal places, e.g. `1999`
/// cents is written as `19.99`. Deserializes from a JSON number or string
/// holding decimal currency, rounding half-up to the nearest cent.
///
/// Amounts at the boundary are limited to [Cents::MAX] in magnitude. Up to
/// that size the decimal value has at most 15 significant digits, so it
/// survives the trip through an `f64` JSON number unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(i64);

impl Cents {
    /// Zero cents.
    pub const ZERO: Cents = Cents(0);

    /// The largest accepted amount, 9,999,999,999,999.99.
    pub const MAX: Cents = Cents(999_999_999_999_999);

    /// Create an amount from integer cents.
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// The raw number of cents.
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Parse decimal currency, e.g. `"19.99"`, into cents.
    ///
    /// Digits past the second decimal place are rounded half-up on the
    /// magnitude, so `"0.005"` becomes 1 cent and `"-0.005"` becomes -1 cent.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidAmount] if `text` is not a plain decimal
    /// number or the amount is larger than [Cents::MAX].
    pub fn parse_decimal(text: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidAmount(text.to_owned());
        let trimmed = text.trim();

        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let (whole_text, fraction_text) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (unsigned, ""),
        };

        if whole_text.is_empty() && fraction_text.is_empty() {
            return Err(invalid());
        }

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole_text) || !all_digits(fraction_text) {
            return Err(invalid());
        }

        let whole: i64 = if whole_text.is_empty() {
            0
        } else {
            whole_text.parse().map_err(|_| invalid())?
        };

        let mut fraction_digits = fraction_text.bytes().map(|b| i64::from(b - b'0'));
        let tens = fraction_digits.next().unwrap_or(0);
        let units = fraction_digits.next().unwrap_or(0);
        let round_up = fraction_digits.next().is_some_and(|digit| digit >= 5);

        let magnitude = whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(tens * 10 + units))
            .and_then(|cents| cents.checked_add(i64::from(round_up)))
            .filter(|cents| *cents <= Self::MAX.0)
            .ok_or_else(invalid)?;

        Ok(Self(if negative { -magnitude } else { magnitude }))
    }

    /// Convert a whole number of currency units, e.g. `12` dollars, into cents.
    fn from_whole_units(units: i64) -> Option<Self> {
        units
            .checked_mul(100)
            .filter(|cents| cents.unsigned_abs() <= Self::MAX.0.unsigned_abs())
            .map(Self)
    }

    /// Add two amounts, returning `None` if the sum is larger than [Cents::MAX]
    /// in magnitude.
    pub fn checked_add(self, rhs: Cents) -> Option<Cents> {
        self.0
            .checked_add(rhs.0)
            .filter(|cents| cents.unsigned_abs() <= Self::MAX.0.unsigned_abs())
            .map(Self)
    }

    /// Return the amount if it is strictly positive and at most [Cents::MAX].
    ///
    /// # Errors
    ///
    /// Returns an [Error::NonPositiveAmount] if the amount is zero or negative,
    /// or an [Error::InvalidAmount] if it is larger than [Cents::MAX].
    pub fn ensure_positive(self) -> Result<Self, Error> {
        if self.0 <= 0 {
            Err(Error::NonPositiveAmount(self))
        } else if self > Self::MAX {
            Err(Error::InvalidAmount(self.to_string()))
        } else {
            Ok(self)
        }
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();

        write!(f, "{sign}{}.{:02}", magnitude / 100, magnitude % 100)
    }
}

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Serialize for Cents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Within [Cents::MAX] the quotient is the closest double to the two
        // decimal value, which serde_json prints back in its shortest form.
        serializer.serialize_f64(self.0 as f64 / 100.0)
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }
}

struct DecimalVisitor;

impl Visitor<'_> for DecimalVisitor {
    type Value = Cents;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a decimal currency amount such as 12.34")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Cents, E> {
        Cents::from_whole_units(value)
            .ok_or_else(|| E::custom(Error::InvalidAmount(value.to_string())))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Cents, E> {
        i64::try_from(value)
            .ok()
            .and_then(Cents::from_whole_units)
            .ok_or_else(|| E::custom(Error::InvalidAmount(value.to_string())))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Cents, E> {
        if !value.is_finite() {
            return Err(E::custom(Error::InvalidAmount(value.to_string())));
        }

        // `Display` for f64 yields the shortest decimal that round-trips and
        // never uses exponent notation, so `19.99` arrives here as "19.99".
        Cents::parse_decimal(&value.to_string()).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Cents, E> {
        Cents::parse_decimal(value).map_err(E::custom)
    }
}

impl ToSql for Cents {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for Cents {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Self)
    }
}

#[cfg(test)]
mod parse_decimal_tests {
    use crate::{Error, money::Cents};

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(Cents::parse_decimal("19.99"), Ok(Cents::new(1999)));
        assert_eq!(Cents::parse_decimal("12"), Ok(Cents::new(1200)));
        assert_eq!(Cents::parse_decimal("0.5"), Ok(Cents::new(50)));
        assert_eq!(Cents::parse_decimal(".07"), Ok(Cents::new(7)));
        assert_eq!(Cents::parse_decimal("  3.10 "), Ok(Cents::new(310)));
        assert_eq!(Cents::parse_decimal("-4.25"), Ok(Cents::new(-425)));
    }

    #[test]
    fn rounds_half_up_to_nearest_cent() {
        assert_eq!(Cents::parse_decimal("0.005"), Ok(Cents::new(1)));
        assert_eq!(Cents::parse_decimal("0.004"), Ok(Cents::new(0)));
        assert_eq!(Cents::parse_decimal("1.995"), Ok(Cents::new(200)));
        assert_eq!(Cents::parse_decimal("10.12999"), Ok(Cents::new(1013)));
        assert_eq!(Cents::parse_decimal("-0.005"), Ok(Cents::new(-1)));
    }

    #[test]
    fn rejects_malformed_input() {
        for text in ["", ".", "abc", "1.2.3", "1,50", "1e5", "--1", "12.3x"] {
            assert_eq!(
                Cents::parse_decimal(text),
                Err(Error::InvalidAmount(text.to_owned())),
                "expected {text:?} to be rejected"
            );
        }
    }

    #[test]
    fn rejects_overflow() {
        let text = "92233720368547758.08";

        assert_eq!(
            Cents::parse_decimal(text),
            Err(Error::InvalidAmount(text.to_owned()))
        );
    }

    #[test]
    fn rejects_amounts_above_maximum() {
        assert_eq!(Cents::parse_decimal("9999999999999.99"), Ok(Cents::MAX));

        for text in ["10000000000000.00", "90071992547409.93", "-10000000000000"] {
            assert_eq!(
                Cents::parse_decimal(text),
                Err(Error::InvalidAmount(text.to_owned())),
                "expected {text:?} to be rejected"
            );
        }
    }

    #[test]
    fn checked_add_stops_at_maximum() {
        assert_eq!(
            Cents::new(1999).checked_add(Cents::new(1)),
            Some(Cents::new(2000))
        );
        assert_eq!(Cents::MAX.checked_add(Cents::new(1)), None);
        assert_eq!(Cents::new(i64::MAX).checked_add(Cents::new(1)), None);
    }

    #[test]
    fn ensure_positive_rejects_amounts_above_maximum() {
        let too_large = Cents::new(Cents::MAX.as_i64() + 1);

        assert_eq!(
            too_large.ensure_positive(),
            Err(Error::InvalidAmount("10000000000000.00".to_owned()))
        );
        assert_eq!(Cents::MAX.ensure_positive(), Ok(Cents::MAX));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert_eq!(Cents::new(1).ensure_positive(), Ok(Cents::new(1)));
        assert_eq!(
            Cents::ZERO.ensure_positive(),
            Err(Error::NonPositiveAmount(Cents::ZERO))
        );
        assert_eq!(
            Cents::new(-5).ensure_positive(),
            Err(Error::NonPositiveAmount(Cents::new(-5)))
        );
    }
}
