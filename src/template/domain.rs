//! Recurring template domain types and validation.

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, OffsetDateTime};

use crate::{
    Cents, Error, TransactionType,
    database_id::{CategoryId, TemplateId},
    extract::double_option,
    transaction::validate_description,
};

/// The amount a recurring template generates each month.
///
/// Serialized as the decimal amount for [TemplateAmount::Fixed] and `null` for
/// [TemplateAmount::Variable].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateAmount {
    /// The same amount every month, e.g. rent.
    Fixed(Cents),
    /// The amount changes every month, e.g. a power bill. The user must supply
    /// the amount before a transaction can be generated.
    #[default]
    Variable,
}

impl TemplateAmount {
    /// The fixed amount, or `None` for a variable amount.
    pub fn as_cents(&self) -> Option<Cents> {
        match self {
            TemplateAmount::Fixed(cents) => Some(*cents),
            TemplateAmount::Variable => None,
        }
    }
}

impl From<Option<Cents>> for TemplateAmount {
    fn from(value: Option<Cents>) -> Self {
        match value {
            Some(cents) => TemplateAmount::Fixed(cents),
            None => TemplateAmount::Variable,
        }
    }
}

impl Serialize for TemplateAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_cents().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TemplateAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<Cents>::deserialize(deserializer).map(TemplateAmount::from)
    }
}

impl ToSql for TemplateAmount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            TemplateAmount::Fixed(cents) => cents.to_sql(),
            TemplateAmount::Variable => Ok(ToSqlOutput::from(rusqlite::types::Null)),
        }
    }
}

impl FromSql for TemplateAmount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Option::<Cents>::column_result(value).map(TemplateAmount::from)
    }
}

/// A recurring-transaction definition that generates at most one dated
/// transaction per month while it is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTemplate {
    /// The ID of the template.
    pub id: TemplateId,
    /// The category given to generated transactions.
    pub category_id: Option<CategoryId>,
    /// Whether generated transactions are income or expenses. Fixed at creation.
    #[serde(rename = "type")]
    pub template_type: TransactionType,
    /// The description given to generated transactions.
    pub description: String,
    /// The amount of generated transactions.
    pub amount: TemplateAmount,
    /// The day of the month transactions are dated, in `1..=31`.
    ///
    /// Days past the end of a month are clamped to the last day of that month.
    pub day_of_month: u8,
    /// The first day the template applies.
    pub start_date: Date,
    /// The last day the template applies, `None` for indefinitely.
    pub end_date: Option<Date>,
    /// Inactive templates never generate transactions.
    pub is_active: bool,
    /// When the template was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the template was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The data needed to create a recurring template.
///
/// Use [NewTemplate::build] in code, or deserialize it from a request body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTemplate {
    /// Whether generated transactions are income or expenses.
    #[serde(rename = "type")]
    pub template_type: TransactionType,
    /// The description given to generated transactions.
    pub description: String,
    /// The amount, `null` or missing for a variable amount.
    #[serde(default)]
    pub amount: TemplateAmount,
    /// The day of the month transactions are dated.
    pub day_of_month: u8,
    /// The first day the template applies.
    pub start_date: Date,
    /// The last day the template applies.
    #[serde(default)]
    pub end_date: Option<Date>,
    /// The category given to generated transactions.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

impl NewTemplate {
    /// Start building a template with the required fields.
    pub fn build(
        template_type: TransactionType,
        description: &str,
        amount: TemplateAmount,
        day_of_month: u8,
        start_date: Date,
    ) -> Self {
        Self {
            template_type,
            description: description.to_owned(),
            amount,
            day_of_month,
            start_date,
            end_date: None,
            category_id: None,
        }
    }

    /// Set the category for generated transactions.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the last day the template applies.
    pub fn end_date(mut self, end_date: Option<Date>) -> Self {
        self.end_date = end_date;
        self
    }
}

/// A partial update to a recurring template.
///
/// The template type cannot be changed. `None` leaves a field unchanged, and
/// for nullable fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TemplateUpdate {
    /// A new description.
    #[serde(default)]
    pub description: Option<String>,
    /// A new amount, `null` switches the template to a variable amount.
    #[serde(default, deserialize_with = "double_option")]
    pub amount: Option<TemplateAmount>,
    /// A new day of the month.
    #[serde(default)]
    pub day_of_month: Option<u8>,
    /// A new start date.
    #[serde(default)]
    pub start_date: Option<Date>,
    /// A new end date, `null` makes the template indefinite.
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<Date>>,
    /// A new category, `null` removes the category.
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<CategoryId>>,
    /// Activate or deactivate the template.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// The validated scheduling fields shared by new and updated templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TemplateSchedule {
    pub description: String,
    pub amount: TemplateAmount,
    pub day_of_month: u8,
    pub start_date: Date,
    pub end_date: Option<Date>,
}

impl TemplateSchedule {
    /// Check the template fields and trim the description.
    ///
    /// # Errors
    ///
    /// This function will return an:
    /// - [Error::EmptyDescription] if the description is blank,
    /// - [Error::NonPositiveAmount] if a fixed amount is zero or negative,
    /// - [Error::InvalidDayOfMonth] if the day is outside `1..=31`,
    /// - or [Error::EndDateBeforeStartDate] if the end date precedes the start date.
    pub fn validate(
        description: &str,
        amount: TemplateAmount,
        day_of_month: u8,
        start_date: Date,
        end_date: Option<Date>,
    ) -> Result<Self, Error> {
        let description = validate_description(description)?;

        if let TemplateAmount::Fixed(cents) = amount {
            cents.ensure_positive()?;
        }

        if !(1..=31).contains(&day_of_month) {
            return Err(Error::InvalidDayOfMonth(day_of_month));
        }

        match end_date {
            Some(end) if end < start_date => {
                return Err(Error::EndDateBeforeStartDate {
                    start: start_date,
                    end,
                });
            }
            _ => {}
        }

        Ok(Self {
            description,
            amount,
            day_of_month,
            start_date,
            end_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Cents, Error,
        template::{NewTemplate, TemplateAmount, TemplateUpdate, domain::TemplateSchedule},
    };

    #[test]
    fn amount_serializes_as_decimal_or_null() {
        assert_eq!(
            serde_json::to_value(TemplateAmount::Fixed(Cents::new(5000))).unwrap(),
            json!(50.0)
        );
        assert_eq!(
            serde_json::to_value(TemplateAmount::Variable).unwrap(),
            json!(null)
        );
    }

    #[test]
    fn missing_amount_is_variable() {
        let template: NewTemplate = serde_json::from_value(json!({
            "type": "expense",
            "description": "Power",
            "dayOfMonth": 20,
            "startDate": "2024-01-01"
        }))
        .unwrap();

        assert_eq!(template.amount, TemplateAmount::Variable);
        assert_eq!(template.end_date, None);
    }

    #[test]
    fn update_distinguishes_missing_and_null_amount() {
        let missing: TemplateUpdate = serde_json::from_value(json!({})).unwrap();
        let null: TemplateUpdate = serde_json::from_value(json!({ "amount": null })).unwrap();
        let fixed: TemplateUpdate = serde_json::from_value(json!({ "amount": 12.5 })).unwrap();

        assert_eq!(missing.amount, None);
        assert_eq!(null.amount, Some(TemplateAmount::Variable));
        assert_eq!(fixed.amount, Some(TemplateAmount::Fixed(Cents::new(1250))));
    }

    #[test]
    fn update_cannot_change_type() {
        let result = serde_json::from_value::<TemplateUpdate>(json!({ "type": "income" }));

        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_day_outside_month_range() {
        for day in [0, 32] {
            assert_eq!(
                TemplateSchedule::validate(
                    "Rent",
                    TemplateAmount::Variable,
                    day,
                    date!(2024 - 01 - 01),
                    None
                ),
                Err(Error::InvalidDayOfMonth(day))
            );
        }
    }

    #[test]
    fn validate_rejects_non_positive_fixed_amount() {
        assert_eq!(
            TemplateSchedule::validate(
                "Rent",
                TemplateAmount::Fixed(Cents::ZERO),
                1,
                date!(2024 - 01 - 01),
                None
            ),
            Err(Error::NonPositiveAmount(Cents::ZERO))
        );
    }

    #[test]
    fn validate_rejects_end_before_start() {
        assert_eq!(
            TemplateSchedule::validate(
                "Rent",
                TemplateAmount::Variable,
                1,
                date!(2024 - 02 - 01),
                Some(date!(2024 - 01 - 31))
            ),
            Err(Error::EndDateBeforeStartDate {
                start: date!(2024 - 02 - 01),
                end: date!(2024 - 01 - 31)
            })
        );
    }

    #[test]
    fn validate_trims_description() {
        let schedule = TemplateSchedule::validate(
            "  Rent ",
            TemplateAmount::Variable,
            31,
            date!(2024 - 01 - 01),
            Some(date!(2024 - 01 - 01)),
        )
        .unwrap();

        assert_eq!(schedule.description, "Rent");
    }
}
