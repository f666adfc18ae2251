//! Expands recurring templates into concrete transactions for a month.
//!
//! [expand] is a pure function of the template and the target month. Writing
//! the result to the database is left to reconciliation.

use serde::Serialize;
use time::Date;

use crate::{
    Cents, Period, TransactionType,
    database_id::{CategoryId, TemplateId},
    template::{RecurringTemplate, TemplateAmount},
    transaction::{Transaction, TransactionBuilder},
};

/// A template that could not be expanded.
///
/// Expansion errors are reported per template and never stop other templates
/// from being reconciled.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ExpansionError {
    /// The stored day of month is outside `1..=31`.
    #[error("recurring template {template_id} has an invalid day of month {day_of_month}")]
    InvalidDayOfMonth {
        /// The template that failed.
        template_id: TemplateId,
        /// The offending day.
        day_of_month: u8,
    },
    /// The transaction date could not be constructed.
    #[error("recurring template {template_id} could not be dated in {period}: {reason}")]
    InvalidDate {
        /// The template that failed.
        template_id: TemplateId,
        /// The month being expanded.
        period: Period,
        /// Why the date could not be built.
        reason: String,
    },
}

impl ExpansionError {
    /// The template that could not be expanded.
    pub fn template_id(&self) -> TemplateId {
        match self {
            ExpansionError::InvalidDayOfMonth { template_id, .. }
            | ExpansionError::InvalidDate { template_id, .. } => *template_id,
        }
    }
}

/// A candidate transaction generated from a template that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    /// The template the draft was generated from.
    pub recurring_template_id: TemplateId,
    /// Copied from the template.
    pub category_id: Option<CategoryId>,
    /// Copied from the template.
    pub transaction_type: TransactionType,
    /// Copied from the template.
    pub description: String,
    /// The template amount. Variable amounts need a value from the user.
    pub amount: TemplateAmount,
    /// The day of month clamped into the target month.
    pub date: Date,
    /// The target month, always equal to the month of `date`.
    pub period: Period,
    /// Generated transactions always start unpaid.
    pub is_paid: bool,
}

impl TransactionDraft {
    /// Whether the user must supply the amount before the draft can be stored.
    pub fn needs_amount(&self) -> bool {
        self.amount == TemplateAmount::Variable
    }

    /// Turn the draft into a transaction builder using the template amount.
    ///
    /// Returns `None` for variable amounts, which must not be inserted
    /// without a value from the user, see [TransactionDraft::with_amount].
    pub fn into_builder(self) -> Option<TransactionBuilder> {
        match self.amount {
            TemplateAmount::Fixed(amount) => Some(self.with_amount(amount)),
            TemplateAmount::Variable => None,
        }
    }

    /// Turn the draft into a transaction builder using `amount` instead of the
    /// template amount.
    pub fn with_amount(self, amount: Cents) -> TransactionBuilder {
        Transaction::build(
            self.transaction_type,
            amount,
            self.date,
            &self.description,
        )
        .category_id(self.category_id)
        .recurring_template_id(Some(self.recurring_template_id))
        .is_paid(self.is_paid)
    }
}

/// Expand `template` into at most one transaction draft for `period`.
///
/// Returns `Ok(None)` when the template is inactive, when `period` is before
/// the month of the start date, or when `period` is after the month of the end
/// date. The end date's month is included even if the clamped date falls after
/// the end date, since windows are compared month by month.
///
/// The transaction is dated on the template's day of month. Days past the end
/// of the month are clamped to the last day, so day 31 in February 2024 is
/// 2024-02-29 and never rolls over into March.
///
/// # Errors
///
/// Returns an [ExpansionError] if the template's day of month is invalid or
/// the date cannot be represented.
pub fn expand(
    template: &RecurringTemplate,
    period: Period,
) -> Result<Option<TransactionDraft>, ExpansionError> {
    if !template.is_active || period < Period::from(template.start_date) {
        return Ok(None);
    }

    if let Some(end_date) = template.end_date {
        if period > Period::from(end_date) {
            return Ok(None);
        }
    }

    if !(1..=31).contains(&template.day_of_month) {
        return Err(ExpansionError::InvalidDayOfMonth {
            template_id: template.id,
            day_of_month: template.day_of_month,
        });
    }

    let date = period
        .clamped_date(template.day_of_month)
        .map_err(|error| ExpansionError::InvalidDate {
            template_id: template.id,
            period,
            reason: error.to_string(),
        })?;

    Ok(Some(TransactionDraft {
        recurring_template_id: template.id,
        category_id: template.category_id,
        transaction_type: template.template_type,
        description: template.description.clone(),
        amount: template.amount,
        date,
        period,
        is_paid: false,
    }))
}
