//! Generates the transactions of active recurring templates for one month.

use std::collections::HashSet;

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error, ErrorKind, Period, UserId,
    category::{self, Category, CategoryReferences},
    database_id::{CategoryId, TemplateId, TransactionId},
    recurrence::expand,
    template::{self, RecurringTemplate},
    transaction::{self, Transaction, TransactionBuilder},
};

/// The ledger operations reconciliation and the category guard depend on.
///
/// Implemented for [Connection]. Every operation is scoped to one user.
pub trait LedgerStore {
    /// The user's active recurring templates.
    fn find_active_templates(&self, user_id: &UserId) -> Result<Vec<RecurringTemplate>, Error>;

    /// The user's transactions in `period`, optionally only those generated by one template.
    fn find_transactions(
        &self,
        user_id: &UserId,
        period: Period,
        recurring_template_id: Option<TemplateId>,
    ) -> Result<Vec<Transaction>, Error>;

    /// Store a new transaction.
    ///
    /// Returns [Error::DuplicateGeneratedTransaction] if the template already
    /// has a transaction in the same month.
    fn insert_transaction(
        &self,
        user_id: &UserId,
        transaction: TransactionBuilder,
    ) -> Result<Transaction, Error>;

    /// Count the transactions and templates that reference a category.
    fn count_references(
        &self,
        category_id: CategoryId,
        user_id: &UserId,
    ) -> Result<CategoryReferences, Error>;

    /// Delete an unreferenced category.
    ///
    /// Returns [Error::CategoryInUse] if the category is referenced.
    fn delete_category(&self, category_id: CategoryId, user_id: &UserId)
    -> Result<Category, Error>;
}

impl LedgerStore for Connection {
    fn find_active_templates(&self, user_id: &UserId) -> Result<Vec<RecurringTemplate>, Error> {
        template::find_active_templates(user_id, self)
    }

    fn find_transactions(
        &self,
        user_id: &UserId,
        period: Period,
        recurring_template_id: Option<TemplateId>,
    ) -> Result<Vec<Transaction>, Error> {
        transaction::find_transactions(user_id, period, recurring_template_id, self)
    }

    fn insert_transaction(
        &self,
        user_id: &UserId,
        transaction: TransactionBuilder,
    ) -> Result<Transaction, Error> {
        transaction::create_transaction(user_id, transaction, self)
    }

    fn count_references(
        &self,
        category_id: CategoryId,
        user_id: &UserId,
    ) -> Result<CategoryReferences, Error> {
        category::count_references(category_id, user_id, self)
    }

    fn delete_category(
        &self,
        category_id: CategoryId,
        user_id: &UserId,
    ) -> Result<Category, Error> {
        category::delete_category(category_id, user_id, self)
    }
}

/// A template that could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFailure {
    /// The template that failed.
    pub template_id: TemplateId,
    /// What went wrong.
    pub message: String,
}

/// The outcome of reconciling one month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    /// The month that was reconciled.
    pub period: Option<Period>,
    /// The transactions generated by this run.
    pub inserted: Vec<TransactionId>,
    /// Templates that did not need a transaction, either because the month is
    /// outside their window or because one was already generated.
    pub skipped: Vec<TemplateId>,
    /// Variable amount templates waiting for the user to supply this month's amount.
    pub pending_amount: Vec<TemplateId>,
    /// Templates that could not be reconciled.
    pub failed: Vec<TemplateFailure>,
}

/// Ensure every active template of `user_id` has its transaction for `period`.
///
/// Reconciliation is idempotent: existing generated transactions are never
/// changed or deleted, so edits and payments made by the user stick, and a
/// second run for the same month inserts nothing. A concurrent run that
/// inserts the same transaction first is detected through the unique index
/// and counted as skipped.
///
/// A template that cannot be expanded or stored is recorded in
/// [ReconciliationSummary::failed] and does not stop the other templates.
///
/// # Errors
///
/// Returns an error if the store cannot be read, or if an insert fails with an
/// internal error such as [Error::SqlError].
pub fn reconcile(
    store: &impl LedgerStore,
    user_id: &UserId,
    period: Period,
) -> Result<ReconciliationSummary, Error> {
    let templates = store.find_active_templates(user_id)?;
    let already_generated: HashSet<TemplateId> = store
        .find_transactions(user_id, period, None)?
        .into_iter()
        .filter_map(|transaction| transaction.recurring_template_id)
        .collect();

    let mut summary = ReconciliationSummary {
        period: Some(period),
        ..Default::default()
    };

    for template in templates {
        let draft = match expand(&template, period) {
            Ok(Some(draft)) => draft,
            Ok(None) => {
                summary.skipped.push(template.id);
                continue;
            }
            Err(error) => {
                tracing::warn!("could not expand template for {period}: {error}");
                summary.failed.push(TemplateFailure {
                    template_id: error.template_id(),
                    message: error.to_string(),
                });
                continue;
            }
        };

        if already_generated.contains(&template.id) {
            summary.skipped.push(template.id);
            continue;
        }

        let Some(builder) = draft.into_builder() else {
            summary.pending_amount.push(template.id);
            continue;
        };

        match store.insert_transaction(user_id, builder) {
            Ok(transaction) => summary.inserted.push(transaction.id),
            Err(Error::DuplicateGeneratedTransaction) => {
                tracing::debug!(
                    "template {} was reconciled concurrently for {period}",
                    template.id
                );
                summary.skipped.push(template.id);
            }
            Err(error) if error.kind() == ErrorKind::InternalError => return Err(error),
            Err(error) => {
                tracing::warn!("could not store transaction for template {}: {error}", template.id);
                summary.failed.push(TemplateFailure {
                    template_id: template.id,
                    message: error.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "reconciled {period} for user {user_id}: {} inserted, {} skipped, {} pending, {} failed",
        summary.inserted.len(),
        summary.skipped.len(),
        summary.pending_amount.len(),
        summary.failed.len()
    );

    Ok(summary)
}
