//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Cents, Error, Period, TransactionType, UserId,
    category::ensure_category_owned,
    database_id::{CategoryId, TemplateId, TransactionId},
    extract::double_option,
    timezone::now_utc,
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// A transaction with a `recurring_template_id` was generated from a
/// recurring template, otherwise it was entered manually.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The template that generated this transaction, if any.
    pub recurring_template_id: Option<TemplateId>,
    /// The category the transaction is filed under.
    pub category_id: Option<CategoryId>,
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned, always positive.
    pub amount: Cents,
    /// When the transaction happened.
    pub date: Date,
    /// The month that `date` falls in.
    #[serde(flatten)]
    pub period: Period,
    /// Whether the transaction has been paid or received.
    pub is_paid: bool,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        amount: Cents,
        date: Date,
        description: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            transaction_type,
            amount,
            date,
            description: description.to_owned(),
            category_id: None,
            recurring_template_id: None,
            is_paid: false,
            notes: None,
        }
    }
}

/// A builder for new transactions.
///
/// The builder only holds the transaction date. The year and month are
/// derived from it when the transaction is written to the database.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TransactionBuilder {
    /// Whether money was earned or spent.
    pub transaction_type: TransactionType,
    /// The amount of money, must be greater than zero.
    pub amount: Cents,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of the transaction.
    pub description: String,
    /// The category of the transaction, e.g. "Groceries", "Rent".
    pub category_id: Option<CategoryId>,
    /// The recurring template this transaction was generated from.
    pub recurring_template_id: Option<TemplateId>,
    /// Whether the transaction has been paid or received.
    pub is_paid: bool,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl TransactionBuilder {
    /// Set the category for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Mark the transaction as generated from a recurring template.
    pub fn recurring_template_id(mut self, template_id: Option<TemplateId>) -> Self {
        self.recurring_template_id = template_id;
        self
    }

    /// Set whether the transaction has been paid.
    pub fn is_paid(mut self, is_paid: bool) -> Self {
        self.is_paid = is_paid;
        self
    }

    /// Set the notes for the transaction.
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

/// A partial update to a transaction.
///
/// `None` leaves a field unchanged. For nullable fields, `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransactionUpdate {
    /// A new amount.
    #[serde(default)]
    pub amount: Option<Cents>,
    /// A new date. The year and month follow the date.
    #[serde(default)]
    pub date: Option<Date>,
    /// A new description.
    #[serde(default)]
    pub description: Option<String>,
    /// A new category, or `Some(None)` to remove the category.
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<CategoryId>>,
    /// Mark the transaction as paid or unpaid.
    #[serde(default)]
    pub is_paid: Option<bool>,
    /// New notes, or `Some(None)` to remove the notes.
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

/// Trim a description and check that it is not empty.
///
/// # Errors
/// Returns [Error::EmptyDescription] if `description` is empty or only whitespace.
pub fn validate_description(description: &str) -> Result<String, Error> {
    let description = description.trim();

    if description.is_empty() {
        Err(Error::EmptyDescription)
    } else {
        Ok(description.to_owned())
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_COLUMNS: &str = "SELECT id, recurring_template_id, category_id, type, description, \
    amount_cents, transaction_date, is_paid, notes, created_at, updated_at FROM \"transaction\"";

/// Create a new transaction for `user_id` from a builder.
///
/// The year and month columns are derived from the builder's date.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyDescription] if the description is blank,
/// - [Error::NonPositiveAmount] if the amount is zero or negative,
/// - [Error::InvalidCategory] if the category ID does not refer to one of the user's categories,
/// - [Error::DuplicateGeneratedTransaction] if the template already generated a transaction in the same month,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: &UserId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let description = validate_description(&builder.description)?;
    let amount = builder.amount.ensure_positive()?;

    if let Some(category_id) = builder.category_id {
        ensure_category_owned(category_id, user_id, connection)?;
    }

    let period = Period::from(builder.date);
    let now = now_utc();

    connection
        .prepare(
            "INSERT INTO \"transaction\" (
                user_id, recurring_template_id, category_id, type, description, amount_cents,
                transaction_date, year, month, is_paid, notes, created_at, updated_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
             RETURNING id, recurring_template_id, category_id, type, description, amount_cents,
                transaction_date, is_paid, notes, created_at, updated_at",
        )?
        .query_row(
            params![
                user_id,
                builder.recurring_template_id,
                builder.category_id,
                builder.transaction_type,
                description,
                amount,
                builder.date,
                period.year(),
                period.month(),
                builder.is_paid,
                builder.notes,
                now,
            ],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => match builder.category_id {
                Some(category_id) => Error::InvalidCategory(category_id),
                None => Error::NotFound,
            },
            error => error.into(),
        })
}

/// Retrieve a transaction by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
pub fn get_transaction(
    id: TransactionId,
    user_id: &UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1 AND user_id = ?2"))?
        .query_row(params![id, user_id], map_transaction_row)
        .map_err(Error::from)
}

/// Retrieve the user's transactions in `period`, optionally only those generated by one template.
pub fn find_transactions(
    user_id: &UserId,
    period: Period,
    recurring_template_id: Option<TemplateId>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS}
             WHERE user_id = ?1 AND year = ?2 AND month = ?3
                AND (?4 IS NULL OR recurring_template_id = ?4)
             ORDER BY transaction_date ASC, id ASC"
        ))?
        .query_map(
            params![user_id, period.year(), period.month(), recurring_template_id],
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Retrieve all of the user's transactions, newest first.
pub fn get_transactions(
    user_id: &UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY transaction_date DESC, id DESC"
        ))?
        .query_map([user_id], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Apply a partial update to a transaction and return the updated transaction.
///
/// Changing the date moves the transaction to the month of the new date.
/// `updated_at` is set to the current time.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the transaction does not exist or belongs to another user,
/// - [Error::EmptyDescription], [Error::NonPositiveAmount] or [Error::InvalidCategory] for invalid changes,
/// - [Error::DuplicateGeneratedTransaction] if a generated transaction is moved into a month
///   that already has a transaction from the same template,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: &UserId,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let mut transaction = get_transaction(id, user_id, &sql_transaction)?;

    if let Some(amount) = update.amount {
        transaction.amount = amount.ensure_positive()?;
    }
    if let Some(date) = update.date {
        transaction.date = date;
        transaction.period = Period::from(date);
    }
    if let Some(description) = update.description {
        transaction.description = validate_description(&description)?;
    }
    if let Some(category_id) = update.category_id {
        if let Some(category_id) = category_id {
            ensure_category_owned(category_id, user_id, &sql_transaction)?;
        }
        transaction.category_id = category_id;
    }
    if let Some(is_paid) = update.is_paid {
        transaction.is_paid = is_paid;
    }
    if let Some(notes) = update.notes {
        transaction.notes = notes;
    }

    let updated = sql_transaction
        .prepare(
            "UPDATE \"transaction\"
             SET category_id = ?1, description = ?2, amount_cents = ?3, transaction_date = ?4,
                 year = ?5, month = ?6, is_paid = ?7, notes = ?8, updated_at = ?9
             WHERE id = ?10 AND user_id = ?11
             RETURNING id, recurring_template_id, category_id, type, description, amount_cents,
                transaction_date, is_paid, notes, created_at, updated_at",
        )?
        .query_row(
            params![
                transaction.category_id,
                transaction.description,
                transaction.amount,
                transaction.date,
                transaction.period.year(),
                transaction.period.month(),
                transaction.is_paid,
                transaction.notes,
                now_utc(),
                id,
                user_id,
            ],
            map_transaction_row,
        )?;

    sql_transaction.commit()?;

    Ok(updated)
}

/// Delete a transaction.
///
/// Deleting a generated transaction allows reconciliation to generate it again.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
pub fn delete_transaction(
    id: TransactionId,
    user_id: &UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the transaction table and its indexes.
///
/// The partial unique index allows at most one generated transaction per
/// template and month, manual transactions are not constrained.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            recurring_template_id INTEGER
                REFERENCES recurring_template(id) ON UPDATE CASCADE ON DELETE SET NULL,
            category_id INTEGER REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            description TEXT NOT NULL,
            amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
            transaction_date TEXT NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            is_paid INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_transaction_generated_unique
            ON \"transaction\"(user_id, recurring_template_id, year, month)
            WHERE recurring_template_id IS NOT NULL;

        CREATE INDEX IF NOT EXISTS idx_transaction_user_period
            ON \"transaction\"(user_id, year, month);

        CREATE INDEX IF NOT EXISTS idx_transaction_user_type_period
            ON \"transaction\"(user_id, type, year, month);

        CREATE INDEX IF NOT EXISTS idx_transaction_category
            ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

/// Map a database row to a [Transaction].
///
/// The period is derived from the stored date.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let date: Date = row.get(6)?;

    Ok(Transaction {
        id: row.get(0)?,
        recurring_template_id: row.get(1)?,
        category_id: row.get(2)?,
        transaction_type: row.get(3)?,
        description: row.get(4)?,
        amount: row.get(5)?,
        date,
        period: Period::from(date),
        is_paid: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Cents, Error, Period, TransactionType, UserId,
        category::{CategoryName, NewCategory, create_category},
        db::initialize,
        template::{NewTemplate, TemplateAmount, create_template},
    };

    use super::{
        Transaction, TransactionUpdate, create_transaction, delete_transaction,
        find_transactions, get_transaction, get_transactions, update_transaction,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn create_test_template(user: &UserId, connection: &Connection) -> i64 {
        create_template(
            user,
            NewTemplate::build(
                TransactionType::Expense,
                "Rent",
                TemplateAmount::Fixed(Cents::new(50_000)),
                1,
                date!(2024 - 01 - 01),
            ),
            connection,
        )
        .expect("Could not create template")
        .id
    }

    #[test]
    fn create_succeeds_and_derives_period() {
        let connection = get_test_connection();
        let user = UserId::new("alice");

        let transaction = create_transaction(
            &user,
            Transaction::build(
                TransactionType::Expense,
                Cents::new(1999),
                date!(2024 - 03 - 31),
                "  Coffee beans ",
            )
            .notes(Some("single origin".to_owned())),
            &connection,
        )
        .expect("Could not create transaction");

        assert!(transaction.id > 0);
        assert_eq!(transaction.amount, Cents::new(1999));
        assert_eq!(transaction.description, "Coffee beans");
        assert_eq!(transaction.period, Period::new(2024, 3).unwrap());
        assert!(!transaction.is_paid);
        assert_eq!(transaction.recurring_template_id, None);

        let (year, month): (i32, u8) = connection
            .query_row(
                "SELECT year, month FROM \"transaction\" WHERE id = ?1",
                [transaction.id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((year, month), (2024, 3));
    }

    #[test]
    fn create_rejects_invalid_fields() {
        let connection = get_test_connection();
        let user = UserId::new("alice");
        let build = |amount: i64, description: &str| {
            Transaction::build(
                TransactionType::Expense,
                Cents::new(amount),
                date!(2024 - 03 - 01),
                description,
            )
        };

        assert_eq!(
            create_transaction(&user, build(0, "Zero"), &connection),
            Err(Error::NonPositiveAmount(Cents::ZERO))
        );
        assert_eq!(
            create_transaction(&user, build(-100, "Negative"), &connection),
            Err(Error::NonPositiveAmount(Cents::new(-100)))
        );
        assert_eq!(
            create_transaction(&user, build(100, " "), &connection),
            Err(Error::EmptyDescription)
        );
    }

    #[test]
    fn create_rejects_other_users_category() {
        let connection = get_test_connection();
        let category = create_category(
            &UserId::new("bob"),
            NewCategory::new(CategoryName::new_unchecked("Rent"), TransactionType::Expense),
            &connection,
        )
        .unwrap();

        let result = create_transaction(
            &UserId::new("alice"),
            Transaction::build(
                TransactionType::Expense,
                Cents::new(100),
                date!(2024 - 03 - 01),
                "Rent",
            )
            .category_id(Some(category.id)),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCategory(category.id)));
    }

    #[test]
    fn second_generated_transaction_in_month_is_rejected() {
        let connection = get_test_connection();
        let user = UserId::new("alice");
        let template_id = create_test_template(&user, &connection);
        let generated = |date| {
            Transaction::build(TransactionType::Expense, Cents::new(50_000), date, "Rent")
                .recurring_template_id(Some(template_id))
        };

        create_transaction(&user, generated(date!(2024 - 03 - 01)), &connection).unwrap();
        let duplicate = create_transaction(&user, generated(date!(2024 - 03 - 20)), &connection);
        let next_month = create_transaction(&user, generated(date!(2024 - 04 - 01)), &connection);

        assert_eq!(duplicate, Err(Error::DuplicateGeneratedTransaction));
        assert!(next_month.is_ok());
    }

    #[test]
    fn manual_transactions_are_not_deduplicated() {
        let connection = get_test_connection();
        let user = UserId::new("alice");
        let manual = || {
            Transaction::build(
                TransactionType::Expense,
                Cents::new(450),
                date!(2024 - 03 - 02),
                "Coffee",
            )
        };

        create_transaction(&user, manual(), &connection).unwrap();
        create_transaction(&user, manual(), &connection).unwrap();

        let period = Period::new(2024, 3).unwrap();
        assert_eq!(find_transactions(&user, period, None, &connection).unwrap().len(), 2);
    }

    #[test]
    fn find_transactions_filters_by_user_period_and_template() {
        let connection = get_test_connection();
        let alice = UserId::new("alice");
        let template_id = create_test_template(&alice, &connection);
        let generated = create_transaction(
            &alice,
            Transaction::build(
                TransactionType::Expense,
                Cents::new(50_000),
                date!(2024 - 03 - 01),
                "Rent",
            )
            .recurring_template_id(Some(template_id)),
            &connection,
        )
        .unwrap();
        let manual = create_transaction(
            &alice,
            Transaction::build(
                TransactionType::Expense,
                Cents::new(450),
                date!(2024 - 03 - 02),
                "Coffee",
            ),
            &connection,
        )
        .unwrap();
        create_transaction(
            &alice,
            Transaction::build(
                TransactionType::Expense,
                Cents::new(450),
                date!(2024 - 04 - 02),
                "Coffee",
            ),
            &connection,
        )
        .unwrap();
        create_transaction(
            &UserId::new("bob"),
            Transaction::build(
                TransactionType::Expense,
                Cents::new(450),
                date!(2024 - 03 - 02),
                "Coffee",
            ),
            &connection,
        )
        .unwrap();
        let march = Period::new(2024, 3).unwrap();

        let all = find_transactions(&alice, march, None, &connection).unwrap();
        let from_template = find_transactions(&alice, march, Some(template_id), &connection).unwrap();

        assert_eq!(all, vec![generated.clone(), manual]);
        assert_eq!(from_template, vec![generated]);
        assert_eq!(get_transactions(&alice, &connection).unwrap().len(), 3);
    }

    #[test]
    fn update_moves_period_with_date() {
        let connection = get_test_connection();
        let user = UserId::new("alice");
        let transaction = create_transaction(
            &user,
            Transaction::build(
                TransactionType::Income,
                Cents::new(10_000),
                date!(2024 - 01 - 31),
                "Refund",
            ),
            &connection,
        )
        .unwrap();

        let updated = update_transaction(
            transaction.id,
            &user,
            TransactionUpdate {
                date: Some(date!(2024 - 02 - 01)),
                is_paid: Some(true),
                notes: Some(Some("late".to_owned())),
                ..Default::default()
            },
            &connection,
        )
        .expect("Could not update transaction");

        assert_eq!(updated.period, Period::new(2024, 2).unwrap());
        assert!(updated.is_paid);
        assert_eq!(updated.notes.as_deref(), Some("late"));
        assert_eq!(updated.amount, transaction.amount);
        assert!(updated.updated_at >= transaction.updated_at);

        let february = Period::new(2024, 2).unwrap();
        assert_eq!(
            find_transactions(&user, february, None, &connection).unwrap(),
            vec![updated]
        );
    }

    #[test]
    fn update_rejects_non_positive_amount() {
        let connection = get_test_connection();
        let user = UserId::new("alice");
        let transaction = create_transaction(
            &user,
            Transaction::build(
                TransactionType::Income,
                Cents::new(10_000),
                date!(2024 - 01 - 31),
                "Refund",
            ),
            &connection,
        )
        .unwrap();

        let result = update_transaction(
            transaction.id,
            &user,
            TransactionUpdate {
                amount: Some(Cents::new(-1)),
                ..Default::default()
            },
            &connection,
        );

        assert_eq!(result, Err(Error::NonPositiveAmount(Cents::new(-1))));
        assert_eq!(get_transaction(transaction.id, &user, &connection), Ok(transaction));
    }

    #[test]
    fn delete_of_other_users_transaction_is_not_found() {
        let connection = get_test_connection();
        let transaction = create_transaction(
            &UserId::new("alice"),
            Transaction::build(
                TransactionType::Expense,
                Cents::new(100),
                date!(2024 - 03 - 01),
                "Snack",
            ),
            &connection,
        )
        .unwrap();

        assert_eq!(
            delete_transaction(transaction.id, &UserId::new("mallory"), &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_transaction(transaction.id, &UserId::new("alice"), &connection),
            Ok(())
        );
        assert_eq!(
            get_transaction(transaction.id, &UserId::new("alice"), &connection),
            Err(Error::NotFound)
        );
    }
}
