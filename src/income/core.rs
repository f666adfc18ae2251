//! Income models and database queries.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Cents, Error, UserId, database_id::IncomeId, timezone::now_utc,
    transaction::validate_description,
};

/// Money the user earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    /// The ID of the income.
    pub id: IncomeId,
    /// Where the income came from.
    pub description: String,
    /// The amount earned, always positive.
    pub amount: Cents,
    /// When the income was received.
    pub date: Date,
    /// Whether the income repeats, e.g. a salary.
    pub is_recurring: bool,
    /// When the income was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The data needed to record an income.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewIncome {
    /// Where the income came from.
    pub description: String,
    /// The decimal amount, e.g. `1234.56`.
    pub amount: Cents,
    /// When the income was received.
    pub date: Date,
    /// Whether the income repeats.
    #[serde(default)]
    pub is_recurring: bool,
}

/// Record an income for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyDescription] if the description is blank,
/// - [Error::NonPositiveAmount] if the amount is zero or negative,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_income(
    user_id: &UserId,
    income: NewIncome,
    connection: &Connection,
) -> Result<Income, Error> {
    let description = validate_description(&income.description)?;
    let amount = income.amount.ensure_positive()?;

    connection
        .prepare(
            "INSERT INTO income (user_id, description, amount_cents, date, is_recurring, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, description, amount_cents, date, is_recurring, created_at",
        )?
        .query_row(
            params![
                user_id,
                description,
                amount,
                income.date,
                income.is_recurring,
                now_utc()
            ],
            map_income_row,
        )
        .map_err(Error::from)
}

/// Retrieve the user's incomes, most recent first.
pub fn get_incomes(user_id: &UserId, connection: &Connection) -> Result<Vec<Income>, Error> {
    connection
        .prepare(
            "SELECT id, description, amount_cents, date, is_recurring, created_at
             FROM income WHERE user_id = ?1 ORDER BY date DESC, id DESC",
        )?
        .query_map([user_id], map_income_row)?
        .map(|income_result| income_result.map_err(Error::from))
        .collect()
}

/// Delete an income.
///
/// # Errors
/// Returns [Error::NotFound] if the income does not exist or belongs to another user.
pub fn delete_income(id: IncomeId, user_id: &UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM income WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the income table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_income_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS income (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            description TEXT NOT NULL,
            amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
            date TEXT NOT NULL,
            is_recurring INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_income_user_date ON income(user_id, date);",
    )?;

    Ok(())
}

fn map_income_row(row: &Row) -> Result<Income, rusqlite::Error> {
    Ok(Income {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: row.get(2)?,
        date: row.get(3)?,
        is_recurring: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::date;

    use crate::{Cents, Error, UserId, db::initialize};

    use super::{NewIncome, create_income, delete_income, get_incomes};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn decimal_amount_round_trips_through_storage() {
        let connection = get_test_connection();
        let user = UserId::new("alice");
        let new_income: NewIncome = serde_json::from_value(json!({
            "description": "Freelance",
            "amount": 19.99,
            "date": "2024-03-01"
        }))
        .unwrap();

        let income = create_income(&user, new_income, &connection).unwrap();
        let stored: i64 = connection
            .query_row(
                "SELECT amount_cents FROM income WHERE id = ?1",
                [income.id],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(stored, 1999);
        assert_eq!(serde_json::to_value(&income).unwrap()["amount"], json!(19.99));
        assert!(!income.is_recurring);
    }

    #[test]
    fn half_cent_rounds_up_at_boundary() {
        let new_income: NewIncome = serde_json::from_value(json!({
            "description": "Interest",
            "amount": "0.125",
            "date": "2024-03-01"
        }))
        .unwrap();

        assert_eq!(new_income.amount, Cents::new(13));
    }

    #[test]
    fn lists_newest_first_and_scopes_by_user() {
        let connection = get_test_connection();
        let user = UserId::new("alice");
        let income = |date| NewIncome {
            description: "Salary".to_owned(),
            amount: Cents::new(100),
            date,
            is_recurring: true,
        };
        let older = create_income(&user, income(date!(2024 - 01 - 31)), &connection).unwrap();
        let newer = create_income(&user, income(date!(2024 - 02 - 29)), &connection).unwrap();
        create_income(&UserId::new("bob"), income(date!(2024 - 02 - 29)), &connection).unwrap();

        assert_eq!(get_incomes(&user, &connection), Ok(vec![newer, older]));
    }

    #[test]
    fn rejects_non_positive_amount() {
        let connection = get_test_connection();

        let result = create_income(
            &UserId::new("alice"),
            NewIncome {
                description: "Refund".to_owned(),
                amount: Cents::new(-500),
                date: date!(2024 - 01 - 01),
                is_recurring: false,
            },
            &connection,
        );

        assert_eq!(result, Err(Error::NonPositiveAmount(Cents::new(-500))));
    }

    #[test]
    fn delete_is_scoped_by_user() {
        let connection = get_test_connection();
        let income = create_income(
            &UserId::new("alice"),
            NewIncome {
                description: "Gift".to_owned(),
                amount: Cents::new(5000),
                date: date!(2024 - 01 - 01),
                is_recurring: false,
            },
            &connection,
        )
        .unwrap();

        assert_eq!(
            delete_income(income.id, &UserId::new("bob"), &connection),
            Err(Error::NotFound)
        );
        assert_eq!(delete_income(income.id, &UserId::new("alice"), &connection), Ok(()));
    }
}
