//! Referential checks that protect categories which are still in use.
//!
//! A category referenced by any transaction or recurring template cannot be
//! deleted. The foreign keys on both tables use `ON DELETE RESTRICT`, so the
//! database rejects such a delete atomically even if a new reference is written
//! between the check and the delete. The reference count is only used to build
//! a helpful error message.

use rusqlite::{Connection, params};
use serde::Serialize;

use crate::{
    Error, UserId,
    category::{Category, get_category},
    database_id::CategoryId,
};

/// The number of rows that reference a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryReferences {
    /// The number of transactions filed under the category.
    pub transactions: u32,
    /// The number of recurring templates filed under the category.
    pub templates: u32,
}

impl CategoryReferences {
    /// Whether nothing references the category.
    pub fn is_empty(&self) -> bool {
        self.transactions == 0 && self.templates == 0
    }
}

/// Count the user's transactions and recurring templates that reference `category_id`.
pub fn count_references(
    category_id: CategoryId,
    user_id: &UserId,
    connection: &Connection,
) -> Result<CategoryReferences, Error> {
    connection
        .prepare(
            "SELECT
                (SELECT COUNT(*) FROM \"transaction\" WHERE category_id = ?1 AND user_id = ?2),
                (SELECT COUNT(*) FROM recurring_template WHERE category_id = ?1 AND user_id = ?2)",
        )?
        .query_row(params![category_id, user_id], |row| {
            Ok(CategoryReferences {
                transactions: row.get(0)?,
                templates: row.get(1)?,
            })
        })
        .map_err(Error::from)
}

/// Whether the category can be deleted, i.e. nothing references it.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn can_delete(
    category_id: CategoryId,
    user_id: &UserId,
    connection: &Connection,
) -> Result<bool, Error> {
    get_category(category_id, user_id, connection)?;

    Ok(count_references(category_id, user_id, connection)?.is_empty())
}

/// Delete an unreferenced category and return the deleted category.
///
/// The check and the delete run inside one SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the category does not exist or belongs to another user,
/// - [Error::CategoryInUse] if a transaction or recurring template references the category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_category(
    category_id: CategoryId,
    user_id: &UserId,
    connection: &Connection,
) -> Result<Category, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let category = get_category(category_id, user_id, &sql_transaction)?;
    let references = count_references(category_id, user_id, &sql_transaction)?;

    if !references.is_empty() {
        return Err(Error::CategoryInUse {
            transactions: references.transactions,
            templates: references.templates,
        });
    }

    let delete_result = sql_transaction.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        params![category_id, user_id],
    );

    match delete_result {
        Ok(0) => return Err(Error::NotFound),
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        )) => {
            tracing::warn!(
                "category {category_id} gained a reference between the check and the delete"
            );
            return Err(Error::CategoryInUse {
                transactions: references.transactions,
                templates: references.templates,
            });
        }
        Err(error) => return Err(error.into()),
    }

    sql_transaction.commit()?;

    Ok(category)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Cents, Error, TransactionType, UserId,
        category::{
            CategoryName, CategoryReferences, NewCategory, can_delete, count_references,
            create_category, delete_category, get_category,
        },
        db::initialize,
        template::{NewTemplate, TemplateAmount, create_template},
        transaction::{Transaction, create_transaction},
    };

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    struct TestCategory {
        id: i64,
        user: UserId,
    }

    fn create_test_category(user: &UserId, connection: &Connection) -> TestCategory {
        let category = create_category(
            user,
            NewCategory::new(CategoryName::new_unchecked("Rent"), TransactionType::Expense),
            connection,
        )
        .expect("Could not create test category");

        TestCategory {
            id: category.id,
            user: user.clone(),
        }
    }

    #[test]
    fn unreferenced_category_can_be_deleted() {
        let connection = get_test_db_connection();
        let category = create_test_category(&UserId::new("alice"), &connection);

        assert_eq!(can_delete(category.id, &category.user, &connection), Ok(true));

        let deleted = delete_category(category.id, &category.user, &connection)
            .expect("Could not delete category");

        assert_eq!(deleted.id, category.id);
        assert_eq!(
            get_category(category.id, &category.user, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn category_with_transaction_cannot_be_deleted() {
        let connection = get_test_db_connection();
        let category = create_test_category(&UserId::new("alice"), &connection);
        create_transaction(
            &category.user,
            Transaction::build(
                TransactionType::Expense,
                Cents::new(100),
                date!(2024 - 03 - 01),
                "Rent",
            )
            .category_id(Some(category.id)),
            &connection,
        )
        .expect("Could not create test transaction");

        assert_eq!(can_delete(category.id, &category.user, &connection), Ok(false));
        assert_eq!(
            delete_category(category.id, &category.user, &connection),
            Err(Error::CategoryInUse {
                transactions: 1,
                templates: 0
            })
        );
        assert!(get_category(category.id, &category.user, &connection).is_ok());
    }

    #[test]
    fn category_with_template_cannot_be_deleted() {
        let connection = get_test_db_connection();
        let category = create_test_category(&UserId::new("alice"), &connection);
        create_template(
            &category.user,
            NewTemplate::build(
                TransactionType::Expense,
                "Rent",
                TemplateAmount::Fixed(Cents::new(100_000)),
                1,
                date!(2024 - 01 - 01),
            )
            .category_id(Some(category.id)),
            &connection,
        )
        .expect("Could not create test template");

        assert_eq!(
            count_references(category.id, &category.user, &connection),
            Ok(CategoryReferences {
                transactions: 0,
                templates: 1
            })
        );
        assert_eq!(
            delete_category(category.id, &category.user, &connection),
            Err(Error::CategoryInUse {
                transactions: 0,
                templates: 1
            })
        );
    }

    #[test]
    fn foreign_key_rejects_delete_of_referenced_category() {
        let connection = get_test_db_connection();
        let category = create_test_category(&UserId::new("alice"), &connection);
        create_transaction(
            &category.user,
            Transaction::build(
                TransactionType::Expense,
                Cents::new(100),
                date!(2024 - 03 - 01),
                "Rent",
            )
            .category_id(Some(category.id)),
            &connection,
        )
        .unwrap();

        let result = connection.execute("DELETE FROM category WHERE id = ?1", [category.id]);

        assert!(result.is_err(), "the foreign key should reject the delete");
    }

    #[test]
    fn deleting_other_users_category_returns_not_found() {
        let connection = get_test_db_connection();
        let category = create_test_category(&UserId::new("alice"), &connection);
        let mallory = UserId::new("mallory");

        assert_eq!(
            delete_category(category.id, &mallory, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(can_delete(category.id, &mallory, &connection), Err(Error::NotFound));
    }
}
