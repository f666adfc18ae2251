//! Database operations for categories.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::{
    Error, TransactionType, UserId,
    category::{Category, CategoryUpdate, NewCategory},
    database_id::CategoryId,
    timezone::now_utc,
};

const SELECT_COLUMNS: &str = "SELECT id, name, type, color, icon, created_at FROM category";

/// Create a category for `user_id` and return it with its generated ID.
pub fn create_category(
    user_id: &UserId,
    category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "INSERT INTO category (user_id, name, type, color, icon, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, name, type, color, icon, created_at",
        )?
        .query_row(
            params![
                user_id,
                category.name,
                category.category_type,
                category.color,
                category.icon,
                now_utc(),
            ],
            map_category_row,
        )
        .map_err(Error::from)
}

/// Retrieve a single category by ID.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn get_category(
    category_id: CategoryId,
    user_id: &UserId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            rusqlite::named_params! { ":id": category_id, ":user_id": user_id },
            map_category_row,
        )
        .map_err(Error::from)
}

/// Retrieve the user's categories in creation order, optionally only those of one type.
pub fn get_categories(
    user_id: &UserId,
    category_type: Option<TransactionType>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS}
             WHERE user_id = :user_id AND (:type IS NULL OR type = :type)
             ORDER BY created_at ASC, id ASC"
        ))?
        .query_map(
            rusqlite::named_params! { ":user_id": user_id, ":type": category_type },
            map_category_row,
        )?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Apply a partial update to a category and return the updated category.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn update_category(
    category_id: CategoryId,
    user_id: &UserId,
    update: CategoryUpdate,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "UPDATE category
             SET name = COALESCE(?1, name),
                 color = COALESCE(?2, color),
                 icon = COALESCE(?3, icon)
             WHERE id = ?4 AND user_id = ?5
             RETURNING id, name, type, color, icon, created_at",
        )?
        .query_row(
            params![update.name, update.color, update.icon, category_id, user_id],
            map_category_row,
        )
        .map_err(Error::from)
}

/// Check that `category_id` refers to a category owned by `user_id`.
///
/// Used before writing a transaction or template that references the category,
/// since the foreign key alone cannot tell categories of different users apart.
///
/// # Errors
/// Returns [Error::InvalidCategory] if the category does not exist or belongs to another user.
pub fn ensure_category_owned(
    category_id: CategoryId,
    user_id: &UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let exists = connection
        .prepare("SELECT 1 FROM category WHERE id = ?1 AND user_id = ?2")?
        .query_row(params![category_id, user_id], |_| Ok(()))
        .optional()?;

    exists.ok_or(Error::InvalidCategory(category_id))
}

/// Map an error from a write that references `category_id` to an [Error].
///
/// A foreign key violation means the category was deleted after
/// [ensure_category_owned] passed, and is reported as [Error::InvalidCategory].
pub fn map_category_write_error(error: rusqlite::Error, category_id: Option<CategoryId>) -> Error {
    match (error, category_id) {
        (
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                    ..
                },
                _,
            ),
            Some(category_id),
        ) => Error::InvalidCategory(category_id),
        (error, _) => error.into(),
    }
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            color TEXT,
            icon TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_type ON category(user_id, type);",
    )?;

    Ok(())
}

/// Map a database row to a [Category].
pub fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        category_type: row.get(2)?,
        color: row.get(3)?,
        icon: row.get(4)?,
        created_at: row.get(5)?,
    })
}
