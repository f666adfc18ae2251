//! Database operations for recurring templates.

use rusqlite::{Connection, Row, params};

use crate::{
    Error, UserId,
    category::{ensure_category_owned, map_category_write_error},
    database_id::TemplateId,
    template::{
        NewTemplate, RecurringTemplate, TemplateUpdate, domain::TemplateSchedule,
    },
    timezone::now_utc,
};

const SELECT_COLUMNS: &str = "SELECT id, category_id, type, description, amount_cents, \
    day_of_month, start_date, end_date, is_active, created_at, updated_at FROM recurring_template";

const RETURNING_COLUMNS: &str = "RETURNING id, category_id, type, description, amount_cents, \
    day_of_month, start_date, end_date, is_active, created_at, updated_at";

/// Create an active recurring template for `user_id`.
///
/// # Errors
/// This function will return a:
/// - validation error if the template fields are invalid, see [TemplateSchedule::validate],
/// - [Error::InvalidCategory] if the category ID does not refer to one of the user's categories,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_template(
    user_id: &UserId,
    template: NewTemplate,
    connection: &Connection,
) -> Result<RecurringTemplate, Error> {
    let schedule = TemplateSchedule::validate(
        &template.description,
        template.amount,
        template.day_of_month,
        template.start_date,
        template.end_date,
    )?;

    if let Some(category_id) = template.category_id {
        ensure_category_owned(category_id, user_id, connection)?;
    }

    let now = now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO recurring_template (
                user_id, category_id, type, description, amount_cents, day_of_month,
                start_date, end_date, is_active, created_at, updated_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)
             {RETURNING_COLUMNS}"
        ))?
        .query_row(
            params![
                user_id,
                template.category_id,
                template.template_type,
                schedule.description,
                schedule.amount,
                schedule.day_of_month,
                schedule.start_date,
                schedule.end_date,
                now,
            ],
            map_template_row,
        )
        .map_err(|error| map_category_write_error(error, template.category_id))
}

/// Retrieve a recurring template by ID.
///
/// # Errors
/// Returns [Error::NotFound] if the template does not exist or belongs to another user.
pub fn get_template(
    id: TemplateId,
    user_id: &UserId,
    connection: &Connection,
) -> Result<RecurringTemplate, Error> {
    connection
        .prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1 AND user_id = ?2"))?
        .query_row(params![id, user_id], map_template_row)
        .map_err(Error::from)
}

/// Retrieve all of the user's templates, active or not, in creation order.
pub fn get_templates(
    user_id: &UserId,
    connection: &Connection,
) -> Result<Vec<RecurringTemplate>, Error> {
    connection
        .prepare(&format!("{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY id ASC"))?
        .query_map([user_id], map_template_row)?
        .map(|template_result| template_result.map_err(Error::from))
        .collect()
}

/// Retrieve the user's active templates in creation order.
pub fn find_active_templates(
    user_id: &UserId,
    connection: &Connection,
) -> Result<Vec<RecurringTemplate>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 AND is_active = 1 ORDER BY id ASC"
        ))?
        .query_map([user_id], map_template_row)?
        .map(|template_result| template_result.map_err(Error::from))
        .collect()
}

/// Apply a partial update to a template and bump its `updated_at`.
///
/// Transactions already generated from the template are not changed.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the template does not exist or belongs to another user,
/// - validation error if the updated fields are invalid, see [TemplateSchedule::validate],
/// - [Error::InvalidCategory] if the new category is not one of the user's categories,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_template(
    id: TemplateId,
    user_id: &UserId,
    update: TemplateUpdate,
    connection: &Connection,
) -> Result<RecurringTemplate, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let current = get_template(id, user_id, &sql_transaction)?;

    let schedule = TemplateSchedule::validate(
        update.description.as_deref().unwrap_or(&current.description),
        update.amount.unwrap_or(current.amount),
        update.day_of_month.unwrap_or(current.day_of_month),
        update.start_date.unwrap_or(current.start_date),
        update.end_date.unwrap_or(current.end_date),
    )?;

    let category_id = update.category_id.unwrap_or(current.category_id);
    if let Some(category_id) = category_id {
        ensure_category_owned(category_id, user_id, &sql_transaction)?;
    }

    let updated = sql_transaction
        .prepare(&format!(
            "UPDATE recurring_template
             SET category_id = ?1, description = ?2, amount_cents = ?3, day_of_month = ?4,
                 start_date = ?5, end_date = ?6, is_active = ?7, updated_at = ?8
             WHERE id = ?9 AND user_id = ?10
             {RETURNING_COLUMNS}"
        ))?
        .query_row(
            params![
                category_id,
                schedule.description,
                schedule.amount,
                schedule.day_of_month,
                schedule.start_date,
                schedule.end_date,
                update.is_active.unwrap_or(current.is_active),
                now_utc(),
                id,
                user_id,
            ],
            map_template_row,
        )
        .map_err(|error| map_category_write_error(error, category_id))?;

    sql_transaction.commit()?;

    Ok(updated)
}

/// Deactivate a template so it stops generating transactions.
///
/// Templates are never deleted so that generated transactions keep pointing
/// at the template they came from.
///
/// # Errors
/// Returns [Error::NotFound] if the template does not exist or belongs to another user.
pub fn deactivate_template(
    id: TemplateId,
    user_id: &UserId,
    connection: &Connection,
) -> Result<RecurringTemplate, Error> {
    connection
        .prepare(&format!(
            "UPDATE recurring_template SET is_active = 0, updated_at = ?1
             WHERE id = ?2 AND user_id = ?3
             {RETURNING_COLUMNS}"
        ))?
        .query_row(params![now_utc(), id, user_id], map_template_row)
        .map_err(Error::from)
}

/// Create the recurring template table and its indexes.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_template_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS recurring_template (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            category_id INTEGER REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            description TEXT NOT NULL,
            amount_cents INTEGER CHECK (amount_cents IS NULL OR amount_cents > 0),
            day_of_month INTEGER NOT NULL CHECK (day_of_month BETWEEN 1 AND 31),
            start_date TEXT NOT NULL,
            end_date TEXT CHECK (end_date IS NULL OR end_date >= start_date),
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_recurring_template_user_active
            ON recurring_template(user_id, is_active);

        CREATE INDEX IF NOT EXISTS idx_recurring_template_category
            ON recurring_template(category_id);",
    )?;

    Ok(())
}

/// Map a database row to a [RecurringTemplate].
pub fn map_template_row(row: &Row) -> Result<RecurringTemplate, rusqlite::Error> {
    Ok(RecurringTemplate {
        id: row.get(0)?,
        category_id: row.get(1)?,
        template_type: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        day_of_month: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
