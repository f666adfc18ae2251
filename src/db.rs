//! Database schema set up for the ledger.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, category::create_category_table, income::create_income_table,
    template::create_template_table, transaction::create_transaction_table,
};

/// Enable foreign keys and create the tables for the domain models if they do not exist.
///
/// All tables are created inside one exclusive SQL transaction, so a failure
/// leaves the database untouched.
///
/// # Errors
/// Returns an [Error::SqlError] if the schema cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign keys are off by default in SQLite and the setting is per connection.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_template_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_income_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
