//! Database initialization for the SQLite backed stores.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error,
    stores::sqlite::{
        create_budget_table, create_goal_table, create_notification_table,
        create_transaction_table,
    },
};

/// Create the tables for the domain models if they do not exist yet.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_goal_table(&transaction)?;
    create_notification_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
