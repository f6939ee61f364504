//! Implements a SQLite backed budget store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params};
use time::Date;

use crate::{
    BudgetId, Error, UserId,
    models::{Budget, BudgetBuilder, BudgetScope},
    stores::BudgetStore,
};

/// Stores budgets in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteBudgetStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteBudgetStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl BudgetStore for SQLiteBudgetStore {
    /// Create a new budget in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount], [Error::InvalidThreshold] or
    ///   [Error::EmptyCategory] if the builder violates the budget
    ///   invariants,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, builder: BudgetBuilder) -> Result<Budget, Error> {
        builder.validate()?;

        let (scope, category, month) = scope_columns(&builder.scope);

        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        connection.execute(
            "INSERT INTO budget (user_id, scope, category, month, amount, warning_threshold, \
             current_spending)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
            params![
                builder.user_id,
                scope,
                category,
                month,
                builder.amount,
                builder.warning_threshold,
            ],
        )?;

        Ok(Budget {
            id: connection.last_insert_rowid(),
            user_id: builder.user_id,
            scope: builder.scope,
            amount: builder.amount,
            warning_threshold: builder.warning_threshold,
            current_spending: 0.0,
        })
    }

    /// Retrieve one of `user_id`'s budgets by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to one of `user_id`'s
    ///   budgets,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, user_id: UserId, id: BudgetId) -> Result<Budget, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;

        let budget = connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM budget WHERE id = ?1 AND user_id = ?2"
            ))?
            .query_row(params![id, user_id], map_budget_row)?;

        Ok(budget)
    }

    /// Retrieve all of `user_id`'s budgets.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn get_for_user(&self, user_id: UserId) -> Result<Vec<Budget>, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;

        connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM budget WHERE user_id = ?1 ORDER BY id ASC"
            ))?
            .query_map(params![user_id], map_budget_row)?
            .map(|result| result.map_err(Error::from))
            .collect()
    }

    /// Retrieve every budget in the database, across all users.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn get_all(&self) -> Result<Vec<Budget>, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;

        connection
            .prepare(&format!("SELECT {COLUMNS} FROM budget ORDER BY id ASC"))?
            .query_map([], map_budget_row)?
            .map(|result| result.map_err(Error::from))
            .collect()
    }

    /// Overwrite a budget, matched by ID and owner.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if the budget is not in the database,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update(&mut self, budget: &Budget) -> Result<(), Error> {
        let (scope, category, month) = scope_columns(&budget.scope);

        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        let changed = connection.execute(
            "UPDATE budget
             SET scope = ?1, category = ?2, month = ?3, amount = ?4, warning_threshold = ?5, \
             current_spending = ?6
             WHERE id = ?7 AND user_id = ?8",
            params![
                scope,
                category,
                month,
                budget.amount,
                budget.warning_threshold,
                budget.current_spending,
                budget.id,
                budget.user_id,
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Persist a freshly computed spend total for a budget.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a budget,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn set_current_spending(&mut self, id: BudgetId, total_spent: f64) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        let changed = connection.execute(
            "UPDATE budget SET current_spending = ?1 WHERE id = ?2",
            params![total_spent, id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Delete one of `user_id`'s budgets.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to one of `user_id`'s
    ///   budgets,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, user_id: UserId, id: BudgetId) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        let changed = connection.execute(
            "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

const COLUMNS: &str = "id, user_id, scope, category, month, amount, warning_threshold, \
    current_spending";

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub(crate) fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                scope TEXT NOT NULL,
                category TEXT,
                month TEXT,
                amount REAL NOT NULL,
                warning_threshold REAL NOT NULL,
                current_spending REAL NOT NULL DEFAULT 0
                )",
        (),
    )?;

    Ok(())
}

fn scope_columns(scope: &BudgetScope) -> (&'static str, Option<&str>, Option<Date>) {
    match scope {
        BudgetScope::Monthly { month } => ("monthly", None, Some(*month)),
        BudgetScope::Category { category } => ("category", Some(category), None),
    }
}

/// Map a database row to a [Budget].
fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    let raw_scope: String = row.get(2)?;
    let scope = match raw_scope.as_str() {
        "monthly" => BudgetScope::Monthly { month: row.get(4)? },
        "category" => BudgetScope::Category {
            category: row.get(3)?,
        },
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown budget scope {other:?}").into(),
            ));
        }
    };

    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        scope,
        amount: row.get(5)?,
        warning_threshold: row.get(6)?,
        current_spending: row.get(7)?,
    })
}
