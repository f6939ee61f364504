//! Implements a SQLite backed savings goal store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params};

use crate::{
    Error, GoalId, UserId,
    models::{Goal, GoalBuilder, GoalStatus},
    stores::GoalStore,
};

/// Stores savings goals in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteGoalStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteGoalStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl GoalStore for SQLiteGoalStore {
    /// Create a new goal in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount], [Error::InvalidAllocation] or
    ///   [Error::EmptyCategory] if the builder violates the goal invariants,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, builder: GoalBuilder) -> Result<Goal, Error> {
        builder.validate()?;

        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        connection.execute(
            "INSERT INTO goal (user_id, title, target_amount, current_amount, currency, \
             target_date, category, status, auto_allocate, allocation_percentage)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, 'active', ?7, ?8)",
            params![
                builder.user_id,
                builder.title,
                builder.target_amount,
                builder.currency,
                builder.target_date,
                builder.category,
                builder.auto_allocate,
                builder.allocation_percentage,
            ],
        )?;

        Ok(Goal {
            id: connection.last_insert_rowid(),
            user_id: builder.user_id,
            title: builder.title,
            target_amount: builder.target_amount,
            current_amount: 0.0,
            currency: builder.currency,
            target_date: builder.target_date,
            category: builder.category,
            status: GoalStatus::Active,
            auto_allocate: builder.auto_allocate,
            allocation_percentage: builder.allocation_percentage,
        })
    }

    /// Retrieve one of `user_id`'s goals by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to one of `user_id`'s
    ///   goals,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, user_id: UserId, id: GoalId) -> Result<Goal, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;

        let goal = connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM goal WHERE id = ?1 AND user_id = ?2"
            ))?
            .query_row(params![id, user_id], map_goal_row)?;

        Ok(goal)
    }

    /// Retrieve all of `user_id`'s goals, newest first.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn get_for_user(&self, user_id: UserId) -> Result<Vec<Goal>, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;

        connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM goal WHERE user_id = ?1 ORDER BY id DESC"
            ))?
            .query_map(params![user_id], map_goal_row)?
            .map(|result| result.map_err(Error::from))
            .collect()
    }

    /// Retrieve `user_id`'s active goals that have auto-allocation enabled.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn get_auto_allocating(&self, user_id: UserId) -> Result<Vec<Goal>, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;

        connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM goal \
                 WHERE user_id = ?1 AND status = 'active' AND auto_allocate = 1 \
                 ORDER BY id ASC"
            ))?
            .query_map(params![user_id], map_goal_row)?
            .map(|result| result.map_err(Error::from))
            .collect()
    }

    /// Overwrite a goal, matched by ID and owner.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if the goal is not in the database,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update(&mut self, goal: &Goal) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        let changed = connection.execute(
            "UPDATE goal
             SET title = ?1, target_amount = ?2, current_amount = ?3, currency = ?4, \
             target_date = ?5, category = ?6, status = ?7, auto_allocate = ?8, \
             allocation_percentage = ?9
             WHERE id = ?10 AND user_id = ?11",
            params![
                goal.title,
                goal.target_amount,
                goal.current_amount,
                goal.currency,
                goal.target_date,
                goal.category,
                goal.status.as_str(),
                goal.auto_allocate,
                goal.allocation_percentage,
                goal.id,
                goal.user_id,
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Delete one of `user_id`'s goals.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to one of `user_id`'s
    ///   goals,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, user_id: UserId, id: GoalId) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        let changed = connection.execute(
            "DELETE FROM goal WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

const COLUMNS: &str = "id, user_id, title, target_amount, current_amount, currency, target_date, \
    category, status, auto_allocate, allocation_percentage";

/// Create the goal table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub(crate) fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS goal (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                target_amount REAL NOT NULL,
                current_amount REAL NOT NULL DEFAULT 0,
                currency TEXT NOT NULL,
                target_date TEXT NOT NULL,
                category TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                auto_allocate INTEGER NOT NULL DEFAULT 0,
                allocation_percentage REAL NOT NULL DEFAULT 0
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Goal].
fn map_goal_row(row: &Row) -> Result<Goal, rusqlite::Error> {
    let raw_status: String = row.get(8)?;
    let status = match raw_status.as_str() {
        "active" => GoalStatus::Active,
        "completed" => GoalStatus::Completed,
        "cancelled" => GoalStatus::Cancelled,
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                8,
                rusqlite::types::Type::Text,
                format!("unknown goal status {other:?}").into(),
            ));
        }
    };

    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        target_amount: row.get(3)?,
        current_amount: row.get(4)?,
        currency: row.get(5)?,
        target_date: row.get(6)?,
        category: row.get(7)?,
        status,
        auto_allocate: row.get(9)?,
        allocation_percentage: row.get(10)?,
    })
}
