//! Implements a SQLite backed notification store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params};
use time::OffsetDateTime;

use crate::{
    Error, NotificationId, UserId,
    models::{Notification, NotificationBuilder, NotificationKind},
    stores::NotificationStore,
};

/// Stores notifications in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteNotificationStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteNotificationStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl NotificationStore for SQLiteNotificationStore {
    /// Create a new notification in the database, stamped with the current
    /// time.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn create(&mut self, builder: NotificationBuilder) -> Result<Notification, Error> {
        let created_at = OffsetDateTime::now_utc();

        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        connection.execute(
            "INSERT INTO notification (user_id, transaction_id, kind, message, is_read, \
             due_date, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
            params![
                builder.user_id,
                builder.transaction_id,
                builder.kind.as_str(),
                builder.message,
                builder.due_date,
                created_at,
            ],
        )?;

        Ok(Notification {
            id: connection.last_insert_rowid(),
            user_id: builder.user_id,
            transaction_id: builder.transaction_id,
            kind: builder.kind,
            message: builder.message,
            is_read: false,
            due_date: builder.due_date,
            created_at,
        })
    }

    /// Retrieve all of `user_id`'s notifications, newest first.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn get_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;

        connection
            .prepare(
                "SELECT id, user_id, transaction_id, kind, message, is_read, due_date, created_at \
                 FROM notification WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            )?
            .query_map(params![user_id], map_notification_row)?
            .map(|result| result.map_err(Error::from))
            .collect()
    }

    /// The number of `user_id`'s notifications that are still unread.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn unread_count(&self, user_id: UserId) -> Result<u64, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;

        connection
            .query_row(
                "SELECT COUNT(id) FROM notification WHERE user_id = ?1 AND is_read = 0",
                params![user_id],
                |row| row.get::<_, i64>(0).map(|count| count as u64),
            )
            .map_err(Error::from)
    }

    /// Mark one of `user_id`'s notifications as read.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to one of `user_id`'s
    ///   notifications,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn mark_read(&mut self, user_id: UserId, id: NotificationId) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        let changed = connection.execute(
            "UPDATE notification SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Mark all of `user_id`'s notifications as read.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn mark_all_read(&mut self, user_id: UserId) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        connection.execute(
            "UPDATE notification SET is_read = 1 WHERE user_id = ?1",
            params![user_id],
        )?;

        Ok(())
    }
}

/// Create the notification table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub(crate) fn create_notification_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS notification (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                transaction_id INTEGER,
                kind TEXT NOT NULL,
                message TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                due_date TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Notification].
fn map_notification_row(row: &Row) -> Result<Notification, rusqlite::Error> {
    let raw_kind: String = row.get(3)?;
    let kind = match raw_kind.as_str() {
        "upcoming" => NotificationKind::Upcoming,
        "missed" => NotificationKind::Missed,
        "budget_warning" => NotificationKind::BudgetWarning,
        "budget_exceeded" => NotificationKind::BudgetExceeded,
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown notification kind {other:?}").into(),
            ));
        }
    };

    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        transaction_id: row.get(2)?,
        kind,
        message: row.get(4)?,
        is_read: row.get(5)?,
        due_date: row.get(6)?,
        created_at: row.get(7)?,
    })
}
