//! Implements a SQLite backed transaction store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, ToSql, params, params_from_iter};
use time::{Date, OffsetDateTime};

use crate::{
    Error, TransactionId, UserId,
    models::{Frequency, Recurrence, Transaction, TransactionBuilder, TransactionType},
    stores::{SortOrder, TransactionFilter, TransactionStore},
};

/// Stores transactions in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] or [Error::EmptyCategory] if the builder
    ///   violates the transaction invariants,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        builder.validate()?;

        let tags = serde_json::to_string(&builder.tags)
            .map_err(|error| Error::JsonSerialization(error.to_string()))?;
        let recurrence = builder.recurrence.clone();

        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        connection.execute(
            "INSERT INTO \"transaction\" (user_id, type, amount, currency, category, \
             description, tags, date, is_recurring, recur_frequency, recur_start, recur_end, \
             recur_last_processed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                builder.user_id,
                builder.transaction_type.as_str(),
                builder.amount,
                builder.currency,
                builder.category,
                builder.description,
                tags,
                builder.date,
                recurrence.is_some(),
                recurrence.as_ref().map(|r| r.frequency.as_str()),
                recurrence.as_ref().map(|r| r.start_date),
                recurrence.as_ref().and_then(|r| r.end_date),
                recurrence.as_ref().and_then(|r| r.last_processed),
            ],
        )?;

        Ok(Transaction {
            id: connection.last_insert_rowid(),
            user_id: builder.user_id,
            transaction_type: builder.transaction_type,
            amount: builder.amount,
            currency: builder.currency,
            category: builder.category,
            description: builder.description,
            tags: builder.tags,
            date: builder.date,
            recurrence,
        })
    }

    /// Retrieve one of `user_id`'s transactions by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to one of `user_id`'s
    ///   transactions,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, user_id: UserId, id: TransactionId) -> Result<Transaction, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;

        let transaction = connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
            ))?
            .query_row(params![id, user_id], map_transaction_row)?;

        Ok(transaction)
    }

    /// Retrieve transactions matching `filter`.
    ///
    /// # Errors
    /// Returns a validation error if the filter is malformed (see
    /// [TransactionFilter::validate]), or [Error::SqlError] on SQL errors.
    fn get_filtered(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, Error> {
        filter.validate()?;

        let mut sql = format!("SELECT {COLUMNS} FROM \"transaction\" WHERE user_id = ?1");
        let mut sql_params: Vec<Box<dyn ToSql>> = vec![Box::new(filter.user_id)];

        if let Some(transaction_type) = filter.transaction_type {
            sql_params.push(Box::new(transaction_type.as_str()));
            sql.push_str(&format!(" AND type = ?{}", sql_params.len()));
        }

        if let Some(category) = &filter.category {
            sql_params.push(Box::new(category.clone()));
            sql.push_str(&format!(" AND category = ?{}", sql_params.len()));
        }

        if let Some(range) = &filter.date_range {
            sql_params.push(Box::new(*range.start()));
            sql.push_str(&format!(" AND date >= ?{}", sql_params.len()));
            sql_params.push(Box::new(*range.end()));
            sql.push_str(&format!(" AND date <= ?{}", sql_params.len()));
        }

        match filter.sort_date {
            // Sort by date, and then ID to keep transaction order stable
            // after updates.
            Some(SortOrder::Ascending) => sql.push_str(" ORDER BY date ASC, id ASC"),
            Some(SortOrder::Descending) => sql.push_str(" ORDER BY date DESC, id ASC"),
            None => {}
        }

        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        let mut transactions: Vec<Transaction> = connection
            .prepare(&sql)?
            .query_map(params_from_iter(sql_params), map_transaction_row)?
            .map(|result| result.map_err(Error::from))
            .collect::<Result<_, _>>()?;

        // Tags are stored as a JSON array, so any-of matching happens here
        // rather than in SQL.
        if !filter.tags.is_empty() {
            transactions
                .retain(|transaction| transaction.tags.iter().any(|t| filter.tags.contains(t)));
        }

        Ok(transactions)
    }

    /// Overwrite a transaction, matched by ID and owner.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if the transaction is not in the database,
    /// - [Error::InvalidAmount] or [Error::EmptyCategory] if the new values
    ///   violate the transaction invariants,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update(&mut self, transaction: &Transaction) -> Result<(), Error> {
        if transaction.amount <= 0.0 {
            return Err(Error::InvalidAmount(transaction.amount));
        }

        if transaction.category.trim().is_empty() {
            return Err(Error::EmptyCategory);
        }

        let tags = serde_json::to_string(&transaction.tags)
            .map_err(|error| Error::JsonSerialization(error.to_string()))?;
        let recurrence = transaction.recurrence.as_ref();

        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        let changed = connection.execute(
            "UPDATE \"transaction\"
             SET type = ?1, amount = ?2, currency = ?3, category = ?4, description = ?5, \
             tags = ?6, date = ?7, is_recurring = ?8, recur_frequency = ?9, recur_start = ?10, \
             recur_end = ?11, recur_last_processed = ?12
             WHERE id = ?13 AND user_id = ?14",
            params![
                transaction.transaction_type.as_str(),
                transaction.amount,
                transaction.currency,
                transaction.category,
                transaction.description,
                tags,
                transaction.date,
                recurrence.is_some(),
                recurrence.map(|r| r.frequency.as_str()),
                recurrence.map(|r| r.start_date),
                recurrence.and_then(|r| r.end_date),
                recurrence.and_then(|r| r.last_processed),
                transaction.id,
                transaction.user_id,
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Delete one of `user_id`'s transactions.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to one of `user_id`'s
    ///   transactions,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, user_id: UserId, id: TransactionId) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        let changed = connection.execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Retrieve every recurring template whose end date is absent or has not
    /// passed as of `as_of`, across all users.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn get_active_recurring(&self, as_of: Date) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;

        connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM \"transaction\" \
                 WHERE is_recurring = 1 AND (recur_end IS NULL OR recur_end >= ?1) \
                 ORDER BY id ASC"
            ))?
            .query_map(params![as_of], map_transaction_row)?
            .map(|result| result.map_err(Error::from))
            .collect()
    }

    /// Record that a recurring template materialized a transaction at
    /// `processed_at`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a recurring template,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn set_last_processed(
        &mut self,
        id: TransactionId,
        processed_at: OffsetDateTime,
    ) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        let changed = connection.execute(
            "UPDATE \"transaction\" SET recur_last_processed = ?1 \
             WHERE id = ?2 AND is_recurring = 1",
            params![processed_at, id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

const COLUMNS: &str = "id, user_id, type, amount, currency, category, description, tags, date, \
    is_recurring, recur_frequency, recur_start, recur_end, recur_last_processed";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub(crate) fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                type TEXT NOT NULL,
                amount REAL NOT NULL,
                currency TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                tags TEXT NOT NULL,
                date TEXT NOT NULL,
                is_recurring INTEGER NOT NULL DEFAULT 0,
                recur_frequency TEXT,
                recur_start TEXT,
                recur_end TEXT,
                recur_last_processed TEXT
                )",
        (),
    )?;

    // Composite index used by the budget and report engines, which always
    // scope by user and usually by date window.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date \
         ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Transaction].
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_type: String = row.get(2)?;
    let transaction_type = parse_transaction_type(2, &raw_type)?;

    let raw_tags: String = row.get(7)?;
    let tags: Vec<String> = serde_json::from_str(&raw_tags).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            error.to_string().into(),
        )
    })?;

    let is_recurring: bool = row.get(9)?;
    let recurrence = if is_recurring {
        let raw_frequency: String = row.get(10)?;

        Some(Recurrence {
            frequency: parse_frequency(10, &raw_frequency)?,
            start_date: row.get(11)?,
            end_date: row.get(12)?,
            last_processed: row.get(13)?,
        })
    } else {
        None
    };

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        transaction_type,
        amount: row.get(3)?,
        currency: row.get(4)?,
        category: row.get(5)?,
        description: row.get(6)?,
        tags,
        date: row.get(8)?,
        recurrence,
    })
}

fn parse_transaction_type(index: usize, value: &str) -> Result<TransactionType, rusqlite::Error> {
    match value {
        "income" => Ok(TransactionType::Income),
        "expense" => Ok(TransactionType::Expense),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            format!("unknown transaction type {other:?}").into(),
        )),
    }
}

fn parse_frequency(index: usize, value: &str) -> Result<Frequency, rusqlite::Error> {
    match value {
        "daily" => Ok(Frequency::Daily),
        "weekly" => Ok(Frequency::Weekly),
        "monthly" => Ok(Frequency::Monthly),
        "yearly" => Ok(Frequency::Yearly),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            format!("unknown frequency {other:?}").into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        Error,
        db::initialize,
        models::{Frequency, Recurrence, Transaction, TransactionType},
        stores::{SortOrder, TransactionFilter, TransactionStore},
    };

    use super::SQLiteTransactionStore;

    fn get_test_store() -> SQLiteTransactionStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SQLiteTransactionStore::new(Arc::new(Mutex::new(connection)))
    }

    #[test]
    fn create_round_trips_all_fields() {
        let mut store = get_test_store();
        let recurrence =
            Recurrence::new(Frequency::Monthly, date!(2025 - 01 - 15), None).unwrap();

        let created = store
            .create(
                Transaction::build(
                    7,
                    TransactionType::Expense,
                    42.5,
                    "Utilities",
                    date!(2025 - 01 - 15),
                )
                .currency("nzd")
                .description("Power bill")
                .tags(vec!["home".to_owned()])
                .recurrence(recurrence),
            )
            .unwrap();

        let fetched = store.get(7, created.id).unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.currency, "NZD");
        assert!(fetched.is_recurring());
    }

    #[test]
    fn create_rejects_invalid_builder() {
        let mut store = get_test_store();

        let result = store.create(Transaction::build(
            7,
            TransactionType::Expense,
            -1.0,
            "Food",
            date!(2025 - 01 - 15),
        ));

        assert_eq!(result, Err(Error::InvalidAmount(-1.0)));
    }

    #[test]
    fn get_is_scoped_by_owner() {
        let mut store = get_test_store();
        let created = store
            .create(Transaction::build(
                7,
                TransactionType::Expense,
                10.0,
                "Food",
                date!(2025 - 01 - 15),
            ))
            .unwrap();

        let result = store.get(8, created.id);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_filtered_applies_criteria_and_sorts() {
        let mut store = get_test_store();
        for (amount, category, day) in [(1.0, "Food", 3), (2.0, "Rent", 2), (3.0, "Food", 1)] {
            store
                .create(Transaction::build(
                    7,
                    TransactionType::Expense,
                    amount,
                    category,
                    date!(2025 - 01 - 01).replace_day(day).unwrap(),
                ))
                .unwrap();
        }
        store
            .create(Transaction::build(
                8,
                TransactionType::Expense,
                4.0,
                "Food",
                date!(2025 - 01 - 04),
            ))
            .unwrap();

        let filter = TransactionFilter::new(7)
            .in_category("Food")
            .sorted(SortOrder::Ascending);
        let transactions = store.get_filtered(&filter).unwrap();

        let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![3.0, 1.0]);
    }

    #[test]
    fn get_filtered_matches_any_tag() {
        let mut store = get_test_store();
        store
            .create(
                Transaction::build(7, TransactionType::Expense, 1.0, "Food", date!(2025 - 01 - 01))
                    .tags(vec!["goal".to_owned()]),
            )
            .unwrap();
        store
            .create(Transaction::build(
                7,
                TransactionType::Expense,
                2.0,
                "Food",
                date!(2025 - 01 - 02),
            ))
            .unwrap();

        let filter = TransactionFilter::new(7).with_any_tag(vec!["goal".to_owned()]);
        let transactions = store.get_filtered(&filter).unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, 1.0);
    }

    #[test]
    fn get_active_recurring_excludes_expired_templates() {
        let mut store = get_test_store();
        let expired = Recurrence::new(
            Frequency::Daily,
            date!(2024 - 01 - 01),
            Some(date!(2024 - 06 - 01)),
        )
        .unwrap();
        let open_ended = Recurrence::new(Frequency::Daily, date!(2024 - 01 - 01), None).unwrap();

        store
            .create(
                Transaction::build(7, TransactionType::Expense, 1.0, "Food", date!(2024 - 01 - 01))
                    .recurrence(expired),
            )
            .unwrap();
        let wanted = store
            .create(
                Transaction::build(7, TransactionType::Expense, 2.0, "Rent", date!(2024 - 01 - 01))
                    .recurrence(open_ended),
            )
            .unwrap();

        let active = store.get_active_recurring(date!(2025 - 01 - 01)).unwrap();

        assert_eq!(active, vec![wanted]);
    }

    #[test]
    fn set_last_processed_updates_template() {
        let mut store = get_test_store();
        let recurrence = Recurrence::new(Frequency::Daily, date!(2025 - 01 - 01), None).unwrap();
        let template = store
            .create(
                Transaction::build(7, TransactionType::Expense, 1.0, "Food", date!(2025 - 01 - 01))
                    .recurrence(recurrence),
            )
            .unwrap();
        let processed_at = datetime!(2025-01-02 08:00 UTC);

        store.set_last_processed(template.id, processed_at).unwrap();

        let fetched = store.get(7, template.id).unwrap();
        assert_eq!(
            fetched.recurrence.unwrap().last_processed,
            Some(processed_at)
        );
    }

    #[test]
    fn set_last_processed_fails_on_plain_transaction() {
        let mut store = get_test_store();
        let plain = store
            .create(Transaction::build(
                7,
                TransactionType::Expense,
                1.0,
                "Food",
                date!(2025 - 01 - 01),
            ))
            .unwrap();

        let result = store.set_last_processed(plain.id, datetime!(2025-01-02 08:00 UTC));

        assert_eq!(result, Err(Error::NotFound));
    }
}
