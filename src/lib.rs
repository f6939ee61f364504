//! Bursar is the analytics and scheduling core of a personal-finance API:
//! budget evaluation, budget recommendations, recurring-transaction
//! processing, budget monitoring, savings goals, and spending trends.
//!
//! This library sits below an HTTP routing/controller layer (not included
//! here). The routing layer authenticates users and calls the operations this
//! crate exposes; the engines talk to persistence exclusively through the
//! store traits in [stores], for which SQLite implementations are provided.
//! The `worker` binary drives the two periodic jobs in [jobs].

#![warn(missing_docs)]

use time::Date;

pub mod budget;
mod calendar;
mod database_id;
pub mod db;
pub mod goal;
pub mod jobs;
pub mod models;
pub mod recurring;
pub mod report;
mod state;
pub mod stores;

pub use database_id::{BudgetId, DatabaseId, GoalId, NotificationId, TransactionId, UserId};
pub use state::{AppState, SQLiteAppState};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A zero or negative amount was used where a positive amount is
    /// required (transaction amounts, budget ceilings, goal targets).
    #[error("amount must be positive, got {0}")]
    InvalidAmount(f64),

    /// An empty string was used as a category label.
    #[error("category cannot be empty")]
    EmptyCategory,

    /// A budget warning threshold outside the range (0, 100].
    #[error("warning threshold must be a percentage in (0, 100], got {0}")]
    InvalidThreshold(f64),

    /// A goal allocation percentage outside the range [0, 100].
    #[error("allocation percentage must be in [0, 100], got {0}")]
    InvalidAllocation(f64),

    /// A recurrence end date that is not after its start date.
    #[error("recurrence end date {end} is not after the start date {start}")]
    EndBeforeStart {
        /// The first date the recurring transaction applies.
        start: Date,
        /// The offending end date.
        end: Date,
    },

    /// A filter date range whose start is after its end.
    #[error("date range starts at {start} which is after its end {end}")]
    InvalidDateRange {
        /// The start of the range.
        start: Date,
        /// The end of the range.
        end: Date,
    },

    /// An empty string was used as a filter tag.
    #[error("filter tags cannot be empty")]
    EmptyTag,

    /// The requested resource does not exist for the given owner.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An error occurred while serializing a value as JSON for storage.
    #[error("could not serialize as JSON: {0}")]
    JsonSerialization(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
