//! Defines the narrow interfaces the engines use to talk to persistence,
//! and the SQLite implementations of those interfaces.

mod budget;
mod goal;
mod notification;
pub mod sqlite;
mod transaction;

pub use budget::BudgetStore;
pub use goal::GoalStore;
pub use notification::NotificationStore;
pub use transaction::{SortOrder, TransactionFilter, TransactionStore};
