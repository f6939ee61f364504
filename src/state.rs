//! Implements a struct that holds the stores shared by the request path and
//! the periodic jobs.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::stores::{
    BudgetStore, GoalStore, NotificationStore, TransactionStore,
    sqlite::{SQLiteBudgetStore, SQLiteGoalStore, SQLiteNotificationStore, SQLiteTransactionStore},
};

/// The state of the application: one store handle per collection.
///
/// The stores are cheap to clone, so the routing layer and the periodic jobs
/// each hold their own copy.
#[derive(Debug, Clone)]
pub struct AppState<T, B, G, N>
where
    T: TransactionStore + Send + Sync,
    B: BudgetStore + Send + Sync,
    G: GoalStore + Send + Sync,
    N: NotificationStore + Send + Sync,
{
    /// The store for managing user [transactions](crate::models::Transaction).
    pub transaction_store: T,
    /// The store for managing user [budgets](crate::models::Budget).
    pub budget_store: B,
    /// The store for managing user [goals](crate::models::Goal).
    pub goal_store: G,
    /// The store for managing user [notifications](crate::models::Notification).
    pub notification_store: N,
}

impl<T, B, G, N> AppState<T, B, G, N>
where
    T: TransactionStore + Send + Sync,
    B: BudgetStore + Send + Sync,
    G: GoalStore + Send + Sync,
    N: NotificationStore + Send + Sync,
{
    /// Create a new [AppState] from the given stores.
    pub fn new(transaction_store: T, budget_store: B, goal_store: G, notification_store: N) -> Self {
        Self {
            transaction_store,
            budget_store,
            goal_store,
            notification_store,
        }
    }
}

/// An [AppState] where every store is backed by the same SQLite database.
pub type SQLiteAppState =
    AppState<SQLiteTransactionStore, SQLiteBudgetStore, SQLiteGoalStore, SQLiteNotificationStore>;

impl SQLiteAppState {
    /// Create the state for a shared SQLite `connection`.
    pub fn from_connection(connection: Arc<Mutex<Connection>>) -> Self {
        Self::new(
            SQLiteTransactionStore::new(connection.clone()),
            SQLiteBudgetStore::new(connection.clone()),
            SQLiteGoalStore::new(connection.clone()),
            SQLiteNotificationStore::new(connection),
        )
    }
}
