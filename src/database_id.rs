//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of a user. Users are managed by the surrounding API; the engines
/// only ever scope queries by this value.
pub type UserId = DatabaseId;

/// The ID of a transaction.
pub type TransactionId = DatabaseId;

/// The ID of a budget.
pub type BudgetId = DatabaseId;

/// The ID of a savings goal.
pub type GoalId = DatabaseId;

/// The ID of a notification.
pub type NotificationId = DatabaseId;
