//! The domain models: transactions, budgets, savings goals, and
//! notifications. All models are exclusively scoped to one owning user.

mod budget;
mod goal;
mod notification;
mod transaction;

pub use budget::{Budget, BudgetBuilder, BudgetScope, DEFAULT_WARNING_THRESHOLD};
pub use goal::{Goal, GoalBuilder, GoalStatus};
pub use notification::{Notification, NotificationBuilder, NotificationKind};
pub use transaction::{Frequency, Recurrence, Transaction, TransactionBuilder, TransactionType};
