//! The budget engines: spend-vs-ceiling evaluation, recommendations from
//! trailing spending history, and the periodic monitor that raises
//! warning/exceeded notifications.

mod evaluator;
mod monitor;
mod recommendation;

pub use evaluator::{BudgetReport, BudgetStatus, evaluate_budget};
pub use monitor::monitor_budgets;
pub use recommendation::{Recommendation, RecommendationKind, recommend_budgets};
