//! The periodic budget monitor: recomputes every budget's spend and raises
//! warning/exceeded notifications on threshold crossings.

use crate::{
    Error,
    budget::evaluator::{BudgetStatus, assess, spending_filter},
    models::{Budget, NotificationBuilder, NotificationKind},
    stores::{BudgetStore, NotificationStore, TransactionStore},
};

/// Recompute the spend of every budget in the store, across all users, and
/// raise notifications for budgets that crossed their warning threshold or
/// ceiling since the last cycle.
///
/// Both alert kinds fire only on the transition: the previously cached
/// `current_spending` must have been below the relevant level. The cache is
/// refreshed for every budget regardless of whether an alert fired, so a
/// budget sitting inside the warning band stays quiet on later cycles.
///
/// A failure on one budget is logged and does not abort the remaining set.
///
/// # Errors
/// Returns an error only if the budget list itself cannot be fetched.
pub fn monitor_budgets<T, B, N>(
    transaction_store: &T,
    budget_store: &mut B,
    notification_store: &mut N,
) -> Result<(), Error>
where
    T: TransactionStore,
    B: BudgetStore,
    N: NotificationStore,
{
    let budgets = budget_store.get_all()?;
    tracing::debug!("monitoring {} budgets", budgets.len());

    for budget in budgets {
        if let Err(error) =
            monitor_budget(&budget, transaction_store, budget_store, notification_store)
        {
            tracing::error!("could not monitor budget {}: {}", budget.id, error);
        }
    }

    Ok(())
}

fn monitor_budget<T, B, N>(
    budget: &Budget,
    transaction_store: &T,
    budget_store: &mut B,
    notification_store: &mut N,
) -> Result<(), Error>
where
    T: TransactionStore,
    B: BudgetStore,
    N: NotificationStore,
{
    let transactions = transaction_store.get_filtered(&spending_filter(budget))?;
    let total_spent: f64 = transactions.iter().map(|t| t.amount).sum();

    let report = assess(budget, total_spent);
    let label = budget.scope.display_label();

    match report.status {
        BudgetStatus::Exceeded if budget.current_spending < budget.amount => {
            notification_store.create(NotificationBuilder::new(
                budget.user_id,
                NotificationKind::BudgetExceeded,
                &format!(
                    "Budget exceeded! You've spent ${total_spent:.2} of your ${:.2} {label} budget.",
                    budget.amount
                ),
            ))?;
        }
        BudgetStatus::Warning if budget.current_spending < budget.warning_level() => {
            notification_store.create(NotificationBuilder::new(
                budget.user_id,
                NotificationKind::BudgetWarning,
                &format!(
                    "You've used {:.1}% of your {label} budget (${total_spent:.2} of ${:.2}).",
                    report.percentage_used, budget.amount
                ),
            ))?;
        }
        _ => {}
    }

    budget_store.set_current_spending(budget.id, total_spent)
}
