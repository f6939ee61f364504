//! Records goal contributions as ledger transactions and keeps the goal's
//! saved amount and status in step.

use time::Date;

use crate::{
    Error, GoalId, UserId,
    models::{Goal, Transaction, TransactionType},
    stores::{GoalStore, TransactionStore},
};

/// The category used for the ledger entries goal contributions generate.
const SAVINGS_CATEGORY: &str = "Savings";

/// Record a contribution (positive `amount`) or withdrawal (negative
/// `amount`) against one of `user_id`'s goals.
///
/// A matching ledger entry is created first: an expense for contributions
/// (money moved into savings), an income for withdrawals (money moved back
/// out), always with a positive amount. The goal's saved amount then absorbs
/// the signed `amount`, clamped at zero, with the status transitions
/// described on [Goal::apply_contribution].
///
/// # Errors
/// Returns [Error::InvalidAmount] for a zero `amount`, [Error::NotFound] if
/// the goal does not exist for `user_id`, or propagates store failures.
pub fn record_contribution<G, T>(
    goal_store: &mut G,
    transaction_store: &mut T,
    user_id: UserId,
    goal_id: GoalId,
    amount: f64,
    description: Option<&str>,
    now: Date,
) -> Result<Goal, Error>
where
    G: GoalStore,
    T: TransactionStore,
{
    if amount == 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    let mut goal = goal_store.get(user_id, goal_id)?;

    let (transaction_type, default_description) = if amount > 0.0 {
        (
            TransactionType::Expense,
            format!("Contribution to {}", goal.title),
        )
    } else {
        (
            TransactionType::Income,
            format!("Withdrawal from {}", goal.title),
        )
    };

    transaction_store.create(
        Transaction::build(user_id, transaction_type, amount.abs(), SAVINGS_CATEGORY, now)
            .currency(&goal.currency)
            .description(description.unwrap_or(&default_description))
            .tags(vec!["goal".to_owned(), goal.category.clone()]),
    )?;

    goal.apply_contribution(amount);
    goal_store.update(&goal)?;

    Ok(goal)
}

/// Allocate a share of an income transaction to each of its owner's active
/// auto-allocating goals.
///
/// Non-income transactions are ignored. Each goal receives
/// `income.amount * allocation_percentage / 100` through its own "Savings"
/// expense entry; zero allocations are skipped. A failure on one goal is
/// logged and does not abort the remaining set.
///
/// # Errors
/// Returns an error only if the goal list itself cannot be fetched.
pub fn allocate_income<G, T>(
    goal_store: &mut G,
    transaction_store: &mut T,
    income: &Transaction,
    now: Date,
) -> Result<(), Error>
where
    G: GoalStore,
    T: TransactionStore,
{
    if income.transaction_type != TransactionType::Income {
        return Ok(());
    }

    let goals = goal_store.get_auto_allocating(income.user_id)?;

    for mut goal in goals {
        let allocation = income.amount * goal.allocation_percentage / 100.0;
        if allocation <= 0.0 {
            continue;
        }

        if let Err(error) =
            allocate_to_goal(&mut goal, allocation, goal_store, transaction_store, now)
        {
            tracing::error!("could not allocate income to goal {}: {}", goal.id, error);
        }
    }

    Ok(())
}

fn allocate_to_goal<G, T>(
    goal: &mut Goal,
    allocation: f64,
    goal_store: &mut G,
    transaction_store: &mut T,
    now: Date,
) -> Result<(), Error>
where
    G: GoalStore,
    T: TransactionStore,
{
    transaction_store.create(
        Transaction::build(
            goal.user_id,
            TransactionType::Expense,
            allocation,
            SAVINGS_CATEGORY,
            now,
        )
        .currency(&goal.currency)
        .description(&format!(
            "Automatic allocation to {} ({}% of income)",
            goal.title, goal.allocation_percentage
        ))
        .tags(vec![
            "goal".to_owned(),
            "automatic".to_owned(),
            goal.category.clone(),
        ]),
    )?;

    goal.apply_contribution(allocation);
    goal_store.update(goal)
}
