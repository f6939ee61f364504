//! The savings goal model: a target amount accumulated through
//! contributions, optionally fed automatically from income transactions.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, GoalId, UserId};

/// The lifecycle state of a savings goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    /// Still being saved towards.
    Active,
    /// The target amount has been reached.
    Completed,
    /// Abandoned by the user.
    Cancelled,
}

impl GoalStatus {
    /// The lowercase name used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Cancelled => "cancelled",
        }
    }
}

/// A savings goal.
///
/// `current_amount` never goes below zero, and `status` flips between
/// [GoalStatus::Active] and [GoalStatus::Completed] as contributions and
/// withdrawals move `current_amount` across the target. Apply changes through
/// [Goal::apply_contribution] so those invariants hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// The ID of the goal.
    pub id: GoalId,
    /// The user that owns the goal.
    pub user_id: UserId,
    /// A short name for the goal, e.g. "Emergency fund".
    pub title: String,
    /// The amount being saved towards. Always positive.
    pub target_amount: f64,
    /// The amount saved so far. Never negative.
    pub current_amount: f64,
    /// The ISO 4217 currency code the amounts are denominated in.
    pub currency: String,
    /// When the user wants the goal reached.
    pub target_date: Date,
    /// The category used for the ledger entries this goal generates.
    pub category: String,
    /// The lifecycle state.
    pub status: GoalStatus,
    /// Whether a share of each income transaction is allocated to this goal.
    pub auto_allocate: bool,
    /// The share of each income transaction allocated when `auto_allocate`
    /// is set, as a percentage in [0, 100].
    pub allocation_percentage: f64,
}

impl Goal {
    /// Create a new goal.
    ///
    /// Shortcut for [GoalBuilder] for discoverability.
    pub fn build(
        user_id: UserId,
        title: &str,
        target_amount: f64,
        target_date: Date,
        category: &str,
    ) -> GoalBuilder {
        GoalBuilder {
            user_id,
            title: title.to_owned(),
            target_amount,
            currency: "USD".to_owned(),
            target_date,
            category: category.to_owned(),
            auto_allocate: false,
            allocation_percentage: 0.0,
        }
    }

    /// Apply a contribution (positive) or withdrawal (negative) to the goal.
    ///
    /// The current amount is clamped at zero. Reaching the target marks the
    /// goal [GoalStatus::Completed]; a withdrawal that drops a completed goal
    /// back below the target reverts it to [GoalStatus::Active].
    pub fn apply_contribution(&mut self, amount: f64) {
        self.current_amount = (self.current_amount + amount).max(0.0);

        if self.current_amount >= self.target_amount {
            self.status = GoalStatus::Completed;
        } else if self.status == GoalStatus::Completed {
            self.status = GoalStatus::Active;
        }
    }

    /// How far along the goal is, as a percentage capped at 100. A goal with
    /// a zero target reports zero.
    pub fn progress_percentage(&self) -> f64 {
        if self.target_amount == 0.0 {
            return 0.0;
        }

        (self.current_amount / self.target_amount * 100.0).min(100.0)
    }

    /// The amount still needed to reach the target, floored at zero.
    pub fn remaining_amount(&self) -> f64 {
        (self.target_amount - self.current_amount).max(0.0)
    }
}

/// A builder for creating [Goal] instances via a store.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalBuilder {
    /// The user that will own the goal.
    pub user_id: UserId,
    /// A short name for the goal.
    pub title: String,
    /// The amount being saved towards. Must be positive.
    pub target_amount: f64,
    /// The currency code. Defaults to "USD".
    pub currency: String,
    /// When the user wants the goal reached.
    pub target_date: Date,
    /// The category used for the ledger entries this goal generates.
    pub category: String,
    /// Whether income is automatically allocated. Defaults to off.
    pub auto_allocate: bool,
    /// The allocation share percentage. Defaults to zero.
    pub allocation_percentage: f64,
}

impl GoalBuilder {
    /// Set the currency code for the goal.
    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_uppercase();
        self
    }

    /// Allocate `percentage` of each income transaction to this goal.
    pub fn auto_allocate(mut self, percentage: f64) -> Self {
        self.auto_allocate = true;
        self.allocation_percentage = percentage;
        self
    }

    /// Check the builder against the goal invariants.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] for a non-positive target,
    /// [Error::InvalidAllocation] for an allocation percentage outside
    /// [0, 100], or [Error::EmptyCategory] for a blank category label.
    pub fn validate(&self) -> Result<(), Error> {
        if self.target_amount <= 0.0 {
            return Err(Error::InvalidAmount(self.target_amount));
        }

        if !(0.0..=100.0).contains(&self.allocation_percentage) {
            return Err(Error::InvalidAllocation(self.allocation_percentage));
        }

        if self.category.trim().is_empty() {
            return Err(Error::EmptyCategory);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::{Goal, GoalStatus};

    fn test_goal(current_amount: f64) -> Goal {
        Goal {
            id: 1,
            user_id: 1,
            title: "Holiday".to_owned(),
            target_amount: 2000.0,
            current_amount,
            currency: "USD".to_owned(),
            target_date: date!(2026 - 01 - 01),
            category: "Travel".to_owned(),
            status: GoalStatus::Active,
            auto_allocate: false,
            allocation_percentage: 0.0,
        }
    }

    #[test]
    fn withdrawal_clamps_current_amount_at_zero() {
        let mut goal = test_goal(500.0);

        goal.apply_contribution(-1000.0);

        assert_eq!(goal.current_amount, 0.0);
    }

    #[test]
    fn reaching_target_completes_goal() {
        let mut goal = test_goal(1900.0);

        goal.apply_contribution(150.0);

        assert_eq!(goal.status, GoalStatus::Completed);
    }

    #[test]
    fn withdrawal_below_target_reverts_to_active() {
        let mut goal = test_goal(1900.0);
        goal.apply_contribution(150.0);

        goal.apply_contribution(-500.0);

        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(goal.current_amount, 1550.0);
    }

    #[test]
    fn progress_caps_at_one_hundred_and_handles_zero_target() {
        let mut goal = test_goal(3000.0);
        assert_eq!(goal.progress_percentage(), 100.0);

        goal.target_amount = 0.0;
        assert_eq!(goal.progress_percentage(), 0.0);
    }

    #[test]
    fn builder_rejects_allocation_out_of_range() {
        let builder = Goal::build(1, "Holiday", 2000.0, date!(2026 - 01 - 01), "Travel")
            .auto_allocate(150.0);

        assert_eq!(builder.validate(), Err(Error::InvalidAllocation(150.0)));
    }
}
