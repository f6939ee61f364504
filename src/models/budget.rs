//! The budget model: a spending ceiling scoped either to one calendar month
//! or to one category with an unbounded time window.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{BudgetId, Error, UserId, calendar};

/// The warning threshold applied when a budget does not specify one, as a
/// percentage of the budget ceiling.
pub const DEFAULT_WARNING_THRESHOLD: f64 = 80.0;

/// What a budget's ceiling applies to.
///
/// The scope carries its own required field, so a monthly budget without a
/// month or a category budget without a category cannot be constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BudgetScope {
    /// Bound to one calendar month.
    Monthly {
        /// Any date within the budgeted month; normalized to the first of
        /// the month on construction.
        month: Date,
    },
    /// Bound to one category label, across all time.
    Category {
        /// The category label the ceiling applies to.
        category: String,
    },
}

impl BudgetScope {
    /// A scope covering the calendar month containing `month`.
    pub fn monthly(month: Date) -> Self {
        BudgetScope::Monthly {
            month: calendar::first_of_month(month),
        }
    }

    /// A scope covering all spending in `category`.
    pub fn category(category: &str) -> Self {
        BudgetScope::Category {
            category: category.to_owned(),
        }
    }

    /// The category label, for category-scoped budgets.
    pub fn category_label(&self) -> Option<&str> {
        match self {
            BudgetScope::Category { category } => Some(category),
            BudgetScope::Monthly { .. } => None,
        }
    }

    /// A short human-readable label used in notification messages: the
    /// category name, or "monthly" for month-scoped budgets.
    pub(crate) fn display_label(&self) -> &str {
        match self {
            BudgetScope::Monthly { .. } => "monthly",
            BudgetScope::Category { category } => category,
        }
    }
}

/// A spending ceiling with a warning threshold and a cached spend total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The user that owns the budget.
    pub user_id: UserId,
    /// What the ceiling applies to.
    pub scope: BudgetScope,
    /// The spending ceiling.
    pub amount: f64,
    /// The percentage of `amount` at which a warning is raised.
    pub warning_threshold: f64,
    /// The spend total cached by the last budget monitor cycle. May lag the
    /// ledger; [crate::budget::evaluate_budget] recomputes from scratch.
    pub current_spending: f64,
}

impl Budget {
    /// Create a new budget.
    ///
    /// Shortcut for [BudgetBuilder] for discoverability.
    pub fn build(user_id: UserId, scope: BudgetScope, amount: f64) -> BudgetBuilder {
        BudgetBuilder {
            user_id,
            scope,
            amount,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
        }
    }

    /// The spend level at which this budget starts warning.
    pub fn warning_level(&self) -> f64 {
        self.amount * self.warning_threshold / 100.0
    }
}

/// A builder for creating [Budget] instances via a store.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetBuilder {
    /// The user that will own the budget.
    pub user_id: UserId,
    /// What the ceiling applies to.
    pub scope: BudgetScope,
    /// The spending ceiling. Must be positive.
    pub amount: f64,
    /// The warning threshold percentage. Defaults to
    /// [DEFAULT_WARNING_THRESHOLD].
    pub warning_threshold: f64,
}

impl BudgetBuilder {
    /// Override the default warning threshold.
    pub fn warning_threshold(mut self, percentage: f64) -> Self {
        self.warning_threshold = percentage;
        self
    }

    /// Check the builder against the budget invariants.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] for a non-positive ceiling,
    /// [Error::InvalidThreshold] for a threshold outside (0, 100], or
    /// [Error::EmptyCategory] for a blank category label.
    pub fn validate(&self) -> Result<(), Error> {
        if self.amount <= 0.0 {
            return Err(Error::InvalidAmount(self.amount));
        }

        if self.warning_threshold <= 0.0 || self.warning_threshold > 100.0 {
            return Err(Error::InvalidThreshold(self.warning_threshold));
        }

        if let BudgetScope::Category { category } = &self.scope
            && category.trim().is_empty()
        {
            return Err(Error::EmptyCategory);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::{Budget, BudgetScope, DEFAULT_WARNING_THRESHOLD};

    #[test]
    fn monthly_scope_normalizes_to_first_of_month() {
        let scope = BudgetScope::monthly(date!(2025 - 06 - 21));

        assert_eq!(
            scope,
            BudgetScope::Monthly {
                month: date!(2025 - 06 - 01)
            }
        );
    }

    #[test]
    fn builder_applies_default_threshold() {
        let builder = Budget::build(1, BudgetScope::category("Food"), 500.0);

        assert_eq!(builder.warning_threshold, DEFAULT_WARNING_THRESHOLD);
        assert!(builder.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        for threshold in [0.0, -5.0, 120.0] {
            let builder = Budget::build(1, BudgetScope::category("Food"), 500.0)
                .warning_threshold(threshold);

            assert_eq!(builder.validate(), Err(Error::InvalidThreshold(threshold)));
        }
    }

    #[test]
    fn validate_rejects_blank_category() {
        let builder = Budget::build(1, BudgetScope::category(""), 500.0);

        assert_eq!(builder.validate(), Err(Error::EmptyCategory));
    }
}
