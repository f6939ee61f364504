//! Computes spend-to-date against a budget definition and classifies the
//! result. Pure read computation; the periodic monitor reuses the same
//! matching rule.

use serde::Serialize;

use crate::{
    Error, calendar,
    models::{Budget, BudgetScope, TransactionType},
    stores::{TransactionFilter, TransactionStore},
};

/// How a budget's spend compares to its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Spend is below the warning threshold.
    Safe,
    /// Spend has reached the warning threshold but not the ceiling.
    Warning,
    /// Spend has reached or passed the ceiling.
    Exceeded,
}

/// The result of evaluating a budget against the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetReport {
    /// The summed expense amounts matching the budget's scope.
    pub total_spent: f64,
    /// `total_spent` as a percentage of the ceiling.
    pub percentage_used: f64,
    /// The ceiling minus `total_spent`. Negative once the budget is
    /// exceeded.
    pub remaining: f64,
    /// The classification of `percentage_used` against the thresholds.
    pub status: BudgetStatus,
}

/// Compute the spend-to-date for `budget` and classify it.
///
/// For a monthly budget the matching window is the calendar month interval
/// [month start, next month start); for a category budget every expense ever
/// recorded under the category counts.
///
/// # Errors
/// Propagates store failures as [Error::SqlError].
pub fn evaluate_budget<T>(budget: &Budget, store: &T) -> Result<BudgetReport, Error>
where
    T: TransactionStore,
{
    let transactions = store.get_filtered(&spending_filter(budget))?;
    let total_spent = transactions.iter().map(|t| t.amount).sum();

    Ok(assess(budget, total_spent))
}

/// The filter selecting the expense transactions that count against
/// `budget`.
pub(crate) fn spending_filter(budget: &Budget) -> TransactionFilter {
    let filter = TransactionFilter::new(budget.user_id).with_type(TransactionType::Expense);

    match &budget.scope {
        BudgetScope::Monthly { month } => {
            let start = calendar::first_of_month(*month);
            let end = calendar::add_months(start, 1).previous_day().unwrap();

            filter.in_range(start..=end)
        }
        BudgetScope::Category { category } => filter.in_category(category),
    }
}

/// Classify `total_spent` against `budget`'s ceiling and warning threshold.
///
/// A budget with a zero or negative ceiling reports 100% used whenever any
/// spend exists and 0% otherwise, so callers never see NaN or infinity.
pub(crate) fn assess(budget: &Budget, total_spent: f64) -> BudgetReport {
    let percentage_used = if budget.amount > 0.0 {
        total_spent / budget.amount * 100.0
    } else if total_spent > 0.0 {
        100.0
    } else {
        0.0
    };

    let status = if percentage_used >= 100.0 {
        BudgetStatus::Exceeded
    } else if percentage_used >= budget.warning_threshold {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Safe
    };

    BudgetReport {
        total_spent,
        percentage_used,
        remaining: budget.amount - total_spent,
        status,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        models::{Budget, BudgetScope, Transaction, TransactionType},
        stores::{TransactionStore, sqlite::SQLiteTransactionStore},
    };

    use super::{BudgetStatus, assess, evaluate_budget};

    fn category_budget(amount: f64) -> Budget {
        Budget {
            id: 1,
            user_id: 7,
            scope: BudgetScope::category("Food"),
            amount,
            warning_threshold: 80.0,
            current_spending: 0.0,
        }
    }

    #[test]
    fn status_boundaries_at_default_threshold() {
        let budget = category_budget(100.0);

        assert_eq!(assess(&budget, 79.0).status, BudgetStatus::Safe);
        assert_eq!(assess(&budget, 80.0).status, BudgetStatus::Warning);
        assert_eq!(assess(&budget, 100.0).status, BudgetStatus::Exceeded);
    }

    #[test]
    fn remaining_is_exact_and_can_go_negative() {
        let budget = category_budget(250.0);

        let report = assess(&budget, 300.0);

        assert_eq!(report.remaining, -50.0);
        assert_eq!(report.percentage_used, 120.0);
        assert_eq!(report.status, BudgetStatus::Exceeded);
    }

    #[test]
    fn zero_ceiling_never_divides_by_zero() {
        let budget = category_budget(0.0);

        let spent = assess(&budget, 10.0);
        let unspent = assess(&budget, 0.0);

        assert_eq!(spent.percentage_used, 100.0);
        assert_eq!(spent.status, BudgetStatus::Exceeded);
        assert_eq!(unspent.percentage_used, 0.0);
        assert_eq!(unspent.status, BudgetStatus::Safe);
    }

    fn get_test_store() -> SQLiteTransactionStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SQLiteTransactionStore::new(Arc::new(Mutex::new(connection)))
    }

    #[test]
    fn monthly_budget_only_counts_expenses_inside_the_month() {
        let mut store = get_test_store();
        // In the month.
        store
            .create(Transaction::build(
                7,
                TransactionType::Expense,
                60.0,
                "Food",
                date!(2025 - 03 - 15),
            ))
            .unwrap();
        // Outside the month.
        store
            .create(Transaction::build(
                7,
                TransactionType::Expense,
                40.0,
                "Food",
                date!(2025 - 04 - 01),
            ))
            .unwrap();
        // Income never counts as spend.
        store
            .create(Transaction::build(
                7,
                TransactionType::Income,
                500.0,
                "Wages",
                date!(2025 - 03 - 20),
            ))
            .unwrap();

        let budget = Budget {
            id: 1,
            user_id: 7,
            scope: BudgetScope::monthly(date!(2025 - 03 - 01)),
            amount: 100.0,
            warning_threshold: 80.0,
            current_spending: 0.0,
        };

        let report = evaluate_budget(&budget, &store).unwrap();

        assert_eq!(report.total_spent, 60.0);
        assert_eq!(report.remaining, 40.0);
        assert_eq!(report.status, BudgetStatus::Safe);
    }

    #[test]
    fn category_budget_spans_all_time() {
        let mut store = get_test_store();
        for (amount, day) in [(30.0, date!(2023 - 01 - 01)), (60.0, date!(2025 - 06 - 01))] {
            store
                .create(Transaction::build(
                    7,
                    TransactionType::Expense,
                    amount,
                    "Food",
                    day,
                ))
                .unwrap();
        }
        store
            .create(Transaction::build(
                7,
                TransactionType::Expense,
                999.0,
                "Rent",
                date!(2025 - 06 - 01),
            ))
            .unwrap();

        let report = evaluate_budget(&category_budget(100.0), &store).unwrap();

        assert_eq!(report.total_spent, 90.0);
        assert_eq!(report.status, BudgetStatus::Warning);
    }
}
