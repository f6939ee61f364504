//! Proposes budget adjustments from the trailing three months of category
//! spending.

use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use crate::{
    Error, UserId, calendar,
    models::TransactionType,
    stores::{BudgetStore, TransactionFilter, TransactionStore},
};

/// The number of trailing months analyzed. Also the averaging divisor: a
/// category active in only one of the three months still averages over all
/// three, which keeps recommendations conservative for sparse spending.
const ANALYSIS_MONTHS: i32 = 3;

/// The share of average spending below the ceiling that counts as
/// significant underspending.
const UNDERSPEND_RATIO: f64 = 0.7;

/// Headroom applied on top of average spending for increase/new
/// recommendations.
const INCREASE_HEADROOM: f64 = 1.1;

/// Headroom applied on top of average spending for decrease
/// recommendations.
const DECREASE_HEADROOM: f64 = 1.2;

/// The direction of a budget recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    /// Raise an existing budget that spending consistently exceeds.
    Increase,
    /// Lower an existing budget that spending sits well below.
    Decrease,
    /// Create a budget for a category that has spending but no ceiling.
    New,
}

/// A proposed budget adjustment for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// The category the proposal applies to.
    pub category: String,
    /// The direction of the proposal.
    pub kind: RecommendationKind,
    /// The existing ceiling, absent for [RecommendationKind::New].
    pub current_budget: Option<f64>,
    /// The proposed ceiling, in whole currency units.
    pub recommended_budget: f64,
    /// Why the proposal was made.
    pub reason: String,
}

/// Analyze `user_id`'s trailing three months of expenses and propose budget
/// adjustments.
///
/// Spending is grouped per category into calendar-month totals and averaged
/// over the full window. Each category is cross-referenced against the
/// user's **category** budgets only; monthly budgets never match. Returns
/// proposals ordered by category name, and an empty list when there are no
/// transactions.
///
/// # Errors
/// Propagates store failures as [Error::SqlError].
pub fn recommend_budgets<T, B>(
    user_id: UserId,
    transaction_store: &T,
    budget_store: &B,
    now: Date,
) -> Result<Vec<Recommendation>, Error>
where
    T: TransactionStore,
    B: BudgetStore,
{
    let window_start = calendar::add_months(now, -ANALYSIS_MONTHS);
    let filter = TransactionFilter::new(user_id)
        .with_type(TransactionType::Expense)
        .in_range(window_start..=now);
    let transactions = transaction_store.get_filtered(&filter)?;

    // Per-category totals per calendar month within the window.
    let mut category_spending: BTreeMap<String, BTreeMap<Date, f64>> = BTreeMap::new();
    for transaction in &transactions {
        let month = calendar::first_of_month(transaction.date);
        *category_spending
            .entry(transaction.category.clone())
            .or_default()
            .entry(month)
            .or_insert(0.0) += transaction.amount;
    }

    let budgets = budget_store.get_for_user(user_id)?;

    let mut recommendations = Vec::new();
    for (category, monthly_totals) in category_spending {
        let average_spending = monthly_totals.values().sum::<f64>() / ANALYSIS_MONTHS as f64;

        let current = budgets
            .iter()
            .find(|budget| budget.scope.category_label() == Some(category.as_str()));

        let recommendation = match current {
            Some(budget) if budget.amount < average_spending => {
                let overage = ((average_spending / budget.amount - 1.0) * 100.0).round() as i64;

                Recommendation {
                    category,
                    kind: RecommendationKind::Increase,
                    current_budget: Some(budget.amount),
                    recommended_budget: recommended_amount(average_spending, INCREASE_HEADROOM),
                    reason: format!("Consistently exceeding budget by {overage}%"),
                }
            }
            Some(budget) if average_spending < budget.amount * UNDERSPEND_RATIO => Recommendation {
                category,
                kind: RecommendationKind::Decrease,
                current_budget: Some(budget.amount),
                recommended_budget: recommended_amount(average_spending, DECREASE_HEADROOM),
                reason: "Significant underspending, budget could be optimized".to_owned(),
            },
            Some(_) => continue,
            None => Recommendation {
                category,
                kind: RecommendationKind::New,
                current_budget: None,
                recommended_budget: recommended_amount(average_spending, INCREASE_HEADROOM),
                reason: "No budget set for active spending category".to_owned(),
            },
        };

        recommendations.push(recommendation);
    }

    Ok(recommendations)
}

/// Scale `average` by `factor` and take the ceiling in whole currency units.
///
/// The product is rounded to cents first, since float noise must not bump a
/// recommendation up a whole unit (`350.0 * 1.1` is `385.00000000000006`).
fn recommended_amount(average: f64, factor: f64) -> f64 {
    ((average * factor * 100.0).round() / 100.0).ceil()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        db::initialize,
        models::{Budget, BudgetScope, Transaction, TransactionType},
        stores::{
            BudgetStore, TransactionStore,
            sqlite::{SQLiteBudgetStore, SQLiteTransactionStore},
        },
    };

    use super::{Recommendation, RecommendationKind, recommend_budgets};

    const NOW: Date = date!(2023 - 06 - 15);

    fn get_test_stores() -> (SQLiteTransactionStore, SQLiteBudgetStore) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        (
            SQLiteTransactionStore::new(connection.clone()),
            SQLiteBudgetStore::new(connection),
        )
    }

    fn spend(store: &mut SQLiteTransactionStore, category: &str, amount: f64, date: Date) {
        store
            .create(Transaction::build(
                7,
                TransactionType::Expense,
                amount,
                category,
                date,
            ))
            .unwrap();
    }

    #[test]
    fn proposes_increase_decrease_and_new() {
        let (mut transactions, mut budgets) = get_test_stores();

        // Food: three monthly totals {400, 350, 300}, average 350.
        spend(&mut transactions, "Food", 400.0, date!(2023 - 03 - 20));
        spend(&mut transactions, "Food", 350.0, date!(2023 - 04 - 15));
        spend(&mut transactions, "Food", 300.0, date!(2023 - 05 - 10));
        // Entertainment: {120, 100} over the window, average 73.33.
        spend(&mut transactions, "Entertainment", 120.0, date!(2023 - 04 - 10));
        spend(&mut transactions, "Entertainment", 100.0, date!(2023 - 05 - 05));
        // Transportation: {220, 180, 200}, average 200, no budget.
        spend(&mut transactions, "Transportation", 220.0, date!(2023 - 03 - 30));
        spend(&mut transactions, "Transportation", 180.0, date!(2023 - 04 - 25));
        spend(&mut transactions, "Transportation", 200.0, date!(2023 - 05 - 20));

        budgets
            .create(Budget::build(7, BudgetScope::category("Food"), 250.0))
            .unwrap();
        budgets
            .create(Budget::build(7, BudgetScope::category("Entertainment"), 200.0))
            .unwrap();

        let recommendations = recommend_budgets(7, &transactions, &budgets, NOW).unwrap();

        assert_eq!(
            recommendations,
            vec![
                Recommendation {
                    category: "Entertainment".to_owned(),
                    kind: RecommendationKind::Decrease,
                    current_budget: Some(200.0),
                    recommended_budget: 88.0,
                    reason: "Significant underspending, budget could be optimized".to_owned(),
                },
                Recommendation {
                    category: "Food".to_owned(),
                    kind: RecommendationKind::Increase,
                    current_budget: Some(250.0),
                    recommended_budget: 385.0,
                    reason: "Consistently exceeding budget by 40%".to_owned(),
                },
                Recommendation {
                    category: "Transportation".to_owned(),
                    kind: RecommendationKind::New,
                    current_budget: None,
                    recommended_budget: 220.0,
                    reason: "No budget set for active spending category".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn monthly_budgets_are_never_matched() {
        let (mut transactions, mut budgets) = get_test_stores();
        spend(&mut transactions, "Food", 300.0, date!(2023 - 05 - 10));
        budgets
            .create(Budget::build(
                7,
                BudgetScope::monthly(date!(2023 - 05 - 01)),
                1000.0,
            ))
            .unwrap();

        let recommendations = recommend_budgets(7, &transactions, &budgets, NOW).unwrap();

        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].kind, RecommendationKind::New);
    }

    #[test]
    fn sits_quiet_when_spending_matches_budget() {
        let (mut transactions, mut budgets) = get_test_stores();
        // Average 100 against a ceiling of 120: neither over nor under 70%.
        spend(&mut transactions, "Food", 300.0, date!(2023 - 05 - 10));
        budgets
            .create(Budget::build(7, BudgetScope::category("Food"), 120.0))
            .unwrap();

        let recommendations = recommend_budgets(7, &transactions, &budgets, NOW).unwrap();

        assert!(recommendations.is_empty());
    }

    #[test]
    fn no_transactions_means_no_recommendations() {
        let (transactions, mut budgets) = get_test_stores();
        budgets
            .create(Budget::build(7, BudgetScope::category("Food"), 250.0))
            .unwrap();

        let recommendations = recommend_budgets(7, &transactions, &budgets, NOW).unwrap();

        assert!(recommendations.is_empty());
    }

    #[test]
    fn income_is_ignored() {
        let (mut transactions, budgets) = get_test_stores();
        transactions
            .create(Transaction::build(
                7,
                TransactionType::Income,
                5000.0,
                "Wages",
                date!(2023 - 05 - 01),
            ))
            .unwrap();

        let recommendations = recommend_budgets(7, &transactions, &budgets, NOW).unwrap();

        assert!(recommendations.is_empty());
    }
}
