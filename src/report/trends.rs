//! Aggregates transactions into monthly buckets and derives summary and
//! trend figures from them.

use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use crate::{
    Error,
    models::TransactionType,
    stores::{SortOrder, TransactionFilter, TransactionStore},
};

/// One calendar month's aggregated totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyBucket {
    /// The summed income amounts for the month.
    pub income: f64,
    /// The summed expense amounts for the month.
    pub expenses: f64,
    /// Expense totals per category label.
    pub categories: BTreeMap<String, f64>,
    /// Expense totals per tag.
    pub tags: BTreeMap<String, f64>,
}

/// Totals and averages across every bucket in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    /// The summed income across all buckets.
    pub total_income: f64,
    /// The summed expenses across all buckets.
    pub total_expenses: f64,
    /// Income minus expenses.
    pub net_savings: f64,
    /// Total income divided by the number of buckets; zero when there are
    /// no buckets.
    pub average_monthly_income: f64,
    /// Total expenses divided by the number of buckets; zero when there are
    /// no buckets.
    pub average_monthly_expenses: f64,
    /// The number of months that had any matching transactions.
    pub months_analyzed: usize,
}

/// The month-over-month percentage growth for one month against the
/// previous existing bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPoint {
    /// The month the growth figure is for, as "YYYY-MM".
    pub month: String,
    /// The percentage growth against the previous bucket. `None` when the
    /// previous bucket's total was zero, where a percentage is undefined.
    pub growth: Option<f64>,
}

/// Month-over-month growth series for income and expenses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSeries {
    /// Income growth per month, comparing consecutive existing buckets.
    pub income_growth: Vec<GrowthPoint>,
    /// Expense growth per month, comparing consecutive existing buckets.
    pub expense_growth: Vec<GrowthPoint>,
}

/// The result of a trend analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    /// The monthly buckets, keyed by "YYYY-MM" in chronological order.
    pub monthly_data: BTreeMap<String, MonthlyBucket>,
    /// Totals and averages across the buckets.
    pub summary: TrendSummary,
    /// Month-over-month growth series.
    pub trends: TrendSeries,
}

/// Aggregate the transactions matching `filter` into monthly buckets and
/// derive the summary and growth series.
///
/// The caller scopes the filter (owner, optional date range, category, and
/// tags); the sort order is forced to ascending by date so buckets fill
/// chronologically.
///
/// # Errors
/// Returns a validation error if the filter is malformed, or propagates
/// store failures as [Error::SqlError].
pub fn generate_trends<T>(filter: TransactionFilter, store: &T) -> Result<TrendReport, Error>
where
    T: TransactionStore,
{
    let filter = filter.sorted(SortOrder::Ascending);
    let transactions = store.get_filtered(&filter)?;

    let mut monthly_data: BTreeMap<String, MonthlyBucket> = BTreeMap::new();
    for transaction in &transactions {
        let bucket = monthly_data.entry(month_key(transaction.date)).or_default();

        match transaction.transaction_type {
            TransactionType::Income => bucket.income += transaction.amount,
            TransactionType::Expense => {
                bucket.expenses += transaction.amount;

                *bucket
                    .categories
                    .entry(transaction.category.clone())
                    .or_insert(0.0) += transaction.amount;

                for tag in &transaction.tags {
                    *bucket.tags.entry(tag.clone()).or_insert(0.0) += transaction.amount;
                }
            }
        }
    }

    Ok(TrendReport {
        summary: summarize(&monthly_data),
        trends: analyze_growth(&monthly_data),
        monthly_data,
    })
}

/// The bucket key for a date: "YYYY-MM", which sorts chronologically.
fn month_key(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), date.month() as u8)
}

fn summarize(monthly_data: &BTreeMap<String, MonthlyBucket>) -> TrendSummary {
    let total_income: f64 = monthly_data.values().map(|bucket| bucket.income).sum();
    let total_expenses: f64 = monthly_data.values().map(|bucket| bucket.expenses).sum();
    let months_analyzed = monthly_data.len();

    // With no buckets there is no meaningful monthly average; report zero
    // rather than dividing by zero.
    let (average_monthly_income, average_monthly_expenses) = if months_analyzed == 0 {
        (0.0, 0.0)
    } else {
        (
            total_income / months_analyzed as f64,
            total_expenses / months_analyzed as f64,
        )
    };

    TrendSummary {
        total_income,
        total_expenses,
        net_savings: total_income - total_expenses,
        average_monthly_income,
        average_monthly_expenses,
        months_analyzed,
    }
}

fn analyze_growth(monthly_data: &BTreeMap<String, MonthlyBucket>) -> TrendSeries {
    let mut trends = TrendSeries::default();

    for (previous, current) in monthly_data.iter().zip(monthly_data.iter().skip(1)) {
        trends.income_growth.push(growth_point(
            current.0,
            previous.1.income,
            current.1.income,
        ));
        trends.expense_growth.push(growth_point(
            current.0,
            previous.1.expenses,
            current.1.expenses,
        ));
    }

    trends
}

fn growth_point(month: &str, previous: f64, current: f64) -> GrowthPoint {
    let growth = if previous == 0.0 {
        None
    } else {
        Some((current - previous) * 100.0 / previous)
    };

    GrowthPoint {
        month: month.to_owned(),
        growth,
    }
}
