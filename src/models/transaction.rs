//! The core transaction model: a dated, typed, categorized monetary event,
//! optionally carrying a recurrence descriptor that makes it a template for
//! periodically materialized ledger entries.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, TransactionId, UserId};

/// Whether a transaction brings money in or spends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned, e.g. wages.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The lowercase name used in storage and notification messages.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

/// How often a recurring transaction happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Every 7 days.
    Weekly,
    /// A calendar month of variable length.
    Monthly,
    /// A calendar year.
    Yearly,
}

impl Frequency {
    /// The lowercase name used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

/// The schedule attached to a recurring transaction template.
///
/// An `end_date` of `None` is interpreted as the transaction recurring
/// indefinitely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    /// How often the transaction repeats.
    pub frequency: Frequency,
    /// The first date the schedule applies.
    pub start_date: Date,
    /// The last date the schedule applies, if any.
    pub end_date: Option<Date>,
    /// When the template last materialized a concrete transaction. `None`
    /// until the recurring processor has run the template once.
    pub last_processed: Option<OffsetDateTime>,
}

impl Recurrence {
    /// Create a schedule starting at `start_date`.
    ///
    /// # Errors
    /// Returns [Error::EndBeforeStart] if `end_date` is on or before
    /// `start_date`.
    pub fn new(
        frequency: Frequency,
        start_date: Date,
        end_date: Option<Date>,
    ) -> Result<Self, Error> {
        match end_date {
            Some(end) if end <= start_date => Err(Error::EndBeforeStart {
                start: start_date,
                end,
            }),
            _ => Ok(Self {
                frequency,
                start_date,
                end_date,
                last_processed: None,
            }),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build] and pass the
/// builder to [crate::stores::TransactionStore::create].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserId,
    /// Whether this is income or an expense.
    pub transaction_type: TransactionType,
    /// The amount of money spent or earned. Always positive; the direction
    /// is carried by `transaction_type`.
    pub amount: f64,
    /// The ISO 4217 currency code the amount is denominated in. Amounts are
    /// stored already normalized; conversion happens upstream.
    pub currency: String,
    /// The category label, e.g. "Groceries".
    pub category: String,
    /// A text description of what the transaction was for.
    pub description: String,
    /// Free-form labels for cross-category reporting.
    pub tags: Vec<String>,
    /// When the transaction happened.
    pub date: Date,
    /// Present when this transaction is a recurring template.
    pub recurrence: Option<Recurrence>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        user_id: UserId,
        transaction_type: TransactionType,
        amount: f64,
        category: &str,
        date: Date,
    ) -> TransactionBuilder {
        TransactionBuilder {
            user_id,
            transaction_type,
            amount,
            currency: "USD".to_owned(),
            category: category.to_owned(),
            description: String::new(),
            tags: Vec::new(),
            date,
            recurrence: None,
        }
    }

    /// Whether the transaction is a recurring template.
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }
}

/// A builder for creating [Transaction] instances via a store.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// The user that will own the transaction.
    pub user_id: UserId,
    /// Whether this is income or an expense.
    pub transaction_type: TransactionType,
    /// The monetary amount. Must be positive.
    pub amount: f64,
    /// The currency code. Defaults to "USD".
    pub currency: String,
    /// The category label. Must not be empty.
    pub category: String,
    /// A text description. Defaults to the empty string.
    pub description: String,
    /// Free-form labels. Defaults to none.
    pub tags: Vec<String>,
    /// When the transaction happened.
    pub date: Date,
    /// The recurrence schedule, for templates.
    pub recurrence: Option<Recurrence>,
}

impl TransactionBuilder {
    /// Set the currency code for the transaction.
    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_uppercase();
        self
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the tags for the transaction.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Mark the transaction as a recurring template.
    pub fn recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Check the builder against the transaction invariants.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if the amount is zero or negative, or
    /// [Error::EmptyCategory] if the category label is blank.
    pub fn validate(&self) -> Result<(), Error> {
        if self.amount <= 0.0 {
            return Err(Error::InvalidAmount(self.amount));
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

    use super::{Frequency, Recurrence, Transaction, TransactionType};

    #[test]
    fn validate_rejects_non_positive_amounts() {
        for amount in [0.0, -12.5] {
            let builder = Transaction::build(
                1,
                TransactionType::Expense,
                amount,
                "Food",
                date!(2025 - 02 - 03),
            );

            assert_eq!(builder.validate(), Err(Error::InvalidAmount(amount)));
        }
    }

    #[test]
    fn validate_rejects_blank_category() {
        let builder = Transaction::build(
            1,
            TransactionType::Expense,
            10.0,
            "  ",
            date!(2025 - 02 - 03),
        );

        assert_eq!(builder.validate(), Err(Error::EmptyCategory));
    }

    #[test]
    fn recurrence_rejects_end_on_or_before_start() {
        let start = date!(2025 - 02 - 03);

        for end in [start, date!(2025 - 01 - 03)] {
            let result = Recurrence::new(Frequency::Weekly, start, Some(end));

            assert_eq!(result, Err(Error::EndBeforeStart { start, end }));
        }
    }

    #[test]
    fn recurrence_accepts_open_end() {
        let result = Recurrence::new(Frequency::Monthly, date!(2025 - 02 - 03), None);

        assert!(result.is_ok());
    }
}
