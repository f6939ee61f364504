//! Defines the transaction store trait and its filter type.

use std::ops::RangeInclusive;

use time::{Date, OffsetDateTime};

use crate::{
    Error, TransactionId, UserId,
    models::{Transaction, TransactionBuilder, TransactionType},
};

/// Handles the creation and retrieval of transactions.
pub trait TransactionStore {
    /// Create a new transaction in the store.
    ///
    /// Implementers must validate the builder first (see
    /// [TransactionBuilder::validate]).
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Retrieve one of `user_id`'s transactions from the store.
    fn get(&self, user_id: UserId, id: TransactionId) -> Result<Transaction, Error>;

    /// Retrieve transactions matching `filter`.
    fn get_filtered(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, Error>;

    /// Overwrite a transaction with `transaction`, matched by ID and owner.
    fn update(&mut self, transaction: &Transaction) -> Result<(), Error>;

    /// Delete one of `user_id`'s transactions.
    fn delete(&mut self, user_id: UserId, id: TransactionId) -> Result<(), Error>;

    /// Retrieve every recurring template, across all users, whose recurrence
    /// end date is absent or has not passed as of `as_of`.
    fn get_active_recurring(&self, as_of: Date) -> Result<Vec<Transaction>, Error>;

    /// Record that a recurring template materialized a transaction at
    /// `processed_at`.
    fn set_last_processed(
        &mut self,
        id: TransactionId,
        processed_at: OffsetDateTime,
    ) -> Result<(), Error>;
}

/// Defines which transactions [TransactionStore::get_filtered] returns.
///
/// Criteria default to "match everything" and are narrowed with the builder
/// methods, so callers assemble exactly the query they mean rather than an
/// ad-hoc bag of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    /// Only include transactions owned by this user.
    pub user_id: UserId,
    /// Only include transactions of this type.
    pub transaction_type: Option<TransactionType>,
    /// Only include transactions with this category label.
    pub category: Option<String>,
    /// Only include transactions carrying at least one of these tags.
    pub tags: Vec<String>,
    /// Only include transactions dated within this range (inclusive).
    pub date_range: Option<RangeInclusive<Date>>,
    /// Order transactions by date. `None` returns them in storage order.
    pub sort_date: Option<SortOrder>,
}

impl TransactionFilter {
    /// A filter matching all of `user_id`'s transactions.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            transaction_type: None,
            category: None,
            tags: Vec::new(),
            date_range: None,
            sort_date: None,
        }
    }

    /// Narrow the filter to one transaction type.
    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    /// Narrow the filter to one category label.
    pub fn in_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    /// Narrow the filter to transactions carrying any of `tags`.
    pub fn with_any_tag(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Narrow the filter to transactions dated within `date_range`.
    pub fn in_range(mut self, date_range: RangeInclusive<Date>) -> Self {
        self.date_range = Some(date_range);
        self
    }

    /// Order the results by date.
    pub fn sorted(mut self, order: SortOrder) -> Self {
        self.sort_date = Some(order);
        self
    }

    /// Check the filter for criteria that cannot match anything sensibly.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] for an inverted date range,
    /// [Error::EmptyCategory] for a blank category, or [Error::EmptyTag] if
    /// any tag is blank.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(range) = &self.date_range
            && range.start() > range.end()
        {
            return Err(Error::InvalidDateRange {
                start: *range.start(),
                end: *range.end(),
            });
        }

        if let Some(category) = &self.category
            && category.trim().is_empty()
        {
            return Err(Error::EmptyCategory);
        }

        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(Error::EmptyTag);
        }

        Ok(())
    }
}

/// The order to sort transactions in a [TransactionFilter].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::TransactionFilter;

    #[test]
    fn validate_rejects_inverted_date_range() {
        let start = date!(2025 - 03 - 01);
        let end = date!(2025 - 01 - 01);
        let filter = TransactionFilter::new(1).in_range(start..=end);

        assert_eq!(filter.validate(), Err(Error::InvalidDateRange { start, end }));
    }

    #[test]
    fn validate_rejects_blank_tag() {
        let filter = TransactionFilter::new(1).with_any_tag(vec!["goal".to_owned(), " ".to_owned()]);

        assert_eq!(filter.validate(), Err(Error::EmptyTag));
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(TransactionFilter::new(1).validate().is_ok());
    }
}
