//! Defines the budget store trait.

use crate::{
    BudgetId, Error, UserId,
    models::{Budget, BudgetBuilder},
};

/// Handles the creation and retrieval of budgets.
pub trait BudgetStore {
    /// Create a new budget in the store.
    ///
    /// Implementers must validate the builder first (see
    /// [BudgetBuilder::validate]).
    fn create(&mut self, builder: BudgetBuilder) -> Result<Budget, Error>;

    /// Retrieve one of `user_id`'s budgets from the store.
    fn get(&self, user_id: UserId, id: BudgetId) -> Result<Budget, Error>;

    /// Retrieve all of `user_id`'s budgets.
    fn get_for_user(&self, user_id: UserId) -> Result<Vec<Budget>, Error>;

    /// Retrieve every budget in the store, across all users. Used by the
    /// budget monitor.
    fn get_all(&self) -> Result<Vec<Budget>, Error>;

    /// Overwrite a budget with `budget`, matched by ID and owner.
    fn update(&mut self, budget: &Budget) -> Result<(), Error>;

    /// Persist a freshly computed spend total for a budget.
    fn set_current_spending(&mut self, id: BudgetId, total_spent: f64) -> Result<(), Error>;

    /// Delete one of `user_id`'s budgets.
    fn delete(&mut self, user_id: UserId, id: BudgetId) -> Result<(), Error>;
}
