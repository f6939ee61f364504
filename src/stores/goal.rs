//! Defines the savings goal store trait.

use crate::{
    Error, GoalId, UserId,
    models::{Goal, GoalBuilder},
};

/// Handles the creation and retrieval of savings goals.
pub trait GoalStore {
    /// Create a new goal in the store.
    ///
    /// Implementers must validate the builder first (see
    /// [GoalBuilder::validate]).
    fn create(&mut self, builder: GoalBuilder) -> Result<Goal, Error>;

    /// Retrieve one of `user_id`'s goals from the store.
    fn get(&self, user_id: UserId, id: GoalId) -> Result<Goal, Error>;

    /// Retrieve all of `user_id`'s goals, newest first.
    fn get_for_user(&self, user_id: UserId) -> Result<Vec<Goal>, Error>;

    /// Retrieve `user_id`'s active goals that have auto-allocation enabled.
    fn get_auto_allocating(&self, user_id: UserId) -> Result<Vec<Goal>, Error>;

    /// Overwrite a goal with `goal`, matched by ID and owner.
    fn update(&mut self, goal: &Goal) -> Result<(), Error>;

    /// Delete one of `user_id`'s goals.
    fn delete(&mut self, user_id: UserId, id: GoalId) -> Result<(), Error>;
}
