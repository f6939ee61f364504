//! Defines the notification store trait.
//!
//! The periodic jobs only ever create notifications; the user-facing API
//! lists them and marks them read.

use crate::{
    Error, NotificationId, UserId,
    models::{Notification, NotificationBuilder},
};

/// Handles the creation and retrieval of notifications.
pub trait NotificationStore {
    /// Create a new notification in the store.
    fn create(&mut self, builder: NotificationBuilder) -> Result<Notification, Error>;

    /// Retrieve all of `user_id`'s notifications, newest first.
    fn get_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, Error>;

    /// The number of `user_id`'s notifications that are still unread.
    fn unread_count(&self, user_id: UserId) -> Result<u64, Error>;

    /// Mark one of `user_id`'s notifications as read.
    fn mark_read(&mut self, user_id: UserId, id: NotificationId) -> Result<(), Error>;

    /// Mark all of `user_id`'s notifications as read.
    fn mark_all_read(&mut self, user_id: UserId) -> Result<(), Error>;
}
