//! The notification model. Notifications are created only by the budget
//! monitor and the recurring processor; the user-facing API reads them and
//! flips `is_read`.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{NotificationId, TransactionId, UserId};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A recurring transaction is due within the next few days.
    Upcoming,
    /// A recurring transaction was processed later than its schedule.
    Missed,
    /// A budget has crossed its warning threshold.
    BudgetWarning,
    /// A budget ceiling has been crossed.
    BudgetExceeded,
}

impl NotificationKind {
    /// The snake_case name used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Upcoming => "upcoming",
            NotificationKind::Missed => "missed",
            NotificationKind::BudgetWarning => "budget_warning",
            NotificationKind::BudgetExceeded => "budget_exceeded",
        }
    }
}

/// A message raised for a user by one of the periodic jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// The ID of the notification.
    pub id: NotificationId,
    /// The user the notification is for.
    pub user_id: UserId,
    /// The recurring template the notification refers to, if any.
    pub transaction_id: Option<TransactionId>,
    /// What the notification is about.
    pub kind: NotificationKind,
    /// The human-readable message shown to the user.
    pub message: String,
    /// Whether the user has seen the notification.
    pub is_read: bool,
    /// The due date the notification refers to, for recurrence alerts.
    pub due_date: Option<OffsetDateTime>,
    /// When the notification was raised.
    pub created_at: OffsetDateTime,
}

/// A builder for creating [Notification] instances via a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationBuilder {
    /// The user the notification is for.
    pub user_id: UserId,
    /// What the notification is about.
    pub kind: NotificationKind,
    /// The human-readable message.
    pub message: String,
    /// The recurring template the notification refers to, if any.
    pub transaction_id: Option<TransactionId>,
    /// The due date the notification refers to, if any.
    pub due_date: Option<OffsetDateTime>,
}

impl NotificationBuilder {
    /// Start a notification of `kind` for `user_id`.
    pub fn new(user_id: UserId, kind: NotificationKind, message: &str) -> Self {
        Self {
            user_id,
            kind,
            message: message.to_owned(),
            transaction_id: None,
            due_date: None,
        }
    }

    /// Reference the recurring template that triggered the notification.
    pub fn transaction(mut self, transaction_id: TransactionId) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Set the due date the notification refers to.
    pub fn due_date(mut self, due_date: OffsetDateTime) -> Self {
        self.due_date = Some(due_date);
        self
    }
}
