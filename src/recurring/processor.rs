//! The periodic recurring transaction processor.

use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    models::{NotificationBuilder, NotificationKind, Transaction},
    recurring::schedule,
    stores::{NotificationStore, TransactionStore},
};

/// How far ahead of a due date an upcoming notification is raised.
const UPCOMING_WINDOW: Duration = Duration::days(3);

/// Materialize every recurring template that has come due and raise
/// upcoming/missed notifications, across all users.
///
/// The run is idempotent per period: materialization only happens when at
/// least one period has elapsed since the template's `last_processed`, and
/// `last_processed` advances to `now` in the same step, so running the job
/// again within the period materializes nothing further.
///
/// A failure on one template is logged and does not abort the remaining set.
///
/// # Errors
/// Returns an error only if the template list itself cannot be fetched.
pub fn process_recurring_transactions<T, N>(
    transaction_store: &mut T,
    notification_store: &mut N,
    now: OffsetDateTime,
) -> Result<(), Error>
where
    T: TransactionStore,
    N: NotificationStore,
{
    let templates = transaction_store.get_active_recurring(now.date())?;
    tracing::debug!("processing {} recurring templates", templates.len());

    for template in templates {
        if let Err(error) = process_template(&template, transaction_store, notification_store, now)
        {
            tracing::error!(
                "could not process recurring transaction {}: {}",
                template.id,
                error
            );
        }
    }

    Ok(())
}

fn process_template<T, N>(
    template: &Transaction,
    transaction_store: &mut T,
    notification_store: &mut N,
    now: OffsetDateTime,
) -> Result<(), Error>
where
    T: TransactionStore,
    N: NotificationStore,
{
    let Some(recurrence) = &template.recurrence else {
        return Ok(());
    };

    let next_due = schedule::next_due_date(recurrence.frequency, now);
    let due = schedule::is_due(recurrence.frequency, recurrence.last_processed, now);

    if next_due - now <= UPCOMING_WINDOW {
        notification_store.create(
            NotificationBuilder::new(
                template.user_id,
                NotificationKind::Upcoming,
                &format!(
                    "Upcoming {}: {} for ${:.2} due on {}",
                    template.transaction_type.as_str(),
                    template.description,
                    template.amount,
                    next_due.date()
                ),
            )
            .transaction(template.id)
            .due_date(next_due),
        )?;
    }

    if due
        && let Some(last) = recurrence.last_processed
        && schedule::is_late(recurrence.frequency, last, now)
    {
        notification_store.create(
            NotificationBuilder::new(
                template.user_id,
                NotificationKind::Missed,
                &format!(
                    "Missed {}: {} for ${:.2} was due on {}",
                    template.transaction_type.as_str(),
                    template.description,
                    template.amount,
                    last.date()
                ),
            )
            .transaction(template.id)
            .due_date(last),
        )?;
    }

    if due {
        transaction_store.create(
            Transaction::build(
                template.user_id,
                template.transaction_type,
                template.amount,
                &template.category,
                now.date(),
            )
            .currency(&template.currency)
            .description(&template.description)
            .tags(template.tags.clone()),
        )?;

        transaction_store.set_last_processed(template.id, now)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        Error, NotificationId, UserId,
        db::initialize,
        models::{
            Frequency, Notification, NotificationBuilder, NotificationKind, Recurrence,
            Transaction, TransactionType,
        },
        stores::{
            NotificationStore, TransactionFilter, TransactionStore,
            sqlite::{SQLiteNotificationStore, SQLiteTransactionStore},
        },
    };

    use super::process_recurring_transactions;

    const NOW: OffsetDateTime = datetime!(2025-03-10 12:00 UTC);

    fn get_test_stores() -> (SQLiteTransactionStore, SQLiteNotificationStore) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        (
            SQLiteTransactionStore::new(connection.clone()),
            SQLiteNotificationStore::new(connection),
        )
    }

    fn create_template(
        store: &mut SQLiteTransactionStore,
        user_id: UserId,
        frequency: Frequency,
        last_processed: Option<OffsetDateTime>,
    ) -> Transaction {
        let mut recurrence =
            Recurrence::new(frequency, NOW.date() - Duration::days(365), None).unwrap();
        recurrence.last_processed = last_processed;

        store
            .create(
                Transaction::build(
                    user_id,
                    TransactionType::Expense,
                    9.99,
                    "Subscriptions",
                    NOW.date() - Duration::days(365),
                )
                .description("Music streaming")
                .tags(vec!["media".to_owned()])
                .recurrence(recurrence),
            )
            .unwrap()
    }

    fn materialized(store: &SQLiteTransactionStore, user_id: UserId) -> Vec<Transaction> {
        store
            .get_filtered(&TransactionFilter::new(user_id))
            .unwrap()
            .into_iter()
            .filter(|t| !t.is_recurring())
            .collect()
    }

    #[test]
    fn due_daily_template_materializes_exactly_once() {
        let (mut transactions, mut notifications) = get_test_stores();
        let template = create_template(
            &mut transactions,
            7,
            Frequency::Daily,
            Some(NOW - Duration::hours(25)),
        );

        process_recurring_transactions(&mut transactions, &mut notifications, NOW).unwrap();

        let concrete = materialized(&transactions, 7);
        assert_eq!(concrete.len(), 1);
        assert_eq!(concrete[0].amount, 9.99);
        assert_eq!(concrete[0].category, "Subscriptions");
        assert_eq!(concrete[0].date, NOW.date());
        assert_eq!(concrete[0].tags, vec!["media".to_owned()]);

        let updated = transactions.get(7, template.id).unwrap();
        assert_eq!(updated.recurrence.unwrap().last_processed, Some(NOW));

        // A second run in the same period must not double-materialize.
        process_recurring_transactions(&mut transactions, &mut notifications, NOW).unwrap();

        assert_eq!(materialized(&transactions, 7).len(), 1);
    }

    #[test]
    fn never_processed_template_materializes_without_missed_alert() {
        let (mut transactions, mut notifications) = get_test_stores();
        create_template(&mut transactions, 7, Frequency::Monthly, None);

        process_recurring_transactions(&mut transactions, &mut notifications, NOW).unwrap();

        assert_eq!(materialized(&transactions, 7).len(), 1);
        assert!(
            notifications
                .get_for_user(7)
                .unwrap()
                .iter()
                .all(|n| n.kind != NotificationKind::Missed)
        );
    }

    #[test]
    fn late_daily_template_raises_missed_alert_dated_at_stale_run() {
        let (mut transactions, mut notifications) = get_test_stores();
        let stale = NOW - Duration::hours(25);
        let template = create_template(&mut transactions, 7, Frequency::Daily, Some(stale));

        process_recurring_transactions(&mut transactions, &mut notifications, NOW).unwrap();

        let missed: Vec<Notification> = notifications
            .get_for_user(7)
            .unwrap()
            .into_iter()
            .filter(|n| n.kind == NotificationKind::Missed)
            .collect();
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].due_date, Some(stale));
        assert_eq!(missed[0].transaction_id, Some(template.id));
    }

    #[test]
    fn daily_template_raises_upcoming_alert_monthly_does_not() {
        let (mut transactions, mut notifications) = get_test_stores();
        create_template(&mut transactions, 7, Frequency::Daily, Some(NOW));
        create_template(&mut transactions, 8, Frequency::Monthly, Some(NOW));

        process_recurring_transactions(&mut transactions, &mut notifications, NOW).unwrap();

        let upcoming: Vec<Notification> = notifications
            .get_for_user(7)
            .unwrap()
            .into_iter()
            .filter(|n| n.kind == NotificationKind::Upcoming)
            .collect();
        assert_eq!(upcoming.len(), 1);
        // The next occurrence is one period out.
        assert_eq!(upcoming[0].due_date, Some(NOW + Duration::days(1)));

        // A monthly template's next due date is ~30 days out, well past the
        // upcoming window.
        assert!(notifications.get_for_user(8).unwrap().is_empty());
    }

    /// A notification sink that always fails, for exercising per-template
    /// failure isolation.
    struct BrokenNotificationStore;

    impl NotificationStore for BrokenNotificationStore {
        fn create(&mut self, _: NotificationBuilder) -> Result<Notification, Error> {
            Err(Error::DatabaseLock)
        }

        fn get_for_user(&self, _: UserId) -> Result<Vec<Notification>, Error> {
            Ok(Vec::new())
        }

        fn unread_count(&self, _: UserId) -> Result<u64, Error> {
            Ok(0)
        }

        fn mark_read(&mut self, _: UserId, _: NotificationId) -> Result<(), Error> {
            Ok(())
        }

        fn mark_all_read(&mut self, _: UserId) -> Result<(), Error> {
            Ok(())
        }
    }

    #[test]
    fn one_failing_template_does_not_abort_the_run() {
        let (mut transactions, _) = get_test_stores();
        // The daily template trips the broken sink with its upcoming alert;
        // the monthly template raises no notifications and must still
        // materialize.
        create_template(
            &mut transactions,
            7,
            Frequency::Daily,
            Some(NOW - Duration::hours(25)),
        );
        create_template(&mut transactions, 8, Frequency::Monthly, None);

        let result = process_recurring_transactions(
            &mut transactions,
            &mut BrokenNotificationStore,
            NOW,
        );

        assert!(result.is_ok());
        assert!(materialized(&transactions, 7).is_empty());
        assert_eq!(materialized(&transactions, 8).len(), 1);
    }
}
