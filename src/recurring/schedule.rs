//! Period arithmetic for recurrence schedules.
//!
//! Daily and weekly periods are measured as elapsed wall-clock time; monthly
//! and yearly periods are measured by the calendar month or year having
//! advanced, which is intentionally coarser (a template processed on Jan 31
//! is due again on Feb 1).

use time::{Duration, OffsetDateTime};

use crate::{calendar, models::Frequency};

/// The next time a template with this `frequency` falls due: one period on
/// from `now`.
pub(crate) fn next_due_date(frequency: Frequency, now: OffsetDateTime) -> OffsetDateTime {
    match frequency {
        Frequency::Daily => now + Duration::days(1),
        Frequency::Weekly => now + Duration::days(7),
        Frequency::Monthly => now.replace_date(calendar::add_months(now.date(), 1)),
        Frequency::Yearly => now.replace_date(calendar::add_years(now.date(), 1)),
    }
}

/// Whether at least one period has elapsed since the template was last
/// processed. A template that has never been processed is always due.
pub(crate) fn is_due(
    frequency: Frequency,
    last_processed: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> bool {
    let Some(last) = last_processed else {
        return true;
    };

    match frequency {
        Frequency::Daily => now - last >= Duration::days(1),
        Frequency::Weekly => now - last >= Duration::days(7),
        Frequency::Monthly => calendar::month_index(now.date()) > calendar::month_index(last.date()),
        Frequency::Yearly => now.year() > last.year(),
    }
}

/// Whether strictly more than one full period has elapsed since `last`,
/// i.e. processing is running late and an occurrence was missed.
pub(crate) fn is_late(frequency: Frequency, last: OffsetDateTime, now: OffsetDateTime) -> bool {
    match frequency {
        Frequency::Daily => now - last > Duration::days(1),
        Frequency::Weekly => now - last > Duration::days(7),
        Frequency::Monthly => {
            calendar::month_index(now.date()) - calendar::month_index(last.date()) > 1
        }
        Frequency::Yearly => now.year() - last.year() > 1,
    }
}
