//! Calendar month arithmetic shared by the budget, recurring, and report
//! engines.

use time::{Date, util::days_in_month};

/// Truncate a date to the first day of its month.
pub(crate) fn first_of_month(date: Date) -> Date {
    date.replace_day(1).unwrap()
}

/// Advance `date` by `months` calendar months, clamping the day to the length
/// of the target month (e.g. Jan 31 + 1 month = Feb 28/29).
pub(crate) fn add_months(date: Date, months: i32) -> Date {
    let total = date.year() * 12 + date.month() as i32 - 1 + months;
    let year = total.div_euclid(12);
    let month = time::Month::try_from((total.rem_euclid(12) + 1) as u8).unwrap();
    let day = date.day().min(days_in_month(month, year));

    Date::from_calendar_date(year, month, day).unwrap()
}

/// Advance `date` by `years` calendar years, clamping Feb 29 to Feb 28 in
/// non-leap years.
pub(crate) fn add_years(date: Date, years: i32) -> Date {
    let year = date.year() + years;
    let day = date.day().min(days_in_month(date.month(), year));

    Date::from_calendar_date(year, date.month(), day).unwrap()
}

/// The number of whole calendar months since year zero. Subtracting two of
/// these gives how many times the calendar month has rolled over between two
/// dates, regardless of the day of month.
pub(crate) fn month_index(date: Date) -> i32 {
    date.year() * 12 + date.month() as i32 - 1
}
