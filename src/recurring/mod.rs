//! The recurring transaction engine: period arithmetic for recurrence
//! schedules and the periodic processor that materializes due templates.

mod processor;
mod schedule;

pub use processor::process_recurring_transactions;
