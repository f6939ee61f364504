//! The savings goal engine: recording contributions and withdrawals, and
//! automatically allocating a share of income to auto-allocating goals.

mod contribution;

pub use contribution::{allocate_income, record_contribution};
