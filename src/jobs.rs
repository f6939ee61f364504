//! The fixed-interval background jobs: the budget monitor and the recurring
//! transaction processor.
//!
//! The two jobs run on independent timers with no mutual exclusion against
//! each other or against concurrent user edits; a cached spend total may be
//! overwritten by a slightly stale computation when passes overlap, which is
//! accepted for these denormalized fields.

use std::time::Duration;

use time::OffsetDateTime;
use tokio::signal;

use crate::{
    AppState,
    budget::monitor_budgets,
    recurring::process_recurring_transactions,
    stores::{BudgetStore, GoalStore, NotificationStore, TransactionStore},
};

/// How often the budget monitor runs by default.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// How often the recurring transaction processor runs by default.
pub const DEFAULT_RECURRING_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// The intervals the scheduled jobs run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobConfig {
    /// The interval between budget monitor runs.
    pub monitor_interval: Duration,
    /// The interval between recurring transaction processor runs.
    pub recurring_interval: Duration,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            recurring_interval: DEFAULT_RECURRING_INTERVAL,
        }
    }
}

/// Run both scheduled jobs until a ctrl+c or terminate signal arrives.
///
/// Each job ticks once immediately on startup and then at its fixed
/// interval. Job failures are logged and the schedule keeps going.
pub async fn run_scheduler<T, B, G, N>(mut state: AppState<T, B, G, N>, config: JobConfig)
where
    T: TransactionStore + Send + Sync,
    B: BudgetStore + Send + Sync,
    G: GoalStore + Send + Sync,
    N: NotificationStore + Send + Sync,
{
    let mut monitor_timer = tokio::time::interval(config.monitor_interval);
    let mut recurring_timer = tokio::time::interval(config.recurring_interval);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = monitor_timer.tick() => run_monitor_cycle(&mut state),
            _ = recurring_timer.tick() => run_recurring_cycle(&mut state),
            _ = &mut shutdown => {
                tracing::info!("stopping scheduled jobs");
                break;
            }
        }
    }
}

/// Run one budget monitor pass, logging any failure.
pub fn run_monitor_cycle<T, B, G, N>(state: &mut AppState<T, B, G, N>)
where
    T: TransactionStore + Send + Sync,
    B: BudgetStore + Send + Sync,
    G: GoalStore + Send + Sync,
    N: NotificationStore + Send + Sync,
{
    tracing::info!("running budget monitor");

    if let Err(error) = monitor_budgets(
        &state.transaction_store,
        &mut state.budget_store,
        &mut state.notification_store,
    ) {
        tracing::error!("budget monitor run failed: {error}");
    }
}

/// Run one recurring transaction pass, logging any failure.
pub fn run_recurring_cycle<T, B, G, N>(state: &mut AppState<T, B, G, N>)
where
    T: TransactionStore + Send + Sync,
    B: BudgetStore + Send + Sync,
    G: GoalStore + Send + Sync,
    N: NotificationStore + Send + Sync,
{
    tracing::info!("processing recurring transactions");

    if let Err(error) = process_recurring_transactions(
        &mut state.transaction_store,
        &mut state.notification_store,
        OffsetDateTime::now_utc(),
    ) {
        tracing::error!("recurring transaction run failed: {error}");
    }
}

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::debug!("Received ctrl+c signal."),
        _ = terminate => tracing::debug!("Received terminate signal."),
    }
}
