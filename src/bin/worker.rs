use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::Parser;
use rusqlite::Connection;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use bursar_rs::{
    SQLiteAppState, db,
    jobs::{JobConfig, run_scheduler},
};

/// The background worker for bursar_rs: runs the budget monitor and the
/// recurring transaction processor on fixed intervals.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// Seconds between budget monitor runs.
    #[arg(long, default_value_t = 6 * 60 * 60)]
    monitor_interval: u64,

    /// Seconds between recurring transaction processor runs.
    #[arg(long, default_value_t = 24 * 60 * 60)]
    recurring_interval: u64,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let connection = Connection::open(&args.db_path).expect("Could not open the database.");
    db::initialize(&connection).expect("Could not initialize the database.");

    let state = SQLiteAppState::from_connection(Arc::new(Mutex::new(connection)));
    let config = JobConfig {
        monitor_interval: Duration::from_secs(args.monitor_interval),
        recurring_interval: Duration::from_secs(args.recurring_interval),
    };

    tracing::info!(
        "worker started: monitoring budgets every {}s, processing recurring transactions every {}s",
        args.monitor_interval,
        args.recurring_interval
    );

    run_scheduler(state, config).await;
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().pretty().with_filter(filter))
        .init();
}
