//! Point Ledger CLI
//!
//! Replays charge and use commands from a CSV file against an in-memory
//! ledger and prints the final state to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > balances.csv
//! cargo run -- --strategy sync commands.csv > balances.csv
//! cargo run -- --history commands.csv > history.csv
//! RUST_LOG=point_ledger=debug cargo run -- --strategy async --batch-size 2000 commands.csv
//! ```
//!
//! Logs go to stderr; stdout carries only CSV.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, output not writable, etc.)

use point_ledger::cli;
use point_ledger::strategy;
use std::process;
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "point_ledger=info".into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::parse_args();

    let strategy = {
        let batch_config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(
            args.strategy,
            batch_config,
            args.to_engine_config(),
            args.output_mode(),
        )
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        error!("{}", e);
        process::exit(1);
    }
}
