//! Replay strategies
//!
//! A strategy reads ledger commands from a CSV file, feeds them to a fresh
//! ledger and writes the final state. Strategies differ only in how commands
//! are scheduled; both produce the same output for the same input.

use crate::cli::StrategyType;
use crate::core::{EngineConfig, LedgerFacade};
use crate::io::csv_format::{write_balances_csv, write_history_csv};
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// What a strategy writes once every command has run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// One `user,points` row per user
    #[default]
    Balances,
    /// One `user,type,amount` row per history record
    History,
}

/// Complete replay pipeline: read, apply, report
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the commands in `input_path` and write the result to `output`
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the input was read and the output written; rejected
    ///   rows and failed commands are logged and do not count as failures
    /// * `Err(String)` if the input could not be opened or the output could
    ///   not be written
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// `batch_config` is only used by the async strategy and defaults when absent.
pub fn create_strategy(
    strategy_type: StrategyType,
    batch_config: Option<BatchConfig>,
    engine_config: EngineConfig,
    mode: OutputMode,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(engine_config, mode)),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(
            batch_config.unwrap_or_default(),
            engine_config,
            mode,
        )),
    }
}

/// Write the final ledger state in the requested shape
pub(crate) fn write_output(
    facade: &LedgerFacade,
    mode: OutputMode,
    output: &mut dyn Write,
) -> Result<(), String> {
    match mode {
        OutputMode::Balances => write_balances_csv(&facade.balances(), output),
        OutputMode::History => write_history_csv(&facade.histories(), output),
    }
}
