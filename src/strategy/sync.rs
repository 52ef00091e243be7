//! Sequential replay strategy
//!
//! Runs one command at a time, in file order, on a current-thread tokio
//! runtime. CSV parsing is delegated to `SyncReader`, ledger logic to the
//! `LedgerFacade`, and output to the csv_format module.

use crate::core::batch_processor::log_failure;
use crate::core::{EngineConfig, LedgerEngine, LedgerFacade};
use crate::io::sync_reader::SyncReader;
use crate::strategy::{write_output, OutputMode, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Sequential processing strategy
///
/// # Examples
///
/// ```no_run
/// use point_ledger::core::EngineConfig;
/// use point_ledger::strategy::{OutputMode, ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
///
/// let strategy = SyncProcessingStrategy::new(EngineConfig::default(), OutputMode::Balances);
/// let mut output = std::io::stdout();
///
/// strategy.process(Path::new("commands.csv"), &mut output)
///     .expect("Replay failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    engine_config: EngineConfig,
    mode: OutputMode,
}

impl SyncProcessingStrategy {
    /// Create a sequential strategy
    pub fn new(engine_config: EngineConfig, mode: OutputMode) -> Self {
        Self {
            engine_config,
            mode,
        }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let facade = LedgerFacade::new(LedgerEngine::in_memory(self.engine_config.clone()));
        let reader = SyncReader::new(input_path)?;

        let mut applied = 0usize;
        let mut failed = 0usize;
        for row in reader {
            match row {
                Ok(command) => match runtime.block_on(facade.execute(&command)) {
                    Ok(_) => applied += 1,
                    Err(e) => {
                        log_failure(&command, &e);
                        failed += 1;
                    }
                },
                Err(e) => warn!(error = %e, "rejected input row"),
            }
        }

        info!(applied, failed, strategy = "sync", "replay finished");
        write_output(&facade, self.mode, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn run(content: &str, mode: OutputMode) -> String {
        let file = create_temp_csv(content);
        let strategy = SyncProcessingStrategy::new(EngineConfig::default(), mode);
        let mut output = Vec::new();

        strategy.process(file.path(), &mut output).unwrap();

        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_sync_strategy_writes_balances() {
        let output = run(
            "type,user,amount\ncharge,4,5000\nuse,4,3000\ncharge,1,10\n",
            OutputMode::Balances,
        );

        assert_eq!(output, "user,points\n1,10\n4,2000\n");
    }

    #[test]
    fn test_sync_strategy_writes_history() {
        let output = run(
            "type,user,amount\ncharge,5,5000\nuse,5,8000\nuse,5,1\n",
            OutputMode::History,
        );

        assert_eq!(output, "user,type,amount\n5,charge,5000\n5,use,1\n");
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let strategy = SyncProcessingStrategy::new(EngineConfig::default(), OutputMode::Balances);
        let mut output = Vec::new();

        let result = strategy.process(Path::new("nonexistent.csv"), &mut output);

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_strategy_continues_past_bad_rows() {
        let output = run(
            "type,user,amount\ncharge,1,100\ncharge,two,5\ncharge,3,0\ncharge,3,50\n",
            OutputMode::Balances,
        );

        assert_eq!(output, "user,points\n1,100\n3,50\n");
    }

    #[test]
    fn test_sync_strategy_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncProcessingStrategy>();
    }
}
