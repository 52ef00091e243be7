//! Concurrent batch replay strategy
//!
//! Reads commands in batches with csv-async and replays each batch with one
//! task per user on a multi-threaded tokio runtime.
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (user partitioning + task spawning)
//!         └── LedgerFacade → LedgerEngine
//! ```
//!
//! Batches run one after another, so a user whose commands span several
//! batches still sees them in file order. Users within a batch run
//! concurrently and contend only through the engine's per-user leases.

use crate::core::{BatchProcessor, EngineConfig, LedgerEngine, LedgerFacade};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{write_output, OutputMode, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, falling back to defaults for zero values
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                requested = batch_size,
                fallback = default.batch_size,
                "invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                requested = max_concurrent_batches,
                fallback = default.max_concurrent_batches,
                "invalid max_concurrent_batches, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Concurrent batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    engine_config: EngineConfig,
    mode: OutputMode,
}

impl AsyncProcessingStrategy {
    /// Create a batch strategy
    pub fn new(config: BatchConfig, engine_config: EngineConfig, mode: OutputMode) -> Self {
        Self {
            config,
            engine_config,
            mode,
        }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let facade = LedgerFacade::new(LedgerEngine::in_memory(self.engine_config.clone()));
            let processor = BatchProcessor::new(facade.clone());

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;

            // csv-async reads through the futures io traits
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut applied = 0usize;
            let mut failed = 0usize;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for result in processor.process_batch(batch).await {
                    if result.result.is_ok() {
                        applied += 1;
                    } else {
                        failed += 1;
                    }
                }
            }

            info!(applied, failed, strategy = "async", "replay finished");
            write_output(&facade, self.mode, output)
        })
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

    fn strategy(batch_size: usize, mode: OutputMode) -> AsyncProcessingStrategy {
        AsyncProcessingStrategy::new(
            BatchConfig::new(batch_size, 4),
            EngineConfig::default(),
            mode,
        )
    }

    #[test]
    fn test_async_strategy_writes_balances() {
        let file = create_temp_csv("type,user,amount\ncharge,1,100\ncharge,2,200\ncharge,1,50\n");
        let mut output = Vec::new();

        strategy(1000, OutputMode::Balances)
            .process(file.path(), &mut output)
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "user,points\n1,150\n2,200\n"
        );
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let mut output = Vec::new();

        let result = strategy(1000, OutputMode::Balances).process(Path::new("nonexistent.csv"), &mut output);

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_async_strategy_maintains_ordering_across_batches() {
        // Batch size 2 splits user 1's commands across three batches.
        let file = create_temp_csv(
            "type,user,amount\n\
             charge,1,100\n\
             charge,2,50\n\
             use,1,30\n\
             charge,2,25\n\
             use,1,80\n\
             use,1,70\n",
        );
        let mut output = Vec::new();

        strategy(2, OutputMode::History)
            .process(file.path(), &mut output)
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "user,type,amount\n1,charge,100\n1,use,30\n1,use,70\n2,charge,50\n2,charge,25\n"
        );
    }

    #[rstest::rstest]
    #[case::zero_batch_size(0, 3, 1000, 3)]
    #[case::zero_workers(10, 0, 10, num_cpus::get())]
    #[case::both_valid(10, 3, 10, 3)]
    fn test_batch_config_zero_values_fall_back(
        #[case] batch_size: usize,
        #[case] workers: usize,
        #[case] expected_batch_size: usize,
        #[case] expected_workers: usize,
    ) {
        let config = BatchConfig::new(batch_size, workers);

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_workers);
    }
}
