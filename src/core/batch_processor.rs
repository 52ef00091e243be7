//! Batch processing with user-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which replays batches of
//! ledger commands concurrently while keeping each user's commands in input
//! order.
//!
//! # Design
//!
//! A batch is partitioned by user id. Each partition runs sequentially on its
//! own tokio task, and partitions run concurrently. The engine's per-user
//! lease would serialize same-user commands anyway, but without the
//! partitioning their order would be up to the scheduler.
//!
//! ```text
//! BatchProcessor
//!     └── LedgerFacade (shared, cloneable)
//! ```

use std::collections::HashMap;

use tracing::{error, warn};

use super::facade::LedgerFacade;
use crate::types::{LedgerCommand, LedgerError, UserBalance, UserId};

/// Outcome of a single replayed command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was run
    pub command: LedgerCommand,

    /// The new balance, or why the command failed
    pub result: Result<UserBalance, LedgerError>,
}

/// Batch processor with user-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    facade: LedgerFacade,
}

impl BatchProcessor {
    /// Create a new BatchProcessor over a facade
    pub fn new(facade: LedgerFacade) -> Self {
        Self { facade }
    }

    /// Partition a batch by user id
    ///
    /// Each command lands in exactly one partition and partitions keep the
    /// relative order of the input.
    pub fn partition_by_user(
        &self,
        batch: Vec<LedgerCommand>,
    ) -> HashMap<UserId, Vec<LedgerCommand>> {
        let mut user_batches: HashMap<UserId, Vec<LedgerCommand>> = HashMap::new();

        for command in batch {
            user_batches
                .entry(command.user_id)
                .or_default()
                .push(command);
        }

        user_batches
    }

    /// Run one user's commands in order
    ///
    /// A failed command is recorded and does not stop the rest.
    pub async fn process_user_commands(&self, commands: Vec<LedgerCommand>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            let result = self.facade.execute(&command).await;
            if let Err(e) = &result {
                log_failure(&command, e);
            }
            results.push(ProcessingResult { command, result });
        }

        results
    }

    /// Run a batch with one task per user
    ///
    /// Results are grouped by user; the grouping order is unspecified.
    pub async fn process_batch(&self, batch: Vec<LedgerCommand>) -> Vec<ProcessingResult> {
        let user_batches = self.partition_by_user(batch);

        let mut tasks = Vec::with_capacity(user_batches.len());
        for (_user_id, commands) in user_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_user_commands(commands).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(user_results) => results.extend(user_results),
                Err(e) => error!(error = %e, "replay task panicked"),
            }
        }

        results
    }
}

/// Log a failed replay command at a level matching its severity
pub fn log_failure(command: &LedgerCommand, error: &LedgerError) {
    if error.is_fatal() {
        error!(
            user_id = command.user_id,
            kind = %command.kind,
            amount = command.amount,
            %error,
            "command failed fatally"
        );
    } else {
        warn!(
            user_id = command.user_id,
            kind = %command.kind,
            amount = command.amount,
            %error,
            "command rejected"
        );
    }
}
