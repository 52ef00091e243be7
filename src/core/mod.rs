//! Core ledger logic
//!
//! This module contains the ledger components:
//! - `traits` - Storage collaborator abstractions
//! - `balance_store` / `history_log` - In-memory store implementations
//! - `user_locks` - Per-user exclusive sections
//! - `engine` - The concurrent mutation engine
//! - `facade` - Raw-input entry points over the engine
//! - `batch_processor` - Concurrent replay with per-user ordering

pub mod balance_store;
pub mod batch_processor;
pub mod engine;
pub mod facade;
pub mod history_log;
pub mod traits;
pub mod user_locks;

pub use balance_store::MemoryBalanceStore;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::{EngineConfig, LedgerEngine, CONSISTENCY_TARGET};
pub use facade::LedgerFacade;
pub use history_log::MemoryHistoryLog;
pub use traits::{BalanceStore, HistoryLog};
pub use user_locks::{UserLease, UserLocks};
