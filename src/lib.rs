//! Point Ledger Library
//! # Overview
//!
//! This library tracks a non-negative point balance per user together with
//! an append-only history of charges and uses. Its core is a concurrent
//! mutation engine that serializes operations per user, lets different users
//! proceed in parallel, and keeps balance and history consistent when a store
//! write fails.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (UserBalance, TransactionRecord, errors)
//! - [`core`] - Ledger components:
//!   - [`core::engine`] - Per-user serialized charge/use with compensation
//!   - [`core::user_locks`] - Lazily created per-user exclusive sections
//!   - [`core::balance_store`] / [`core::history_log`] - In-memory stores
//!   - [`core::facade`] - Raw-input entry points
//! - [`io`] - CSV command input and ledger output
//! - [`strategy`] - Sequential and concurrent replay pipelines
//! - [`cli`] - CLI arguments parsing
//!
//! # Operations
//!
//! - **Charge**: add a positive amount to a user's balance
//! - **Use**: spend a positive amount, only if the balance covers it
//! - **Balance / History**: read without taking the user's lease
//!
//! # Example
//!
//! ```no_run
//! use point_ledger::{EngineConfig, LedgerEngine};
//!
//! # async fn demo() -> Result<(), point_ledger::LedgerError> {
//! let engine = LedgerEngine::in_memory(EngineConfig::default());
//! engine.charge(1, 5000).await?;
//! let balance = engine.use_points(1, 3000).await?;
//! assert_eq!(balance.points, 2000);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use crate::core::{
    BalanceStore, EngineConfig, HistoryLog, LedgerEngine, LedgerFacade, MemoryBalanceStore,
    MemoryHistoryLog, UserLocks,
};
pub use crate::io::{write_balances_csv, write_history_csv};
pub use crate::types::{
    LedgerCommand, LedgerError, Points, SequenceId, StoreError, TransactionRecord,
    TransactionType, UserBalance, UserId,
};
