//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `balance`: Per-user balance record
//! - `transaction`: Identifiers, history records and ledger commands
//! - `error`: Error types for the ledger and its stores

pub mod balance;
pub mod error;
pub mod transaction;

pub use balance::UserBalance;
pub use error::{LedgerError, StoreError};
pub use transaction::{
    LedgerCommand, Points, SequenceId, TransactionRecord, TransactionType, UserId,
};
