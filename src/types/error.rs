//! Error types for the point ledger
//!
//! This module defines the failures surfaced by the storage collaborators and
//! by the ledger engine itself.
//!
//! # Error Categories
//!
//! - **Caller errors**: invalid amount, insufficient balance, overflow,
//!   malformed user id. No state was touched.
//! - **Persistence errors**: a store operation failed and any partial effect
//!   was compensated before the error was returned.
//! - **Fatal errors**: compensation could not be completed, or the critical
//!   section was torn down. The ledger invariant may be broken for that user.

use super::transaction::{Points, SequenceId, UserId};
use thiserror::Error;

/// Failure reported by a balance store or history log
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The underlying storage could not complete the operation
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Description of the fault
        message: String,
    },

    /// A compensating void referenced a record that does not exist
    #[error("history record {sequence_id} not found")]
    RecordNotFound {
        /// The sequence id that was looked up
        sequence_id: SequenceId,
    },
}

impl StoreError {
    /// Create an Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }
}

/// Main error type for ledger operations
///
/// Every variant except `ConsistencyViolation` and `Aborted` is recoverable:
/// the ledger is in its pre-operation state when it is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Charge or use amount was zero or negative
    #[error("Invalid amount {amount} for user {user_id}: amount must be positive")]
    InvalidAmount {
        /// Target user
        user_id: UserId,
        /// The rejected amount
        amount: Points,
    },

    /// Use amount exceeds the current balance
    #[error("Insufficient balance for user {user_id}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Target user
        user_id: UserId,
        /// Balance at the time of the check
        available: Points,
        /// Requested use amount
        requested: Points,
    },

    /// The resulting balance would not fit the point range
    #[error("Amount overflow in {operation} for user {user_id}")]
    AmountOverflow {
        /// Target user
        user_id: UserId,
        /// Operation that would overflow
        operation: String,
    },

    /// A store operation failed; partial effects were compensated
    #[error("Persistence error in {operation} for user {user_id}: {source}")]
    Persistence {
        /// Target user
        user_id: UserId,
        /// Store operation that failed
        operation: String,
        /// Underlying store failure
        source: StoreError,
    },

    /// A history record could not be voided after a failed balance write
    ///
    /// The record is left dangling and the ledger invariant is broken for
    /// this user until an operator intervenes.
    #[error("Consistency violation for user {user_id}: history record {sequence_id} could not be voided after {attempts} attempts")]
    ConsistencyViolation {
        /// Target user
        user_id: UserId,
        /// The dangling history record
        sequence_id: SequenceId,
        /// Number of void attempts made
        attempts: u32,
    },

    /// The critical section did not run to completion
    #[error("Operation for user {user_id} aborted before completion")]
    Aborted {
        /// Target user
        user_id: UserId,
    },

    /// Raw user id input was not a non-negative integer
    #[error("Invalid user id '{raw}'")]
    InvalidUserId {
        /// The rejected input
        raw: String,
    },
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(user_id: UserId, amount: Points) -> Self {
        LedgerError::InvalidAmount { user_id, amount }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(user_id: UserId, available: Points, requested: Points) -> Self {
        LedgerError::InsufficientBalance {
            user_id,
            available,
            requested,
        }
    }

    /// Create an AmountOverflow error
    pub fn amount_overflow(user_id: UserId, operation: &str) -> Self {
        LedgerError::AmountOverflow {
            user_id,
            operation: operation.to_string(),
        }
    }

    /// Create a Persistence error
    pub fn persistence(user_id: UserId, operation: &str, source: StoreError) -> Self {
        LedgerError::Persistence {
            user_id,
            operation: operation.to_string(),
            source,
        }
    }

    /// Create a ConsistencyViolation error
    pub fn consistency_violation(user_id: UserId, sequence_id: SequenceId, attempts: u32) -> Self {
        LedgerError::ConsistencyViolation {
            user_id,
            sequence_id,
            attempts,
        }
    }

    /// Create an InvalidUserId error
    pub fn invalid_user_id(raw: &str) -> Self {
        LedgerError::InvalidUserId {
            raw: raw.to_string(),
        }
    }

    /// Whether this error signals a broken ledger invariant
    ///
    /// Fatal errors need operator intervention; every other variant leaves
    /// the ledger exactly as it was before the call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LedgerError::ConsistencyViolation { .. } | LedgerError::Aborted { .. }
        )
    }
}
