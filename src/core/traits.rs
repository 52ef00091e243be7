//! Core traits for the storage collaborators of the ledger engine
//!
//! The engine depends only on these abstractions. Each store must provide
//! atomic single-key operations; no cross-store transaction is assumed.

use crate::types::{
    Points, SequenceId, StoreError, TransactionRecord, TransactionType, UserBalance, UserId,
};
use chrono::{DateTime, Utc};

/// Trait for holding the current balance of every user
///
/// Implementations must be safe to share across threads and tasks.
pub trait BalanceStore: Send + Sync {
    /// Get the balance for a user, or a zero balance for an unknown user
    fn get(&self, user_id: UserId) -> UserBalance;

    /// Replace the stored balance for a user
    fn set(&self, user_id: UserId, points: Points) -> Result<UserBalance, StoreError>;

    /// Get every stored balance, in arbitrary order
    fn all(&self) -> Vec<UserBalance>;
}

/// Trait for the append-only transaction history
///
/// Implementations must be safe to share across threads and tasks.
pub trait HistoryLog: Send + Sync {
    /// Append a record, assigning it the next global sequence id
    fn append(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionType,
        timestamp: DateTime<Utc>,
    ) -> Result<TransactionRecord, StoreError>;

    /// Remove a previously appended record
    ///
    /// Only used to compensate a mutation whose balance write failed.
    fn void(&self, sequence_id: SequenceId) -> Result<(), StoreError>;

    /// List a user's records in ascending sequence order
    fn list_by_user(&self, user_id: UserId) -> Vec<TransactionRecord>;

    /// Every user with at least one live record, in arbitrary order
    fn users(&self) -> Vec<UserId>;
}
