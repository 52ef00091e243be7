//! Concurrent mutation engine for the point ledger
//!
//! This module provides the `LedgerEngine`, which applies charge and use
//! requests to a balance store and a history log as one logical unit.
//!
//! # Design
//!
//! ```text
//! LedgerEngine
//!     ├── Arc<dyn BalanceStore>  (current balance per user)
//!     ├── Arc<dyn HistoryLog>    (append-only history)
//!     └── Arc<UserLocks>         (per-user exclusive sections)
//! ```
//!
//! A mutation validates its amount, takes the user's lease, then runs the
//! read-validate-append-write sequence on a spawned task that owns the lease.
//! The stores offer no joint transaction, so a failed balance write is undone
//! by voiding the history record that was just appended. If the void cannot
//! be completed within the configured number of attempts the engine reports a
//! `ConsistencyViolation` and logs it on the `point_ledger::consistency`
//! target.
//!
//! # Cancellation
//!
//! Dropping a `charge` or `use_points` future while it waits for the lease
//! applies nothing. Dropping it after the lease is taken detaches the caller,
//! but the spawned critical section still runs to completion (compensation
//! included) before the lease is released.
//!
//! # Thread Safety
//!
//! The engine is cheap to clone and every clone shares the same stores and
//! lock registry. Queries take no lease and may observe a history record whose
//! balance write is still in flight.

use crate::core::balance_store::MemoryBalanceStore;
use crate::core::history_log::MemoryHistoryLog;
use crate::core::traits::{BalanceStore, HistoryLog};
use crate::core::user_locks::UserLocks;
use crate::types::{
    LedgerError, Points, StoreError, TransactionRecord, TransactionType, UserBalance, UserId,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Log target for broken-invariant events
pub const CONSISTENCY_TARGET: &str = "point_ledger::consistency";

/// Engine tuning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of attempts to void a history record after a failed
    /// balance write
    pub compensation_attempts: u32,
    /// Pause between void attempts
    pub compensation_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            compensation_attempts: 5,
            compensation_backoff: Duration::from_millis(10),
        }
    }
}

impl EngineConfig {
    /// Create an EngineConfig, falling back to the default attempt count for zero
    pub fn new(compensation_attempts: u32, compensation_backoff: Duration) -> Self {
        let default = Self::default();

        let compensation_attempts = if compensation_attempts == 0 {
            warn!(
                requested = compensation_attempts,
                fallback = default.compensation_attempts,
                "invalid compensation_attempts, using default"
            );
            default.compensation_attempts
        } else {
            compensation_attempts
        };

        Self {
            compensation_attempts,
            compensation_backoff,
        }
    }
}

/// Per-user serialized ledger engine
///
/// Cloneable; clones share state.
#[derive(Clone)]
pub struct LedgerEngine {
    balances: Arc<dyn BalanceStore>,
    history: Arc<dyn HistoryLog>,
    locks: Arc<UserLocks>,
    config: EngineConfig,
}

impl std::fmt::Debug for LedgerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("locks", &self.locks)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LedgerEngine {
    /// Create an engine over the given stores
    pub fn new(
        balances: Arc<dyn BalanceStore>,
        history: Arc<dyn HistoryLog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            balances,
            history,
            locks: Arc::new(UserLocks::new()),
            config,
        }
    }

    /// Create an engine backed by fresh in-memory stores
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(
            Arc::new(MemoryBalanceStore::new()),
            Arc::new(MemoryHistoryLog::new()),
            config,
        )
    }

    /// Current balance of a user, zero if never mutated
    pub fn get_balance(&self, user_id: UserId) -> UserBalance {
        self.balances.get(user_id)
    }

    /// History of a user in ascending sequence order
    pub fn get_history(&self, user_id: UserId) -> Vec<TransactionRecord> {
        self.history.list_by_user(user_id)
    }

    /// Every stored balance, in arbitrary order
    pub fn all_balances(&self) -> Vec<UserBalance> {
        self.balances.all()
    }

    /// Every user with a history record, in arbitrary order
    pub fn history_users(&self) -> Vec<UserId> {
        self.history.users()
    }

    /// Number of users with an operation in flight or waiting
    pub fn active_users(&self) -> usize {
        self.locks.active_users()
    }

    /// Add points to a user's balance
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is not positive
    /// * `AmountOverflow` - the new balance would exceed the point range
    /// * `Persistence` - a store failed; nothing was left applied
    /// * `ConsistencyViolation` / `Aborted` - fatal, see [`LedgerError::is_fatal`]
    pub async fn charge(&self, user_id: UserId, amount: Points) -> Result<UserBalance, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(user_id, amount));
        }
        self.mutate(user_id, amount, TransactionType::Charge).await
    }

    /// Spend points from a user's balance
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is not positive
    /// * `InsufficientBalance` - the balance does not cover `amount`
    /// * `Persistence` - a store failed; nothing was left applied
    /// * `ConsistencyViolation` / `Aborted` - fatal, see [`LedgerError::is_fatal`]
    pub async fn use_points(
        &self,
        user_id: UserId,
        amount: Points,
    ) -> Result<UserBalance, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(user_id, amount));
        }
        self.mutate(user_id, amount, TransactionType::Use).await
    }

    /// Run one mutation inside the user's exclusive section
    async fn mutate(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionType,
    ) -> Result<UserBalance, LedgerError> {
        let lease = self.locks.acquire(user_id).await;

        let engine = self.clone();
        let task = tokio::spawn(async move {
            let result = engine.apply(lease.user_id(), amount, kind).await;
            drop(lease);
            result
        });

        match task.await {
            Ok(result) => result,
            Err(join_error) => {
                error!(
                    target: CONSISTENCY_TARGET,
                    user_id,
                    kind = %kind,
                    amount,
                    error = %join_error,
                    "critical section aborted, ledger state for user is unverified"
                );
                Err(LedgerError::Aborted { user_id })
            }
        }
    }

    /// Read, validate, append and write; caller holds the lease
    async fn apply(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionType,
    ) -> Result<UserBalance, LedgerError> {
        let attempted_at = Utc::now();
        let current = self.balances.get(user_id);

        let new_points = match kind {
            TransactionType::Charge => current
                .points
                .checked_add(amount)
                .ok_or_else(|| LedgerError::amount_overflow(user_id, "charge"))?,
            TransactionType::Use => {
                if current.points < amount {
                    return Err(LedgerError::insufficient_balance(
                        user_id,
                        current.points,
                        amount,
                    ));
                }
                current.points - amount
            }
        };

        let record = self
            .history
            .append(user_id, amount, kind, attempted_at)
            .map_err(|source| {
                warn!(user_id, kind = %kind, amount, error = %source, "history append failed");
                LedgerError::persistence(user_id, "history append", source)
            })?;

        match self.balances.set(user_id, new_points) {
            Ok(balance) => {
                debug!(
                    user_id,
                    kind = %kind,
                    amount,
                    sequence_id = record.sequence_id,
                    points = balance.points,
                    "mutation committed"
                );
                Ok(balance)
            }
            Err(source) => {
                warn!(
                    user_id,
                    sequence_id = record.sequence_id,
                    error = %source,
                    "balance write failed, voiding history record"
                );
                self.compensate(&record).await?;
                Err(LedgerError::persistence(user_id, "balance write", source))
            }
        }
    }

    /// Void a history record whose balance write failed
    ///
    /// A record that is already gone counts as voided.
    async fn compensate(&self, record: &TransactionRecord) -> Result<(), LedgerError> {
        let attempts = self.config.compensation_attempts;

        for attempt in 1..=attempts {
            match self.history.void(record.sequence_id) {
                Ok(()) | Err(StoreError::RecordNotFound { .. }) => return Ok(()),
                Err(source) => {
                    warn!(
                        user_id = record.user_id,
                        sequence_id = record.sequence_id,
                        attempt,
                        max_attempts = attempts,
                        error = %source,
                        "history void failed"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.config.compensation_backoff).await;
                    }
                }
            }
        }

        error!(
            target: CONSISTENCY_TARGET,
            user_id = record.user_id,
            sequence_id = record.sequence_id,
            kind = %record.kind,
            amount = record.amount,
            attempts,
            "dangling history record, operator intervention required"
        );
        Err(LedgerError::consistency_violation(
            record.user_id,
            record.sequence_id,
            attempts,
        ))
    }
}
