//! Thread-safe in-memory history log
//!
//! This module provides the `MemoryHistoryLog` struct, the append-only record
//! of every committed charge and use.
//!
//! # Design
//!
//! Records live in a per-user `DashMap` bucket, with a second map from
//! sequence id to owning user so that a compensating `void` can find the
//! record without scanning every user. The global cursor is advanced while
//! the user's bucket is held, so each bucket is always sorted by sequence id.

use crate::core::traits::HistoryLog;
use crate::types::{
    Points, SequenceId, StoreError, TransactionRecord, TransactionType, UserId,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory append-only history log
#[derive(Debug)]
pub struct MemoryHistoryLog {
    /// Records per user in ascending sequence order
    records: DashMap<UserId, Vec<TransactionRecord>>,

    /// Owning user of every live record
    owners: DashMap<SequenceId, UserId>,

    /// Next sequence id to hand out
    cursor: AtomicU64,
}

impl MemoryHistoryLog {
    /// Create a new empty MemoryHistoryLog
    ///
    /// The first appended record receives sequence id 1.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            owners: DashMap::new(),
            cursor: AtomicU64::new(1),
        }
    }

    /// Number of live records across all users
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether the log holds no live records
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl Default for MemoryHistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLog for MemoryHistoryLog {
    fn append(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionType,
        timestamp: DateTime<Utc>,
    ) -> Result<TransactionRecord, StoreError> {
        let mut bucket = self.records.entry(user_id).or_default();

        // Sequence assignment happens under the bucket lock.
        let sequence_id = self.cursor.fetch_add(1, Ordering::SeqCst);
        let record = TransactionRecord {
            sequence_id,
            user_id,
            amount,
            kind,
            timestamp,
        };
        bucket.push(record.clone());
        self.owners.insert(sequence_id, user_id);

        Ok(record)
    }

    fn void(&self, sequence_id: SequenceId) -> Result<(), StoreError> {
        let (_, user_id) = self
            .owners
            .remove(&sequence_id)
            .ok_or(StoreError::RecordNotFound { sequence_id })?;

        if let Some(mut bucket) = self.records.get_mut(&user_id) {
            bucket.retain(|record| record.sequence_id != sequence_id);
        }

        Ok(())
    }

    fn list_by_user(&self, user_id: UserId) -> Vec<TransactionRecord> {
        self.records
            .get(&user_id)
            .map(|bucket| bucket.value().clone())
            .unwrap_or_default()
    }

    fn users(&self) -> Vec<UserId> {
        self.records
            .iter()
            .filter(|bucket| !bucket.value().is_empty())
            .map(|bucket| *bucket.key())
            .collect()
    }
}
