//! Thread-safe in-memory balance store
//!
//! This module provides the `MemoryBalanceStore` struct, which keeps the
//! current balance of every user in a concurrent map.
//!
//! # Design
//!
//! The store uses `DashMap` (a concurrent HashMap) so that reads and writes for
//! different users never contend on a global lock. Each `get` or `set` is
//! atomic for its single key; the store makes no promise about sequences of
//! calls. Serializing read-modify-write cycles is the engine's job.

use crate::core::traits::BalanceStore;
use crate::types::{Points, StoreError, UserBalance, UserId};
use chrono::Utc;
use dashmap::DashMap;

/// In-memory balance store keyed by user id
#[derive(Debug)]
pub struct MemoryBalanceStore {
    /// Concurrent HashMap storing balances by user ID
    ///
    /// Only users that have been written appear here; reads of other users
    /// are answered with a fresh zero balance without inserting it.
    balances: DashMap<UserId, UserBalance>,
}

impl MemoryBalanceStore {
    /// Create a new empty MemoryBalanceStore
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }

    /// Number of users with a stored balance
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Whether no balance has been stored yet
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl Default for MemoryBalanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceStore for MemoryBalanceStore {
    /// Get a snapshot of a user's balance
    ///
    /// The returned value is a clone; concurrent writes after this call are
    /// not reflected in it.
    fn get(&self, user_id: UserId) -> UserBalance {
        self.balances
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| UserBalance::new(user_id))
    }

    fn set(&self, user_id: UserId, points: Points) -> Result<UserBalance, StoreError> {
        let balance = UserBalance {
            user_id,
            points,
            updated_at: Utc::now(),
        };
        self.balances.insert(user_id, balance.clone());
        Ok(balance)
    }

    fn all(&self) -> Vec<UserBalance> {
        self.balances
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_get_unknown_user_returns_zero_without_inserting() {
        let store = MemoryBalanceStore::new();

        let balance = store.get(1);

        assert_eq!(balance.user_id, 1);
        assert_eq!(balance.points, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_replaces_balance() {
        let store = MemoryBalanceStore::new();

        store.set(1, 5000).unwrap();
        let updated = store.set(1, 2000).unwrap();

        assert_eq!(updated.points, 2000);
        assert_eq!(store.get(1).points, 2000);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_advances_updated_at() {
        let store = MemoryBalanceStore::new();

        let first = store.set(1, 10).unwrap();
        let second = store.set(1, 20).unwrap();

        assert!(second.updated_at >= first.updated_at);
    }

    #[test]
    fn test_all_returns_every_stored_balance() {
        let store = MemoryBalanceStore::new();
        store.set(1, 10).unwrap();
        store.set(2, 20).unwrap();
        store.set(3, 30).unwrap();

        let mut all = store.all();
        all.sort_by_key(|balance| balance.user_id);

        let points: Vec<Points> = all.iter().map(|balance| balance.points).collect();
        assert_eq!(points, vec![10, 20, 30]);
    }

    #[test]
    fn test_concurrent_sets_different_users() {
        let store = Arc::new(MemoryBalanceStore::new());
        let mut handles = vec![];

        for i in 0u64..10 {
            let store_clone = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store_clone.set(i, (i as Points + 1) * 100).unwrap();
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 10);
        for i in 0u64..10 {
            assert_eq!(store.get(i).points, (i as Points + 1) * 100);
        }
    }
}
