//! Per-user serialization for ledger mutations
//!
//! This module provides the `UserLocks` registry, which hands out an exclusive
//! `UserLease` per user id.
//!
//! # Design
//!
//! Each user id maps to an `Arc<tokio::sync::Mutex<()>>` slot in a `DashMap`.
//! A lease owns the mutex guard, so it can be moved into a spawned task and
//! outlive the caller's future. Slots are created on first use and removed
//! once no lease or waiter references them, so the registry only holds users
//! with in-flight or queued operations.
//!
//! # Thread Safety
//!
//! Operations on different users never wait on each other beyond the brief
//! shard lock taken while looking up a slot. Waiting for a busy user suspends
//! only the calling task.
//!
//! Mutual exclusion is the only guarantee; waiters for the same user are not
//! promised FIFO service.

use crate::types::UserId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Slot = Arc<Mutex<()>>;

/// Registry of per-user exclusive sections
#[derive(Debug, Default)]
pub struct UserLocks {
    slots: DashMap<UserId, Slot>,
}

impl UserLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Acquire the exclusive section for a user
    ///
    /// Suspends until every earlier lease for the same user is released.
    /// Cancelling the returned future while it waits leaves nothing held.
    pub async fn acquire(self: &Arc<Self>, user_id: UserId) -> UserLease {
        // Clone under the shard lock so reclamation can never race the lookup.
        let slot = Arc::clone(self.slots.entry(user_id).or_default().value());

        // Declared before the await so a cancelled wait drops the slot first.
        let mut waiter = PendingAcquire {
            registry: Arc::clone(self),
            user_id,
            armed: true,
        };
        let guard = slot.lock_owned().await;
        waiter.armed = false;

        UserLease {
            registry: Arc::clone(self),
            user_id,
            guard: Some(guard),
        }
    }

    /// Number of users with an in-flight or waiting operation
    pub fn active_users(&self) -> usize {
        self.slots.len()
    }

    /// Drop the slot for a user when nothing else references it
    fn reclaim(&self, user_id: UserId) {
        self.slots
            .remove_if(&user_id, |_, slot| Arc::strong_count(slot) == 1);
    }
}

/// Exclusive access to one user's ledger entries
///
/// Released on drop, on every exit path.
#[derive(Debug)]
pub struct UserLease {
    registry: Arc<UserLocks>,
    user_id: UserId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl UserLease {
    /// The user this lease covers
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

impl Drop for UserLease {
    fn drop(&mut self) {
        // Release the mutex first so its Arc no longer counts towards the slot.
        drop(self.guard.take());
        self.registry.reclaim(self.user_id);
    }
}

/// Reclaims the slot of an acquire that was cancelled while waiting
struct PendingAcquire {
    registry: Arc<UserLocks>,
    user_id: UserId,
    armed: bool,
}

impl Drop for PendingAcquire {
    fn drop(&mut self) {
        if self.armed {
            self.registry.reclaim(self.user_id);
        }
    }
}
