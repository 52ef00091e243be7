//! Balance-related types for the point ledger
//!
//! This module defines the UserBalance record held by the balance store.

use super::transaction::{Points, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current point balance of a single user
///
/// Implicitly exists for every user id: reading an unknown user yields a
/// zero balance rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBalance {
    /// The user this balance belongs to
    pub user_id: UserId,

    /// Current points, never negative
    pub points: Points,

    /// Time of the last mutation
    ///
    /// For a never-mutated user this is the time of the read.
    pub updated_at: DateTime<Utc>,
}

impl UserBalance {
    /// Create a zero balance for the given user
    pub fn new(user_id: UserId) -> Self {
        UserBalance {
            user_id,
            points: 0,
            updated_at: Utc::now(),
        }
    }
}
