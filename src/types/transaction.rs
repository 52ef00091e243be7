//! Transaction-related types for the point ledger
//!
//! This module defines identifiers, the history record appended for every
//! committed charge or use, and the command shape fed to the ledger by the
//! replay driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identifier
///
/// Opaque, non-negative integer.
pub type UserId = u64;

/// Global history sequence identifier
///
/// Assigned by the history log at append time, starting at 1.
pub type SequenceId = u64;

/// Point quantity
///
/// Signed so that a negative request amount can be represented and rejected.
/// Stored balances are never negative.
pub type Points = i64;

/// Kind of balance mutation recorded in the history log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Points added to a balance
    Charge,

    /// Points spent from a balance
    ///
    /// Requires the balance to cover the full amount.
    Use,
}

impl TransactionType {
    /// Upper-case label used in logs and CSV output
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Charge => "CHARGE",
            TransactionType::Use => "USE",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Committed history entry
///
/// Immutable once appended. The amount is always positive; the direction is
/// carried by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Globally unique, strictly increasing in append order
    pub sequence_id: SequenceId,

    /// The affected user
    pub user_id: UserId,

    /// Magnitude of the mutation (> 0)
    pub amount: Points,

    /// Whether the points were charged or used
    pub kind: TransactionType,

    /// Time of the attempted mutation
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    /// Signed effect of this record on the user's balance
    pub fn signed_amount(&self) -> Points {
        match self.kind {
            TransactionType::Charge => self.amount,
            TransactionType::Use => -self.amount,
        }
    }
}

/// Ledger command as read from replay input
///
/// The amount is not validated here; non-positive amounts are left for the
/// engine to reject with `InvalidAmount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerCommand {
    /// Charge or use
    pub kind: TransactionType,

    /// Target user
    pub user_id: UserId,

    /// Requested amount, exactly as supplied
    pub amount: Points,
}
