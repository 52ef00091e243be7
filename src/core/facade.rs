//! Caller-facing entry points to the ledger
//!
//! `LedgerFacade` accepts raw caller input, checks its shape and hands the
//! typed request to the `LedgerEngine`. It adds no behavior of its own.

use crate::core::engine::LedgerEngine;
use crate::types::{
    LedgerCommand, LedgerError, Points, TransactionRecord, TransactionType, UserBalance, UserId,
};
use std::collections::BTreeSet;

/// Pass-through facade over a `LedgerEngine`
#[derive(Debug, Clone)]
pub struct LedgerFacade {
    engine: LedgerEngine,
}

impl LedgerFacade {
    /// Wrap an engine
    pub fn new(engine: LedgerEngine) -> Self {
        Self { engine }
    }

    /// Parse a raw user id
    ///
    /// # Arguments
    ///
    /// * `raw` - Caller-supplied text; surrounding whitespace is ignored
    ///
    /// # Returns
    ///
    /// * `Ok(UserId)` - `raw` is a non-negative integer
    /// * `Err(LedgerError::InvalidUserId)` - anything else
    pub fn parse_user_id(raw: &str) -> Result<UserId, LedgerError> {
        raw.trim()
            .parse::<UserId>()
            .map_err(|_| LedgerError::invalid_user_id(raw))
    }

    /// Balance query for a raw user id
    pub fn balance(&self, raw_user: &str) -> Result<UserBalance, LedgerError> {
        let user_id = Self::parse_user_id(raw_user)?;
        Ok(self.engine.get_balance(user_id))
    }

    /// History query for a raw user id
    pub fn history(&self, raw_user: &str) -> Result<Vec<TransactionRecord>, LedgerError> {
        let user_id = Self::parse_user_id(raw_user)?;
        Ok(self.engine.get_history(user_id))
    }

    /// Charge command for a raw user id
    pub async fn charge(&self, raw_user: &str, amount: Points) -> Result<UserBalance, LedgerError> {
        let user_id = Self::parse_user_id(raw_user)?;
        self.engine.charge(user_id, amount).await
    }

    /// Use command for a raw user id
    pub async fn use_points(
        &self,
        raw_user: &str,
        amount: Points,
    ) -> Result<UserBalance, LedgerError> {
        let user_id = Self::parse_user_id(raw_user)?;
        self.engine.use_points(user_id, amount).await
    }

    /// Run an already parsed command
    pub async fn execute(&self, command: &LedgerCommand) -> Result<UserBalance, LedgerError> {
        match command.kind {
            TransactionType::Charge => self.engine.charge(command.user_id, command.amount).await,
            TransactionType::Use => {
                self.engine
                    .use_points(command.user_id, command.amount)
                    .await
            }
        }
    }

    /// Every stored balance, sorted by user id
    pub fn balances(&self) -> Vec<UserBalance> {
        let mut balances = self.engine.all_balances();
        balances.sort_by_key(|balance| balance.user_id);
        balances
    }

    /// Every user's history, sorted by user id then sequence id
    ///
    /// Users are taken from both stores, so a record left dangling by a
    /// `ConsistencyViolation` is listed even when its user has no balance.
    pub fn histories(&self) -> Vec<TransactionRecord> {
        let user_ids: BTreeSet<UserId> = self
            .engine
            .all_balances()
            .iter()
            .map(|balance| balance.user_id)
            .chain(self.engine.history_users())
            .collect();

        user_ids
            .into_iter()
            .flat_map(|user_id| self.engine.get_history(user_id))
            .collect()
    }
}
