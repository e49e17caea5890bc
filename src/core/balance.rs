use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{LedgerError, Result};
use crate::ledger::{validation::MAX_AMOUNT, Account, Entity, Ledger, Transaction};

use super::journal::Journal;

/// Stages balance deltas against copies of the affected accounts.
///
/// Deltas on the same account accumulate; accounts that no longer exist are skipped.
/// A balance pushed past [`MAX_AMOUNT`] in either direction is a validation error.
pub(crate) struct BalanceAdjuster<'a> {
    ledger: &'a Ledger,
    now: DateTime<Utc>,
    staged: BTreeMap<Uuid, (Account, Account)>,
}

impl<'a> BalanceAdjuster<'a> {
    pub(crate) fn new(ledger: &'a Ledger, now: DateTime<Utc>) -> Self {
        Self {
            ledger,
            now,
            staged: BTreeMap::new(),
        }
    }

    pub(crate) fn shift(&mut self, account_id: Uuid, delta: Decimal) -> Result<()> {
        let (before, mut after) = match self.staged.remove(&account_id) {
            Some(pair) => pair,
            None => match self.ledger.account(account_id) {
                Some(account) => (account.clone(), account.clone()),
                None => {
                    debug!(
                        "account {} not found; skipping balance delta {}",
                        account_id, delta
                    );
                    return Ok(());
                }
            },
        };
        let balance = after
            .balance
            .checked_add(delta)
            .filter(|balance| balance.abs() <= MAX_AMOUNT)
            .ok_or_else(|| {
                LedgerError::validation(format!(
                    "balance of account {} would leave the accepted range applying {}",
                    account_id, delta
                ))
            })?;
        after.balance = balance;
        after.updated_at = self.now;
        self.staged.insert(account_id, (before, after));
        Ok(())
    }

    /// Applies the effect of a newly recorded transaction.
    pub(crate) fn apply(&mut self, txn: &Transaction) -> Result<()> {
        self.shift(txn.account_id, txn.signed_amount())
    }

    /// Undoes the effect of a transaction that is being changed or removed.
    pub(crate) fn revert(&mut self, txn: &Transaction) -> Result<()> {
        self.shift(txn.account_id, -txn.signed_amount())
    }

    /// Appends one account update per account whose balance actually moved.
    pub(crate) fn stage(self, journal: &mut Journal) {
        for (_, (before, after)) in self.staged {
            if before.balance != after.balance {
                journal.update(Entity::Account(before), Entity::Account(after));
            }
        }
    }
}
