use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{LedgerError, Result};
use crate::ledger::{
    calendar::month_start,
    validation::{
        validate_balance, validate_budget_amount, validate_recurring, validate_transaction,
    },
    Account, AccountPatch, Budget, Category, CategoryPatch, Entity, Ledger, NewAccount,
    NewCategory, NewRecurringTransaction, NewTransaction, RecurringPatch, RecurringTransaction,
    Transaction, TransactionPatch,
};
use crate::storage::{ledger_warnings, PersistenceAdapter};

use super::balance::BalanceAdjuster;
use super::clock::{Clock, SystemClock};
use super::journal::Journal;
use super::scheduler::{RecurringScheduler, SchedulerReport};

/// Outcome of firing one recurring schedule once.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub transaction: Transaction,
    pub next_date: NaiveDate,
}

/// Single source of truth for accounts, categories, transactions, schedules and budgets.
///
/// Every mutation holds the write lock for its whole duration, persists through the
/// adapter, and only then becomes visible to readers.
pub struct LedgerStore {
    state: RwLock<Ledger>,
    adapter: Box<dyn PersistenceAdapter>,
    clock: Arc<dyn Clock>,
}

impl LedgerStore {
    pub fn new(adapter: Box<dyn PersistenceAdapter>) -> Self {
        Self::with_clock(adapter, Arc::new(SystemClock))
    }

    pub fn with_clock(adapter: Box<dyn PersistenceAdapter>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(Ledger::default()),
            adapter,
            clock,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn adapter(&self) -> &dyn PersistenceAdapter {
        self.adapter.as_ref()
    }

    /// Replaces in-memory state with the adapter's collections.
    pub fn load(&self) -> Result<()> {
        let loaded = self.adapter.load_all()?;
        let mut state = self.write()?;
        *state = loaded;
        info!(
            "loaded ledger: {} accounts, {} categories, {} transactions, {} recurring, {} budgets",
            state.accounts.len(),
            state.categories.len(),
            state.transactions.len(),
            state.recurring_transactions.len(),
            state.budgets.len()
        );
        for warning in ledger_warnings(&state) {
            warn!("{}", warning);
        }
        Ok(())
    }

    /// Loads all collections, then runs `scheduler` once for `clock.today()`.
    pub fn initialize(&self, scheduler: &RecurringScheduler) -> Result<SchedulerReport> {
        self.load()?;
        let today = self.clock.today();
        let report = scheduler.tick(self, today)?;
        info!(
            "initialized ledger for {}: {} recurring transaction(s) materialized, {} skipped",
            today,
            report.created.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Ledger>> {
        self.state.read().map_err(|_| LedgerError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>> {
        self.state.write().map_err(|_| LedgerError::Poisoned)
    }

    /// Runs `build` against committed state under the write lock and commits its journal.
    pub(crate) fn transact<T, F>(&self, build: F) -> Result<T>
    where
        F: FnOnce(&Ledger, DateTime<Utc>, &mut Journal) -> Result<T>,
    {
        let mut state = self.write()?;
        let now = self.clock.now();
        let mut journal = Journal::new();
        let value = build(&state, now, &mut journal)?;
        if !journal.is_empty() {
            journal.commit(self.adapter.as_ref(), &mut state)?;
        }
        Ok(value)
    }

    // ----- accounts -----

    pub fn add_account(&self, input: NewAccount) -> Result<Account> {
        validate_balance(input.balance)?;
        if let Some(goal) = input.goal_amount {
            validate_balance(goal)?;
        }
        self.transact(|_, now, journal| {
            let account = Account::from_new(input, now);
            journal.insert(Entity::Account(account.clone()));
            debug!("adding account {} ({})", account.name, account.id);
            Ok(account)
        })
    }

    pub fn update_account(&self, id: Uuid, patch: AccountPatch) -> Result<Account> {
        if let Some(balance) = patch.balance {
            validate_balance(balance)?;
        }
        if let Some(Some(goal)) = patch.goal_amount {
            validate_balance(goal)?;
        }
        self.transact(|state, now, journal| {
            let current = state
                .account(id)
                .ok_or_else(|| LedgerError::not_found("account", id))?;
            let next = current.patched(patch, now);
            journal.update(Entity::Account(current.clone()), Entity::Account(next.clone()));
            Ok(next)
        })
    }

    /// Removes the account. Its transactions stay behind as orphans.
    pub fn delete_account(&self, id: Uuid) -> Result<()> {
        self.transact(|state, _, journal| {
            let current = state
                .account(id)
                .ok_or_else(|| LedgerError::not_found("account", id))?;
            journal.remove(Entity::Account(current.clone()));
            Ok(())
        })
    }

    // ----- categories -----

    pub fn add_category(&self, input: NewCategory) -> Result<Category> {
        self.transact(|_, now, journal| {
            let category = Category::from_new(input, now);
            journal.insert(Entity::Category(category.clone()));
            Ok(category)
        })
    }

    pub fn update_category(&self, id: Uuid, patch: CategoryPatch) -> Result<Category> {
        self.transact(|state, _, journal| {
            let current = state
                .category(id)
                .ok_or_else(|| LedgerError::not_found("category", id))?;
            let next = current.patched(patch);
            journal.update(
                Entity::Category(current.clone()),
                Entity::Category(next.clone()),
            );
            Ok(next)
        })
    }

    pub fn delete_category(&self, id: Uuid) -> Result<()> {
        self.transact(|state, _, journal| {
            let current = state
                .category(id)
                .ok_or_else(|| LedgerError::not_found("category", id))?;
            journal.remove(Entity::Category(current.clone()));
            Ok(())
        })
    }

    // ----- transactions -----

    pub fn add_transaction(&self, input: NewTransaction) -> Result<Transaction> {
        self.transact(|state, now, journal| stage_new_transaction(state, input, now, journal))
    }

    /// Merges `patch`; a change to amount, type or account reverts the old effect
    /// before applying the new one.
    pub fn update_transaction(&self, id: Uuid, patch: TransactionPatch) -> Result<Transaction> {
        self.transact(|state, now, journal| {
            let current = state
                .transaction(id)
                .ok_or_else(|| LedgerError::not_found("transaction", id))?;
            let next = current.patched(patch, now);
            validate_transaction(state, &next)?;
            journal.update(
                Entity::Transaction(current.clone()),
                Entity::Transaction(next.clone()),
            );
            if current.balance_effect_differs(&next) {
                let mut balances = BalanceAdjuster::new(state, now);
                balances.revert(current)?;
                balances.apply(&next)?;
                balances.stage(journal);
            }
            Ok(next)
        })
    }

    /// Deleting an unknown id is a no-op.
    pub fn delete_transaction(&self, id: Uuid) -> Result<()> {
        self.transact(|state, now, journal| {
            let Some(current) = state.transaction(id) else {
                debug!("transaction {} not found; nothing to delete", id);
                return Ok(());
            };
            let mut balances = BalanceAdjuster::new(state, now);
            balances.revert(current)?;
            balances.stage(journal);
            journal.remove(Entity::Transaction(current.clone()));
            Ok(())
        })
    }

    // ----- recurring schedules -----

    pub fn add_recurring(&self, input: NewRecurringTransaction) -> Result<RecurringTransaction> {
        self.transact(|state, now, journal| {
            let schedule = RecurringTransaction::from_new(input, now);
            validate_recurring(state, &schedule)?;
            journal.insert(Entity::Recurring(schedule.clone()));
            Ok(schedule)
        })
    }

    pub fn update_recurring(
        &self,
        id: Uuid,
        patch: RecurringPatch,
    ) -> Result<RecurringTransaction> {
        self.transact(|state, now, journal| {
            let current = state
                .recurring(id)
                .ok_or_else(|| LedgerError::not_found("recurring transaction", id))?;
            let next = current.patched(patch, now);
            validate_recurring(state, &next)?;
            journal.update(
                Entity::Recurring(current.clone()),
                Entity::Recurring(next.clone()),
            );
            Ok(next)
        })
    }

    pub fn delete_recurring(&self, id: Uuid) -> Result<()> {
        self.transact(|state, _, journal| {
            if let Some(current) = state.recurring(id) {
                journal.remove(Entity::Recurring(current.clone()));
            }
            Ok(())
        })
    }

    /// Fires schedule `id` once if it is active and due on `today`.
    ///
    /// The generated transaction, its balance effect and the advanced `next_date` are
    /// written as one unit. Returns `None` when nothing was due.
    pub fn materialize_occurrence(&self, id: Uuid, today: NaiveDate) -> Result<Option<Occurrence>> {
        self.transact(|state, now, journal| {
            let Some(schedule) = state.recurring(id) else {
                return Ok(None);
            };
            if !schedule.is_due(today) {
                return Ok(None);
            }
            let next_date = schedule.frequency.advance(schedule.next_date).ok_or_else(|| {
                LedgerError::validation(format!(
                    "recurring transaction {} cannot advance past {}",
                    schedule.id, schedule.next_date
                ))
            })?;
            let transaction = stage_new_transaction(state, schedule.occurrence(), now, journal)?;
            let mut advanced = schedule.clone();
            advanced.next_date = next_date;
            advanced.updated_at = now;
            journal.update(Entity::Recurring(schedule.clone()), Entity::Recurring(advanced));
            Ok(Some(Occurrence {
                transaction,
                next_date,
            }))
        })
    }

    // ----- budgets -----

    /// Upserts the budget for (`category_id`, month). `month` defaults to the current month.
    pub fn set_budget(
        &self,
        category_id: Uuid,
        amount: Decimal,
        month: Option<NaiveDate>,
    ) -> Result<Budget> {
        validate_budget_amount(amount)?;
        let month = month_start(month.unwrap_or_else(|| self.clock.today()));
        self.transact(|state, now, journal| match state.budget_for(category_id, month) {
            Some(existing) => {
                let mut next = existing.clone();
                next.amount = amount;
                next.month = month;
                next.updated_at = now;
                journal.update(Entity::Budget(existing.clone()), Entity::Budget(next.clone()));
                Ok(next)
            }
            None => {
                let budget = Budget::new(category_id, amount, month, now);
                journal.insert(Entity::Budget(budget.clone()));
                Ok(budget)
            }
        })
    }

    pub fn delete_budget(&self, id: Uuid) -> Result<()> {
        self.transact(|state, _, journal| {
            if let Some(current) = state.budget(id) {
                journal.remove(Entity::Budget(current.clone()));
            }
            Ok(())
        })
    }

    // ----- reads -----

    pub fn snapshot(&self) -> Result<Ledger> {
        Ok(self.read()?.clone())
    }

    pub fn accounts(&self) -> Result<Vec<Account>> {
        Ok(self.read()?.accounts.clone())
    }

    pub fn account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.read()?.account(id).cloned())
    }

    pub fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.read()?.categories.clone())
    }

    pub fn category(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.read()?.category(id).cloned())
    }

    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.read()?.transactions.clone())
    }

    pub fn transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
        Ok(self.read()?.transaction(id).cloned())
    }

    pub fn transactions_for_account(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        Ok(self.read()?.transactions_for_account(account_id))
    }

    pub fn recurring_transactions(&self) -> Result<Vec<RecurringTransaction>> {
        Ok(self.read()?.recurring_transactions.clone())
    }

    pub fn recurring(&self, id: Uuid) -> Result<Option<RecurringTransaction>> {
        Ok(self.read()?.recurring(id).cloned())
    }

    pub fn budgets(&self) -> Result<Vec<Budget>> {
        Ok(self.read()?.budgets.clone())
    }

    pub fn budget_for(&self, category_id: Uuid, month: NaiveDate) -> Result<Option<Budget>> {
        Ok(self.read()?.budget_for(category_id, month).cloned())
    }
}

/// Validates and stages a new transaction together with its balance effect.
fn stage_new_transaction(
    state: &Ledger,
    input: NewTransaction,
    now: DateTime<Utc>,
    journal: &mut Journal,
) -> Result<Transaction> {
    let txn = Transaction::from_new(input, now);
    validate_transaction(state, &txn)?;
    journal.insert(Entity::Transaction(txn.clone()));
    let mut balances = BalanceAdjuster::new(state, now);
    balances.apply(&txn)?;
    balances.stage(journal);
    Ok(txn)
}
