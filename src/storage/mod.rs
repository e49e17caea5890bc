//! Persistence adapters: one table per collection behind a common trait.

pub mod json_backend;
pub mod memory;

use std::{collections::HashSet, fmt};

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::errors::StorageError;
use crate::ledger::{Account, Budget, Category, Ledger, RecurringTransaction, Transaction};

pub use json_backend::JsonStorage;
pub use memory::MemoryStorage;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// The five persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Accounts,
    Categories,
    Transactions,
    RecurringTransactions,
    Budgets,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Accounts,
        Collection::Categories,
        Collection::Transactions,
        Collection::RecurringTransactions,
        Collection::Budgets,
    ];

    /// Name used for files and export keys.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Accounts => "accounts",
            Collection::Categories => "categories",
            Collection::Transactions => "transactions",
            Collection::RecurringTransactions => "recurringTransactions",
            Collection::Budgets => "budgets",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.name())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record that lives in exactly one collection and is keyed by id.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> Uuid;
}

impl Record for Account {
    const COLLECTION: Collection = Collection::Accounts;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Category {
    const COLLECTION: Collection = Collection::Categories;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Transaction {
    const COLLECTION: Collection = Collection::Transactions;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for RecurringTransaction {
    const COLLECTION: Collection = Collection::RecurringTransactions;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Budget {
    const COLLECTION: Collection = Collection::Budgets;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Durable CRUD over one collection.
pub trait Table<T: Record>: Send + Sync {
    fn get_all(&self) -> StorageResult<Vec<T>>;

    /// Fails with [`StorageError::NotFound`] when `id` is absent.
    fn get(&self, id: Uuid) -> StorageResult<T>;

    /// Fails with [`StorageError::Duplicate`] when the id already exists.
    fn add(&self, record: &T) -> StorageResult<()>;

    /// Upsert by id.
    fn update(&self, record: &T) -> StorageResult<()>;

    /// Removing an absent id is a no-op.
    fn delete(&self, id: Uuid) -> StorageResult<()>;

    fn clear(&self) -> StorageResult<()>;
}

/// The transactions table adds secondary lookups.
pub trait TransactionTable: Table<Transaction> {
    fn by_account(&self, account_id: Uuid) -> StorageResult<Vec<Transaction>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|txn| txn.account_id == account_id)
            .collect())
    }

    fn by_category(&self, category_id: Uuid) -> StorageResult<Vec<Transaction>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|txn| txn.category_id == category_id)
            .collect())
    }

    /// Transactions dated within `[start, end]`, inclusive.
    fn by_date_range(&self, start: NaiveDate, end: NaiveDate) -> StorageResult<Vec<Transaction>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|txn| txn.date >= start && txn.date <= end)
            .collect())
    }
}

/// Abstraction over persistence backends holding the five ledger collections.
pub trait PersistenceAdapter: Send + Sync {
    fn accounts(&self) -> &dyn Table<Account>;
    fn categories(&self) -> &dyn Table<Category>;
    fn transactions(&self) -> &dyn TransactionTable;
    fn recurring_transactions(&self) -> &dyn Table<RecurringTransaction>;
    fn budgets(&self) -> &dyn Table<Budget>;

    /// Reads every collection into a fresh [`Ledger`].
    fn load_all(&self) -> StorageResult<Ledger> {
        Ok(Ledger {
            accounts: self.accounts().get_all()?,
            categories: self.categories().get_all()?,
            transactions: self.transactions().get_all()?,
            recurring_transactions: self.recurring_transactions().get_all()?,
            budgets: self.budgets().get_all()?,
        })
    }
}

/// Detects dangling references within a ledger snapshot.
pub fn ledger_warnings(ledger: &Ledger) -> Vec<String> {
    let account_ids: HashSet<_> = ledger.accounts.iter().map(|a| a.id).collect();
    let category_ids: HashSet<_> = ledger.categories.iter().map(|c| c.id).collect();
    let recurring_ids: HashSet<_> = ledger
        .recurring_transactions
        .iter()
        .map(|r| r.id)
        .collect();
    let mut warnings = Vec::new();

    for txn in &ledger.transactions {
        if !account_ids.contains(&txn.account_id) {
            warnings.push(format!(
                "transaction {} references unknown account {}",
                txn.id, txn.account_id
            ));
        }
        if !category_ids.contains(&txn.category_id) {
            warnings.push(format!(
                "transaction {} references missing category {}",
                txn.id, txn.category_id
            ));
        }
        if let Some(schedule) = txn.recurring_transaction_id {
            if !recurring_ids.contains(&schedule) {
                warnings.push(format!(
                    "transaction {} references removed recurring schedule {}",
                    txn.id, schedule
                ));
            }
        }
    }
    for schedule in &ledger.recurring_transactions {
        if !account_ids.contains(&schedule.account_id) {
            warnings.push(format!(
                "recurring schedule {} references unknown account {}",
                schedule.id, schedule.account_id
            ));
        }
        if !category_ids.contains(&schedule.category_id) {
            warnings.push(format!(
                "recurring schedule {} references missing category {}",
                schedule.id, schedule.category_id
            ));
        }
    }
    for budget in &ledger.budgets {
        if !category_ids.contains(&budget.category_id) {
            warnings.push(format!(
                "budget {} references missing category {}",
                budget.id, budget.category_id
            ));
        }
    }
    warnings
}
