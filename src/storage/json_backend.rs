use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use tracing::debug;
use uuid::Uuid;

use crate::errors::StorageError;
use crate::ledger::{Account, Budget, Category, RecurringTransaction, Transaction};
use crate::utils::persistence::write_atomic;

use super::{Collection, PersistenceAdapter, Record, StorageResult, Table, TransactionTable};

/// One collection mirrored to a JSON array on disk.
///
/// Every mutation rewrites the whole file atomically; the cached rows only change
/// once the write has landed.
#[derive(Debug)]
pub struct JsonTable<T> {
    path: PathBuf,
    rows: RwLock<Vec<T>>,
}

impl<T: Record> JsonTable<T> {
    pub fn open(path: PathBuf) -> StorageResult<Self> {
        let rows = if path.exists() {
            let data = fs::read_to_string(&path)?;
            if data.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            write_atomic(&path, "[]")?;
            Vec::new()
        };
        debug!(
            collection = %T::COLLECTION,
            records = rows.len(),
            path = %path.display(),
            "loaded json collection"
        );
        Ok(Self {
            path,
            rows: RwLock::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate<F>(&self, change: F) -> StorageResult<()>
    where
        F: FnOnce(&mut Vec<T>) -> StorageResult<()>,
    {
        let mut rows = self.rows.write().map_err(|_| StorageError::Poisoned)?;
        let mut next = rows.clone();
        change(&mut next)?;
        let json = serde_json::to_string_pretty(&next)?;
        write_atomic(&self.path, &json)?;
        *rows = next;
        Ok(())
    }
}

impl<T: Record> Table<T> for JsonTable<T> {
    fn get_all(&self) -> StorageResult<Vec<T>> {
        let rows = self.rows.read().map_err(|_| StorageError::Poisoned)?;
        Ok(rows.clone())
    }

    fn get(&self, id: Uuid) -> StorageResult<T> {
        let rows = self.rows.read().map_err(|_| StorageError::Poisoned)?;
        rows.iter()
            .find(|row| row.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound {
                collection: T::COLLECTION,
                id,
            })
    }

    fn add(&self, record: &T) -> StorageResult<()> {
        self.mutate(|rows| {
            if rows.iter().any(|row| row.id() == record.id()) {
                return Err(StorageError::Duplicate {
                    collection: T::COLLECTION,
                    id: record.id(),
                });
            }
            rows.push(record.clone());
            Ok(())
        })
    }

    fn update(&self, record: &T) -> StorageResult<()> {
        self.mutate(|rows| {
            match rows.iter_mut().find(|row| row.id() == record.id()) {
                Some(slot) => *slot = record.clone(),
                None => rows.push(record.clone()),
            }
            Ok(())
        })
    }

    fn delete(&self, id: Uuid) -> StorageResult<()> {
        {
            let rows = self.rows.read().map_err(|_| StorageError::Poisoned)?;
            if !rows.iter().any(|row| row.id() == id) {
                return Ok(());
            }
        }
        self.mutate(|rows| {
            rows.retain(|row| row.id() != id);
            Ok(())
        })
    }

    fn clear(&self) -> StorageResult<()> {
        self.mutate(|rows| {
            rows.clear();
            Ok(())
        })
    }
}

impl TransactionTable for JsonTable<Transaction> {}

/// File-backed adapter: one JSON document per collection under `root`.
#[derive(Debug)]
pub struct JsonStorage {
    root: PathBuf,
    accounts: JsonTable<Account>,
    categories: JsonTable<Category>,
    transactions: JsonTable<Transaction>,
    recurring: JsonTable<RecurringTransaction>,
    budgets: JsonTable<Budget>,
}

impl JsonStorage {
    /// Opens (creating if needed) the data directory and loads every collection.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let path_for = |collection: Collection| root.join(collection.file_name());
        Ok(Self {
            accounts: JsonTable::open(path_for(Collection::Accounts))?,
            categories: JsonTable::open(path_for(Collection::Categories))?,
            transactions: JsonTable::open(path_for(Collection::Transactions))?,
            recurring: JsonTable::open(path_for(Collection::RecurringTransactions))?,
            budgets: JsonTable::open(path_for(Collection::Budgets))?,
            root,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }
}

impl PersistenceAdapter for JsonStorage {
    fn accounts(&self) -> &dyn Table<Account> {
        &self.accounts
    }

    fn categories(&self) -> &dyn Table<Category> {
        &self.categories
    }

    fn transactions(&self) -> &dyn TransactionTable {
        &self.transactions
    }

    fn recurring_transactions(&self) -> &dyn Table<RecurringTransaction> {
        &self.recurring
    }

    fn budgets(&self) -> &dyn Table<Budget> {
        &self.budgets
    }
}
