use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::RwLock,
};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::StorageError;
use crate::ledger::{Account, Budget, Category, RecurringTransaction, Transaction};

use super::{PersistenceAdapter, Record, StorageResult, Table, TransactionTable};

/// Volatile table that keeps records in insertion order.
#[derive(Debug)]
pub struct MemoryTable<T> {
    rows: RwLock<Vec<T>>,
}

impl<T> Default for MemoryTable<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Record> Table<T> for MemoryTable<T> {
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
        let mut rows = self.rows.write().map_err(|_| StorageError::Poisoned)?;
        if rows.iter().any(|row| row.id() == record.id()) {
            return Err(StorageError::Duplicate {
                collection: T::COLLECTION,
                id: record.id(),
            });
        }
        rows.push(record.clone());
        Ok(())
    }

    fn update(&self, record: &T) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| StorageError::Poisoned)?;
        match rows.iter_mut().find(|row| row.id() == record.id()) {
            Some(slot) => *slot = record.clone(),
            None => rows.push(record.clone()),
        }
        Ok(())
    }

    fn delete(&self, id: Uuid) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| StorageError::Poisoned)?;
        rows.retain(|row| row.id() != id);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| StorageError::Poisoned)?;
        rows.clear();
        Ok(())
    }
}

#[derive(Debug, Default)]
struct TransactionRows {
    order: Vec<Uuid>,
    records: HashMap<Uuid, Transaction>,
    by_account: HashMap<Uuid, HashSet<Uuid>>,
    by_category: HashMap<Uuid, HashSet<Uuid>>,
    by_date: BTreeMap<NaiveDate, HashSet<Uuid>>,
}

impl TransactionRows {
    fn index(&mut self, txn: &Transaction) {
        self.by_account
            .entry(txn.account_id)
            .or_default()
            .insert(txn.id);
        self.by_category
            .entry(txn.category_id)
            .or_default()
            .insert(txn.id);
        self.by_date.entry(txn.date).or_default().insert(txn.id);
    }

    fn unindex(&mut self, txn: &Transaction) {
        if let Some(ids) = self.by_account.get_mut(&txn.account_id) {
            ids.remove(&txn.id);
            if ids.is_empty() {
                self.by_account.remove(&txn.account_id);
            }
        }
        if let Some(ids) = self.by_category.get_mut(&txn.category_id) {
            ids.remove(&txn.id);
            if ids.is_empty() {
                self.by_category.remove(&txn.category_id);
            }
        }
        if let Some(ids) = self.by_date.get_mut(&txn.date) {
            ids.remove(&txn.id);
            if ids.is_empty() {
                self.by_date.remove(&txn.date);
            }
        }
    }

    fn insert(&mut self, txn: Transaction) {
        match self.records.remove(&txn.id) {
            Some(previous) => self.unindex(&previous),
            None => self.order.push(txn.id),
        }
        self.index(&txn);
        self.records.insert(txn.id, txn);
    }

    fn remove(&mut self, id: Uuid) {
        if let Some(previous) = self.records.remove(&id) {
            self.unindex(&previous);
            self.order.retain(|existing| *existing != id);
        }
    }

    /// Resolves ids to records, ordered by date then insertion.
    fn collect(&self, ids: Option<&HashSet<Uuid>>) -> Vec<Transaction> {
        let Some(ids) = ids else {
            return Vec::new();
        };
        let mut found: Vec<Transaction> = self
            .order
            .iter()
            .filter(|id| ids.contains(id))
            .filter_map(|id| self.records.get(id).cloned())
            .collect();
        found.sort_by_key(|txn| txn.date);
        found
    }
}

/// Volatile transactions table with account, category and date indexes.
#[derive(Debug, Default)]
pub struct MemoryTransactionTable {
    rows: RwLock<TransactionRows>,
}

impl Table<Transaction> for MemoryTransactionTable {
    fn get_all(&self) -> StorageResult<Vec<Transaction>> {
        let rows = self.rows.read().map_err(|_| StorageError::Poisoned)?;
        Ok(rows
            .order
            .iter()
            .filter_map(|id| rows.records.get(id).cloned())
            .collect())
    }

    fn get(&self, id: Uuid) -> StorageResult<Transaction> {
        let rows = self.rows.read().map_err(|_| StorageError::Poisoned)?;
        rows.records
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound {
                collection: Transaction::COLLECTION,
                id,
            })
    }

    fn add(&self, record: &Transaction) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| StorageError::Poisoned)?;
        if rows.records.contains_key(&record.id) {
            return Err(StorageError::Duplicate {
                collection: Transaction::COLLECTION,
                id: record.id,
            });
        }
        rows.insert(record.clone());
        Ok(())
    }

    fn update(&self, record: &Transaction) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| StorageError::Poisoned)?;
        rows.insert(record.clone());
        Ok(())
    }

    fn delete(&self, id: Uuid) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| StorageError::Poisoned)?;
        rows.remove(id);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| StorageError::Poisoned)?;
        *rows = TransactionRows::default();
        Ok(())
    }
}

impl TransactionTable for MemoryTransactionTable {
    fn by_account(&self, account_id: Uuid) -> StorageResult<Vec<Transaction>> {
        let rows = self.rows.read().map_err(|_| StorageError::Poisoned)?;
        Ok(rows.collect(rows.by_account.get(&account_id)))
    }

    fn by_category(&self, category_id: Uuid) -> StorageResult<Vec<Transaction>> {
        let rows = self.rows.read().map_err(|_| StorageError::Poisoned)?;
        Ok(rows.collect(rows.by_category.get(&category_id)))
    }

    fn by_date_range(&self, start: NaiveDate, end: NaiveDate) -> StorageResult<Vec<Transaction>> {
        if start > end {
            return Ok(Vec::new());
        }
        let rows = self.rows.read().map_err(|_| StorageError::Poisoned)?;
        let ids: HashSet<Uuid> = rows
            .by_date
            .range(start..=end)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        Ok(rows.collect(Some(&ids)))
    }
}

/// In-process adapter; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    accounts: MemoryTable<Account>,
    categories: MemoryTable<Category>,
    transactions: MemoryTransactionTable,
    recurring: MemoryTable<RecurringTransaction>,
    budgets: MemoryTable<Budget>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceAdapter for MemoryStorage {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AccountKind, CategoryKind, NewAccount, NewTransaction};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn txn(account: Uuid, category: Uuid, date: NaiveDate) -> Transaction {
        Transaction::from_new(
            NewTransaction::new(
                account,
                category,
                Decimal::TEN,
                CategoryKind::Expense,
                "test",
                date,
            ),
            Utc::now(),
        )
    }

    #[test]
    fn add_rejects_duplicates_and_get_reports_missing() {
        let storage = MemoryStorage::new();
        let account = Account::from_new(
            NewAccount::new("Checking", AccountKind::Checking, Decimal::ZERO),
            Utc::now(),
        );
        storage.accounts().add(&account).unwrap();
        assert!(matches!(
            storage.accounts().add(&account),
            Err(StorageError::Duplicate { .. })
        ));
        assert!(matches!(
            storage.accounts().get(Uuid::new_v4()),
            Err(StorageError::NotFound { .. })
        ));
        storage.accounts().delete(Uuid::new_v4()).unwrap();
        assert_eq!(storage.accounts().get_all().unwrap().len(), 1);
    }

    #[test]
    fn indexes_follow_updates_and_deletes() {
        let storage = MemoryStorage::new();
        let (a, b, cat) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let first = txn(a, cat, ymd(2024, 1, 5));
        let second = txn(a, cat, ymd(2024, 2, 5));
        storage.transactions().add(&first).unwrap();
        storage.transactions().add(&second).unwrap();
        assert_eq!(storage.transactions().by_account(a).unwrap().len(), 2);

        let moved = Transaction {
            account_id: b,
            date: ymd(2024, 3, 1),
            ..first.clone()
        };
        storage.transactions().update(&moved).unwrap();
        assert_eq!(storage.transactions().by_account(a).unwrap().len(), 1);
        assert_eq!(storage.transactions().by_account(b).unwrap()[0].id, first.id);

        let february = storage
            .transactions()
            .by_date_range(ymd(2024, 2, 1), ymd(2024, 2, 29))
            .unwrap();
        assert_eq!(february.len(), 1);
        assert_eq!(february[0].id, second.id);

        storage.transactions().delete(second.id).unwrap();
        assert!(storage.transactions().by_category(cat).unwrap().len() == 1);
        assert_eq!(storage.transactions().get_all().unwrap()[0].id, first.id);
    }

    #[test]
    fn emptied_index_entries_are_pruned() {
        let table = MemoryTransactionTable::default();
        let (account, category) = (Uuid::new_v4(), Uuid::new_v4());
        let only = txn(account, category, ymd(2024, 4, 1));
        table.add(&only).unwrap();
        table
            .update(&Transaction {
                account_id: Uuid::new_v4(),
                category_id: Uuid::new_v4(),
                ..only.clone()
            })
            .unwrap();
        {
            let rows = table.rows.read().unwrap();
            assert!(!rows.by_account.contains_key(&account));
            assert!(!rows.by_category.contains_key(&category));
        }

        table.delete(only.id).unwrap();
        let rows = table.rows.read().unwrap();
        assert!(rows.by_account.is_empty());
        assert!(rows.by_category.is_empty());
        assert!(rows.by_date.is_empty());
        assert!(rows.order.is_empty());
    }
}
