#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;
use wealthtrack_core::{
    core::{FixedClock, LedgerStore},
    errors::StorageError,
    ledger::{Account, Budget, Category, RecurringTransaction},
    storage::{
        memory::{MemoryTable, MemoryTransactionTable},
        JsonStorage, MemoryStorage, PersistenceAdapter, Record, StorageResult, Table,
        TransactionTable,
    },
};

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn dollars(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Creates a unique directory that outlives the calling test.
pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn memory_store(today: NaiveDate) -> (LedgerStore, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::on(today));
    let store = LedgerStore::with_clock(Box::new(MemoryStorage::new()), clock.clone());
    (store, clock)
}

pub fn json_store(dir: &Path, today: NaiveDate) -> LedgerStore {
    let storage = JsonStorage::open(dir).expect("open json storage");
    LedgerStore::with_clock(Box::new(storage), Arc::new(FixedClock::on(today)))
}

/// Deterministic pseudo-random sequence for long operation runs.
pub struct Sequence(u64);

impl Sequence {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

/// Shared switch that makes exactly one upcoming write fail.
#[derive(Debug, Default)]
pub struct Faults {
    remaining: Mutex<Option<usize>>,
    writes: Mutex<usize>,
}

impl Faults {
    /// Lets `successes` writes through, then fails the next one.
    pub fn fail_after(&self, successes: usize) {
        *self.remaining.lock().expect("faults lock") = Some(successes);
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().expect("faults lock")
    }

    fn check(&self) -> StorageResult<()> {
        *self.writes.lock().expect("faults lock") += 1;
        let mut remaining = self.remaining.lock().expect("faults lock");
        match *remaining {
            Some(0) => {
                *remaining = None;
                Err(StorageError::Backend("injected write failure".into()))
            }
            Some(left) => {
                *remaining = Some(left - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

pub struct FlakyTable<Tbl> {
    inner: Tbl,
    faults: Arc<Faults>,
}

impl<T: Record, Tbl: Table<T>> Table<T> for FlakyTable<Tbl> {
    fn get_all(&self) -> StorageResult<Vec<T>> {
        self.inner.get_all()
    }

    fn get(&self, id: Uuid) -> StorageResult<T> {
        self.inner.get(id)
    }

    fn add(&self, record: &T) -> StorageResult<()> {
        self.faults.check()?;
        self.inner.add(record)
    }

    fn update(&self, record: &T) -> StorageResult<()> {
        self.faults.check()?;
        self.inner.update(record)
    }

    fn delete(&self, id: Uuid) -> StorageResult<()> {
        self.faults.check()?;
        self.inner.delete(id)
    }

    fn clear(&self) -> StorageResult<()> {
        self.faults.check()?;
        self.inner.clear()
    }
}

impl TransactionTable for FlakyTable<MemoryTransactionTable> {}

/// In-memory adapter whose writes can be made to fail on demand.
pub struct FlakyStorage {
    accounts: FlakyTable<MemoryTable<Account>>,
    categories: FlakyTable<MemoryTable<Category>>,
    transactions: FlakyTable<MemoryTransactionTable>,
    recurring: FlakyTable<MemoryTable<RecurringTransaction>>,
    budgets: FlakyTable<MemoryTable<Budget>>,
}

impl FlakyStorage {
    pub fn new() -> (Self, Arc<Faults>) {
        let faults = Arc::new(Faults::default());
        let storage = Self {
            accounts: FlakyTable {
                inner: MemoryTable::default(),
                faults: faults.clone(),
            },
            categories: FlakyTable {
                inner: MemoryTable::default(),
                faults: faults.clone(),
            },
            transactions: FlakyTable {
                inner: MemoryTransactionTable::default(),
                faults: faults.clone(),
            },
            recurring: FlakyTable {
                inner: MemoryTable::default(),
                faults: faults.clone(),
            },
            budgets: FlakyTable {
                inner: MemoryTable::default(),
                faults: faults.clone(),
            },
        };
        (storage, faults)
    }
}

impl PersistenceAdapter for FlakyStorage {
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

pub fn flaky_store(today: NaiveDate) -> (LedgerStore, Arc<Faults>) {
    let (storage, faults) = FlakyStorage::new();
    let store = LedgerStore::with_clock(Box::new(storage), Arc::new(FixedClock::on(today)));
    (store, faults)
}
