//! Ordered entity writes that either all reach the adapter or are undone.

use tracing::{error, warn};

use crate::ledger::{Entity, Ledger};
use crate::storage::{PersistenceAdapter, Record, StorageResult, Table};

/// One staged write.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Insert(Entity),
    Update { before: Entity, after: Entity },
    Remove(Entity),
}

impl Change {
    fn describe(&self) -> String {
        match self {
            Change::Insert(entity) => format!("insert {} {}", entity.kind(), entity.id()),
            Change::Update { after, .. } => format!("update {} {}", after.kind(), after.id()),
            Change::Remove(entity) => format!("remove {} {}", entity.kind(), entity.id()),
        }
    }
}

#[derive(Clone, Copy)]
enum Write {
    Add,
    Upsert,
}

fn put_in<T, Tbl>(table: &Tbl, record: &T, mode: Write) -> StorageResult<()>
where
    T: Record,
    Tbl: Table<T> + ?Sized,
{
    match mode {
        Write::Add => table.add(record),
        Write::Upsert => table.update(record),
    }
}

fn put(adapter: &dyn PersistenceAdapter, entity: &Entity, mode: Write) -> StorageResult<()> {
    match entity {
        Entity::Account(record) => put_in(adapter.accounts(), record, mode),
        Entity::Category(record) => put_in(adapter.categories(), record, mode),
        Entity::Transaction(record) => put_in(adapter.transactions(), record, mode),
        Entity::Recurring(record) => put_in(adapter.recurring_transactions(), record, mode),
        Entity::Budget(record) => put_in(adapter.budgets(), record, mode),
    }
}

fn erase(adapter: &dyn PersistenceAdapter, entity: &Entity) -> StorageResult<()> {
    let id = entity.id();
    match entity {
        Entity::Account(_) => adapter.accounts().delete(id),
        Entity::Category(_) => adapter.categories().delete(id),
        Entity::Transaction(_) => adapter.transactions().delete(id),
        Entity::Recurring(_) => adapter.recurring_transactions().delete(id),
        Entity::Budget(_) => adapter.budgets().delete(id),
    }
}

/// Collects the writes of one logical operation.
#[derive(Debug, Default)]
pub struct Journal {
    changes: Vec<Change>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) {
        self.changes.push(Change::Insert(entity));
    }

    pub fn update(&mut self, before: Entity, after: Entity) {
        self.changes.push(Change::Update { before, after });
    }

    pub fn remove(&mut self, entity: Entity) {
        self.changes.push(Change::Remove(entity));
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Writes every change through `adapter`, then mirrors them into `ledger`.
    ///
    /// If a write fails, the writes already made are compensated in reverse order and
    /// `ledger` is left untouched.
    pub fn commit(
        self,
        adapter: &dyn PersistenceAdapter,
        ledger: &mut Ledger,
    ) -> StorageResult<()> {
        for (index, change) in self.changes.iter().enumerate() {
            if let Err(err) = Self::apply(adapter, change) {
                warn!(
                    "write {} of {} failed ({}): {}; rolling back",
                    index + 1,
                    self.changes.len(),
                    change.describe(),
                    err
                );
                Self::compensate(adapter, &self.changes[..index]);
                return Err(err);
            }
        }
        for change in self.changes {
            match change {
                Change::Insert(entity) | Change::Update { after: entity, .. } => {
                    ledger.upsert(entity)
                }
                Change::Remove(entity) => ledger.remove(&entity),
            }
        }
        Ok(())
    }

    fn apply(adapter: &dyn PersistenceAdapter, change: &Change) -> StorageResult<()> {
        match change {
            Change::Insert(entity) => put(adapter, entity, Write::Add),
            Change::Update { after, .. } => put(adapter, after, Write::Upsert),
            Change::Remove(entity) => erase(adapter, entity),
        }
    }

    fn compensate(adapter: &dyn PersistenceAdapter, applied: &[Change]) {
        for change in applied.iter().rev() {
            let undo = match change {
                Change::Insert(entity) => erase(adapter, entity),
                Change::Update { before, .. } => put(adapter, before, Write::Upsert),
                Change::Remove(entity) => put(adapter, entity, Write::Upsert),
            };
            if let Err(err) = undo {
                error!(
                    "failed to undo {}: {}; durable state may diverge from memory",
                    change.describe(),
                    err
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Category, CategoryKind, NewCategory};
    use crate::storage::MemoryStorage;
    use chrono::Utc;

    fn category(name: &str) -> Category {
        Category::from_new(NewCategory::new(name, CategoryKind::Expense), Utc::now())
    }

    #[test]
    fn commit_writes_in_order_and_updates_ledger() {
        let storage = MemoryStorage::new();
        let mut ledger = Ledger::default();
        let food = category("Food");
        let renamed = Category {
            name: "Groceries".into(),
            ..food.clone()
        };

        let mut journal = Journal::new();
        journal.insert(Entity::Category(food.clone()));
        journal.update(Entity::Category(food.clone()), Entity::Category(renamed.clone()));
        assert_eq!(journal.len(), 2);
        journal.commit(&storage, &mut ledger).unwrap();

        assert_eq!(storage.categories().get(food.id).unwrap(), renamed);
        assert_eq!(ledger.categories, vec![renamed]);
    }

    #[test]
    fn failing_write_compensates_earlier_ones() {
        let storage = MemoryStorage::new();
        let existing = category("Rent");
        storage.categories().add(&existing).unwrap();
        let mut ledger = Ledger::default();
        ledger.upsert(Entity::Category(existing.clone()));

        let fresh = category("Fuel");
        let mut journal = Journal::new();
        journal.insert(Entity::Category(fresh.clone()));
        journal.remove(Entity::Category(existing.clone()));
        // Second insert of the same id is rejected by the table.
        journal.insert(Entity::Category(fresh.clone()));

        assert!(journal.commit(&storage, &mut ledger).is_err());
        let stored = storage.categories().get_all().unwrap();
        assert_eq!(stored, vec![existing.clone()]);
        assert_eq!(ledger.categories, vec![existing]);
    }
}
