use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    account::Account, budget::Budget, category::Category, recurring::RecurringTransaction,
    transaction::Transaction,
};

/// In-memory view of all five collections, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub recurring_transactions: Vec<RecurringTransaction>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
}

/// Any record the ledger stores, tagged by collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Account(Account),
    Category(Category),
    Transaction(Transaction),
    Recurring(RecurringTransaction),
    Budget(Budget),
}

impl Entity {
    pub fn id(&self) -> Uuid {
        match self {
            Entity::Account(record) => record.id,
            Entity::Category(record) => record.id,
            Entity::Transaction(record) => record.id,
            Entity::Recurring(record) => record.id,
            Entity::Budget(record) => record.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Account(_) => "account",
            Entity::Category(_) => "category",
            Entity::Transaction(_) => "transaction",
            Entity::Recurring(_) => "recurring transaction",
            Entity::Budget(_) => "budget",
        }
    }
}

fn upsert_by_id<T, F>(items: &mut Vec<T>, record: T, id_of: F)
where
    F: Fn(&T) -> Uuid,
{
    let id = id_of(&record);
    match items.iter_mut().find(|existing| id_of(existing) == id) {
        Some(slot) => *slot = record,
        None => items.push(record),
    }
}

impl Ledger {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
            && self.categories.is_empty()
            && self.transactions.is_empty()
            && self.recurring_transactions.is_empty()
            && self.budgets.is_empty()
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn recurring(&self, id: Uuid) -> Option<&RecurringTransaction> {
        self.recurring_transactions
            .iter()
            .find(|schedule| schedule.id == id)
    }

    pub fn budget(&self, id: Uuid) -> Option<&Budget> {
        self.budgets.iter().find(|budget| budget.id == id)
    }

    pub fn budget_for(&self, category_id: Uuid, month: NaiveDate) -> Option<&Budget> {
        self.budgets
            .iter()
            .find(|budget| budget.covers(category_id, month))
    }

    pub fn transactions_for_account(&self, account_id: Uuid) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|txn| txn.account_id == account_id)
            .cloned()
            .collect()
    }

    /// Inserts the record, or replaces the one with the same id in place.
    pub fn upsert(&mut self, entity: Entity) {
        match entity {
            Entity::Account(record) => upsert_by_id(&mut self.accounts, record, |r| r.id),
            Entity::Category(record) => upsert_by_id(&mut self.categories, record, |r| r.id),
            Entity::Transaction(record) => upsert_by_id(&mut self.transactions, record, |r| r.id),
            Entity::Recurring(record) => {
                upsert_by_id(&mut self.recurring_transactions, record, |r| r.id)
            }
            Entity::Budget(record) => upsert_by_id(&mut self.budgets, record, |r| r.id),
        }
    }

    pub fn remove(&mut self, entity: &Entity) {
        let id = entity.id();
        match entity {
            Entity::Account(_) => self.accounts.retain(|r| r.id != id),
            Entity::Category(_) => self.categories.retain(|r| r.id != id),
            Entity::Transaction(_) => self.transactions.retain(|r| r.id != id),
            Entity::Recurring(_) => self.recurring_transactions.retain(|r| r.id != id),
            Entity::Budget(_) => self.budgets.retain(|r| r.id != id),
        }
    }
}
