use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::core::journal::Journal;
use crate::core::store::LedgerStore;
use crate::errors::{LedgerError, Result};
use crate::ledger::{
    calendar::month_start,
    validation::{validate_budget_amount, validate_recurring, validate_transaction},
    Account, Budget, Category, Entity, Ledger, RecurringTransaction, Transaction,
};

use super::{ImportMode, ImportReport};

/// Portable snapshot of every collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub recurring_transactions: Vec<RecurringTransaction>,
    pub budgets: Vec<Budget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
}

impl ExportDocument {
    pub fn from_ledger(ledger: Ledger, export_date: DateTime<Utc>) -> Self {
        Self {
            accounts: ledger.accounts,
            categories: ledger.categories,
            transactions: ledger.transactions,
            recurring_transactions: ledger.recurring_transactions,
            budgets: ledger.budgets,
            export_date: Some(export_date),
        }
    }

    pub fn into_ledger(self) -> Ledger {
        Ledger {
            accounts: self.accounts,
            categories: self.categories,
            transactions: self.transactions,
            recurring_transactions: self.recurring_transactions,
            budgets: self.budgets,
        }
    }
}

pub fn export_document(store: &LedgerStore) -> Result<ExportDocument> {
    let ledger = store.snapshot()?;
    Ok(ExportDocument::from_ledger(ledger, store.clock().now()))
}

/// Pretty-printed JSON export of the whole store.
pub fn export_json(store: &LedgerStore) -> Result<String> {
    let document = export_document(store)?;
    let json = serde_json::to_string_pretty(&document)
        .map_err(|err| LedgerError::Export(format!("JSON encoding error: {err}")))?;
    info!(
        "exported {} accounts, {} transactions, {} budgets",
        document.accounts.len(),
        document.transactions.len(),
        document.budgets.len()
    );
    Ok(json)
}

/// Parses `payload` and imports it with [`import_document`].
///
/// All five collection keys must be present; `exportDate` is optional.
pub fn import_json(store: &LedgerStore, payload: &str, mode: ImportMode) -> Result<ImportReport> {
    let document: ExportDocument = serde_json::from_str(payload)
        .map_err(|err| LedgerError::ImportFormat(err.to_string()))?;
    import_document(store, document, mode)
}

/// Imports every record in one atomic unit: either all of it lands or none of it does.
///
/// Balances are taken as stored and no scheduler tick runs afterwards.
pub fn import_document(
    store: &LedgerStore,
    document: ExportDocument,
    mode: ImportMode,
) -> Result<ImportReport> {
    let incoming = document.into_ledger();
    check_payload(&incoming)?;
    let incoming = match mode {
        ImportMode::Append => with_fresh_ids(incoming),
        ImportMode::MergeById | ImportMode::Replace => incoming,
    };

    let report = store.transact(|state, now, journal| {
        let mut plan = ImportPlan::new(state, mode, journal);
        for account in incoming.accounts {
            plan.stage(Entity::Account(account));
            plan.report.accounts += 1;
        }
        for category in incoming.categories {
            plan.stage(Entity::Category(category));
            plan.report.categories += 1;
        }
        for txn in incoming.transactions {
            plan.stage(Entity::Transaction(txn));
            plan.report.transactions += 1;
        }
        for schedule in incoming.recurring_transactions {
            plan.stage(Entity::Recurring(schedule));
            plan.report.recurring_transactions += 1;
        }
        for budget in incoming.budgets {
            plan.stage_budget(budget, now);
            plan.report.budgets += 1;
        }
        plan.validate()?;
        Ok(plan.report)
    })?;

    info!(
        "imported {} record(s) with mode {:?} ({} replaced, {} removed)",
        report.total(),
        mode,
        report.replaced,
        report.removed
    );
    Ok(report)
}

fn check_unique<I>(collection: &str, ids: I) -> Result<()>
where
    I: IntoIterator<Item = Uuid>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(LedgerError::ImportFormat(format!(
                "duplicate id {} in {}",
                id, collection
            )));
        }
    }
    Ok(())
}

/// Rejects payloads that could never be stored consistently.
fn check_payload(ledger: &Ledger) -> Result<()> {
    check_unique("accounts", ledger.accounts.iter().map(|r| r.id))?;
    check_unique("categories", ledger.categories.iter().map(|r| r.id))?;
    check_unique("transactions", ledger.transactions.iter().map(|r| r.id))?;
    check_unique(
        "recurringTransactions",
        ledger.recurring_transactions.iter().map(|r| r.id),
    )?;
    check_unique("budgets", ledger.budgets.iter().map(|r| r.id))?;

    let mut slots = HashSet::new();
    for budget in &ledger.budgets {
        if !slots.insert((budget.category_id, month_start(budget.month))) {
            return Err(LedgerError::ImportFormat(format!(
                "more than one budget for category {} in {}",
                budget.category_id,
                budget.month.format("%Y-%m")
            )));
        }
    }
    Ok(())
}

/// Assigns new ids, pointing in-payload references at them. Unknown references stay as-is.
fn with_fresh_ids(mut ledger: Ledger) -> Ledger {
    fn remap(ids: &mut HashMap<Uuid, Uuid>, id: &mut Uuid) {
        let fresh = Uuid::new_v4();
        ids.insert(*id, fresh);
        *id = fresh;
    }
    fn follow(ids: &HashMap<Uuid, Uuid>, id: &mut Uuid) {
        if let Some(fresh) = ids.get(id) {
            *id = *fresh;
        }
    }

    let mut accounts = HashMap::new();
    let mut categories = HashMap::new();
    let mut schedules = HashMap::new();
    for account in &mut ledger.accounts {
        remap(&mut accounts, &mut account.id);
    }
    for category in &mut ledger.categories {
        remap(&mut categories, &mut category.id);
    }
    for schedule in &mut ledger.recurring_transactions {
        remap(&mut schedules, &mut schedule.id);
        follow(&accounts, &mut schedule.account_id);
        follow(&categories, &mut schedule.category_id);
    }
    for txn in &mut ledger.transactions {
        txn.id = Uuid::new_v4();
        follow(&accounts, &mut txn.account_id);
        follow(&categories, &mut txn.category_id);
        if let Some(schedule) = txn.recurring_transaction_id.as_mut() {
            follow(&schedules, schedule);
        }
    }
    for budget in &mut ledger.budgets {
        budget.id = Uuid::new_v4();
        follow(&categories, &mut budget.category_id);
    }
    ledger
}

/// Stages imported records against a projection of the resulting ledger.
struct ImportPlan<'a> {
    projected: Ledger,
    journal: &'a mut Journal,
    report: ImportReport,
}

impl<'a> ImportPlan<'a> {
    fn new(state: &Ledger, mode: ImportMode, journal: &'a mut Journal) -> Self {
        let mut report = ImportReport {
            mode,
            ..ImportReport::default()
        };
        let projected = if mode == ImportMode::Replace {
            let existing = state.clone();
            for account in existing.accounts {
                journal.remove(Entity::Account(account));
            }
            for category in existing.categories {
                journal.remove(Entity::Category(category));
            }
            for txn in existing.transactions {
                journal.remove(Entity::Transaction(txn));
            }
            for schedule in existing.recurring_transactions {
                journal.remove(Entity::Recurring(schedule));
            }
            for budget in existing.budgets {
                journal.remove(Entity::Budget(budget));
            }
            report.removed = journal.len();
            Ledger::default()
        } else {
            state.clone()
        };
        Self {
            projected,
            journal,
            report,
        }
    }

    fn existing(&self, entity: &Entity) -> Option<Entity> {
        let id = entity.id();
        match entity {
            Entity::Account(_) => self.projected.account(id).cloned().map(Entity::Account),
            Entity::Category(_) => self.projected.category(id).cloned().map(Entity::Category),
            Entity::Transaction(_) => self
                .projected
                .transaction(id)
                .cloned()
                .map(Entity::Transaction),
            Entity::Recurring(_) => self.projected.recurring(id).cloned().map(Entity::Recurring),
            Entity::Budget(_) => self.projected.budget(id).cloned().map(Entity::Budget),
        }
    }

    fn stage(&mut self, entity: Entity) {
        match self.existing(&entity) {
            Some(before) => {
                self.journal.update(before, entity.clone());
                self.report.replaced += 1;
            }
            None => self.journal.insert(entity.clone()),
        }
        self.projected.upsert(entity);
    }

    /// A budget whose (category, month) is already taken folds into the existing one.
    fn stage_budget(&mut self, mut budget: Budget, now: DateTime<Utc>) {
        budget.month = month_start(budget.month);
        let occupied = self
            .projected
            .budget_for(budget.category_id, budget.month)
            .filter(|existing| existing.id != budget.id)
            .cloned();
        match occupied {
            Some(existing) => {
                let mut merged = existing.clone();
                merged.amount = budget.amount;
                merged.updated_at = now;
                self.journal
                    .update(Entity::Budget(existing), Entity::Budget(merged.clone()));
                self.report.replaced += 1;
                self.projected.upsert(Entity::Budget(merged));
            }
            None => self.stage(Entity::Budget(budget)),
        }
    }

    /// Checks imported records against the ledger they will end up in.
    fn validate(&self) -> Result<()> {
        let invalid = |what: &str, id: Uuid, err: LedgerError| match err {
            LedgerError::Validation(reason) => {
                LedgerError::ImportFormat(format!("{} {}: {}", what, id, reason))
            }
            other => other,
        };
        for change in self.journal.changes() {
            let entity = match change {
                crate::core::journal::Change::Insert(entity) => entity,
                crate::core::journal::Change::Update { after, .. } => after,
                crate::core::journal::Change::Remove(_) => continue,
            };
            match entity {
                Entity::Transaction(txn) => validate_transaction(&self.projected, txn)
                    .map_err(|err| invalid("transaction", txn.id, err))?,
                Entity::Recurring(schedule) => validate_recurring(&self.projected, schedule)
                    .map_err(|err| invalid("recurring transaction", schedule.id, err))?,
                Entity::Budget(budget) => validate_budget_amount(budget.amount)
                    .map_err(|err| invalid("budget", budget.id, err))?,
                Entity::Account(_) | Entity::Category(_) => {}
            }
        }
        Ok(())
    }
}
