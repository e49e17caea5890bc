use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::category::CategoryKind;

/// Transactions share the income/expense direction with categories.
pub type TransactionKind = CategoryKind;

/// A dated movement of money into or out of one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn from_new(input: NewTransaction, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: input.account_id,
            category_id: input.category_id,
            amount: input.amount,
            kind: input.kind,
            description: input.description,
            date: input.date,
            notes: input.notes,
            receipt_url: input.receipt_url,
            recurring_transaction_id: input.recurring_transaction_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn patched(&self, patch: TransactionPatch, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if let Some(account_id) = patch.account_id {
            next.account_id = account_id;
        }
        if let Some(category_id) = patch.category_id {
            next.category_id = category_id;
        }
        if let Some(amount) = patch.amount {
            next.amount = amount;
        }
        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(date) = patch.date {
            next.date = date;
        }
        if let Some(notes) = patch.notes {
            next.notes = notes;
        }
        if let Some(receipt_url) = patch.receipt_url {
            next.receipt_url = receipt_url;
        }
        next.updated_at = now;
        next
    }

    /// Effect on the owning account's balance: `+amount` for income, `-amount` for expense.
    pub fn signed_amount(&self) -> Decimal {
        signed(self.kind, self.amount)
    }

    /// True when switching from `self` to `other` moves money differently.
    pub fn balance_effect_differs(&self, other: &Transaction) -> bool {
        self.amount != other.amount
            || self.kind != other.kind
            || self.account_id != other.account_id
    }
}

pub(crate) fn signed(kind: TransactionKind, amount: Decimal) -> Decimal {
    match kind {
        CategoryKind::Income => amount,
        CategoryKind::Expense => -amount,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub description: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub receipt_url: Option<String>,
    pub recurring_transaction_id: Option<Uuid>,
}

impl NewTransaction {
    pub fn new(
        account_id: Uuid,
        category_id: Uuid,
        amount: Decimal,
        kind: TransactionKind,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            account_id,
            category_id,
            amount,
            kind,
            description: description.into(),
            date,
            notes: None,
            receipt_url: None,
            recurring_transaction_id: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial update for a transaction; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub kind: Option<TransactionKind>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
    pub receipt_url: Option<Option<String>>,
}
