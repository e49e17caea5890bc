use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calendar::{shift_month, shift_year};
use super::transaction::{NewTransaction, TransactionKind};

/// How often a recurring schedule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Next occurrence after `from`. Month and year steps clamp to the last valid day.
    ///
    /// Returns `None` only when the result falls outside the supported date range.
    pub fn advance(&self, from: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => from.checked_add_signed(Duration::days(1)),
            Frequency::Weekly => from.checked_add_signed(Duration::weeks(1)),
            Frequency::Monthly => shift_month(from, 1),
            Frequency::Yearly => shift_year(from, 1),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Yearly => "Yearly",
        }
    }
}

/// Template that materializes a transaction every time `next_date` comes due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: String,
    pub frequency: Frequency,
    pub next_date: NaiveDate,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl RecurringTransaction {
    pub fn from_new(input: NewRecurringTransaction, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: input.account_id,
            category_id: input.category_id,
            amount: input.amount,
            kind: input.kind,
            description: input.description,
            frequency: input.frequency,
            next_date: input.next_date,
            active: input.active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn patched(&self, patch: RecurringPatch, now: DateTime<Utc>) -> Self {
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
        if let Some(frequency) = patch.frequency {
            next.frequency = frequency;
        }
        if let Some(next_date) = patch.next_date {
            next.next_date = next_date;
        }
        if let Some(active) = patch.active {
            next.active = active;
        }
        next.updated_at = now;
        next
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.active && self.next_date <= today
    }

    /// Transaction input for the occurrence at `next_date`.
    pub fn occurrence(&self) -> NewTransaction {
        NewTransaction {
            account_id: self.account_id,
            category_id: self.category_id,
            amount: self.amount,
            kind: self.kind,
            description: self.description.clone(),
            date: self.next_date,
            notes: None,
            receipt_url: None,
            recurring_transaction_id: Some(self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringTransaction {
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub description: String,
    pub frequency: Frequency,
    pub next_date: NaiveDate,
    pub active: bool,
}

impl NewRecurringTransaction {
    pub fn new(
        account_id: Uuid,
        category_id: Uuid,
        amount: Decimal,
        kind: TransactionKind,
        description: impl Into<String>,
        frequency: Frequency,
        next_date: NaiveDate,
    ) -> Self {
        Self {
            account_id,
            category_id,
            amount,
            kind,
            description: description.into(),
            frequency,
            next_date,
            active: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecurringPatch {
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub kind: Option<TransactionKind>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub next_date: Option<NaiveDate>,
    pub active: Option<bool>,
}
