use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a financial account whose balance is kept in step with its transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub goal_amount: Option<Decimal>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Builds an account from creation input, stamping a fresh id and timestamps.
    pub fn from_new(input: NewAccount, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            kind: input.kind,
            balance: input.balance,
            goal_amount: input.goal_amount,
            color: input.color,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy with the patch merged in and `updated_at` refreshed.
    pub fn patched(&self, patch: AccountPatch, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name;
        }
        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        if let Some(balance) = patch.balance {
            next.balance = balance;
        }
        if let Some(goal) = patch.goal_amount {
            next.goal_amount = goal;
        }
        if let Some(color) = patch.color {
            next.color = color;
        }
        next.updated_at = now;
        next
    }
}

/// Supported account types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
    EmergencySavings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub balance: Decimal,
    pub goal_amount: Option<Decimal>,
    pub color: String,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, kind: AccountKind, balance: Decimal) -> Self {
        Self {
            name: name.into(),
            kind,
            balance,
            goal_amount: None,
            color: String::from("#3B82F6"),
        }
    }

    pub fn with_goal(mut self, goal: Decimal) -> Self {
        self.goal_amount = Some(goal);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// Partial update for an account. A `balance` here is a direct correction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
    pub balance: Option<Decimal>,
    pub goal_amount: Option<Option<Decimal>>,
    pub color: Option<String>,
}
