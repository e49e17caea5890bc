use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calendar::month_start;

/// A monthly spending ceiling for one category. At most one per (category, month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Uuid,
    pub category_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub month: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Creates a budget for the month containing `month`.
    pub fn new(category_id: Uuid, amount: Decimal, month: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_id,
            amount,
            month: month_start(month),
            created_at: now,
            updated_at: now,
        }
    }

    /// Both sides are compared by month, so a stored date off the 1st still matches.
    pub fn covers(&self, category_id: Uuid, month: NaiveDate) -> bool {
        self.category_id == category_id && month_start(self.month) == month_start(month)
    }
}
