//! Pure budget evaluation over a transaction list.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::ledger::{
    calendar::{month_end, month_start},
    Budget, CategoryKind, Transaction,
};

/// Percent-of-budget levels where the status turns stricter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetThresholds {
    pub warning: Decimal,
    pub exceeded: Decimal,
}

impl Default for BudgetThresholds {
    fn default() -> Self {
        Self {
            warning: Decimal::from(80),
            exceeded: Decimal::from(100),
        }
    }
}

impl BudgetThresholds {
    /// Returns `None` unless `0 < warning <= exceeded`.
    pub fn new(warning: Decimal, exceeded: Decimal) -> Option<Self> {
        if warning > Decimal::ZERO && warning <= exceeded {
            Some(Self { warning, exceeded })
        } else {
            None
        }
    }

    pub fn classify(&self, percentage: Decimal) -> BudgetStatus {
        if percentage >= self.exceeded {
            BudgetStatus::Exceeded
        } else if percentage >= self.warning {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Good
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Good,
    Warning,
    Exceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub month: NaiveDate,
    pub budgeted: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percentage: Decimal,
    pub status: BudgetStatus,
}

/// Sum of expense amounts for `category_id` dated within the month containing `month`.
///
/// Saturates at [`Decimal::MAX`] instead of overflowing.
pub fn category_spending(
    transactions: &[Transaction],
    category_id: Uuid,
    month: NaiveDate,
) -> Decimal {
    let (start, end) = (month_start(month), month_end(month));
    transactions
        .iter()
        .filter(|txn| {
            txn.kind == CategoryKind::Expense
                && txn.category_id == category_id
                && txn.date >= start
                && txn.date <= end
        })
        .fold(Decimal::ZERO, |total, txn| total.saturating_add(txn.amount))
}

pub fn budget_status(budget: &Budget, transactions: &[Transaction]) -> BudgetProgress {
    budget_status_with(budget, transactions, &BudgetThresholds::default())
}

/// A zero budget reports 0% and is exceeded by any spending at all. A percentage too
/// large to represent reports as [`Decimal::MAX`].
pub fn budget_status_with(
    budget: &Budget,
    transactions: &[Transaction],
    thresholds: &BudgetThresholds,
) -> BudgetProgress {
    let spent = category_spending(transactions, budget.category_id, budget.month);
    let (percentage, status) = if budget.amount.is_zero() {
        let status = if spent > Decimal::ZERO {
            BudgetStatus::Exceeded
        } else {
            BudgetStatus::Good
        };
        (Decimal::ZERO, status)
    } else {
        let percentage = spent
            .checked_div(budget.amount)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::MAX);
        (percentage, thresholds.classify(percentage))
    };
    BudgetProgress {
        budget_id: budget.id,
        category_id: budget.category_id,
        month: budget.month,
        budgeted: budget.amount,
        spent,
        remaining: budget.amount.saturating_sub(spent),
        percentage,
        status,
    }
}

/// Progress for every budget set for the month containing `month`.
pub fn budget_statuses(
    budgets: &[Budget],
    transactions: &[Transaction],
    month: NaiveDate,
    thresholds: &BudgetThresholds,
) -> Vec<BudgetProgress> {
    let month = month_start(month);
    budgets
        .iter()
        .filter(|budget| month_start(budget.month) == month)
        .map(|budget| budget_status_with(budget, transactions, thresholds))
        .collect()
}
