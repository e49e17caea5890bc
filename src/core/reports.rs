//! Derived totals for dashboards and reports. Nothing here touches the store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::ledger::{
    calendar::{month_end, month_start, shift_month},
    Account, Category, CategoryKind, Transaction,
};

fn in_month(txn: &Transaction, month: Option<NaiveDate>) -> bool {
    match month {
        Some(month) => txn.date >= month_start(month) && txn.date <= month_end(month),
        None => true,
    }
}

fn saturating_sum<I: IntoIterator<Item = Decimal>>(amounts: I) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |total, amount| total.saturating_add(amount))
}

fn total_of(
    transactions: &[Transaction],
    kind: CategoryKind,
    month: Option<NaiveDate>,
) -> Decimal {
    saturating_sum(
        transactions
            .iter()
            .filter(|txn| txn.kind == kind && in_month(txn, month))
            .map(|txn| txn.amount),
    )
}

/// Income across all time, or within the month containing `month`.
pub fn total_income(transactions: &[Transaction], month: Option<NaiveDate>) -> Decimal {
    total_of(transactions, CategoryKind::Income, month)
}

pub fn total_expenses(transactions: &[Transaction], month: Option<NaiveDate>) -> Decimal {
    total_of(transactions, CategoryKind::Expense, month)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotals {
    pub month: NaiveDate,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
}

/// Income, expenses and net for the `months` months ending with `reference`, oldest first.
pub fn monthly_trend(
    transactions: &[Transaction],
    reference: NaiveDate,
    months: u32,
) -> Vec<MonthlyTotals> {
    let anchor = month_start(reference);
    (0..months as i32)
        .rev()
        .filter_map(|back| shift_month(anchor, -back))
        .map(|month| {
            let income = total_income(transactions, Some(month));
            let expenses = total_expenses(transactions, Some(month));
            MonthlyTotals {
                month,
                income,
                expenses,
                net: income.saturating_sub(expenses),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: Uuid,
    pub name: String,
    pub color: String,
    pub amount: Decimal,
}

/// Per-category totals of `kind`, dropping empty categories, largest first.
pub fn category_breakdown(
    transactions: &[Transaction],
    categories: &[Category],
    kind: CategoryKind,
    month: Option<NaiveDate>,
) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = categories
        .iter()
        .filter(|category| category.kind == kind)
        .map(|category| CategoryTotal {
            category_id: category.id,
            name: category.name.clone(),
            color: category.color.clone(),
            amount: saturating_sum(
                transactions
                    .iter()
                    .filter(|txn| {
                        txn.category_id == category.id && txn.kind == kind && in_month(txn, month)
                    })
                    .map(|txn| txn.amount),
            ),
        })
        .filter(|total| total.amount > Decimal::ZERO)
        .collect();
    totals.sort_by(|a, b| b.amount.cmp(&a.amount));
    totals
}

pub fn total_balance(accounts: &[Account]) -> Decimal {
    saturating_sum(accounts.iter().map(|account| account.balance))
}

/// Percentage of the savings goal reached; not capped at 100. `None` without a positive goal.
///
/// Totals in this module saturate at the `Decimal` bounds rather than overflow.
pub fn goal_progress(account: &Account) -> Option<Decimal> {
    match account.goal_amount {
        Some(goal) if goal > Decimal::ZERO => Some(
            account
                .balance
                .checked_div(goal)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .unwrap_or(if account.balance.is_sign_negative() {
                    Decimal::MIN
                } else {
                    Decimal::MAX
                }),
        ),
        _ => None,
    }
}
