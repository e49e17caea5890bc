//! Input checks shared by the store, the scheduler and the import codec.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::{LedgerError, Result};

use super::{Ledger, RecurringTransaction, Transaction, TransactionKind};

const MAX_FRACTION_DIGITS: u32 = 2;

/// Largest magnitude accepted for amounts and balances (15 significant digits with
/// two of them fractional), so values survive the float encoding of the JSON collections.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 2);

fn check_magnitude(what: &str, amount: Decimal) -> Result<()> {
    if amount.abs() > MAX_AMOUNT {
        return Err(LedgerError::validation(format!(
            "{} {} exceeds the limit of {}",
            what, amount, MAX_AMOUNT
        )));
    }
    Ok(())
}

/// Amounts must be strictly positive, at most [`MAX_AMOUNT`], with at most two
/// fractional digits.
pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "amount must be greater than zero, got {}",
            amount
        )));
    }
    check_magnitude("amount", amount)?;
    if amount.normalize().scale() > MAX_FRACTION_DIGITS {
        return Err(LedgerError::validation(format!(
            "amount {} has more than {} fractional digits",
            amount, MAX_FRACTION_DIGITS
        )));
    }
    Ok(())
}

/// The direction must match the category's type when the category resolves.
pub fn validate_flow(ledger: &Ledger, category_id: Uuid, kind: TransactionKind) -> Result<()> {
    match ledger.category(category_id) {
        Some(category) if category.kind != kind => Err(LedgerError::validation(format!(
            "{} entry cannot use {} category `{}`",
            kind.as_str(),
            category.kind.as_str(),
            category.name
        ))),
        _ => Ok(()),
    }
}

pub fn validate_transaction(ledger: &Ledger, txn: &Transaction) -> Result<()> {
    validate_amount(txn.amount)?;
    validate_flow(ledger, txn.category_id, txn.kind)
}

pub fn validate_recurring(ledger: &Ledger, schedule: &RecurringTransaction) -> Result<()> {
    validate_amount(schedule.amount)?;
    validate_flow(ledger, schedule.category_id, schedule.kind)
}

/// Budget ceilings may be zero but never negative.
pub fn validate_budget_amount(amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "budget amount must not be negative, got {}",
            amount
        )));
    }
    check_magnitude("budget amount", amount)?;
    if amount.normalize().scale() > MAX_FRACTION_DIGITS {
        return Err(LedgerError::validation(format!(
            "budget amount {} has more than {} fractional digits",
            amount, MAX_FRACTION_DIGITS
        )));
    }
    Ok(())
}

/// Account balances may be negative but share the amount limit and precision.
pub fn validate_balance(balance: Decimal) -> Result<()> {
    check_magnitude("balance", balance)?;
    if balance.normalize().scale() > MAX_FRACTION_DIGITS {
        return Err(LedgerError::validation(format!(
            "balance {} has more than {} fractional digits",
            balance, MAX_FRACTION_DIGITS
        )));
    }
    Ok(())
}
