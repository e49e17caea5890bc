use std::collections::HashMap;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use uuid::Uuid;

use crate::core::store::LedgerStore;
use crate::errors::{LedgerError, Result};
use crate::ledger::{Account, Category, Transaction};

const HEADER: &str = "Date,Description,Account,Category,Type,Amount,Notes";

/// Renders transactions as CSV: a bare header line, then one fully quoted row each.
///
/// Accounts and categories appear by name, empty when the reference is orphaned.
pub fn transactions_to_csv(
    transactions: &[Transaction],
    accounts: &[Account],
    categories: &[Category],
) -> Result<String> {
    let account_names: HashMap<Uuid, &str> = accounts
        .iter()
        .map(|account| (account.id, account.name.as_str()))
        .collect();
    let category_names: HashMap<Uuid, &str> = categories
        .iter()
        .map(|category| (category.id, category.name.as_str()))
        .collect();

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(Vec::new());

    for txn in transactions {
        writer
            .write_record([
                txn.date.to_string().as_str(),
                txn.description.as_str(),
                account_names.get(&txn.account_id).copied().unwrap_or(""),
                category_names.get(&txn.category_id).copied().unwrap_or(""),
                txn.kind.as_str(),
                txn.amount.normalize().to_string().as_str(),
                txn.notes.as_deref().unwrap_or(""),
            ])
            .map_err(|err| LedgerError::Export(format!("CSV write error: {err}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| LedgerError::Export(format!("CSV flush error: {err}")))?;
    let rows = String::from_utf8(bytes)
        .map_err(|err| LedgerError::Export(format!("CSV encoding error: {err}")))?;

    let mut out = String::from(HEADER);
    let rows = rows.trim_end_matches('\n');
    if !rows.is_empty() {
        out.push('\n');
        out.push_str(rows);
    }
    Ok(out)
}

/// CSV of every transaction currently in the store.
pub fn export_transactions_csv(store: &LedgerStore) -> Result<String> {
    let ledger = store.snapshot()?;
    transactions_to_csv(&ledger.transactions, &ledger.accounts, &ledger.categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AccountKind, CategoryKind, NewAccount, NewCategory, NewTransaction};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    #[test]
    fn rows_are_quoted_and_names_resolved() {
        let now = Utc::now();
        let account = Account::from_new(
            NewAccount::new("Main Checking", AccountKind::Checking, Decimal::ZERO),
            now,
        );
        let category = Category::from_new(NewCategory::new("Dining", CategoryKind::Expense), now);
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let dinner = Transaction::from_new(
            NewTransaction::new(
                account.id,
                category.id,
                Decimal::new(2500, 2),
                CategoryKind::Expense,
                "Dinner at \"Luigi's\"",
                date,
            )
            .with_notes("split, 2 ways"),
            now,
        );
        let orphan = Transaction::from_new(
            NewTransaction::new(
                Uuid::new_v4(),
                Uuid::new_v4(),
                Decimal::new(1050, 2),
                CategoryKind::Income,
                "Refund",
                date,
            ),
            now,
        );

        let csv = transactions_to_csv(&[dinner, orphan], &[account], &[category]).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Date,Description,Account,Category,Type,Amount,Notes");
        assert_eq!(
            lines[1],
            r#""2024-01-15","Dinner at ""Luigi's""","Main Checking","Dining","expense","25","split, 2 ways""#
        );
        assert_eq!(
            lines[2],
            r#""2024-01-15","Refund","","","income","10.5","""#
        );
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn empty_ledger_yields_header_only() {
        assert_eq!(transactions_to_csv(&[], &[], &[]).unwrap(), HEADER);
    }
}
