mod common;

use common::{dollars, memory_store, ymd, Sequence};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;
use wealthtrack_core::{
    core::LedgerStore,
    ledger::{
        AccountKind, AccountPatch, CategoryKind, NewAccount, NewCategory, NewTransaction,
        TransactionPatch,
    },
    LedgerError,
};

struct Fixture {
    store: LedgerStore,
    checking: Uuid,
    savings: Uuid,
    groceries: Uuid,
    salary: Uuid,
}

fn fixture() -> Fixture {
    let (store, _) = memory_store(ymd(2024, 1, 20));
    let checking = store
        .add_account(NewAccount::new("Checking", AccountKind::Checking, dollars(100_000)))
        .unwrap()
        .id;
    let savings = store
        .add_account(NewAccount::new("Savings", AccountKind::Savings, dollars(50_000)))
        .unwrap()
        .id;
    let groceries = store
        .add_category(NewCategory::new("Groceries", CategoryKind::Expense))
        .unwrap()
        .id;
    let salary = store
        .add_category(NewCategory::new("Salary", CategoryKind::Income))
        .unwrap()
        .id;
    Fixture {
        store,
        checking,
        savings,
        groceries,
        salary,
    }
}

fn balance(store: &LedgerStore, account: Uuid) -> Decimal {
    store.account(account).unwrap().expect("account exists").balance
}

#[test]
fn balance_follows_add_update_delete_scenario() {
    let f = fixture();
    assert_eq!(balance(&f.store, f.checking), dollars(100_000));

    let groceries = f
        .store
        .add_transaction(NewTransaction::new(
            f.checking,
            f.groceries,
            dollars(5_000),
            CategoryKind::Expense,
            "Groceries",
            ymd(2024, 1, 10),
        ))
        .unwrap();
    assert_eq!(balance(&f.store, f.checking), dollars(95_000));

    let salary = f
        .store
        .add_transaction(NewTransaction::new(
            f.checking,
            f.salary,
            dollars(20_000),
            CategoryKind::Income,
            "Salary",
            ymd(2024, 1, 15),
        ))
        .unwrap();
    assert_eq!(balance(&f.store, f.checking), dollars(115_000));

    f.store
        .update_transaction(
            groceries.id,
            TransactionPatch {
                amount: Some(dollars(7_500)),
                ..TransactionPatch::default()
            },
        )
        .unwrap();
    assert_eq!(balance(&f.store, f.checking), dollars(112_500));

    f.store.delete_transaction(salary.id).unwrap();
    assert_eq!(balance(&f.store, f.checking), dollars(92_500));

    let persisted = f.store.adapter().accounts().get(f.checking).unwrap();
    assert_eq!(persisted.balance, dollars(92_500));
}

#[test]
fn identical_update_leaves_balance_unchanged() {
    let f = fixture();
    let txn = f
        .store
        .add_transaction(NewTransaction::new(
            f.checking,
            f.groceries,
            dollars(1_234),
            CategoryKind::Expense,
            "Market",
            ymd(2024, 1, 5),
        ))
        .unwrap();
    let before = balance(&f.store, f.checking);

    f.store
        .update_transaction(
            txn.id,
            TransactionPatch {
                amount: Some(txn.amount),
                kind: Some(txn.kind),
                account_id: Some(txn.account_id),
                description: Some("Farmers market".into()),
                ..TransactionPatch::default()
            },
        )
        .unwrap();
    assert_eq!(balance(&f.store, f.checking), before);
    assert_eq!(
        f.store.transaction(txn.id).unwrap().unwrap().description,
        "Farmers market"
    );
}

#[test]
fn delete_then_readd_restores_balance() {
    let f = fixture();
    let input = NewTransaction::new(
        f.savings,
        f.salary,
        dollars(9_999),
        CategoryKind::Income,
        "Bonus",
        ymd(2024, 1, 18),
    );
    let before = balance(&f.store, f.savings);
    let txn = f.store.add_transaction(input.clone()).unwrap();
    let after_add = balance(&f.store, f.savings);
    f.store.delete_transaction(txn.id).unwrap();
    assert_eq!(balance(&f.store, f.savings), before);
    f.store.add_transaction(input).unwrap();
    assert_eq!(balance(&f.store, f.savings), after_add);
}

#[test]
fn moving_a_transaction_between_accounts_moves_its_effect() {
    let f = fixture();
    let txn = f
        .store
        .add_transaction(NewTransaction::new(
            f.checking,
            f.groceries,
            dollars(2_000),
            CategoryKind::Expense,
            "Hardware store",
            ymd(2024, 1, 7),
        ))
        .unwrap();
    f.store
        .update_transaction(
            txn.id,
            TransactionPatch {
                account_id: Some(f.savings),
                amount: Some(dollars(3_000)),
                ..TransactionPatch::default()
            },
        )
        .unwrap();
    assert_eq!(balance(&f.store, f.checking), dollars(100_000));
    assert_eq!(balance(&f.store, f.savings), dollars(47_000));
    assert_eq!(f.store.transactions_for_account(f.savings).unwrap().len(), 1);
    assert!(f.store.transactions_for_account(f.checking).unwrap().is_empty());
}

#[test]
fn update_rejects_invalid_merge_and_changes_nothing() {
    let f = fixture();
    let txn = f
        .store
        .add_transaction(NewTransaction::new(
            f.checking,
            f.groceries,
            dollars(1_000),
            CategoryKind::Expense,
            "Bakery",
            ymd(2024, 1, 3),
        ))
        .unwrap();
    let err = f
        .store
        .update_transaction(
            txn.id,
            TransactionPatch {
                amount: Some(Decimal::new(1_005, 3)),
                ..TransactionPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    let err = f
        .store
        .update_transaction(
            txn.id,
            TransactionPatch {
                kind: Some(CategoryKind::Income),
                ..TransactionPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(f.store.transaction(txn.id).unwrap().unwrap(), txn);
    assert_eq!(balance(&f.store, f.checking), dollars(99_000));

    let err = f
        .store
        .update_transaction(Uuid::new_v4(), TransactionPatch::default())
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

#[test]
fn deleting_account_or_category_leaves_orphans() {
    let f = fixture();
    let txn = f
        .store
        .add_transaction(NewTransaction::new(
            f.checking,
            f.groceries,
            dollars(500),
            CategoryKind::Expense,
            "Snacks",
            ymd(2024, 1, 9),
        ))
        .unwrap();
    f.store.delete_account(f.checking).unwrap();
    f.store.delete_category(f.groceries).unwrap();
    assert!(f.store.account(f.checking).unwrap().is_none());
    assert!(f.store.transaction(txn.id).unwrap().is_some());

    // Reverting an orphan's effect is skipped silently.
    f.store.delete_transaction(txn.id).unwrap();
    assert!(f.store.transactions().unwrap().is_empty());
}

#[test]
fn direct_balance_correction_through_account_patch() {
    let f = fixture();
    let updated = f
        .store
        .update_account(
            f.savings,
            AccountPatch {
                balance: Some(dollars(60_000)),
                goal_amount: Some(Some(dollars(100_000))),
                ..AccountPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.balance, dollars(60_000));
    assert_eq!(updated.goal_amount, Some(dollars(100_000)));
    assert!(updated.updated_at >= updated.created_at);
}

#[test]
fn balances_match_initial_plus_signed_sum_after_long_sequence() {
    let f = fixture();
    let accounts = [f.checking, f.savings];
    let initial: HashMap<Uuid, Decimal> = accounts
        .iter()
        .map(|id| (*id, balance(&f.store, *id)))
        .collect();
    let mut seq = Sequence::new(0x5eed);
    let mut live: Vec<Uuid> = Vec::new();

    for step in 0..400 {
        let account = accounts[seq.below(2) as usize];
        let (category, kind) = if seq.below(2) == 0 {
            (f.groceries, CategoryKind::Expense)
        } else {
            (f.salary, CategoryKind::Income)
        };
        let amount = dollars(1 + seq.below(50_000) as i64);
        match seq.below(4) {
            0 | 1 => {
                let txn = f
                    .store
                    .add_transaction(NewTransaction::new(
                        account,
                        category,
                        amount,
                        kind,
                        format!("step {step}"),
                        ymd(2024, 1, 1 + (step % 28) as u32),
                    ))
                    .unwrap();
                live.push(txn.id);
            }
            2 if !live.is_empty() => {
                let id = live[seq.below(live.len() as u64) as usize];
                f.store
                    .update_transaction(
                        id,
                        TransactionPatch {
                            account_id: Some(account),
                            category_id: Some(category),
                            kind: Some(kind),
                            amount: Some(amount),
                            ..TransactionPatch::default()
                        },
                    )
                    .unwrap();
            }
            3 if !live.is_empty() => {
                let id = live.swap_remove(seq.below(live.len() as u64) as usize);
                f.store.delete_transaction(id).unwrap();
            }
            _ => {}
        }
    }

    let transactions = f.store.transactions().unwrap();
    assert_eq!(transactions.len(), live.len());
    for account in accounts {
        let expected = initial[&account]
            + transactions
                .iter()
                .filter(|txn| txn.account_id == account)
                .map(|txn| txn.signed_amount())
                .sum::<Decimal>();
        assert_eq!(balance(&f.store, account), expected);
        let persisted = f.store.adapter().accounts().get(account).unwrap();
        assert_eq!(persisted.balance, expected);
    }
}
