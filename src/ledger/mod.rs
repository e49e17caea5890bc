//! Ledger domain models, persistence-friendly types, and helpers.

pub mod account;
pub mod budget;
pub mod calendar;
pub mod category;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod recurring;
pub mod transaction;
pub mod validation;

pub use account::{Account, AccountKind, AccountPatch, NewAccount};
pub use budget::Budget;
pub use category::{Category, CategoryKind, CategoryPatch, NewCategory};
pub use ledger::{Entity, Ledger};
pub use recurring::{Frequency, NewRecurringTransaction, RecurringPatch, RecurringTransaction};
pub use transaction::{NewTransaction, Transaction, TransactionKind, TransactionPatch};
