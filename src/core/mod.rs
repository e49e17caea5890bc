//! Ledger consistency engine: the store, its journal, the recurring scheduler and
//! the pure budget/report evaluators.

pub(crate) mod balance;
pub mod budget;
pub mod clock;
pub mod journal;
pub mod reports;
pub mod scheduler;
pub mod store;

pub use budget::{BudgetProgress, BudgetStatus, BudgetThresholds};
pub use clock::{Clock, FixedClock, SystemClock};
pub use scheduler::{CatchUpPolicy, RecurringScheduler, SchedulerReport};
pub use store::{LedgerStore, Occurrence};
