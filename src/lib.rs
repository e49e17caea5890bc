#![doc(test(attr(deny(warnings))))]

//! WealthTrack Core keeps account balances, transactions, recurring schedules and
//! monthly budgets mutually consistent, and turns recurring schedules into real
//! ledger entries as time passes.

pub mod codec;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

pub use crate::core::{
    CatchUpPolicy, Clock, FixedClock, LedgerStore, RecurringScheduler, SchedulerReport,
    SystemClock,
};
pub use codec::ImportMode;
pub use errors::{LedgerError, Result, StorageError};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("WealthTrack Core tracing initialized.");
    });
}

/// Like [`init`], but filters logs with the configured `logFilter` directive.
pub fn init_with_config(config: &config::Config) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing_with(&config.log_filter);
        tracing::info!(filter = %config.log_filter, "WealthTrack Core tracing initialized.");
    });
}
