use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{LedgerError, Result};
use crate::ledger::Transaction;

use super::store::LedgerStore;

/// Upper bound on occurrences one schedule may generate in a single catch-up tick.
pub const MAX_CATCH_UP_OCCURRENCES: usize = 1024;

/// How many missed occurrences a tick materializes per schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatchUpPolicy {
    /// At most one occurrence per schedule per tick.
    #[default]
    SingleStep,
    /// Every occurrence up to and including today.
    CatchUp,
}

impl CatchUpPolicy {
    fn limit(&self) -> usize {
        match self {
            CatchUpPolicy::SingleStep => 1,
            CatchUpPolicy::CatchUp => MAX_CATCH_UP_OCCURRENCES,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSchedule {
    pub recurring_id: Uuid,
    pub reason: String,
}

/// What a tick produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulerReport {
    pub created: Vec<Transaction>,
    pub skipped: Vec<SkippedSchedule>,
    /// Schedules that hit [`MAX_CATCH_UP_OCCURRENCES`] and are still due.
    pub capped: Vec<Uuid>,
}

impl SchedulerReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.skipped.is_empty() && self.capped.is_empty()
    }
}

/// Materializes due recurring schedules into transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecurringScheduler {
    policy: CatchUpPolicy,
}

impl RecurringScheduler {
    pub fn new(policy: CatchUpPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CatchUpPolicy {
        self.policy
    }

    /// Fires every active schedule whose `next_date` is on or before `today`.
    ///
    /// Schedules that fail validation are skipped and reported; persistence failures
    /// abort the tick.
    pub fn tick(&self, store: &LedgerStore, today: NaiveDate) -> Result<SchedulerReport> {
        let due: Vec<Uuid> = store
            .recurring_transactions()?
            .into_iter()
            .filter(|schedule| schedule.is_due(today))
            .map(|schedule| schedule.id)
            .collect();
        let mut report = SchedulerReport::default();
        let limit = self.policy.limit();

        for id in due {
            let mut fired = 0;
            while fired < limit {
                match store.materialize_occurrence(id, today) {
                    Ok(Some(occurrence)) => {
                        debug!(
                            "recurring {} materialized transaction {} on {}; next {}",
                            id,
                            occurrence.transaction.id,
                            occurrence.transaction.date,
                            occurrence.next_date
                        );
                        report.created.push(occurrence.transaction);
                        fired += 1;
                    }
                    Ok(None) => break,
                    Err(LedgerError::Validation(reason)) => {
                        warn!("skipping recurring transaction {}: {}", id, reason);
                        report.skipped.push(SkippedSchedule {
                            recurring_id: id,
                            reason,
                        });
                        break;
                    }
                    Err(err) => return Err(err),
                }
            }
            if fired == limit && self.policy == CatchUpPolicy::CatchUp {
                let still_due = store
                    .recurring(id)?
                    .map(|schedule| schedule.is_due(today))
                    .unwrap_or(false);
                if still_due {
                    warn!(
                        "recurring transaction {} reached the catch-up limit of {} occurrences",
                        id, MAX_CATCH_UP_OCCURRENCES
                    );
                    report.capped.push(id);
                }
            }
        }
        Ok(report)
    }
}
