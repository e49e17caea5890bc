//! Portable representations of the ledger: a full JSON document and a transactions CSV.

pub mod csv;
pub mod json;

use serde::{Deserialize, Serialize};

pub use self::csv::{export_transactions_csv, transactions_to_csv};
pub use self::json::{export_document, export_json, import_document, import_json, ExportDocument};

/// How imported records combine with what the store already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Insert everything under fresh ids; references inside the payload follow the new ids.
    /// Importing the same file twice duplicates records.
    #[default]
    Append,
    /// Upsert by id: known ids are replaced, unknown ids inserted.
    MergeById,
    /// Clear every collection, then insert the payload with its own ids.
    Replace,
}

/// Counts of what an import wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub mode: ImportMode,
    pub accounts: usize,
    pub categories: usize,
    pub transactions: usize,
    pub recurring_transactions: usize,
    pub budgets: usize,
    /// Existing records overwritten by imported ones.
    pub replaced: usize,
    /// Existing records dropped by [`ImportMode::Replace`].
    pub removed: usize,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.accounts
            + self.categories
            + self.transactions
            + self.recurring_transactions
            + self.budgets
    }
}
