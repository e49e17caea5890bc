use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::codec::ImportMode;
use crate::core::budget::BudgetThresholds;
use crate::core::scheduler::{CatchUpPolicy, RecurringScheduler};
use crate::utils::persistence::app_data_dir;

use super::ConfigError;

const DATA_DIR_NAME: &str = "data";

/// User-tunable engine settings persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Custom directory for the JSON collections. Defaults to `<app data dir>/data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub catch_up_policy: CatchUpPolicy,
    #[serde(default)]
    pub import_mode: ImportMode,
    #[serde(
        default = "Config::default_warning_percent",
        with = "rust_decimal::serde::float"
    )]
    pub budget_warning_percent: Decimal,
    #[serde(
        default = "Config::default_exceeded_percent",
        with = "rust_decimal::serde::float"
    )]
    pub budget_exceeded_percent: Decimal,
    #[serde(default = "Config::default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            catch_up_policy: CatchUpPolicy::default(),
            import_mode: ImportMode::default(),
            budget_warning_percent: Self::default_warning_percent(),
            budget_exceeded_percent: Self::default_exceeded_percent(),
            log_filter: Self::default_log_filter(),
        }
    }
}

impl Config {
    pub fn default_warning_percent() -> Decimal {
        BudgetThresholds::default().warning
    }

    pub fn default_exceeded_percent() -> Decimal {
        BudgetThresholds::default().exceeded
    }

    pub fn default_log_filter() -> String {
        "wealthtrack_core=info".into()
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(path) => path.clone(),
            None => app_data_dir().join(DATA_DIR_NAME),
        }
    }

    pub fn budget_thresholds(&self) -> Result<BudgetThresholds, ConfigError> {
        let (warning, exceeded) = (self.budget_warning_percent, self.budget_exceeded_percent);
        BudgetThresholds::new(warning, exceeded).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "budget warning threshold {warning} must be positive \
                 and not above exceeded threshold {exceeded}"
            ))
        })
    }

    pub fn scheduler(&self) -> RecurringScheduler {
        RecurringScheduler::new(self.catch_up_policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.budget_thresholds().map(|_| ())
    }
}
