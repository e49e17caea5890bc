use thiserror::Error;
use uuid::Uuid;

use crate::storage::Collection;

/// Failures raised by the ledger store and the codecs built on top of it.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),
    #[error("Import format error: {0}")]
    ImportFormat(String),
    #[error("Export error: {0}")]
    Export(String),
    #[error("Ledger state lock poisoned")]
    Poisoned,
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        LedgerError::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Failures raised by persistence adapters.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{collection} record not found: {id}")]
    NotFound { collection: Collection, id: Uuid },
    #[error("{collection} record already exists: {id}")]
    Duplicate { collection: Collection, id: Uuid },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Storage lock poisoned")]
    Poisoned,
}
