use super::job::JobError;
use saved::config::ConfigError;
use saved::storage::StorageError;
use saved::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Saved jobs error: {0}")]
    Store(#[from] StoreError),
    #[error("Invalid job: {0}")]
    InvalidJob(#[from] JobError),
    #[error("Bad Input: {0}")]
    BadInput(String),
}
