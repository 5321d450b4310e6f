use thiserror::Error;

use crate::storage::StorageError;

/// Top-level server errors (startup, shutdown, listeners)
///
/// Request-level failures use [`shared::AppError`]; this type only covers the
/// lifecycle paths in `main`/`Server::run`.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
