//! Error types for template population.

use assetdb_client::ClientError;
use thiserror::Error;

/// Result type for template population.
pub type WorkfileResult<T> = Result<T, WorkfileError>;

/// Errors that can occur while populating a template.
#[derive(Debug, Error)]
pub enum WorkfileError {
    /// Querying the asset database failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The host refused an operation on its scene.
    #[error("host error: {0}")]
    Host(String),

    /// A representation could not be loaded.
    #[error("failed to load representation {representation_id}: {message}")]
    Load {
        representation_id: String,
        message: String,
    },
}

impl WorkfileError {
    pub fn host(message: impl Into<String>) -> Self {
        WorkfileError::Host(message.into())
    }
}
