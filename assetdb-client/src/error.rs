//! Error types for the entity client.

use assetdb_graphql::GraphQlError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while querying the asset database.
///
/// "Not found" is never an error: lookups return `None` or an empty list.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The query could not be built or its response could not be decoded.
    #[error(transparent)]
    GraphQl(#[from] GraphQlError),

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with GraphQL errors.
    #[error("server returned errors: {}", .0.join("; "))]
    Server(Vec<String>),

    /// A REST endpoint answered with a non-success status.
    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// Legacy entry point with no implementation on this schema.
    #[error("'{0}' is not implemented")]
    NotImplemented(&'static str),

    /// Filter combination the schema cannot express.
    #[error("unsupported filter: {0}")]
    Unsupported(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Returns true for entry points that will never be available.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, ClientError::NotImplemented(_))
    }

    /// HTTP status of the failed request, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
