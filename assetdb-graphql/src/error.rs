//! Error types for query construction and execution.

use thiserror::Error;

/// Result type for query builder operations.
pub type GraphQlResult<T> = Result<T, GraphQlError>;

/// Errors raised locally, before or after a query reaches the server.
///
/// All of these describe a programming defect or a malformed server
/// envelope. None of them is transient.
#[derive(Debug, Error)]
pub enum GraphQlError {
    /// The query has no top-level fields.
    #[error("query '{0}' has no fields to query")]
    MissingFields(String),

    /// A field requesting an edge collection has no inner selection.
    #[error("edged field '{0}' has no child fields")]
    EdgesWithoutFields(String),

    /// A variable name was referenced that the query never declared.
    #[error("unknown query variable: {0}")]
    UnknownVariable(String),

    /// A variable was declared twice with different types.
    #[error("variable '{name}' already declared as {existing}, cannot redeclare as {requested}")]
    VariableTypeConflict {
        name: String,
        existing: &'static str,
        requested: &'static str,
    },

    /// Pagination needs exactly one edged field to walk.
    #[error("query '{query}' has {count} paginated fields, continuous query supports one")]
    AmbiguousPagination { query: String, count: usize },

    /// The server response did not have the shape the selection declared.
    #[error("malformed response at '{path}': {reason}")]
    MalformedResponse { path: String, reason: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
