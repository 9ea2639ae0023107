//! Asset database client.
//!
//! Two API generations live side by side:
//!
//! - [`v4`]: entity queries returning records in the server's own shape
//! - [`entities`]: the legacy (v3) API: same queries, legacy field names in,
//!   legacy documents out, via [`conversion`]
//!
//! Every entity function takes its connection explicitly. Anything
//! implementing [`ServerConnection`] works; [`HttpConnection`] talks to a
//! real server and [`default_connection`] builds one from the environment
//! for binaries that want a process-wide default.

pub mod config;
pub mod connection;
pub mod constants;
pub mod conversion;
pub mod entities;
pub mod error;
pub mod filters;
pub mod queries;
pub mod v4;

/// One decoded entity record.
pub type Document = serde_json::Map<String, serde_json::Value>;

pub use config::ServerConfig;
pub use connection::{default_connection, HttpConnection, ServerConnection};
pub use constants::field_set;
pub use error::{ClientError, ClientResult};
pub use filters::{ActiveSelection, FilterSet, QueryFilters};
pub use v4::{
    FolderFilter, RepresentationFilter, RepresentationParents, SubsetFilter, TaskFilter,
    VersionFilter,
};
