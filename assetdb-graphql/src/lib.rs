//! GraphQL query construction and execution for the asset database client.
//!
//! - [`GraphQlQuery`] / [`QueryField`]: an owned selection tree with
//!   variables and field arguments, rendered to a query document
//! - [`fields_to_tree`]: folds flat dotted field paths (`"attrib.fps"`) into
//!   the [`FieldNode`] trie the builder expands
//! - [`GraphQlConnection`]: the transport seam; [`GraphQlQuery::query`] runs a
//!   query once, [`GraphQlQuery::continuous_query`] walks cursor pages
//!
//! Edge collections are declared with `has_edges` and come back from the
//! executor as plain lists, so callers never see `edges`/`node` envelopes.

mod error;
mod executor;
mod fields;
mod query;

pub use error::{GraphQlError, GraphQlResult};
pub use executor::{GraphQlConnection, Paginator};
pub use fields::{fields_to_tree, flatten_tree, FieldNode, FieldTree};
pub use query::{
    FilterValue, GraphQlQuery, QueryField, QueryVariable, VariableType, DEFAULT_PAGE_SIZE,
};
