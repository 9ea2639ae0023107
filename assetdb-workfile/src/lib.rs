//! Template-driven scene population.
//!
//! A host opens a template scene containing placeholder nodes. Each
//! placeholder names a family, a representation and a loader; populating
//! the template queries the asset database for matching representations,
//! loads the latest one per subset and parents it where the placeholder
//! sits. Host scene types stay opaque behind [`TemplateLoader`] and
//! [`Placeholder`].

pub mod error;
pub mod loader;
pub mod placeholder;
pub mod query;
pub mod representations;

pub use error::{WorkfileError, WorkfileResult};
pub use loader::{
    collect_placeholders, context_task_type, populate_template, update_missing_containers,
    PopulateReport, TemplateLoader,
};
pub use placeholder::{Placeholder, CONTEXT_ASSET, LINKED_ASSET, REQUIRED_ATTRIBUTES};
pub use query::query_placeholder_representations;
pub use representations::{latest_representations_by_subset, parse_loader_args};
