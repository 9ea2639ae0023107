//! Placeholders: marker nodes in a template that say what to load and where
//! to put it.

use crate::error::WorkfileResult;
use crate::representations::parse_loader_args;
use assetdb_client::Document;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

/// Keys every placeholder must carry to be usable.
pub const REQUIRED_ATTRIBUTES: &[&str] = &[
    "builder_type",
    "family",
    "representation",
    "order",
    "loader",
    "loader_args",
];

/// Builder type of placeholders that load the current context asset.
pub const CONTEXT_ASSET: &str = "context_asset";

/// Builder type of placeholders that load assets linked to the context.
pub const LINKED_ASSET: &str = "linked_asset";

/// A placeholder read from a host template node.
///
/// Implementors expose the data collected from the node and the host side
/// effects; everything else has a default built on [`Placeholder::data`].
#[async_trait]
pub trait Placeholder: Send + Sync {
    /// Host handle of a loaded container.
    type Container: Send + Sync;

    /// Name of the underlying node.
    fn name(&self) -> &str;

    /// Attributes collected from the node.
    fn data(&self) -> &Document;

    /// Keys that must be present in [`Placeholder::data`].
    fn required_attributes(&self) -> &[&str] {
        REQUIRED_ATTRIBUTES
    }

    /// Load priority, lowest first. Placeholders without a numeric order
    /// load last.
    fn order(&self) -> i64 {
        self.data()
            .get("order")
            .and_then(Value::as_i64)
            .unwrap_or(i64::MAX)
    }

    fn loader_name(&self) -> &str {
        data_str(self.data(), "loader")
    }

    /// Raw loader arguments as written on the node.
    fn loader_args(&self) -> &str {
        data_str(self.data(), "loader_args")
    }

    /// Loader options parsed from [`Placeholder::loader_args`].
    fn loader_options(&self) -> Document {
        parse_loader_args(self.loader_args())
    }

    fn builder_type(&self) -> &str {
        data_str(self.data(), "builder_type")
    }

    /// Whether the placeholder loads the current context asset rather than
    /// linked assets.
    fn is_context(&self) -> bool {
        self.builder_type() == CONTEXT_ASSET
    }

    /// Whether every required attribute is present.
    fn is_valid(&self) -> bool {
        let data = self.data();
        let valid = self
            .required_attributes()
            .iter()
            .all(|key| data.contains_key(*key));
        if valid {
            debug!(placeholder = %self.name(), "valid placeholder");
        } else {
            info!(placeholder = %self.name(), "placeholder is not valid");
        }
        valid
    }

    /// Representations matching this placeholder's filters.
    async fn representations(
        &self,
        current_asset: &Document,
        linked_assets: &[Document],
    ) -> WorkfileResult<Vec<Document>>;

    /// Moves a loaded container under this placeholder's place in the scene.
    fn parent_in_hierarchy(&mut self, container: &Self::Container) -> WorkfileResult<()>;

    /// Removes the placeholder from the scene once loading is done.
    fn clean(&mut self) -> WorkfileResult<()>;

    /// Message reported when the placeholder yields nothing usable.
    fn error_message(&self) -> String {
        format!(
            "No representation found for placeholder '{}' (loader '{}', family '{}')",
            self.name(),
            self.loader_name(),
            data_str(self.data(), "family"),
        )
    }
}

fn data_str<'a>(data: &'a Document, key: &str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or_default()
}
