//! Template loaders and the population loop.
//!
//! A [`TemplateLoader`] is the host side: it lists the placeholder nodes of
//! the opened template and loads representations into the scene.
//! [`populate_template`] drives it: placeholders are validated and sorted,
//! each one picks the latest representation per subset, and every pick is
//! loaded, parented and cleaned up through the loader's hooks.

use crate::error::{WorkfileError, WorkfileResult};
use crate::placeholder::Placeholder;
use crate::representations::{
    latest_representations_by_subset, representation_asset, representation_id,
    representation_subset,
};
use assetdb_client::Document;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Host-side template operations.
#[async_trait]
pub trait TemplateLoader: Send {
    /// Host node carrying placeholder data.
    type Node: Send;
    /// Host handle of a loaded container.
    type Container: Send + Sync;
    type Placeholder: Placeholder<Container = Self::Container>;

    /// Placeholder nodes of the current template.
    fn template_nodes(&self) -> WorkfileResult<Vec<Self::Node>>;

    /// Reads a placeholder from one node.
    fn placeholder_from_node(&self, node: Self::Node) -> WorkfileResult<Self::Placeholder>;

    /// Representation ids of containers already present in the scene.
    fn loaded_container_ids(&self) -> WorkfileResult<BTreeSet<String>>;

    /// Loads one representation for a placeholder.
    async fn load(
        &mut self,
        placeholder: &Self::Placeholder,
        representation: &Document,
    ) -> WorkfileResult<Self::Container>;

    /// Runs before each representation of a placeholder is considered.
    fn preload(&mut self, _placeholder: &Self::Placeholder, _representation: &Document) {}

    fn load_succeeded(
        &mut self,
        placeholder: &mut Self::Placeholder,
        container: &Self::Container,
    ) -> WorkfileResult<()> {
        placeholder.parent_in_hierarchy(container)
    }

    fn load_failed(
        &mut self,
        placeholder: &Self::Placeholder,
        representation: &Document,
        error: &WorkfileError,
    ) {
        warn!(
            asset = representation_asset(representation).unwrap_or_default(),
            subset = representation_subset(representation).unwrap_or_default(),
            loader = %placeholder.loader_name(),
            error = %error,
            "failed to load representation"
        );
    }

    /// Runs after every load attempt, successful or not.
    fn postload(&mut self, placeholder: &mut Self::Placeholder) -> WorkfileResult<()> {
        placeholder.clean()
    }
}

/// What one population pass did, by representation id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopulateReport {
    pub loaded: Vec<String>,
    /// Representations skipped because their id was ignored.
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
    /// Placeholders that matched no representation.
    pub empty_placeholders: Vec<String>,
}

impl PopulateReport {
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Task type of `task_name` in a legacy asset document.
pub fn context_task_type<'a>(asset: &'a Document, task_name: &str) -> Option<&'a str> {
    asset
        .get("data")?
        .get("tasks")?
        .get(task_name)?
        .get("type")?
        .as_str()
}

/// Valid placeholders of the template, lowest order first.
pub fn collect_placeholders<L>(loader: &L) -> WorkfileResult<Vec<L::Placeholder>>
where
    L: TemplateLoader + ?Sized,
{
    let mut placeholders = Vec::new();
    for node in loader.template_nodes()? {
        let placeholder = loader.placeholder_from_node(node)?;
        if placeholder.is_valid() {
            placeholders.push(placeholder);
        }
    }
    placeholders.sort_by_key(|placeholder| placeholder.order());
    debug!(
        placeholders = ?placeholders.iter().map(|p| p.name()).collect::<Vec<_>>(),
        "placeholders found in template"
    );
    Ok(placeholders)
}

/// Loads representations for every placeholder of the template.
///
/// Representations whose id is in `ignored_ids` are skipped. Load failures
/// are reported through [`TemplateLoader::load_failed`] and recorded; query
/// and host errors abort the pass.
pub async fn populate_template<L>(
    loader: &mut L,
    current_asset: &Document,
    linked_assets: &[Document],
    ignored_ids: &BTreeSet<String>,
) -> WorkfileResult<PopulateReport>
where
    L: TemplateLoader + ?Sized,
{
    let mut report = PopulateReport::default();

    for mut placeholder in collect_placeholders(loader)? {
        debug!(placeholder = %placeholder.name(), "processing placeholder");
        let found = placeholder
            .representations(current_asset, linked_assets)
            .await?;
        let representations = latest_representations_by_subset(found);
        if representations.is_empty() {
            info!(placeholder = %placeholder.name(), "no representation for placeholder");
            report.empty_placeholders.push(placeholder.name().to_string());
            continue;
        }

        for representation in representations {
            loader.preload(&placeholder, &representation);

            let Some(id) = representation_id(&representation).map(str::to_string) else {
                warn!("{}", placeholder.error_message());
                continue;
            };
            if ignored_ids.contains(&id) {
                debug!(representation = %id, "ignoring already loaded representation");
                report.skipped.push(id);
                continue;
            }

            info!(
                asset = representation_asset(&representation).unwrap_or_default(),
                subset = representation_subset(&representation).unwrap_or_default(),
                loader = %placeholder.loader_name(),
                args = %placeholder.loader_args(),
                "loading representation"
            );
            let outcome = match loader.load(&placeholder, &representation).await {
                Ok(container) => loader.load_succeeded(&mut placeholder, &container),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => report.loaded.push(id),
                Err(e) => {
                    loader.load_failed(&placeholder, &representation, &e);
                    report.failed.push(id);
                }
            }
            loader.postload(&mut placeholder)?;
        }
    }
    Ok(report)
}

/// Populates again, skipping representations that already have a container
/// in the scene.
pub async fn update_missing_containers<L>(
    loader: &mut L,
    current_asset: &Document,
    linked_assets: &[Document],
) -> WorkfileResult<PopulateReport>
where
    L: TemplateLoader + ?Sized,
{
    let loaded = loader.loaded_container_ids()?;
    populate_template(loader, current_asset, linked_assets, &loaded).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn task_type_is_read_from_legacy_tasks() {
        let asset = match json!({"data": {"tasks": {"comp": {"type": "Compositing"}}}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(context_task_type(&asset, "comp"), Some("Compositing"));
        assert_eq!(context_task_type(&asset, "anim"), None);
    }
}
