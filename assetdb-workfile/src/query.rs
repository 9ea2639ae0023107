//! Representation lookup for placeholders.

use crate::error::WorkfileResult;
use crate::placeholder::Placeholder;
use assetdb_client::entities::{
    get_last_versions, get_representations, get_subsets, RepresentationQuery, SubsetQuery,
};
use assetdb_client::{Document, ServerConnection};
use serde_json::Value;
use tracing::debug;

fn strings(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|field| field.to_string()).collect()
}

fn document_id(document: &Document) -> Option<String> {
    document.get("_id").and_then(Value::as_str).map(str::to_string)
}

fn subset_family(subset: &Document) -> Option<&str> {
    subset
        .get("data")
        .and_then(|data| data.get("family"))
        .and_then(Value::as_str)
}

/// Representations a placeholder asks for: the last version of every subset
/// of the placeholder's family under the context asset (or the linked assets
/// for non-context placeholders), narrowed to the placeholder's
/// representation name.
pub async fn query_placeholder_representations<C, P>(
    con: &C,
    project_name: &str,
    placeholder: &P,
    current_asset: &Document,
    linked_assets: &[Document],
) -> WorkfileResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
    P: Placeholder + ?Sized,
{
    let assets = if placeholder.is_context() {
        std::slice::from_ref(current_asset)
    } else {
        linked_assets
    };
    let asset_ids: Vec<String> = assets.iter().filter_map(document_id).collect();
    if asset_ids.is_empty() {
        return Ok(Vec::new());
    }

    let family = placeholder
        .data()
        .get("family")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let subsets = get_subsets(
        con,
        project_name,
        &SubsetQuery {
            asset_ids: Some(asset_ids),
            fields: Some(strings(&["_id", "data.family"])),
            ..Default::default()
        },
    )
    .await?;
    let subset_ids: Vec<String> = subsets
        .iter()
        .filter(|subset| subset_family(subset) == Some(family))
        .filter_map(document_id)
        .collect();
    debug!(
        placeholder = %placeholder.name(),
        family,
        subsets = subset_ids.len(),
        "subsets matching placeholder"
    );
    if subset_ids.is_empty() {
        return Ok(Vec::new());
    }

    let versions = get_last_versions(
        con,
        project_name,
        &subset_ids,
        Some(strings(&["_id"]).as_slice()),
    )
    .await?;
    let version_ids: Vec<String> = versions.values().filter_map(document_id).collect();
    if version_ids.is_empty() {
        return Ok(Vec::new());
    }

    let representation_names = placeholder
        .data()
        .get("representation")
        .and_then(Value::as_str)
        .map(|name| vec![name.to_string()]);
    let representations = get_representations(
        con,
        project_name,
        &RepresentationQuery {
            version_ids: Some(version_ids),
            representation_names,
            ..Default::default()
        },
    )
    .await?;
    Ok(representations)
}
