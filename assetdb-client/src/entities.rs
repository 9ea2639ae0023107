//! Legacy (v3) entity API.
//!
//! These functions keep the legacy call shapes and document layout on top of
//! the v4 entity functions: legacy field names are mapped to v4 fields on the
//! way in and records are converted back on the way out. Lookups that find
//! nothing return `None` or an empty collection, never an error.

use crate::connection::ServerConnection;
use crate::conversion::{
    convert_v4_folder_to_v3, convert_v4_hero_version_to_v3, convert_v4_project_to_v3,
    convert_v4_representation_to_v3, convert_v4_subset_to_v3, convert_v4_version_to_v3,
    folder_fields_v3_to_v4, is_hero_version, project_fields_v3_to_v4,
    representation_fields_v3_to_v4, subset_fields_v3_to_v4, version_fields_v3_to_v4,
};
use crate::error::{ClientError, ClientResult};
use crate::filters::{ActiveSelection, QueryFilters};
use crate::queries::{subset_families_graphql_query, version_is_latest_graphql_query};
use crate::v4::{
    get_v4_folders, get_v4_folders_tasks, get_v4_project, get_v4_projects,
    get_v4_representations, get_v4_representations_parents, get_v4_subsets, get_v4_versions,
    FolderFilter, RepresentationFilter, RepresentationParents, SubsetFilter, VersionFilter,
};
use crate::Document;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

fn first(documents: Vec<Document>) -> Option<Document> {
    documents.into_iter().next()
}

fn single(value: &str) -> Option<Vec<String>> {
    Some(vec![value.to_string()])
}

fn owned(values: Option<&[String]>) -> Option<Vec<String>> {
    values.map(<[String]>::to_vec)
}

fn str_field<'a>(document: &'a Document, key: &str) -> Option<&'a str> {
    document.get(key).and_then(Value::as_str)
}

// ── Projects ─────────────────────────────────────────────────────

/// Projects selected by their active flag. Asking for neither active nor
/// inactive projects returns nothing without a request.
pub async fn get_projects<C>(
    con: &C,
    active: bool,
    inactive: bool,
    library: Option<bool>,
    fields: Option<&[String]>,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    let Some(active) = ActiveSelection::from_flags(active, inactive).as_filter() else {
        return Ok(Vec::new());
    };
    let fields = project_fields_v3_to_v4(fields);
    let projects = get_v4_projects(con, active, library, fields.as_ref()).await?;
    Ok(projects.into_iter().map(convert_v4_project_to_v3).collect())
}

pub async fn get_project<C>(
    con: &C,
    project_name: &str,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let fields = project_fields_v3_to_v4(fields);
    let project = get_v4_project(con, project_name, fields.as_ref()).await?;
    Ok(project.map(convert_v4_project_to_v3))
}

/// Not available on this schema.
pub fn get_whole_project() -> ClientResult<Vec<Document>> {
    Err(ClientError::NotImplemented("get_whole_project"))
}

// ── Assets ───────────────────────────────────────────────────────

/// Filters for [`get_assets`].
#[derive(Debug, Clone, Default)]
pub struct AssetQuery {
    pub asset_ids: Option<Vec<String>>,
    pub asset_names: Option<Vec<String>>,
    /// `None` entries select assets directly under the project.
    pub parent_ids: Option<Vec<Option<String>>>,
    /// Return archived (inactive) assets instead of active ones.
    pub archived: bool,
    pub fields: Option<Vec<String>>,
}

/// Assets (folders) of a project, with their tasks inline when the
/// requested fields need them.
pub async fn get_assets<C>(
    con: &C,
    project_name: &str,
    query: &AssetQuery,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    if project_name.is_empty() {
        return Ok(Vec::new());
    }

    let fields = folder_fields_v3_to_v4(query.fields.as_deref());
    let with_tasks = fields.as_ref().is_none_or(|fields| fields.contains("tasks"));
    let filter = FolderFilter {
        folder_ids: query.asset_ids.clone(),
        folder_names: query.asset_names.clone(),
        parent_ids: query.parent_ids.clone(),
        active: Some(!query.archived),
        fields,
        ..Default::default()
    };

    let folders = if with_tasks {
        get_v4_folders_tasks(con, project_name, &filter).await?
    } else {
        get_v4_folders(con, project_name, &filter).await?
    };
    Ok(folders
        .into_iter()
        .map(|folder| convert_v4_folder_to_v3(folder, project_name))
        .collect())
}

pub async fn get_asset_by_id<C>(
    con: &C,
    project_name: &str,
    asset_id: &str,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let query = AssetQuery {
        asset_ids: single(asset_id),
        fields: owned(fields),
        ..Default::default()
    };
    Ok(first(get_assets(con, project_name, &query).await?))
}

pub async fn get_asset_by_name<C>(
    con: &C,
    project_name: &str,
    asset_name: &str,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let query = AssetQuery {
        asset_names: single(asset_name),
        fields: owned(fields),
        ..Default::default()
    };
    Ok(first(get_assets(con, project_name, &query).await?))
}

/// Not available on this schema.
pub fn get_archived_assets() -> ClientResult<Vec<Document>> {
    Err(ClientError::NotImplemented("get_archived_assets"))
}

/// Ids of the given assets (or of every asset) that have at least one
/// subset.
pub async fn get_asset_ids_with_subsets<C>(
    con: &C,
    project_name: &str,
    asset_ids: Option<&[String]>,
) -> ClientResult<BTreeSet<String>>
where
    C: ServerConnection + ?Sized,
{
    let filter = FolderFilter {
        folder_ids: owned(asset_ids),
        has_subsets: Some(true),
        fields: Some(BTreeSet::from(["id".to_string()])),
        ..Default::default()
    };
    let folders = get_v4_folders(con, project_name, &filter).await?;
    Ok(folders
        .iter()
        .filter_map(|folder| str_field(folder, "id"))
        .map(str::to_string)
        .collect())
}

// ── Subsets ──────────────────────────────────────────────────────

/// Filters for [`get_subsets`].
#[derive(Debug, Clone, Default)]
pub struct SubsetQuery {
    pub subset_ids: Option<Vec<String>>,
    pub subset_names: Option<Vec<String>>,
    pub asset_ids: Option<Vec<String>>,
    /// Subset names allowed per asset id. Replaces `subset_names` and
    /// `asset_ids` when set.
    pub names_by_asset_ids: Option<BTreeMap<String, Vec<String>>>,
    /// Return archived (inactive) subsets instead of active ones.
    pub archived: bool,
    pub fields: Option<Vec<String>>,
}

pub async fn get_subsets<C>(
    con: &C,
    project_name: &str,
    query: &SubsetQuery,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    let filter = SubsetFilter {
        subset_ids: query.subset_ids.clone(),
        subset_names: query.subset_names.clone(),
        folder_ids: query.asset_ids.clone(),
        names_by_folder_ids: query.names_by_asset_ids.clone(),
        active: Some(!query.archived),
        fields: subset_fields_v3_to_v4(query.fields.as_deref()),
    };
    let subsets = get_v4_subsets(con, project_name, &filter).await?;
    Ok(subsets.into_iter().map(convert_v4_subset_to_v3).collect())
}

pub async fn get_subset_by_id<C>(
    con: &C,
    project_name: &str,
    subset_id: &str,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let query = SubsetQuery {
        subset_ids: single(subset_id),
        fields: owned(fields),
        ..Default::default()
    };
    Ok(first(get_subsets(con, project_name, &query).await?))
}

pub async fn get_subset_by_name<C>(
    con: &C,
    project_name: &str,
    subset_name: &str,
    asset_id: &str,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let query = SubsetQuery {
        subset_names: single(subset_name),
        asset_ids: single(asset_id),
        fields: owned(fields),
        ..Default::default()
    };
    Ok(first(get_subsets(con, project_name, &query).await?))
}

/// Families of the given subsets, or every family used in the project.
pub async fn get_subset_families<C>(
    con: &C,
    project_name: &str,
    subset_ids: Option<&[String]>,
) -> ClientResult<BTreeSet<String>>
where
    C: ServerConnection + ?Sized,
{
    if let Some(subset_ids) = subset_ids {
        let filter = SubsetFilter {
            subset_ids: Some(subset_ids.to_vec()),
            fields: Some(BTreeSet::from(["family".to_string()])),
            ..Default::default()
        };
        let subsets = get_v4_subsets(con, project_name, &filter).await?;
        return Ok(subsets
            .iter()
            .filter_map(|subset| str_field(subset, "family"))
            .map(str::to_string)
            .collect());
    }

    let mut query = subset_families_graphql_query()?;
    QueryFilters::new(project_name).apply(&mut query)?;
    let data = query.query(con).await?;
    Ok(data
        .pointer("/project/subsetFamilies")
        .and_then(Value::as_array)
        .map(|families| {
            families
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default())
}

// ── Versions ─────────────────────────────────────────────────────

/// Filters for [`get_versions`].
#[derive(Debug, Clone, Default)]
pub struct VersionQuery {
    pub version_ids: Option<Vec<String>>,
    pub subset_ids: Option<Vec<String>>,
    pub versions: Option<Vec<i64>>,
    /// Include hero versions next to the standard ones.
    pub hero: bool,
    pub fields: Option<Vec<String>>,
}

/// Queries versions and converts them. Hero versions are linked to the
/// standard version they mirror through a second, batched lookup.
async fn query_versions<C>(
    con: &C,
    project_name: &str,
    mut filter: VersionFilter,
    fields: Option<&[String]>,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    let mut v4_fields = version_fields_v3_to_v4(fields);
    if filter.hero {
        if let Some(fields) = v4_fields.as_mut() {
            fields.insert("subsetId".to_string());
            fields.insert("version".to_string());
        }
    }
    filter.fields = v4_fields;

    let queried = get_v4_versions(con, project_name, &filter).await?;

    let mut hero_subset_ids = BTreeSet::new();
    let mut hero_numbers = BTreeSet::new();
    for version in queried.iter().filter(|version| is_hero_version(version)) {
        if let Some(subset_id) = str_field(version, "subsetId") {
            hero_subset_ids.insert(subset_id.to_string());
        }
        if let Some(number) = version.get("version").and_then(Value::as_i64) {
            hero_numbers.insert(number.abs());
        }
    }

    let candidates = if hero_subset_ids.is_empty() {
        Vec::new()
    } else {
        let lookup = VersionFilter {
            subset_ids: Some(hero_subset_ids.into_iter().collect()),
            versions: Some(hero_numbers.into_iter().collect()),
            hero: false,
            fields: Some(BTreeSet::from([
                "id".to_string(),
                "version".to_string(),
                "subsetId".to_string(),
            ])),
            ..Default::default()
        };
        get_v4_versions(con, project_name, &lookup).await?
    };

    Ok(queried
        .into_iter()
        .map(|version| {
            if is_hero_version(&version) {
                convert_v4_hero_version_to_v3(version, &candidates)
            } else {
                convert_v4_version_to_v3(version)
            }
        })
        .collect())
}

/// Standard versions, plus hero versions when `hero` is set.
pub async fn get_versions<C>(
    con: &C,
    project_name: &str,
    query: &VersionQuery,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    let filter = VersionFilter {
        version_ids: query.version_ids.clone(),
        subset_ids: query.subset_ids.clone(),
        versions: query.versions.clone(),
        hero: query.hero,
        standard: true,
        ..Default::default()
    };
    query_versions(con, project_name, filter, query.fields.as_deref()).await
}

/// Version by id, hero versions included.
pub async fn get_version_by_id<C>(
    con: &C,
    project_name: &str,
    version_id: &str,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let query = VersionQuery {
        version_ids: single(version_id),
        hero: true,
        fields: owned(fields),
        ..Default::default()
    };
    Ok(first(get_versions(con, project_name, &query).await?))
}

pub async fn get_version_by_name<C>(
    con: &C,
    project_name: &str,
    version: i64,
    subset_id: &str,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let query = VersionQuery {
        subset_ids: single(subset_id),
        versions: Some(vec![version]),
        fields: owned(fields),
        ..Default::default()
    };
    Ok(first(get_versions(con, project_name, &query).await?))
}

/// Hero versions only.
pub async fn get_hero_versions<C>(
    con: &C,
    project_name: &str,
    subset_ids: Option<&[String]>,
    version_ids: Option<&[String]>,
    fields: Option<&[String]>,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    let filter = VersionFilter {
        subset_ids: owned(subset_ids),
        version_ids: owned(version_ids),
        hero: true,
        standard: false,
        ..Default::default()
    };
    query_versions(con, project_name, filter, fields).await
}

pub async fn get_hero_version_by_id<C>(
    con: &C,
    project_name: &str,
    version_id: &str,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let ids = [version_id.to_string()];
    Ok(first(get_hero_versions(con, project_name, None, Some(&ids), fields).await?))
}

pub async fn get_hero_version_by_subset_id<C>(
    con: &C,
    project_name: &str,
    subset_id: &str,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let ids = [subset_id.to_string()];
    Ok(first(get_hero_versions(con, project_name, Some(&ids), None, fields).await?))
}

/// Latest standard version of each subset, keyed by subset id.
pub async fn get_last_versions<C>(
    con: &C,
    project_name: &str,
    subset_ids: &[String],
    fields: Option<&[String]>,
) -> ClientResult<BTreeMap<String, Document>>
where
    C: ServerConnection + ?Sized,
{
    // The result is keyed by parent, so it must always be selected.
    let fields = fields.map(|fields| {
        let mut fields = fields.to_vec();
        fields.push("parent".to_string());
        fields
    });
    let filter = VersionFilter {
        subset_ids: Some(subset_ids.to_vec()),
        hero: false,
        latest: true,
        ..Default::default()
    };
    let versions = query_versions(con, project_name, filter, fields.as_deref()).await?;
    Ok(versions
        .into_iter()
        .filter_map(|version| {
            let parent = str_field(&version, "parent")?.to_string();
            Some((parent, version))
        })
        .collect())
}

pub async fn get_last_version_by_subset_id<C>(
    con: &C,
    project_name: &str,
    subset_id: &str,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let filter = VersionFilter {
        subset_ids: single(subset_id),
        hero: false,
        latest: true,
        ..Default::default()
    };
    Ok(first(query_versions(con, project_name, filter, fields).await?))
}

/// Latest version of a subset found by name under an asset given by id or
/// by name. Stops at the first missing link.
pub async fn get_last_version_by_subset_name<C>(
    con: &C,
    project_name: &str,
    subset_name: &str,
    asset_id: Option<&str>,
    asset_name: Option<&str>,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let id_fields = ["_id".to_string()];
    let asset_id = match (asset_id, asset_name) {
        (Some(asset_id), _) => asset_id.to_string(),
        (None, Some(asset_name)) => {
            let asset = get_asset_by_name(con, project_name, asset_name, Some(&id_fields)).await?;
            match asset.as_ref().and_then(|asset| str_field(asset, "_id")) {
                Some(id) => id.to_string(),
                None => return Ok(None),
            }
        }
        (None, None) => return Ok(None),
    };

    let subset =
        get_subset_by_name(con, project_name, subset_name, &asset_id, Some(&id_fields)).await?;
    let Some(subset_id) = subset.as_ref().and_then(|subset| str_field(subset, "_id")) else {
        return Ok(None);
    };
    get_last_version_by_subset_id(con, project_name, subset_id, fields).await
}

/// Whether the version is the latest one of its subset.
pub async fn version_is_latest<C>(
    con: &C,
    project_name: &str,
    version_id: &str,
) -> ClientResult<bool>
where
    C: ServerConnection + ?Sized,
{
    let mut query = version_is_latest_graphql_query()?;
    let mut filters = QueryFilters::new(project_name);
    filters.set("versionId", version_id);
    filters.apply(&mut query)?;

    let data = query.query(con).await?;
    let latest_id = data
        .pointer("/project/version/subset/latestVersion/id")
        .and_then(Value::as_str);
    Ok(latest_id == Some(version_id))
}

/// Not available on this schema.
pub fn get_output_link_versions() -> ClientResult<Vec<Document>> {
    Err(ClientError::NotImplemented("get_output_link_versions"))
}

// ── Representations ──────────────────────────────────────────────

/// Filters for [`get_representations`].
#[derive(Debug, Clone)]
pub struct RepresentationQuery {
    pub representation_ids: Option<Vec<String>>,
    pub representation_names: Option<Vec<String>>,
    pub version_ids: Option<Vec<String>>,
    /// Context value filters. Not supported by the server schema.
    pub context_filters: Option<BTreeMap<String, Vec<String>>>,
    /// Representation names allowed per version id. Replaces
    /// `representation_names` and `version_ids` when set.
    pub names_by_version_ids: Option<BTreeMap<String, Vec<String>>>,
    /// Include archived (inactive) representations.
    pub archived: bool,
    /// Include standard (active) representations.
    pub standard: bool,
    pub fields: Option<Vec<String>>,
}

impl Default for RepresentationQuery {
    fn default() -> Self {
        Self {
            representation_ids: None,
            representation_names: None,
            version_ids: None,
            context_filters: None,
            names_by_version_ids: None,
            archived: false,
            standard: true,
            fields: None,
        }
    }
}

pub async fn get_representations<C>(
    con: &C,
    project_name: &str,
    query: &RepresentationQuery,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    if query.context_filters.is_some() {
        return Err(ClientError::Unsupported(
            "representations cannot be filtered by context".to_string(),
        ));
    }
    let Some(active) = ActiveSelection::from_flags(query.standard, query.archived).as_filter()
    else {
        return Ok(Vec::new());
    };

    let filter = RepresentationFilter {
        representation_ids: query.representation_ids.clone(),
        representation_names: query.representation_names.clone(),
        version_ids: query.version_ids.clone(),
        names_by_version_ids: query.names_by_version_ids.clone(),
        active,
        fields: representation_fields_v3_to_v4(query.fields.as_deref()),
    };
    let representations = get_v4_representations(con, project_name, &filter).await?;
    Ok(representations
        .into_iter()
        .map(convert_v4_representation_to_v3)
        .collect())
}

pub async fn get_representation_by_id<C>(
    con: &C,
    project_name: &str,
    representation_id: &str,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let query = RepresentationQuery {
        representation_ids: single(representation_id),
        fields: owned(fields),
        ..Default::default()
    };
    Ok(first(get_representations(con, project_name, &query).await?))
}

pub async fn get_representation_by_name<C>(
    con: &C,
    project_name: &str,
    representation_name: &str,
    version_id: &str,
    fields: Option<&[String]>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    let query = RepresentationQuery {
        representation_names: single(representation_name),
        version_ids: single(version_id),
        fields: owned(fields),
        ..Default::default()
    };
    Ok(first(get_representations(con, project_name, &query).await?))
}

fn convert_parents(parents: RepresentationParents, project_name: &str) -> RepresentationParents {
    RepresentationParents {
        version: parents.version.map(convert_v4_version_to_v3),
        subset: parents.subset.map(convert_v4_subset_to_v3),
        folder: parents.folder.map(|mut folder| {
            // Parent lookups never carry tasks; keep the legacy key present.
            folder.insert("tasks".to_string(), Value::Array(Vec::new()));
            convert_v4_folder_to_v3(folder, project_name)
        }),
        project: parents.project.map(convert_v4_project_to_v3),
    }
}

/// Legacy parents of each representation document, keyed by its `_id`.
pub async fn get_representations_parents<C>(
    con: &C,
    project_name: &str,
    representations: &[Document],
) -> ClientResult<BTreeMap<String, RepresentationParents>>
where
    C: ServerConnection + ?Sized,
{
    let ids: Vec<String> = representations
        .iter()
        .filter_map(|representation| str_field(representation, "_id"))
        .map(str::to_string)
        .collect();
    let parents = get_v4_representations_parents(con, project_name, &ids).await?;
    Ok(parents
        .into_iter()
        .map(|(id, parents)| (id, convert_parents(parents, project_name)))
        .collect())
}

pub async fn get_representation_parents<C>(
    con: &C,
    project_name: &str,
    representation: &Document,
) -> ClientResult<Option<RepresentationParents>>
where
    C: ServerConnection + ?Sized,
{
    let Some(id) = str_field(representation, "_id") else {
        return Ok(None);
    };
    let mut parents =
        get_representations_parents(con, project_name, std::slice::from_ref(representation))
            .await?;
    Ok(parents.remove(id))
}

/// Not available on this schema.
pub fn get_archived_representations() -> ClientResult<Vec<Document>> {
    Err(ClientError::NotImplemented("get_archived_representations"))
}

// ── Thumbnails ───────────────────────────────────────────────────

/// Thumbnail id of an `asset`, `version` or `subset` entity. A subset uses
/// the thumbnail of its last version.
pub async fn get_thumbnail_id_from_source<C>(
    con: &C,
    project_name: &str,
    source_type: &str,
    source_id: &str,
) -> ClientResult<Option<String>>
where
    C: ServerConnection + ?Sized,
{
    if source_type.is_empty() || source_id.is_empty() {
        return Ok(None);
    }
    let fields = ["data.thumbnail_id".to_string()];
    let source = match source_type {
        "asset" => get_asset_by_id(con, project_name, source_id, Some(&fields)).await?,
        "version" => get_version_by_id(con, project_name, source_id, Some(&fields)).await?,
        "subset" => {
            get_last_version_by_subset_id(con, project_name, source_id, Some(&fields)).await?
        }
        _ => None,
    };
    Ok(source
        .as_ref()
        .and_then(|document| document.get("data"))
        .and_then(|data| data.get("thumbnail_id"))
        .and_then(Value::as_str)
        .map(str::to_string))
}
