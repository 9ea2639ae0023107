//! Entity queries against the current server schema.
//!
//! Every function follows the same protocol: normalize the optional filters
//! (an empty list short-circuits to an empty result without a request),
//! resolve the field set, bind the filters onto the entity's query template,
//! execute, then apply the filters the server cannot express.

use crate::connection::ServerConnection;
use crate::constants::{
    DEFAULT_FOLDER_FIELDS, DEFAULT_REPRESENTATION_FIELDS, DEFAULT_SUBSET_FIELDS,
    DEFAULT_TASK_FIELDS, DEFAULT_V3_FOLDER_FIELDS, DEFAULT_VERSION_FIELDS, PRIMARY_ANATOMY_PRESET,
};
use crate::error::ClientResult;
use crate::filters::{
    normalize_parent_ids, retain_active, retain_flag, FilterSet, QueryFilters, Unsatisfiable,
};
use crate::queries::{
    folders_graphql_query, folders_tasks_graphql_query, project_graphql_query,
    projects_graphql_query, representations_graphql_query, representations_parents_graphql_query,
    subsets_graphql_query, tasks_graphql_query, versions_graphql_query,
};
use crate::Document;
use assetdb_graphql::GraphQlQuery;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Filters for [`get_v4_folders`] and [`get_v4_folders_tasks`].
#[derive(Debug, Clone, Default)]
pub struct FolderFilter {
    pub folder_ids: Option<Vec<String>>,
    pub folder_paths: Option<Vec<String>>,
    pub folder_names: Option<Vec<String>>,
    /// Parent folder ids. `None` entries (or the project name) select
    /// folders directly under the project.
    pub parent_ids: Option<Vec<Option<String>>>,
    /// Only folders with subsets.
    pub has_subsets: Option<bool>,
    pub active: Option<bool>,
    pub fields: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub task_ids: Option<Vec<String>>,
    pub task_names: Option<Vec<String>>,
    pub task_types: Option<Vec<String>>,
    pub folder_ids: Option<Vec<String>>,
    pub active: Option<bool>,
    pub fields: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct SubsetFilter {
    pub subset_ids: Option<Vec<String>>,
    pub subset_names: Option<Vec<String>>,
    pub folder_ids: Option<Vec<String>>,
    /// Subset names allowed per folder id. Replaces `subset_names` and
    /// `folder_ids` when set.
    pub names_by_folder_ids: Option<BTreeMap<String, Vec<String>>>,
    pub active: Option<bool>,
    pub fields: Option<BTreeSet<String>>,
}

/// Filters for [`get_v4_versions`].
#[derive(Debug, Clone)]
pub struct VersionFilter {
    pub version_ids: Option<Vec<String>>,
    pub subset_ids: Option<Vec<String>>,
    pub versions: Option<Vec<i64>>,
    /// Include hero versions.
    pub hero: bool,
    /// Include standard (non-hero) versions.
    pub standard: bool,
    /// Only the latest standard version of each subset.
    pub latest: bool,
    pub fields: Option<BTreeSet<String>>,
}

impl Default for VersionFilter {
    fn default() -> Self {
        Self {
            version_ids: None,
            subset_ids: None,
            versions: None,
            hero: true,
            standard: true,
            latest: false,
            fields: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RepresentationFilter {
    pub representation_ids: Option<Vec<String>>,
    pub representation_names: Option<Vec<String>>,
    pub version_ids: Option<Vec<String>>,
    /// Representation names allowed per version id. Replaces
    /// `representation_names` and `version_ids` when set.
    pub names_by_version_ids: Option<BTreeMap<String, Vec<String>>>,
    pub active: Option<bool>,
    pub fields: Option<BTreeSet<String>>,
}

/// Ancestors of one representation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepresentationParents {
    pub version: Option<Document>,
    pub subset: Option<Document>,
    pub folder: Option<Document>,
    pub project: Option<Document>,
}

fn defaults(fields: &[&str]) -> BTreeSet<String> {
    fields.iter().map(|field| field.to_string()).collect()
}

fn requested(fields: Option<&BTreeSet<String>>) -> Option<&BTreeSet<String>> {
    fields.filter(|fields| !fields.is_empty())
}

fn resolve_fields(fields: Option<&BTreeSet<String>>, default: &[&str]) -> BTreeSet<String> {
    requested(fields).cloned().unwrap_or_else(|| defaults(default))
}

/// Moves the list found at `path` out of `data`, keeping object entries.
pub(crate) fn take_documents(data: &mut Value, path: &[&str]) -> Vec<Document> {
    let mut current = data;
    for part in path {
        current = match current.get_mut(*part) {
            Some(next) => next,
            None => return Vec::new(),
        };
    }
    match current.take() {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(document) => Some(document),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn take_object(document: &mut Document, key: &str) -> Option<Document> {
    match document.remove(key) {
        Some(Value::Object(object)) => Some(object),
        _ => None,
    }
}

async fn run_query<C>(query: &GraphQlQuery, con: &C, path: &[&str]) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    let mut data = query.query(con).await?;
    Ok(take_documents(&mut data, path))
}

async fn run_paginated<C>(
    mut query: GraphQlQuery,
    con: &C,
    path: &[&str],
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    query.set_page_size(con.page_size());
    let mut documents = Vec::new();
    let mut pages = query.continuous_query(con);
    while let Some(page) = pages.next_page().await {
        documents.extend(take_documents(&mut page?, path));
    }
    Ok(documents)
}

fn short_circuit(entity: &str, project_name: &str) {
    debug!(entity, project = project_name, "filter matches nothing, skipping query");
}

// ── Projects ─────────────────────────────────────────────────────

/// Projects on the server. Without explicit fields the full REST documents
/// are returned.
pub async fn get_v4_projects<C>(
    con: &C,
    active: Option<bool>,
    library: Option<bool>,
    fields: Option<&BTreeSet<String>>,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    let Some(fields) = requested(fields) else {
        return con.get_rest_projects(active, library).await;
    };

    let mut fields = fields.clone();
    if active.is_some() {
        fields.insert("active".to_string());
    }
    if library.is_some() {
        fields.insert("library".to_string());
    }

    let query = projects_graphql_query(&fields)?;
    let mut projects = run_paginated(query, con, &["projects"]).await?;
    retain_active(&mut projects, active);
    retain_flag(&mut projects, "library", library);
    Ok(projects)
}

/// One project by name, or `None` when it does not exist.
pub async fn get_v4_project<C>(
    con: &C,
    project_name: &str,
    fields: Option<&BTreeSet<String>>,
) -> ClientResult<Option<Document>>
where
    C: ServerConnection + ?Sized,
{
    if project_name.is_empty() {
        return Ok(None);
    }
    let Some(fields) = requested(fields) else {
        return con.get_rest_project(project_name).await;
    };

    let mut query = project_graphql_query(fields)?;
    query.set_variable_value("projectName", project_name)?;
    let mut data = query.query(con).await?;

    match data.get_mut("project").map(Value::take) {
        Some(Value::Object(mut project)) => {
            project.insert("name".to_string(), Value::from(project_name));
            Ok(Some(project))
        }
        _ => Ok(None),
    }
}

/// Every anatomy preset known to the server.
pub async fn get_v4_project_anatomy_presets<C>(con: &C) -> ClientResult<Value>
where
    C: ServerConnection + ?Sized,
{
    con.get("anatomy/presets").await
}

/// One anatomy preset. `None` selects the server's primary preset.
pub async fn get_v4_project_anatomy_preset<C>(
    con: &C,
    preset_name: Option<&str>,
) -> ClientResult<Value>
where
    C: ServerConnection + ?Sized,
{
    let preset_name = preset_name.unwrap_or(PRIMARY_ANATOMY_PRESET);
    con.get(&format!("anatomy/presets/{}", urlencoding::encode(preset_name)))
        .await
}

// ── Folders and tasks ────────────────────────────────────────────

fn folder_filters(project_name: &str, filter: &FolderFilter) -> Result<QueryFilters, Unsatisfiable> {
    let mut filters = QueryFilters::new(project_name);
    filters.constrain_values("folderIds", filter.folder_ids.clone())?;
    filters.constrain_values("folderPaths", filter.folder_paths.clone())?;
    filters.constrain_values("folderNames", filter.folder_names.clone())?;
    filters.constrain(
        "parentFolderIds",
        normalize_parent_ids(project_name, filter.parent_ids.clone()),
    )?;
    if let Some(has_subsets) = filter.has_subsets {
        filters.set("folderHasSubsets", has_subsets);
    }
    Ok(filters)
}

async fn query_folders<C>(
    con: &C,
    project_name: &str,
    filter: &FolderFilter,
    with_tasks: bool,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    if project_name.is_empty() {
        return Ok(Vec::new());
    }
    let Ok(filters) = folder_filters(project_name, filter) else {
        short_circuit("folder", project_name);
        return Ok(Vec::new());
    };

    let default = if with_tasks {
        DEFAULT_V3_FOLDER_FIELDS
    } else {
        DEFAULT_FOLDER_FIELDS
    };
    let mut fields = resolve_fields(filter.fields.as_ref(), default);
    if filter.active.is_some() {
        fields.insert("active".to_string());
    }

    let mut query = if with_tasks {
        folders_tasks_graphql_query(&fields)?
    } else {
        folders_graphql_query(&fields)?
    };
    filters.apply(&mut query)?;

    let mut folders = run_paginated(query, con, &["project", "folders"]).await?;
    retain_active(&mut folders, filter.active);
    Ok(folders)
}

/// Folders of a project.
pub async fn get_v4_folders<C>(
    con: &C,
    project_name: &str,
    filter: &FolderFilter,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    query_folders(con, project_name, filter, false).await
}

/// Folders of a project with their tasks inline, for the legacy asset shape.
pub async fn get_v4_folders_tasks<C>(
    con: &C,
    project_name: &str,
    filter: &FolderFilter,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    query_folders(con, project_name, filter, true).await
}

fn task_filters(project_name: &str, filter: &TaskFilter) -> Result<QueryFilters, Unsatisfiable> {
    let mut filters = QueryFilters::new(project_name);
    filters.constrain_values("taskIds", filter.task_ids.clone())?;
    filters.constrain_values("taskNames", filter.task_names.clone())?;
    filters.constrain_values("taskTypes", filter.task_types.clone())?;
    filters.constrain_values("folderIds", filter.folder_ids.clone())?;
    Ok(filters)
}

/// Tasks of a project.
pub async fn get_v4_tasks<C>(
    con: &C,
    project_name: &str,
    filter: &TaskFilter,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    if project_name.is_empty() {
        return Ok(Vec::new());
    }
    let Ok(filters) = task_filters(project_name, filter) else {
        short_circuit("task", project_name);
        return Ok(Vec::new());
    };

    let mut fields = resolve_fields(filter.fields.as_ref(), DEFAULT_TASK_FIELDS);
    if filter.active.is_some() {
        fields.insert("active".to_string());
    }

    let mut query = tasks_graphql_query(&fields)?;
    filters.apply(&mut query)?;

    let mut tasks = run_query(&query, con, &["project", "tasks"]).await?;
    retain_active(&mut tasks, filter.active);
    Ok(tasks)
}

// ── Subsets ──────────────────────────────────────────────────────

fn subset_filters(project_name: &str, filter: &SubsetFilter) -> Result<QueryFilters, Unsatisfiable> {
    let mut filters = QueryFilters::new(project_name);
    filters.constrain_values("subsetIds", filter.subset_ids.clone())?;

    match &filter.names_by_folder_ids {
        Some(names_by_folder_ids) => {
            let mut folder_ids = BTreeSet::new();
            let mut names = BTreeSet::new();
            for (folder_id, folder_names) in names_by_folder_ids {
                if folder_id.is_empty() || folder_names.is_empty() {
                    continue;
                }
                folder_ids.insert(folder_id.clone());
                names.extend(folder_names.iter().cloned());
            }
            filters.constrain("folderIds", FilterSet::from_option(Some(folder_ids)))?;
            filters.constrain("subsetNames", FilterSet::from_option(Some(names)))?;
        }
        None => {
            filters.constrain_values("subsetNames", filter.subset_names.clone())?;
            filters.constrain_values("folderIds", filter.folder_ids.clone())?;
        }
    }
    Ok(filters)
}

fn document_str<'a>(document: &'a Document, key: &str) -> Option<&'a str> {
    document.get(key).and_then(Value::as_str)
}

/// Keeps documents whose name is allowed for their parent.
fn retain_names_by_parent(
    documents: &mut Vec<Document>,
    parent_key: &str,
    names_by_parent: &BTreeMap<String, Vec<String>>,
) {
    documents.retain(|document| {
        let (Some(parent), Some(name)) = (document_str(document, parent_key), document_str(document, "name"))
        else {
            return false;
        };
        names_by_parent
            .get(parent)
            .is_some_and(|names| names.iter().any(|allowed| allowed == name))
    });
}

/// Subsets of a project.
pub async fn get_v4_subsets<C>(
    con: &C,
    project_name: &str,
    filter: &SubsetFilter,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    if project_name.is_empty() {
        return Ok(Vec::new());
    }
    let Ok(filters) = subset_filters(project_name, filter) else {
        short_circuit("subset", project_name);
        return Ok(Vec::new());
    };

    let mut fields = match requested(filter.fields.as_ref()) {
        Some(fields) => {
            let mut fields = fields.clone();
            fields.insert("id".to_string());
            fields
        }
        None => defaults(DEFAULT_SUBSET_FIELDS),
    };
    if filter.active.is_some() {
        fields.insert("active".to_string());
    }
    if filter.names_by_folder_ids.is_some() {
        fields.insert("name".to_string());
        fields.insert("folderId".to_string());
    }

    let mut query = subsets_graphql_query(&fields)?;
    filters.apply(&mut query)?;

    let mut subsets = run_query(&query, con, &["project", "subsets"]).await?;
    if let Some(names_by_folder_ids) = &filter.names_by_folder_ids {
        retain_names_by_parent(&mut subsets, "folderId", names_by_folder_ids);
    }
    retain_active(&mut subsets, filter.active);
    Ok(subsets)
}

// ── Versions ─────────────────────────────────────────────────────

fn version_filters(project_name: &str, filter: &VersionFilter) -> Result<QueryFilters, Unsatisfiable> {
    let mut filters = QueryFilters::new(project_name);
    filters.constrain_values("versionIds", filter.version_ids.clone())?;
    filters.constrain_values("subsetIds", filter.subset_ids.clone())?;
    filters.constrain_values("versions", filter.versions.clone())?;

    // Server-side modes are exclusive, first match wins.
    if filter.hero && !filter.standard {
        filters.set("heroOnly", true);
    } else if filter.hero && filter.latest {
        filters.set("heroOrLatestOnly", true);
    } else if filter.latest {
        filters.set("latestOnly", true);
    }
    Ok(filters)
}

/// Versions of a project. Hero versions carry a negative version number.
pub async fn get_v4_versions<C>(
    con: &C,
    project_name: &str,
    filter: &VersionFilter,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    if project_name.is_empty() || (!filter.hero && !filter.standard) {
        return Ok(Vec::new());
    }

    let Ok(filters) = version_filters(project_name, filter) else {
        short_circuit("version", project_name);
        return Ok(Vec::new());
    };

    let mut fields = resolve_fields(filter.fields.as_ref(), DEFAULT_VERSION_FIELDS);
    fields.insert("id".to_string());
    fields.insert("version".to_string());

    let mut query = versions_graphql_query(&fields)?;
    filters.apply(&mut query)?;
    run_query(&query, con, &["project", "versions"]).await
}

// ── Representations ──────────────────────────────────────────────

fn representation_filters(
    project_name: &str,
    filter: &RepresentationFilter,
) -> Result<QueryFilters, Unsatisfiable> {
    let mut filters = QueryFilters::new(project_name);
    filters.constrain_values("representationIds", filter.representation_ids.clone())?;

    match &filter.names_by_version_ids {
        Some(names_by_version_ids) => {
            let mut version_ids = BTreeSet::new();
            let mut names = BTreeSet::new();
            for (version_id, version_names) in names_by_version_ids {
                version_ids.insert(version_id.clone());
                names.extend(version_names.iter().cloned());
            }
            filters.constrain("versionIds", FilterSet::from_option(Some(version_ids)))?;
            filters.constrain("representationNames", FilterSet::from_option(Some(names)))?;
        }
        None => {
            filters.constrain_values("representationNames", filter.representation_names.clone())?;
            filters.constrain_values("versionIds", filter.version_ids.clone())?;
        }
    }
    Ok(filters)
}

/// Representations of a project.
///
/// With `names_by_version_ids` the server is asked for the union of names
/// over the union of versions. Results come back as the server returns them,
/// not narrowed per version.
pub async fn get_v4_representations<C>(
    con: &C,
    project_name: &str,
    filter: &RepresentationFilter,
) -> ClientResult<Vec<Document>>
where
    C: ServerConnection + ?Sized,
{
    if project_name.is_empty() {
        return Ok(Vec::new());
    }
    let Ok(filters) = representation_filters(project_name, filter) else {
        short_circuit("representation", project_name);
        return Ok(Vec::new());
    };

    let mut fields = resolve_fields(filter.fields.as_ref(), DEFAULT_REPRESENTATION_FIELDS);
    if filter.active.is_some() {
        fields.insert("active".to_string());
    }

    let mut query = representations_graphql_query(&fields)?;
    filters.apply(&mut query)?;

    let mut representations = run_query(&query, con, &["project", "representations"]).await?;
    retain_active(&mut representations, filter.active);
    Ok(representations)
}

/// Version, subset, folder and project of each representation, keyed by
/// representation id. Ids the server does not know map to empty parents.
pub async fn get_v4_representations_parents<C>(
    con: &C,
    project_name: &str,
    representation_ids: &[String],
) -> ClientResult<BTreeMap<String, RepresentationParents>>
where
    C: ServerConnection + ?Sized,
{
    let mut output: BTreeMap<String, RepresentationParents> = representation_ids
        .iter()
        .map(|id| (id.clone(), RepresentationParents::default()))
        .collect();
    if output.is_empty() || project_name.is_empty() {
        return Ok(output);
    }

    let project = get_v4_project(con, project_name, None).await?;

    let mut query = representations_parents_graphql_query(
        &defaults(DEFAULT_VERSION_FIELDS),
        &defaults(DEFAULT_SUBSET_FIELDS),
        &defaults(DEFAULT_FOLDER_FIELDS),
    )?;
    let mut filters = QueryFilters::new(project_name);
    if filters
        .constrain_values("representationIds", Some(output.keys().cloned()))
        .is_err()
    {
        return Ok(output);
    }
    filters.apply(&mut query)?;

    for mut representation in run_query(&query, con, &["project", "representations"]).await? {
        let Some(id) = document_str(&representation, "id").map(str::to_string) else {
            continue;
        };
        let mut version = take_object(&mut representation, "version");
        let mut subset = version.as_mut().and_then(|version| take_object(version, "subset"));
        let folder = subset.as_mut().and_then(|subset| take_object(subset, "folder"));
        output.insert(
            id,
            RepresentationParents {
                version,
                subset,
                folder,
                project: project.clone(),
            },
        );
    }
    Ok(output)
}
