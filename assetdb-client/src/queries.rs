//! Query templates, one per entity kind.
//!
//! Each template declares every filter variable its entity supports but
//! binds none of them; entity functions bind only the filters the caller
//! asked for, so unused arguments drop out of the rendered document.

use crate::constants::{
    FOLDER_ATTRIBUTES, FOLDER_TASK_FIELDS, PROJECT_ATTRIBUTES, REPRESENTATION_ATTRIBUTES,
    REPRESENTATION_FILES_FIELDS, SUBSET_ATTRIBUTES, TASK_ATTRIBUTES, VERSION_ATTRIBUTES,
};
use assetdb_graphql::{fields_to_tree, GraphQlQuery, GraphQlResult, QueryField, VariableType};
use std::collections::BTreeSet;

/// Bare field names that stand for a whole sub-selection.
type Expansions<'a> = &'a [(&'a str, &'a [&'a str])];

fn expand_fields(fields: &BTreeSet<String>, expansions: Expansions<'_>) -> Vec<String> {
    let mut output = Vec::with_capacity(fields.len());
    for field in fields {
        match expansions.iter().find(|(name, _)| name == field) {
            Some((name, children)) => {
                output.extend(children.iter().map(|child| format!("{name}.{child}")));
            }
            None => output.push(field.clone()),
        }
    }
    output
}

fn add_selection(field: &mut QueryField, fields: &BTreeSet<String>, expansions: Expansions<'_>) {
    if let Some(tree) = fields_to_tree(expand_fields(fields, expansions)) {
        field.add_fields_tree(&tree);
    }
}

fn is_tasks_path(field: &str) -> bool {
    field == "tasks" || field.starts_with("tasks.")
}

/// Single project by name.
pub fn project_graphql_query(fields: &BTreeSet<String>) -> GraphQlResult<GraphQlQuery> {
    let mut query = GraphQlQuery::new("ProjectQuery");
    let project_name = query.add_variable("projectName", VariableType::String, None)?;

    let project = query.add_field("project", false);
    project.set_filter("name", &project_name);
    add_selection(project, fields, &[("attrib", PROJECT_ATTRIBUTES)]);
    Ok(query)
}

/// Every project, paginated.
pub fn projects_graphql_query(fields: &BTreeSet<String>) -> GraphQlResult<GraphQlQuery> {
    let mut query = GraphQlQuery::new("ProjectsQuery");
    let projects = query.add_field("projects", true);
    add_selection(projects, fields, &[("attrib", PROJECT_ATTRIBUTES)]);
    Ok(query)
}

/// Folders of one project, paginated. A `tasks` field selects the folder's
/// tasks as a nested edge collection.
pub fn folders_graphql_query(fields: &BTreeSet<String>) -> GraphQlResult<GraphQlQuery> {
    build_folders_query("FoldersQuery", fields, false)
}

/// Folders of one project with their tasks inline.
pub fn folders_tasks_graphql_query(fields: &BTreeSet<String>) -> GraphQlResult<GraphQlQuery> {
    build_folders_query("FoldersTasksQuery", fields, true)
}

fn build_folders_query(
    name: &str,
    fields: &BTreeSet<String>,
    with_tasks: bool,
) -> GraphQlResult<GraphQlQuery> {
    let mut query = GraphQlQuery::new(name);
    let project_name = query.add_variable("projectName", VariableType::String, None)?;
    let folder_ids = query.add_variable("folderIds", VariableType::StringList, None)?;
    let parent_ids = query.add_variable("parentFolderIds", VariableType::StringList, None)?;
    let folder_paths = query.add_variable("folderPaths", VariableType::StringList, None)?;
    let folder_names = query.add_variable("folderNames", VariableType::StringList, None)?;
    let has_subsets = query.add_variable("folderHasSubsets", VariableType::Boolean, None)?;

    let project = query.add_field("project", false);
    project.set_filter("name", &project_name);

    let folders = project.add_field("folders", true);
    folders
        .set_filter("ids", &folder_ids)
        .set_filter("parentIds", &parent_ids)
        .set_filter("paths", &folder_paths)
        .set_filter("names", &folder_names)
        .set_filter("hasSubsets", &has_subsets);

    let (task_fields, folder_fields): (BTreeSet<String>, BTreeSet<String>) =
        fields.iter().cloned().partition(|field| is_tasks_path(field));
    add_selection(folders, &folder_fields, &[("attrib", FOLDER_ATTRIBUTES)]);

    if with_tasks || !task_fields.is_empty() {
        let tasks = folders.add_field("tasks", true);
        let explicit: BTreeSet<String> = task_fields
            .iter()
            .filter_map(|field| field.strip_prefix("tasks."))
            .map(str::to_string)
            .collect();
        if explicit.is_empty() {
            for field in FOLDER_TASK_FIELDS {
                tasks.add_field(field, false);
            }
        } else {
            add_selection(tasks, &explicit, &[]);
        }
    }
    Ok(query)
}

/// Tasks of one project.
pub fn tasks_graphql_query(fields: &BTreeSet<String>) -> GraphQlResult<GraphQlQuery> {
    let mut query = GraphQlQuery::new("TasksQuery");
    let project_name = query.add_variable("projectName", VariableType::String, None)?;
    let task_ids = query.add_variable("taskIds", VariableType::StringList, None)?;
    let task_names = query.add_variable("taskNames", VariableType::StringList, None)?;
    let task_types = query.add_variable("taskTypes", VariableType::StringList, None)?;
    let folder_ids = query.add_variable("folderIds", VariableType::StringList, None)?;

    let project = query.add_field("project", false);
    project.set_filter("name", &project_name);

    let tasks = project.add_field("tasks", true);
    tasks
        .set_filter("ids", &task_ids)
        .set_filter("names", &task_names)
        .set_filter("taskTypes", &task_types)
        .set_filter("folderIds", &folder_ids);
    add_selection(tasks, fields, &[("attrib", TASK_ATTRIBUTES)]);
    Ok(query)
}

/// Subsets of one project.
pub fn subsets_graphql_query(fields: &BTreeSet<String>) -> GraphQlResult<GraphQlQuery> {
    let mut query = GraphQlQuery::new("SubsetsQuery");
    let project_name = query.add_variable("projectName", VariableType::String, None)?;
    let subset_ids = query.add_variable("subsetIds", VariableType::StringList, None)?;
    let subset_names = query.add_variable("subsetNames", VariableType::StringList, None)?;
    let folder_ids = query.add_variable("folderIds", VariableType::StringList, None)?;

    let project = query.add_field("project", false);
    project.set_filter("name", &project_name);

    let subsets = project.add_field("subsets", true);
    subsets
        .set_filter("ids", &subset_ids)
        .set_filter("names", &subset_names)
        .set_filter("folderIds", &folder_ids);
    add_selection(subsets, fields, &[("attrib", SUBSET_ATTRIBUTES)]);
    Ok(query)
}

/// Versions of one project.
pub fn versions_graphql_query(fields: &BTreeSet<String>) -> GraphQlResult<GraphQlQuery> {
    let mut query = GraphQlQuery::new("VersionsQuery");
    let project_name = query.add_variable("projectName", VariableType::String, None)?;
    let version_ids = query.add_variable("versionIds", VariableType::StringList, None)?;
    let subset_ids = query.add_variable("subsetIds", VariableType::StringList, None)?;
    let versions_var = query.add_variable("versions", VariableType::IntList, None)?;
    let hero_only = query.add_variable("heroOnly", VariableType::Boolean, None)?;
    let latest_only = query.add_variable("latestOnly", VariableType::Boolean, None)?;
    let hero_or_latest = query.add_variable("heroOrLatestOnly", VariableType::Boolean, None)?;

    let project = query.add_field("project", false);
    project.set_filter("name", &project_name);

    let versions = project.add_field("versions", true);
    versions
        .set_filter("ids", &version_ids)
        .set_filter("subsetIds", &subset_ids)
        .set_filter("versions", &versions_var)
        .set_filter("heroOnly", &hero_only)
        .set_filter("latestOnly", &latest_only)
        .set_filter("heroOrLatestOnly", &hero_or_latest);
    add_selection(versions, fields, &[("attrib", VERSION_ATTRIBUTES)]);
    Ok(query)
}

const REPRESENTATION_EXPANSIONS: Expansions<'static> = &[
    ("attrib", REPRESENTATION_ATTRIBUTES),
    ("files", REPRESENTATION_FILES_FIELDS),
];

/// Representations of one project.
pub fn representations_graphql_query(fields: &BTreeSet<String>) -> GraphQlResult<GraphQlQuery> {
    let mut query = GraphQlQuery::new("RepresentationsQuery");
    let project_name = query.add_variable("projectName", VariableType::String, None)?;
    let repre_ids = query.add_variable("representationIds", VariableType::StringList, None)?;
    let repre_names = query.add_variable("representationNames", VariableType::StringList, None)?;
    let version_ids = query.add_variable("versionIds", VariableType::StringList, None)?;

    let project = query.add_field("project", false);
    project.set_filter("name", &project_name);

    let representations = project.add_field("representations", true);
    representations
        .set_filter("ids", &repre_ids)
        .set_filter("names", &repre_names)
        .set_filter("versionIds", &version_ids);
    add_selection(representations, fields, REPRESENTATION_EXPANSIONS);
    Ok(query)
}

/// Version, subset and folder of each representation in one round trip.
pub fn representations_parents_graphql_query(
    version_fields: &BTreeSet<String>,
    subset_fields: &BTreeSet<String>,
    folder_fields: &BTreeSet<String>,
) -> GraphQlResult<GraphQlQuery> {
    let mut query = GraphQlQuery::new("RepresentationsParentsQuery");
    let project_name = query.add_variable("projectName", VariableType::String, None)?;
    let repre_ids = query.add_variable("representationIds", VariableType::StringList, None)?;

    let project = query.add_field("project", false);
    project.set_filter("name", &project_name);

    let representations = project.add_field("representations", true);
    representations.set_filter("ids", &repre_ids);
    representations.add_field("id", false);

    let version = representations.add_field("version", false);
    add_selection(version, version_fields, &[("attrib", VERSION_ATTRIBUTES)]);
    let subset = version.add_field("subset", false);
    add_selection(subset, subset_fields, &[("attrib", SUBSET_ATTRIBUTES)]);
    let folder = subset.add_field("folder", false);
    add_selection(folder, folder_fields, &[("attrib", FOLDER_ATTRIBUTES)]);
    Ok(query)
}

/// Family names used in a project.
pub fn subset_families_graphql_query() -> GraphQlResult<GraphQlQuery> {
    let mut query = GraphQlQuery::new("SubsetFamilies");
    let project_name = query.add_variable("projectName", VariableType::String, None)?;
    let project = query.add_field("project", false);
    project.set_filter("name", &project_name);
    project.add_field("subsetFamilies", false);
    Ok(query)
}

/// Id of the latest version of the subset owning a version.
pub fn version_is_latest_graphql_query() -> GraphQlResult<GraphQlQuery> {
    let mut query = GraphQlQuery::new("VersionIsLatest");
    let project_name = query.add_variable("projectName", VariableType::String, None)?;
    let version_id = query.add_variable("versionId", VariableType::String, None)?;

    let project = query.add_field("project", false);
    project.set_filter("name", &project_name);
    project
        .add_field("version", false)
        .set_filter("id", &version_id)
        .add_field("subset", false)
        .add_field("latestVersion", false)
        .add_field("id", false);
    Ok(query)
}
