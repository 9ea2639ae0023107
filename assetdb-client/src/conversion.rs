//! Conversion between the current (v4) entity schema and the legacy (v3)
//! document shape.
//!
//! Field conversion maps legacy dotted field names onto v4 field paths.
//! Unknown legacy fields are dropped. Record conversion reshapes v4 records
//! into legacy documents: `id` becomes `_id`, the parent reference becomes a
//! scalar `parent`, and scattered attributes are gathered into `data`.

use crate::constants::{
    FOLDER_ATTRIBUTES, PROJECT_ATTRIBUTES, REPRESENTATION_ATTRIBUTES, SUBSET_ATTRIBUTES,
    VERSION_ATTRIBUTES,
};
use crate::Document;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

pub const PROJECT_SCHEMA: &str = "openpype:project-3.0";
pub const ASSET_SCHEMA: &str = "openpype:asset-3.0";
pub const SUBSET_SCHEMA: &str = "openpype:subset-3.0";
pub const VERSION_SCHEMA: &str = "openpype:version-3.0";
pub const HERO_VERSION_SCHEMA: &str = "openpype:hero_version-1.0";
pub const REPRESENTATION_SCHEMA: &str = "openpype:representation-2.0";

/// How legacy field names of one entity kind map onto v4 fields.
struct FieldMapping {
    /// v4 fields every converted query needs.
    required: &'static [&'static str],
    /// Legacy key to v4 fields. An empty target list marks a key that is
    /// synthesized during record conversion.
    table: &'static [(&'static str, &'static [&'static str])],
    /// v4 fields behind the whole legacy `data` bag, besides attributes.
    data: &'static [&'static str],
    attributes: &'static [&'static str],
}

const PROJECT_MAPPING: FieldMapping = FieldMapping {
    required: &["name"],
    table: &[
        ("_id", &["name"]),
        ("name", &["name"]),
        ("type", &[]),
        ("schema", &[]),
        ("config", &["config"]),
        ("data.code", &["code"]),
        ("data.library_project", &["library"]),
        ("data.active", &["active"]),
    ],
    data: &["code", "library", "active"],
    attributes: PROJECT_ATTRIBUTES,
};

const FOLDER_MAPPING: FieldMapping = FieldMapping {
    required: &["id"],
    table: &[
        ("_id", &["id"]),
        ("name", &["name"]),
        ("parent", &[]),
        ("type", &[]),
        ("schema", &[]),
        ("data.label", &["name"]),
        ("data.visualParent", &["parentId"]),
        ("data.parents", &["parents"]),
        ("data.active", &["active"]),
        ("data.thumbnail_id", &["thumbnailId"]),
        ("data.tasks", &["tasks"]),
    ],
    data: &["name", "parentId", "parents", "active", "thumbnailId", "tasks"],
    attributes: FOLDER_ATTRIBUTES,
};

const SUBSET_MAPPING: FieldMapping = FieldMapping {
    required: &["id"],
    table: &[
        ("_id", &["id"]),
        ("name", &["name"]),
        ("parent", &["folderId"]),
        ("type", &[]),
        ("schema", &[]),
        ("data.family", &["family"]),
        ("data.families", &["family"]),
        ("data.active", &["active"]),
    ],
    data: &["family", "active"],
    attributes: SUBSET_ATTRIBUTES,
};

const VERSION_MAPPING: FieldMapping = FieldMapping {
    required: &["id"],
    table: &[
        ("_id", &["id"]),
        ("name", &["version"]),
        ("parent", &["subsetId"]),
        ("type", &["version"]),
        ("schema", &["version"]),
        ("version_id", &["subsetId", "version"]),
        ("data.author", &["author"]),
        ("data.thumbnail_id", &["thumbnailId"]),
        ("data.time", &["createdAt"]),
        ("data.active", &["active"]),
    ],
    data: &["author", "thumbnailId", "createdAt", "active"],
    attributes: VERSION_ATTRIBUTES,
};

const REPRESENTATION_MAPPING: FieldMapping = FieldMapping {
    required: &["id"],
    table: &[
        ("_id", &["id"]),
        ("name", &["name"]),
        ("parent", &["versionId"]),
        ("type", &[]),
        ("schema", &[]),
        ("context", &["context"]),
        ("files", &["files"]),
        ("data.active", &["active"]),
    ],
    data: &["active"],
    attributes: REPRESENTATION_ATTRIBUTES,
};

/// Legacy lookup key: `data.<key>` for the data bag, the first segment for
/// anything else.
fn legacy_key(field: &str) -> &str {
    let mut parts = field.splitn(3, '.');
    let first = parts.next().unwrap_or(field);
    match (first, parts.next()) {
        ("data", Some(second)) => &field[..first.len() + 1 + second.len()],
        _ => first,
    }
}

fn map_fields(fields: Option<&[String]>, mapping: &FieldMapping) -> Option<BTreeSet<String>> {
    let fields = fields.filter(|fields| !fields.is_empty())?;

    let mut output: BTreeSet<String> = mapping.required.iter().map(|f| f.to_string()).collect();
    for field in fields {
        if field == "data" {
            output.extend(mapping.data.iter().map(|f| f.to_string()));
            output.insert("attrib".to_string());
            continue;
        }

        let key = legacy_key(field);
        if let Some((_, targets)) = mapping.table.iter().find(|(legacy, _)| *legacy == key) {
            output.extend(targets.iter().map(|f| f.to_string()));
            continue;
        }

        match key.strip_prefix("data.") {
            Some(attribute) if mapping.attributes.contains(&attribute) => {
                output.insert(format!("attrib.{attribute}"));
            }
            _ => debug!(field = %field, "dropping unknown legacy field"),
        }
    }
    Some(output)
}

/// Maps legacy project fields to v4 fields. `None` means "use defaults".
pub fn project_fields_v3_to_v4(fields: Option<&[String]>) -> Option<BTreeSet<String>> {
    map_fields(fields, &PROJECT_MAPPING)
}

/// Maps legacy asset fields to v4 folder fields.
pub fn folder_fields_v3_to_v4(fields: Option<&[String]>) -> Option<BTreeSet<String>> {
    map_fields(fields, &FOLDER_MAPPING)
}

pub fn subset_fields_v3_to_v4(fields: Option<&[String]>) -> Option<BTreeSet<String>> {
    map_fields(fields, &SUBSET_MAPPING)
}

pub fn version_fields_v3_to_v4(fields: Option<&[String]>) -> Option<BTreeSet<String>> {
    map_fields(fields, &VERSION_MAPPING)
}

pub fn representation_fields_v3_to_v4(fields: Option<&[String]>) -> Option<BTreeSet<String>> {
    map_fields(fields, &REPRESENTATION_MAPPING)
}

// ── Record conversion ────────────────────────────────────────────

fn move_field(source: &mut Document, from: &str, target: &mut Document, to: &str) {
    if let Some(value) = source.remove(from) {
        target.insert(to.to_string(), value);
    }
}

/// Merges set attributes into the data bag. Unset (`null`) attributes are
/// left out.
fn merge_attributes(source: &mut Document, data: &mut Document) {
    if let Some(Value::Object(attrib)) = source.remove("attrib") {
        data.extend(attrib.into_iter().filter(|(_, value)| !value.is_null()));
    }
}

fn new_document(entity_type: &str, schema: &str) -> Document {
    let mut output = Map::new();
    output.insert("type".to_string(), Value::from(entity_type));
    output.insert("schema".to_string(), Value::from(schema));
    output
}

/// Converts a v4 project record into a legacy project document.
pub fn convert_v4_project_to_v3(mut project: Document) -> Document {
    let mut output = new_document("project", PROJECT_SCHEMA);
    if let Some(name) = project.remove("name") {
        output.insert("_id".to_string(), name.clone());
        output.insert("name".to_string(), name);
    }
    move_field(&mut project, "config", &mut output, "config");

    let mut data = Map::new();
    move_field(&mut project, "code", &mut data, "code");
    move_field(&mut project, "library", &mut data, "library_project");
    move_field(&mut project, "active", &mut data, "active");
    merge_attributes(&mut project, &mut data);
    output.insert("data".to_string(), Value::Object(data));
    output
}

/// Converts a folder's task list into the legacy `{name: {"type": ..}}`
/// mapping.
fn convert_tasks(tasks: Value) -> Value {
    let mut output = Map::new();
    if let Value::Array(tasks) = tasks {
        for task in tasks {
            let Some(name) = task.get("name").and_then(Value::as_str) else {
                continue;
            };
            let task_type = task.get("taskType").cloned().unwrap_or(Value::Null);
            let mut info = Map::new();
            info.insert("type".to_string(), task_type);
            output.insert(name.to_string(), Value::Object(info));
        }
    }
    Value::Object(output)
}

/// Converts a v4 folder record into a legacy asset document.
pub fn convert_v4_folder_to_v3(mut folder: Document, project_name: &str) -> Document {
    let mut output = new_document("asset", ASSET_SCHEMA);
    move_field(&mut folder, "id", &mut output, "_id");
    output.insert("parent".to_string(), Value::from(project_name));

    let mut data = Map::new();
    if let Some(name) = folder.remove("name") {
        data.insert("label".to_string(), name.clone());
        output.insert("name".to_string(), name);
    }
    move_field(&mut folder, "parentId", &mut data, "visualParent");
    move_field(&mut folder, "parents", &mut data, "parents");
    move_field(&mut folder, "active", &mut data, "active");
    move_field(&mut folder, "thumbnailId", &mut data, "thumbnail_id");
    if let Some(tasks) = folder.remove("tasks") {
        data.insert("tasks".to_string(), convert_tasks(tasks));
    }
    merge_attributes(&mut folder, &mut data);
    output.insert("data".to_string(), Value::Object(data));
    output
}

/// Converts a v4 subset record into a legacy subset document.
pub fn convert_v4_subset_to_v3(mut subset: Document) -> Document {
    let mut output = new_document("subset", SUBSET_SCHEMA);
    move_field(&mut subset, "id", &mut output, "_id");
    move_field(&mut subset, "name", &mut output, "name");
    move_field(&mut subset, "folderId", &mut output, "parent");

    let mut data = Map::new();
    if let Some(family) = subset.remove("family") {
        data.insert("families".to_string(), Value::Array(vec![family.clone()]));
        data.insert("family".to_string(), family);
    }
    move_field(&mut subset, "active", &mut data, "active");
    merge_attributes(&mut subset, &mut data);
    output.insert("data".to_string(), Value::Object(data));
    output
}

/// Whether a v4 version record is a hero version.
pub fn is_hero_version(version: &Document) -> bool {
    version
        .get("version")
        .and_then(Value::as_i64)
        .is_some_and(|number| number < 0)
}

/// Converts a v4 version record into a legacy version document.
///
/// Hero versions (negative version number) become `hero_version` documents
/// without a `name`; use [`convert_v4_hero_version_to_v3`] to also link the
/// standard version they mirror.
pub fn convert_v4_version_to_v3(mut version: Document) -> Document {
    let hero = is_hero_version(&version);
    let mut output = if hero {
        new_document("hero_version", HERO_VERSION_SCHEMA)
    } else {
        new_document("version", VERSION_SCHEMA)
    };
    move_field(&mut version, "id", &mut output, "_id");
    move_field(&mut version, "subsetId", &mut output, "parent");
    if let Some(number) = version.remove("version") {
        if !hero {
            output.insert("name".to_string(), number);
        }
    }

    let mut data = Map::new();
    move_field(&mut version, "author", &mut data, "author");
    move_field(&mut version, "thumbnailId", &mut data, "thumbnail_id");
    move_field(&mut version, "createdAt", &mut data, "time");
    move_field(&mut version, "active", &mut data, "active");
    merge_attributes(&mut version, &mut data);
    output.insert("data".to_string(), Value::Object(data));
    output
}

/// Id of the standard version a hero version mirrors: same subset, version
/// number equal to the hero's absolute value.
pub fn hero_version_source_id(hero: &Document, candidates: &[Document]) -> Option<String> {
    let number = hero.get("version").and_then(Value::as_i64)?.abs();
    let subset_id = hero.get("subsetId").and_then(Value::as_str)?;
    candidates
        .iter()
        .find(|candidate| {
            candidate.get("subsetId").and_then(Value::as_str) == Some(subset_id)
                && candidate.get("version").and_then(Value::as_i64) == Some(number)
        })
        .and_then(|candidate| candidate.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Converts a v4 hero version and attaches `version_id`, the id of the
/// matching standard version among `candidates` (`null` when none matches).
pub fn convert_v4_hero_version_to_v3(hero: Document, candidates: &[Document]) -> Document {
    let version_id = hero_version_source_id(&hero, candidates);
    let mut output = convert_v4_version_to_v3(hero);
    output.insert(
        "version_id".to_string(),
        version_id.map_or(Value::Null, Value::String),
    );
    output
}

fn convert_file(file: Value) -> Value {
    let Value::Object(mut file) = file else {
        return file;
    };
    let mut output = Map::new();
    move_field(&mut file, "id", &mut output, "_id");
    move_field(&mut file, "path", &mut output, "path");
    move_field(&mut file, "size", &mut output, "size");
    move_field(&mut file, "hash", &mut output, "hash");
    output.insert("sites".to_string(), Value::Array(Vec::new()));
    Value::Object(output)
}

/// Converts a v4 representation record into a legacy representation
/// document.
pub fn convert_v4_representation_to_v3(mut representation: Document) -> Document {
    let mut output = new_document("representation", REPRESENTATION_SCHEMA);
    move_field(&mut representation, "id", &mut output, "_id");
    move_field(&mut representation, "name", &mut output, "name");
    move_field(&mut representation, "versionId", &mut output, "parent");
    move_field(&mut representation, "context", &mut output, "context");
    if let Some(Value::Array(files)) = representation.remove("files") {
        let files = files.into_iter().map(convert_file).collect();
        output.insert("files".to_string(), Value::Array(files));
    }

    let mut data = Map::new();
    move_field(&mut representation, "active", &mut data, "active");
    merge_attributes(&mut representation, &mut data);
    output.insert("data".to_string(), Value::Object(data));
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_key_keeps_data_prefix() {
        assert_eq!(legacy_key("data.tasks.comp"), "data.tasks");
        assert_eq!(legacy_key("data"), "data");
        assert_eq!(legacy_key("files.path"), "files");
        assert_eq!(legacy_key("_id"), "_id");
    }

    #[test]
    fn empty_field_list_means_defaults() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(folder_fields_v3_to_v4(Some(empty.as_slice())), None);
        assert_eq!(folder_fields_v3_to_v4(None), None);
    }
}
