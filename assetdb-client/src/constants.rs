//! Default field selections and known attribute names per entity type.
//!
//! Field names are dotted paths on the entity node. The bare names `attrib`,
//! `files` and `tasks` stand for their full sub-selection and are expanded
//! when a query is built.

use std::collections::BTreeSet;

/// Collects field names into the set form the entity functions take.
pub fn field_set<I, S>(fields: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fields.into_iter().map(Into::into).collect()
}

pub const PROJECT_ATTRIBUTES: &[&str] = &[
    "fps",
    "resolutionWidth",
    "resolutionHeight",
    "pixelAspect",
    "clipIn",
    "clipOut",
    "frameStart",
    "frameEnd",
    "handleStart",
    "handleEnd",
    "applications",
    "tools",
];

pub const FOLDER_ATTRIBUTES: &[&str] = &[
    "fps",
    "resolutionWidth",
    "resolutionHeight",
    "pixelAspect",
    "clipIn",
    "clipOut",
    "frameStart",
    "frameEnd",
    "handleStart",
    "handleEnd",
    "tools",
];

pub const TASK_ATTRIBUTES: &[&str] = &[
    "fps",
    "frameStart",
    "frameEnd",
    "handleStart",
    "handleEnd",
];

pub const SUBSET_ATTRIBUTES: &[&str] = &["subsetGroup"];

pub const VERSION_ATTRIBUTES: &[&str] = &[
    "fps",
    "resolutionWidth",
    "resolutionHeight",
    "pixelAspect",
    "clipIn",
    "clipOut",
    "frameStart",
    "frameEnd",
    "handleStart",
    "handleEnd",
    "families",
    "intent",
    "source",
    "comment",
    "machine",
    "colorSpace",
];

pub const REPRESENTATION_ATTRIBUTES: &[&str] = &["path", "template"];

pub const DEFAULT_PROJECT_FIELDS: &[&str] = &[
    "name",
    "code",
    "active",
    "library",
    "config",
    "createdAt",
    "attrib",
];

pub const DEFAULT_FOLDER_FIELDS: &[&str] = &[
    "id",
    "name",
    "path",
    "parentId",
    "parents",
    "active",
    "thumbnailId",
    "attrib",
];

/// Folder selection used by the legacy asset functions, which carry the
/// folder's tasks inline.
pub const DEFAULT_V3_FOLDER_FIELDS: &[&str] = &[
    "id",
    "name",
    "path",
    "parentId",
    "parents",
    "active",
    "thumbnailId",
    "attrib",
    "tasks",
];

pub const DEFAULT_TASK_FIELDS: &[&str] = &[
    "id",
    "name",
    "taskType",
    "folderId",
    "active",
    "assignees",
    "attrib",
];

pub const DEFAULT_SUBSET_FIELDS: &[&str] = &[
    "id",
    "name",
    "folderId",
    "family",
    "active",
    "attrib",
];

pub const DEFAULT_VERSION_FIELDS: &[&str] = &[
    "id",
    "version",
    "subsetId",
    "taskId",
    "author",
    "thumbnailId",
    "active",
    "createdAt",
    "updatedAt",
    "attrib",
];

pub const DEFAULT_REPRESENTATION_FIELDS: &[&str] = &[
    "id",
    "name",
    "versionId",
    "context",
    "active",
    "createdAt",
    "attrib",
    "files",
];

/// Sub-selection of a representation's `files`.
pub const REPRESENTATION_FILES_FIELDS: &[&str] = &["id", "name", "path", "size", "hash"];

/// Sub-selection of a folder's inline `tasks`.
pub const FOLDER_TASK_FIELDS: &[&str] = &["name", "taskType"];

/// Preset name meaning "the server's primary anatomy preset".
pub const PRIMARY_ANATOMY_PRESET: &str = "_";
