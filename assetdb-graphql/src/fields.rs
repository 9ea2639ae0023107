//! Flat dotted field paths to nested selection trees.
//!
//! Callers describe what they want as dotted paths (`"attrib.fps"`,
//! `"files.path"`). The query builder needs a tree, so paths are folded into
//! a trie where a leaf means "select this field and everything under it".

use std::collections::BTreeMap;
use tracing::debug;

/// Children of one level of the selection trie.
pub type FieldTree = BTreeMap<String, FieldNode>;

/// One node of the selection trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldNode {
    /// Select the field as a whole. Any deeper path is absorbed.
    Wildcard,
    /// Select only the listed sub-fields.
    Subtree(FieldTree),
}

impl FieldNode {
    /// Returns true when this node selects the whole field.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, FieldNode::Wildcard)
    }
}

/// Folds dotted field paths into a selection trie.
///
/// Returns `None` for an empty input so callers can tell "no fields given"
/// from "fields given". A path whose proper prefix is also requested is
/// absorbed by that prefix, regardless of input order. Blank segments are
/// dropped, so `"attrib..fps"` selects `attrib.fps` and `""` selects nothing.
pub fn fields_to_tree<I, S>(fields: I) -> Option<FieldTree>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut output = FieldTree::new();
    let mut any = false;
    for field in fields {
        if insert_path(&mut output, field.as_ref()) {
            any = true;
        } else {
            debug!(path = field.as_ref(), "skipping blank field path");
        }
    }
    any.then_some(output)
}

/// Returns false when the path has no non-blank segment.
fn insert_path(root: &mut FieldTree, path: &str) -> bool {
    let mut parts: Vec<&str> = path
        .split('.')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    let Some(last) = parts.pop() else {
        return false;
    };

    let mut level = root;
    for part in parts {
        let node = level
            .entry(part.to_string())
            .or_insert_with(|| FieldNode::Subtree(FieldTree::new()));
        match node {
            FieldNode::Wildcard => return true,
            FieldNode::Subtree(children) => level = children,
        }
    }
    level.insert(last.to_string(), FieldNode::Wildcard);
    true
}

/// Flattens a selection trie back into dotted leaf paths, sorted.
pub fn flatten_tree(tree: &FieldTree) -> Vec<String> {
    let mut output = Vec::new();
    flatten_into(tree, "", &mut output);
    output
}

fn flatten_into(tree: &FieldTree, prefix: &str, output: &mut Vec<String>) {
    for (key, node) in tree {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match node {
            FieldNode::Wildcard => output.push(path),
            FieldNode::Subtree(children) => flatten_into(children, &path, output),
        }
    }
}
