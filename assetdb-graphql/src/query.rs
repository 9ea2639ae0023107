//! Query document builder.
//!
//! A [`GraphQlQuery`] owns its declared variables and a tree of
//! [`QueryField`] nodes. Rendering walks the tree and produces the textual
//! document sent to the server:
//!
//! ```text
//! query FoldersQuery($projectName: String!, $folderIds: [String!]!) {
//!   project(name: $projectName) {
//!     folders(ids: $folderIds) {
//!       edges {
//!         node {
//!           id
//!           name
//!         }
//!       }
//!     }
//!   }
//! }
//! ```

use crate::error::{GraphQlError, GraphQlResult};
use crate::fields::{FieldNode, FieldTree};
use serde_json::{Map, Value};
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Records requested per page by [`GraphQlQuery::continuous_query`].
///
/// [`GraphQlQuery::continuous_query`]: crate::GraphQlQuery::continuous_query
pub const DEFAULT_PAGE_SIZE: usize = 300;

const INDENT: usize = 2;

/// Declared type of a query variable. Every type renders as non-nullable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    String,
    Int,
    Boolean,
    StringList,
    IntList,
}

impl VariableType {
    /// GraphQL type literal used in the query header.
    pub fn as_graphql(&self) -> &'static str {
        match self {
            VariableType::String => "String!",
            VariableType::Int => "Int!",
            VariableType::Boolean => "Boolean!",
            VariableType::StringList => "[String!]!",
            VariableType::IntList => "[Int!]!",
        }
    }
}

/// Handle to a variable declared on a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryVariable {
    variable_name: String,
}

impl QueryVariable {
    fn new(variable_name: impl Into<String>) -> Self {
        Self {
            variable_name: variable_name.into(),
        }
    }

    /// Bare variable name, as used in the variables payload.
    pub fn variable_name(&self) -> &str {
        &self.variable_name
    }

    /// Reference form used inside the document (`$name`).
    pub fn reference(&self) -> String {
        format!("${}", self.variable_name)
    }
}

impl fmt::Display for QueryVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.variable_name)
    }
}

/// Value of a field argument.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Reference to a declared variable, by name.
    Variable(String),
    /// Bracketed list of quoted strings.
    StringList(Vec<String>),
    String(String),
    Int(i64),
    Boolean(bool),
}

impl FilterValue {
    fn render(&self) -> String {
        match self {
            FilterValue::Variable(name) => format!("${name}"),
            FilterValue::StringList(items) => {
                let items: Vec<String> = items.iter().map(|item| quote(item)).collect();
                format!("[{}]", items.join(", "))
            }
            FilterValue::String(value) => quote(value),
            FilterValue::Int(value) => value.to_string(),
            FilterValue::Boolean(value) => value.to_string(),
        }
    }
}

fn quote(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

impl From<&QueryVariable> for FilterValue {
    fn from(variable: &QueryVariable) -> Self {
        FilterValue::Variable(variable.variable_name.clone())
    }
}

impl From<QueryVariable> for FilterValue {
    fn from(variable: QueryVariable) -> Self {
        FilterValue::Variable(variable.variable_name)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(items: Vec<String>) -> Self {
        FilterValue::StringList(items)
    }
}

impl From<&[&str]> for FilterValue {
    fn from(items: &[&str]) -> Self {
        FilterValue::StringList(items.iter().map(|item| item.to_string()).collect())
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Boolean(value)
    }
}

#[derive(Debug, Clone)]
struct VariableSlot {
    variable: QueryVariable,
    value_type: VariableType,
    value: Option<Value>,
}

/// Pagination arguments injected into the single paginated field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageRequest<'a> {
    pub page_size: usize,
    pub cursor_variable: &'a str,
    pub cursor: Option<&'a str>,
}

struct RenderContext<'a> {
    bound: HashSet<&'a str>,
}

impl RenderContext<'_> {
    fn is_renderable(&self, value: &FilterValue) -> bool {
        match value {
            FilterValue::Variable(name) => self.bound.contains(name.as_str()),
            _ => true,
        }
    }
}

/// Root of a query document.
#[derive(Debug, Clone)]
pub struct GraphQlQuery {
    name: String,
    variables: Vec<VariableSlot>,
    children: Vec<QueryField>,
    page_size: usize,
}

impl GraphQlQuery {
    /// Creates an empty query with the given operation name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            children: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Operation name rendered after `query`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records requested per page when paginating.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Overrides the page size used by continuous queries.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    /// Declares a variable, optionally binding a value.
    ///
    /// Redeclaring a name with the same type replaces the bound value.
    /// Redeclaring it with a different type is an error.
    pub fn add_variable(
        &mut self,
        name: &str,
        value_type: VariableType,
        value: Option<Value>,
    ) -> GraphQlResult<QueryVariable> {
        let value = value.filter(|value| !value.is_null());
        if let Some(slot) = self.slot_mut(name) {
            if slot.value_type != value_type {
                return Err(GraphQlError::VariableTypeConflict {
                    name: name.to_string(),
                    existing: slot.value_type.as_graphql(),
                    requested: value_type.as_graphql(),
                });
            }
            slot.value = value;
            return Ok(slot.variable.clone());
        }

        let variable = QueryVariable::new(name);
        self.variables.push(VariableSlot {
            variable: variable.clone(),
            value_type,
            value,
        });
        Ok(variable)
    }

    /// Returns the handle of a declared variable.
    pub fn get_variable(&self, name: &str) -> Option<&QueryVariable> {
        self.variables
            .iter()
            .find(|slot| slot.variable.variable_name == name)
            .map(|slot| &slot.variable)
    }

    /// Binds a value to a declared variable. `null` unbinds it.
    pub fn set_variable_value(&mut self, name: &str, value: impl Into<Value>) -> GraphQlResult<()> {
        let value = value.into();
        let slot = self
            .slot_mut(name)
            .ok_or_else(|| GraphQlError::UnknownVariable(name.to_string()))?;
        slot.value = (!value.is_null()).then_some(value);
        Ok(())
    }

    /// Values of every bound variable, keyed by variable name.
    pub fn get_variable_values(&self) -> Map<String, Value> {
        self.variables
            .iter()
            .filter_map(|slot| {
                slot.value
                    .as_ref()
                    .map(|value| (slot.variable.variable_name.clone(), value.clone()))
            })
            .collect()
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut VariableSlot> {
        self.variables
            .iter_mut()
            .find(|slot| slot.variable.variable_name == name)
    }

    /// Adds a top-level field, or returns the existing one with that name.
    pub fn add_field(&mut self, name: &str, has_edges: bool) -> &mut QueryField {
        add_child(&mut self.children, name, has_edges)
    }

    /// Attaches an already built field. A field with the same name already
    /// attached is kept and the new one is dropped.
    pub fn add_obj_field(&mut self, field: QueryField) -> &mut QueryField {
        attach_child(&mut self.children, field)
    }

    /// Top-level field by name.
    pub fn field(&self, name: &str) -> Option<&QueryField> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Mutable top-level field by name.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut QueryField> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    /// Top-level fields in insertion order.
    pub fn children(&self) -> &[QueryField] {
        &self.children
    }

    /// Renders the query document.
    pub fn calculate_query(&self) -> GraphQlResult<String> {
        self.render(None)
    }

    pub(crate) fn render(&self, page: Option<&PageRequest<'_>>) -> GraphQlResult<String> {
        if self.children.is_empty() {
            return Err(GraphQlError::MissingFields(self.name.clone()));
        }

        let mut declarations: Vec<String> = self
            .variables
            .iter()
            .filter(|slot| slot.value.is_some())
            .map(|slot| format!("{}: {}", slot.variable, slot.value_type.as_graphql()))
            .collect();
        let mut bound: HashSet<&str> = self
            .variables
            .iter()
            .filter(|slot| slot.value.is_some())
            .map(|slot| slot.variable.variable_name.as_str())
            .collect();
        if let Some(PageRequest {
            cursor: Some(_),
            cursor_variable,
            ..
        }) = page
        {
            declarations.push(format!(
                "${}: {}",
                cursor_variable,
                VariableType::String.as_graphql()
            ));
            bound.insert(*cursor_variable);
        }

        let mut header = format!("query {}", self.name);
        if !declarations.is_empty() {
            header.push_str(&format!("({})", declarations.join(", ")));
        }

        let ctx = RenderContext { bound };
        let mut lines = vec![format!("{header} {{")];
        for child in &self.children {
            child.render_into(&mut lines, INDENT, &ctx, page)?;
        }
        lines.push("}".to_string());
        Ok(lines.join("\n"))
    }

    /// Paths to edged fields that are not nested inside another edged field.
    pub fn paginated_field_paths(&self) -> Vec<Vec<&str>> {
        let mut output = Vec::new();
        for child in &self.children {
            child.collect_paginated(&mut Vec::new(), &mut output);
        }
        output
    }
}

fn add_child<'a>(children: &'a mut Vec<QueryField>, name: &str, has_edges: bool) -> &'a mut QueryField {
    attach_child(children, QueryField::new(name, has_edges))
}

fn attach_child(children: &mut Vec<QueryField>, field: QueryField) -> &mut QueryField {
    let index = match children.iter().position(|child| child.name == field.name) {
        Some(index) => index,
        None => {
            children.push(field);
            children.len() - 1
        }
    };
    &mut children[index]
}

/// One selected field with optional arguments and sub-selection.
#[derive(Debug, Clone)]
pub struct QueryField {
    name: String,
    has_edges: bool,
    filters: Vec<(String, FilterValue)>,
    children: Vec<QueryField>,
}

impl QueryField {
    /// Creates a detached field.
    pub fn new(name: impl Into<String>, has_edges: bool) -> Self {
        Self {
            name: name.into(),
            has_edges,
            filters: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the field is an edge collection (`edges { node { .. } }`).
    pub fn has_edges(&self) -> bool {
        self.has_edges
    }

    pub fn children(&self) -> &[QueryField] {
        &self.children
    }

    pub fn filters(&self) -> &[(String, FilterValue)] {
        &self.filters
    }

    /// Sets an argument on this field, replacing a previous value of `key`.
    pub fn set_filter(&mut self, key: &str, value: impl Into<FilterValue>) -> &mut Self {
        let value = value.into();
        match self.filters.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.filters.push((key.to_string(), value)),
        }
        self
    }

    /// Adds a sub-field, or returns the existing one with that name.
    pub fn add_field(&mut self, name: &str, has_edges: bool) -> &mut QueryField {
        add_child(&mut self.children, name, has_edges)
    }

    /// Attaches an already built sub-field.
    pub fn add_obj_field(&mut self, field: QueryField) -> &mut QueryField {
        attach_child(&mut self.children, field)
    }

    /// Sub-field by name.
    pub fn field(&self, name: &str) -> Option<&QueryField> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Mutable sub-field by name.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut QueryField> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    /// Expands a selection trie under this field, breadth first.
    pub fn add_fields_tree(&mut self, tree: &FieldTree) {
        let mut queue: VecDeque<(Vec<&str>, &str, &FieldNode)> = tree
            .iter()
            .map(|(key, node)| (Vec::new(), key.as_str(), node))
            .collect();

        while let Some((parent_path, key, node)) = queue.pop_front() {
            self.descend_mut(&parent_path).add_field(key, false);
            if let FieldNode::Subtree(children) = node {
                let mut path = parent_path;
                path.push(key);
                for (child_key, child_node) in children {
                    queue.push_back((path.clone(), child_key.as_str(), child_node));
                }
            }
        }
    }

    fn descend_mut(&mut self, path: &[&str]) -> &mut QueryField {
        let mut field = self;
        for part in path {
            field = field.add_field(part, false);
        }
        field
    }

    fn collect_paginated<'a>(&'a self, path: &mut Vec<&'a str>, output: &mut Vec<Vec<&'a str>>) {
        path.push(&self.name);
        if self.has_edges {
            output.push(path.clone());
        } else {
            for child in &self.children {
                child.collect_paginated(path, output);
            }
        }
        path.pop();
    }

    fn render_into(
        &self,
        lines: &mut Vec<String>,
        indent: usize,
        ctx: &RenderContext<'_>,
        page: Option<&PageRequest<'_>>,
    ) -> GraphQlResult<()> {
        let offset = " ".repeat(indent);
        let paginate = if self.has_edges { page } else { None };

        let mut arguments: Vec<String> = self
            .filters
            .iter()
            .filter(|(_, value)| ctx.is_renderable(value))
            .map(|(key, value)| format!("{key}: {}", value.render()))
            .collect();
        if let Some(request) = paginate {
            arguments.push(format!("first: {}", request.page_size));
            if request.cursor.is_some() {
                arguments.push(format!("after: ${}", request.cursor_variable));
            }
        }

        let mut header = format!("{offset}{}", self.name);
        if !arguments.is_empty() {
            header.push_str(&format!("({})", arguments.join(", ")));
        }

        if self.children.is_empty() {
            if self.has_edges {
                return Err(GraphQlError::EdgesWithoutFields(self.name.clone()));
            }
            lines.push(header);
            return Ok(());
        }

        lines.push(format!("{header} {{"));
        let mut child_indent = indent + INDENT;
        let edges_offset = " ".repeat(indent + INDENT);
        let node_offset = " ".repeat(indent + INDENT * 2);
        if self.has_edges {
            lines.push(format!("{edges_offset}edges {{"));
            lines.push(format!("{node_offset}node {{"));
            child_indent += INDENT * 2;
        }

        // Pagination arguments apply to the outermost edged field only.
        let child_page = if self.has_edges { None } else { page };
        for child in &self.children {
            child.render_into(lines, child_indent, ctx, child_page)?;
        }

        if self.has_edges {
            lines.push(format!("{node_offset}}}"));
            lines.push(format!("{edges_offset}}}"));
        }
        if paginate.is_some() {
            lines.push(format!("{edges_offset}pageInfo {{"));
            lines.push(format!("{node_offset}endCursor"));
            lines.push(format!("{node_offset}hasNextPage"));
            lines.push(format!("{edges_offset}}}"));
        }
        lines.push(format!("{offset}}}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_value_list_renders_quoted() {
        let value = FilterValue::from(vec!["a".to_string(), "b\"c".to_string()]);
        assert_eq!(value.render(), r#"["a", "b\"c"]"#);
    }

    #[test]
    fn filter_value_variable_renders_reference() {
        let mut query = GraphQlQuery::new("Q");
        let var = query.add_variable("ids", VariableType::StringList, None).unwrap();
        assert_eq!(FilterValue::from(&var).render(), "$ids");
        assert_eq!(var.to_string(), "$ids");
    }

    #[test]
    fn scalar_literals_render_directly() {
        assert_eq!(FilterValue::from(true).render(), "true");
        assert_eq!(FilterValue::from(42_i64).render(), "42");
        assert_eq!(FilterValue::from("root").render(), "\"root\"");
    }

    #[test]
    fn collect_paginated_skips_nested_edges() {
        let mut query = GraphQlQuery::new("Q");
        let folders = query.add_field("project", false).add_field("folders", true);
        folders.add_field("tasks", true).add_field("name", false);
        let paths = query.paginated_field_paths();
        assert_eq!(paths, vec![vec!["project", "folders"]]);
    }
}
