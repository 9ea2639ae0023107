//! Filter normalization shared by the entity functions.
//!
//! Every optional id or name list passes through [`FilterSet`], which tells
//! apart "no constraint" (`None`) from "constraint nobody can satisfy" (an
//! empty list). An unsatisfiable filter short-circuits the call before any
//! request is sent.

use assetdb_graphql::{GraphQlQuery, GraphQlResult};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Parent id that stands for "directly under the project".
pub const ROOT_PARENT_ID: &str = "root";

/// Marker returned when a filter can match nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsatisfiable;

/// A normalized, deduplicated filter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSet<T> {
    /// No constraint was requested.
    Unconstrained,
    /// An empty constraint was requested.
    Unsatisfiable,
    /// Match any of these values.
    Constrained(BTreeSet<T>),
}

impl<T: Ord> FilterSet<T> {
    /// `None` is unconstrained, an empty collection is unsatisfiable.
    pub fn from_option<I>(values: Option<I>) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        match values {
            None => FilterSet::Unconstrained,
            Some(values) => {
                let set: BTreeSet<T> = values.into_iter().collect();
                if set.is_empty() {
                    FilterSet::Unsatisfiable
                } else {
                    FilterSet::Constrained(set)
                }
            }
        }
    }

    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, FilterSet::Unsatisfiable)
    }

    /// Constrained values, or `None` when unconstrained.
    pub fn into_values(self) -> Result<Option<BTreeSet<T>>, Unsatisfiable> {
        match self {
            FilterSet::Unconstrained => Ok(None),
            FilterSet::Unsatisfiable => Err(Unsatisfiable),
            FilterSet::Constrained(values) => Ok(Some(values)),
        }
    }
}

/// Normalizes parent folder ids: `None` and the project name itself both
/// mean the project root.
pub fn normalize_parent_ids<I>(project_name: &str, parent_ids: Option<I>) -> FilterSet<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    FilterSet::from_option(parent_ids.map(|ids| {
        ids.into_iter()
            .map(|id| match id {
                None => ROOT_PARENT_ID.to_string(),
                Some(id) if id == project_name => ROOT_PARENT_ID.to_string(),
                Some(id) => id,
            })
            .collect::<Vec<_>>()
    }))
}

/// Which entities to keep by their `active` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveSelection {
    /// Neither active nor inactive entities were asked for.
    Nothing,
    /// Both active and inactive entities.
    Any,
    /// Only entities whose flag equals the value.
    Only(bool),
}

impl ActiveSelection {
    pub fn from_flags(active: bool, inactive: bool) -> Self {
        match (active, inactive) {
            (false, false) => ActiveSelection::Nothing,
            (true, true) => ActiveSelection::Any,
            (true, false) => ActiveSelection::Only(true),
            (false, true) => ActiveSelection::Only(false),
        }
    }

    /// `None` when the selection matches nothing, otherwise the optional
    /// exact flag to filter on.
    pub fn as_filter(self) -> Option<Option<bool>> {
        match self {
            ActiveSelection::Nothing => None,
            ActiveSelection::Any => Some(None),
            ActiveSelection::Only(flag) => Some(Some(flag)),
        }
    }
}

/// Keeps documents whose boolean `key` equals `value`. `None` keeps
/// everything.
pub fn retain_flag(documents: &mut Vec<Map<String, Value>>, key: &str, value: Option<bool>) {
    if let Some(value) = value {
        documents.retain(|doc| doc.get(key).and_then(Value::as_bool) == Some(value));
    }
}

/// Keeps documents whose `active` flag matches.
pub fn retain_active(documents: &mut Vec<Map<String, Value>>, active: Option<bool>) {
    retain_flag(documents, "active", active);
}

/// Variable values collected for one query, always including the project
/// name.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFilters {
    values: Map<String, Value>,
}

impl QueryFilters {
    pub fn new(project_name: &str) -> Self {
        let mut values = Map::new();
        values.insert("projectName".to_string(), Value::String(project_name.to_string()));
        Self { values }
    }

    /// Project-independent filters, for queries without a project scope.
    pub fn unscoped() -> Self {
        Self { values: Map::new() }
    }

    /// Adds a list constraint. Unconstrained sets add nothing, unsatisfiable
    /// ones make the whole query unsatisfiable.
    pub fn constrain<T>(&mut self, name: &str, filter: FilterSet<T>) -> Result<(), Unsatisfiable>
    where
        T: Ord + Into<Value>,
    {
        if let Some(values) = filter.into_values()? {
            let list = values.into_iter().map(Into::into).collect();
            self.values.insert(name.to_string(), Value::Array(list));
        }
        Ok(())
    }

    /// Shorthand for [`constrain`](Self::constrain) on an optional list.
    pub fn constrain_values<T, I>(&mut self, name: &str, values: Option<I>) -> Result<(), Unsatisfiable>
    where
        T: Ord + Into<Value>,
        I: IntoIterator<Item = T>,
    {
        self.constrain(name, FilterSet::from_option(values))
    }

    /// Sets a scalar variable value.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Binds every collected value onto `query`'s declared variables.
    pub fn apply(&self, query: &mut GraphQlQuery) -> GraphQlResult<()> {
        for (name, value) in &self.values {
            query.set_variable_value(name, value.clone())?;
        }
        Ok(())
    }
}
