//! Shared fixtures: an in-memory server connection that replays scripted
//! GraphQL responses and records every request.

#![allow(dead_code)]

use assetdb_client::{ClientError, ClientResult, Document, ServerConnection};
use assetdb_graphql::GraphQlConnection;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

/// One recorded GraphQL request.
#[derive(Debug, Clone)]
pub struct Request {
    pub query: String,
    pub variables: Map<String, Value>,
}

impl Request {
    pub fn variables_json(&self) -> Value {
        Value::Object(self.variables.clone())
    }
}

#[derive(Default)]
pub struct RecordingConnection {
    responses: Mutex<VecDeque<Value>>,
    requests: Mutex<Vec<Request>>,
    projects: Vec<Document>,
    rest: BTreeMap<String, Value>,
    rest_calls: Mutex<Vec<String>>,
    page_size: Option<usize>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the `data` object of the next GraphQL response.
    pub fn respond(mut self, data: Value) -> Self {
        if let Ok(responses) = self.responses.get_mut() {
            responses.push_back(data);
        }
        self
    }

    /// Adds a project served by the REST accessors.
    pub fn with_project(mut self, project: Value) -> Self {
        self.projects.push(doc(project));
        self
    }

    /// Serves `value` for a raw REST GET on `path`.
    pub fn with_rest(mut self, path: &str, value: Value) -> Self {
        self.rest.insert(path.to_string(), value);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn rest_calls(&self) -> Vec<String> {
        self.rest_calls.lock().unwrap().clone()
    }

    /// No GraphQL and no REST request was made.
    pub fn untouched(&self) -> bool {
        self.requests().is_empty() && self.rest_calls().is_empty()
    }
}

#[async_trait]
impl GraphQlConnection for RecordingConnection {
    type Error = ClientError;

    async fn query_graphql(
        &self,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Result<Value, Self::Error> {
        self.requests.lock().unwrap().push(Request {
            query: query.to_string(),
            variables: variables.clone(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ClientError::Server(vec!["no scripted response left".to_string()]))
    }
}

#[async_trait]
impl ServerConnection for RecordingConnection {
    async fn get_rest_projects(
        &self,
        active: Option<bool>,
        library: Option<bool>,
    ) -> ClientResult<Vec<Document>> {
        self.rest_calls.lock().unwrap().push("projects".to_string());
        let matches = |project: &Document, key: &str, flag: Option<bool>| {
            flag.is_none_or(|flag| project.get(key).and_then(Value::as_bool) == Some(flag))
        };
        Ok(self
            .projects
            .iter()
            .filter(|project| matches(project, "active", active) && matches(project, "library", library))
            .cloned()
            .collect())
    }

    async fn get_rest_project(&self, project_name: &str) -> ClientResult<Option<Document>> {
        self.rest_calls
            .lock()
            .unwrap()
            .push(format!("projects/{project_name}"));
        Ok(self
            .projects
            .iter()
            .find(|project| project.get("name").and_then(Value::as_str) == Some(project_name))
            .cloned())
    }

    async fn get(&self, path: &str) -> ClientResult<Value> {
        self.rest_calls.lock().unwrap().push(path.to_string());
        self.rest.get(path).cloned().ok_or(ClientError::Api {
            status: 404,
            message: format!("{path} not found"),
        })
    }

    fn page_size(&self) -> usize {
        self.page_size.unwrap_or(assetdb_graphql::DEFAULT_PAGE_SIZE)
    }
}

pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Edge envelope around `nodes`, as the server sends it.
pub fn edges(nodes: Vec<Value>) -> Value {
    let edges: Vec<Value> = nodes.into_iter().map(|node| json!({"node": node})).collect();
    json!({"edges": edges})
}

/// Paginated edge envelope.
pub fn page(nodes: Vec<Value>, cursor: &str, has_next: bool) -> Value {
    let mut envelope = edges(nodes);
    envelope["pageInfo"] = json!({"endCursor": cursor, "hasNextPage": has_next});
    envelope
}

/// `{"project": {<collection>: <envelope>}}`
pub fn project_data(collection: &str, envelope: Value) -> Value {
    json!({"project": {collection: envelope}})
}

/// Selected field names directly inside the `node { .. }` block of the
/// first edge collection in a rendered query.
pub fn node_selection(query: &str) -> Vec<String> {
    let mut lines = query.lines().skip_while(|line| line.trim() != "node {");
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let depth = header.len() - header.trim_start().len() + 2;
    lines
        .take_while(|line| line.len() - line.trim_start().len() >= depth)
        .filter(|line| line.len() - line.trim_start().len() == depth)
        .map(|line| line.trim().trim_end_matches(" {").to_string())
        .collect()
}
