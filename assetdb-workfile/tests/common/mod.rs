//! Shared fixtures: an in-memory host with placeholders and a loader that
//! record every scene operation.

#![allow(dead_code)]

use assetdb_client::Document;
use assetdb_workfile::{Placeholder, TemplateLoader, WorkfileError, WorkfileResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

pub type Events = Arc<Mutex<Vec<String>>>;

pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// Placeholder data with every required attribute.
pub fn placeholder_data(order: i64, family: &str, builder_type: &str) -> Document {
    doc(json!({
        "builder_type": builder_type,
        "family": family,
        "representation": "abc",
        "order": order,
        "loader": "ReferenceLoader",
        "loader_args": "{\"namespace\": \"x\"}"
    }))
}

pub fn representation(id: &str, subset: &str, version: i64) -> Document {
    doc(json!({
        "_id": id,
        "context": {"asset": "sh010", "subset": subset, "version": version}
    }))
}

/// Node of the fake host scene.
#[derive(Clone)]
pub struct Node {
    pub name: String,
    pub data: Document,
    pub representations: Vec<Document>,
}

impl Node {
    pub fn new(name: &str, data: Document, representations: Vec<Document>) -> Self {
        Self {
            name: name.to_string(),
            data,
            representations,
        }
    }
}

pub struct FakePlaceholder {
    node: Node,
    events: Events,
}

#[async_trait]
impl Placeholder for FakePlaceholder {
    type Container = String;

    fn name(&self) -> &str {
        &self.node.name
    }

    fn data(&self) -> &Document {
        &self.node.data
    }

    async fn representations(
        &self,
        _current_asset: &Document,
        _linked_assets: &[Document],
    ) -> WorkfileResult<Vec<Document>> {
        self.events
            .lock()
            .unwrap()
            .push(format!("query:{}", self.node.name));
        Ok(self.node.representations.clone())
    }

    fn parent_in_hierarchy(&mut self, container: &String) -> WorkfileResult<()> {
        self.events
            .lock()
            .unwrap()
            .push(format!("parent:{}:{container}", self.node.name));
        Ok(())
    }

    fn clean(&mut self) -> WorkfileResult<()> {
        self.events
            .lock()
            .unwrap()
            .push(format!("clean:{}", self.node.name));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeLoader {
    pub nodes: Vec<Node>,
    pub loaded_ids: BTreeSet<String>,
    pub failing_ids: BTreeSet<String>,
    pub events: Events,
}

impl FakeLoader {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl TemplateLoader for FakeLoader {
    type Node = Node;
    type Container = String;
    type Placeholder = FakePlaceholder;

    fn template_nodes(&self) -> WorkfileResult<Vec<Node>> {
        Ok(self.nodes.clone())
    }

    fn placeholder_from_node(&self, node: Node) -> WorkfileResult<FakePlaceholder> {
        Ok(FakePlaceholder {
            node,
            events: Arc::clone(&self.events),
        })
    }

    fn loaded_container_ids(&self) -> WorkfileResult<BTreeSet<String>> {
        Ok(self.loaded_ids.clone())
    }

    async fn load(
        &mut self,
        placeholder: &FakePlaceholder,
        representation: &Document,
    ) -> WorkfileResult<String> {
        let id = representation
            .get("_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.events
            .lock()
            .unwrap()
            .push(format!("load:{}:{id}", placeholder.name()));
        if self.failing_ids.contains(&id) {
            return Err(WorkfileError::Load {
                representation_id: id,
                message: "reference failed".to_string(),
            });
        }
        Ok(format!("container_{id}"))
    }
}

/// Server connection replaying GraphQL `data` objects in order.
#[derive(Default)]
pub struct ScriptedServer {
    responses: Mutex<std::collections::VecDeque<Value>>,
    pub queries: Mutex<Vec<(String, serde_json::Map<String, Value>)>>,
}

impl ScriptedServer {
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl assetdb_graphql::GraphQlConnection for ScriptedServer {
    type Error = assetdb_client::ClientError;

    async fn query_graphql(
        &self,
        query: &str,
        variables: &serde_json::Map<String, Value>,
    ) -> Result<Value, Self::Error> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), variables.clone()));
        self.responses.lock().unwrap().pop_front().ok_or_else(|| {
            assetdb_client::ClientError::Server(vec!["no scripted response left".to_string()])
        })
    }
}

#[async_trait]
impl assetdb_client::ServerConnection for ScriptedServer {
    async fn get_rest_projects(
        &self,
        _active: Option<bool>,
        _library: Option<bool>,
    ) -> assetdb_client::ClientResult<Vec<Document>> {
        Ok(Vec::new())
    }

    async fn get_rest_project(
        &self,
        _project_name: &str,
    ) -> assetdb_client::ClientResult<Option<Document>> {
        Ok(None)
    }

    async fn get(&self, path: &str) -> assetdb_client::ClientResult<Value> {
        Err(assetdb_client::ClientError::Api {
            status: 404,
            message: format!("{path} not found"),
        })
    }
}

/// `{"project": {<collection>: {"edges": [{"node": ..}]}}}`
pub fn project_edges(collection: &str, nodes: Vec<Value>) -> Value {
    let edges: Vec<Value> = nodes.into_iter().map(|node| json!({"node": node})).collect();
    json!({"project": {collection: {"edges": edges}}})
}
