//! Shared test fixtures: an in-memory connection replaying canned responses.

use assetdb_graphql::{GraphQlConnection, GraphQlError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error(transparent)]
    Query(#[from] GraphQlError),
    #[error("transport failed: {0}")]
    Transport(String),
}

/// One recorded request.
#[derive(Debug, Clone)]
pub struct Request {
    pub query: String,
    pub variables: Map<String, Value>,
}

/// Replays responses in order and records every request.
#[derive(Default)]
pub struct ScriptedConnection {
    responses: Mutex<VecDeque<Result<Value, String>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedConnection {
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(message.to_string())])),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphQlConnection for ScriptedConnection {
    type Error = MockError;

    async fn query_graphql(
        &self,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Result<Value, Self::Error> {
        self.requests.lock().unwrap().push(Request {
            query: query.to_string(),
            variables: variables.clone(),
        });
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(MockError::Transport(message)),
            None => Err(MockError::Transport("no scripted response left".to_string())),
        }
    }
}
