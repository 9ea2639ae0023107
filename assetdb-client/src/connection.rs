//! Server connections.
//!
//! [`ServerConnection`] is what the entity functions talk to: a GraphQL
//! transport plus the few REST endpoints the GraphQL schema does not cover.
//! [`HttpConnection`] is the reqwest implementation.

use crate::config::ServerConfig;
use crate::error::{ClientError, ClientResult};
use crate::Document;
use assetdb_graphql::{GraphQlConnection, DEFAULT_PAGE_SIZE};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

/// Connection to an asset database server.
#[async_trait]
pub trait ServerConnection: GraphQlConnection<Error = ClientError> {
    /// Full project documents, optionally filtered by active and library
    /// flags.
    async fn get_rest_projects(
        &self,
        active: Option<bool>,
        library: Option<bool>,
    ) -> ClientResult<Vec<Document>>;

    /// Full project document, or `None` when the project does not exist.
    async fn get_rest_project(&self, project_name: &str) -> ClientResult<Option<Document>>;

    /// Raw GET on a REST endpoint, relative to the API root.
    async fn get(&self, path: &str) -> ClientResult<Value>;

    /// Records requested per page by paginated queries.
    fn page_size(&self) -> usize {
        DEFAULT_PAGE_SIZE
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProjectList {
    #[serde(default)]
    projects: Vec<ProjectListItem>,
}

#[derive(Debug, Deserialize)]
struct ProjectListItem {
    name: String,
}

/// HTTP connection using `POST {server}/graphql` and `GET {server}/api/..`.
#[derive(Debug, Clone)]
pub struct HttpConnection {
    config: ServerConfig,
    client: Client,
}

impl HttpConnection {
    /// Creates a connection. No request is made until the first query.
    pub fn new(config: ServerConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn graphql_url(&self) -> String {
        format!("{}/graphql", self.config.base_url())
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.config.base_url(), path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send_get(&self, path: &str, query: &[(&str, String)]) -> ClientResult<Response> {
        let url = self.api_url(path);
        debug!(%url, "GET");
        let response = self
            .authorize(self.client.get(&url))
            .query(query)
            .send()
            .await?;
        Ok(response)
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl GraphQlConnection for HttpConnection {
    type Error = ClientError;

    async fn query_graphql(
        &self,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Result<Value, Self::Error> {
        let response = self
            .authorize(self.client.post(self.graphql_url()))
            .json(&json!({"query": query, "variables": variables}))
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: GraphQlResponse = response.json().await?;
        if !body.errors.is_empty() {
            return Err(ClientError::Server(
                body.errors.into_iter().map(|error| error.message).collect(),
            ));
        }
        Ok(body.data.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ServerConnection for HttpConnection {
    async fn get_rest_projects(
        &self,
        active: Option<bool>,
        library: Option<bool>,
    ) -> ClientResult<Vec<Document>> {
        let mut query = Vec::new();
        if let Some(active) = active {
            query.push(("active", active.to_string()));
        }
        if let Some(library) = library {
            query.push(("library", library.to_string()));
        }

        let response = check_status(self.send_get("projects", &query).await?).await?;
        let list: ProjectList = response.json().await?;

        let mut projects = Vec::with_capacity(list.projects.len());
        for item in list.projects {
            if let Some(project) = self.get_rest_project(&item.name).await? {
                projects.push(project);
            }
        }
        Ok(projects)
    }

    async fn get_rest_project(&self, project_name: &str) -> ClientResult<Option<Document>> {
        let path = format!("projects/{}", urlencoding::encode(project_name));
        let response = self.send_get(&path, &[]).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;
        match response.json::<Value>().await? {
            Value::Object(project) => Ok(Some(project)),
            _ => Ok(None),
        }
    }

    async fn get(&self, path: &str) -> ClientResult<Value> {
        let response = check_status(self.send_get(path, &[]).await?).await?;
        Ok(response.json().await?)
    }

    fn page_size(&self) -> usize {
        self.config.page_size
    }
}

static DEFAULT_CONNECTION: OnceLock<Arc<HttpConnection>> = OnceLock::new();

/// Process-wide connection built from the environment on first use.
///
/// Library functions never call this; they take a connection argument.
pub fn default_connection() -> ClientResult<Arc<HttpConnection>> {
    if let Some(con) = DEFAULT_CONNECTION.get() {
        return Ok(Arc::clone(con));
    }
    let config = ServerConfig::from_env()?;
    info!(server = %config.base_url(), "opening default connection");
    let con = Arc::new(HttpConnection::new(config)?);
    Ok(Arc::clone(DEFAULT_CONNECTION.get_or_init(|| con)))
}
