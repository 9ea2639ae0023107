//! Sending built queries to a server and decoding the responses.
//!
//! The executor never owns a connection. Callers pass anything implementing
//! [`GraphQlConnection`]; transport errors come back as the connection's own
//! error type, while local failures (missing fields, malformed envelopes) are
//! converted into it through `From<GraphQlError>`.

use crate::error::GraphQlError;
use crate::query::{GraphQlQuery, PageRequest, QueryField};
use async_trait::async_trait;
use futures::Stream;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Transport capable of executing one rendered query document.
#[async_trait]
pub trait GraphQlConnection: Send + Sync {
    /// Error type surfaced to callers. Local query errors convert into it.
    type Error: std::error::Error + From<GraphQlError> + Send + Sync + 'static;

    /// Executes `query` with bound `variables` and returns the `data` object
    /// of the response.
    async fn query_graphql(
        &self,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Result<Value, Self::Error>;
}

impl GraphQlQuery {
    /// Executes the query once and returns the decoded data object, with
    /// every edge envelope replaced by the list of its nodes.
    pub async fn query<C>(&self, con: &C) -> Result<Value, C::Error>
    where
        C: GraphQlConnection + ?Sized,
    {
        let document = self.calculate_query()?;
        let variables = self.get_variable_values();
        debug!(
            query = %self.name(),
            variables = ?variables.keys().collect::<Vec<_>>(),
            "executing query"
        );

        let mut data = con.query_graphql(&document, &variables).await?;
        unwrap_edges(self.children(), &mut data);
        Ok(data)
    }

    /// Starts a cursor walk over the query's paginated field.
    ///
    /// Each call starts an independent walk; nothing is shared between
    /// paginators of the same query.
    pub fn continuous_query<'a, C>(&'a self, con: &'a C) -> Paginator<'a, C>
    where
        C: GraphQlConnection + ?Sized,
    {
        Paginator {
            query: self,
            con,
            cursor: None,
            page_index: 0,
            finished: false,
        }
    }
}

/// Lazy, finite sequence of decoded pages.
pub struct Paginator<'a, C: ?Sized> {
    query: &'a GraphQlQuery,
    con: &'a C,
    cursor: Option<String>,
    page_index: usize,
    finished: bool,
}

impl<'a, C> Paginator<'a, C>
where
    C: GraphQlConnection + ?Sized,
{
    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.page_index
    }

    /// Fetches the next page, or `None` once the server reported the last
    /// one. After an error the paginator is exhausted.
    pub async fn next_page(&mut self) -> Option<Result<Value, C::Error>> {
        if self.finished {
            return None;
        }
        let page = self.fetch_page().await;
        if page.is_err() {
            self.finished = true;
        }
        Some(page)
    }

    /// Fetches every remaining page.
    pub async fn collect_pages(mut self) -> Result<Vec<Value>, C::Error> {
        let mut pages = Vec::new();
        while let Some(page) = self.next_page().await {
            pages.push(page?);
        }
        Ok(pages)
    }

    /// Adapts the paginator into a stream of pages.
    pub fn into_stream(self) -> impl Stream<Item = Result<Value, C::Error>> + 'a {
        futures::stream::unfold(self, |mut paginator| async move {
            paginator.next_page().await.map(|page| (page, paginator))
        })
    }

    async fn fetch_page(&mut self) -> Result<Value, C::Error> {
        let paths = self.query.paginated_field_paths();
        let path: Vec<String> = match paths.as_slice() {
            [] => {
                self.finished = true;
                self.page_index += 1;
                return self.query.query(self.con).await;
            }
            [path] => path.iter().map(|part| part.to_string()).collect(),
            _ => {
                return Err(GraphQlError::AmbiguousPagination {
                    query: self.query.name().to_string(),
                    count: paths.len(),
                }
                .into());
            }
        };

        let cursor_variable = format!("{}Cursor", path.last().map_or("page", String::as_str));
        let request = PageRequest {
            page_size: self.query.page_size(),
            cursor_variable: &cursor_variable,
            cursor: self.cursor.as_deref(),
        };
        let document = self.query.render(Some(&request))?;

        let mut variables = self.query.get_variable_values();
        if let Some(cursor) = &self.cursor {
            variables.insert(cursor_variable.clone(), Value::String(cursor.clone()));
        }
        debug!(
            query = %self.query.name(),
            page = self.page_index,
            variables = ?variables.keys().collect::<Vec<_>>(),
            "executing paginated query"
        );

        let mut data = self.con.query_graphql(&document, &variables).await?;
        self.page_index += 1;

        match read_page_info(&data, &path)? {
            Some(PageInfo {
                end_cursor: Some(end_cursor),
                has_next_page: true,
            }) => {
                if self.cursor.as_deref() == Some(end_cursor.as_str()) {
                    warn!(
                        query = %self.query.name(),
                        "server returned the same cursor twice, stopping pagination"
                    );
                    self.finished = true;
                } else {
                    self.cursor = Some(end_cursor);
                }
            }
            _ => self.finished = true,
        }

        unwrap_edges(self.query.children(), &mut data);
        Ok(data)
    }
}

#[derive(Debug, PartialEq)]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

/// Reads `pageInfo` of the edge envelope found at `path`.
///
/// A `null` anywhere on the path means there is nothing to paginate.
fn read_page_info(data: &Value, path: &[String]) -> Result<Option<PageInfo>, GraphQlError> {
    let mut current = data;
    for (depth, part) in path.iter().enumerate() {
        current = match current {
            Value::Null => return Ok(None),
            Value::Object(map) => match map.get(part) {
                Some(value) => value,
                None => return Ok(None),
            },
            other => {
                return Err(GraphQlError::MalformedResponse {
                    path: path[..=depth].join("."),
                    reason: format!("expected an object, got {}", value_kind(other)),
                });
            }
        };
    }

    let Some(page_info) = current.get("pageInfo") else {
        if !current.is_null() {
            warn!(path = %path.join("."), "edge envelope has no pageInfo");
        }
        return Ok(None);
    };

    Ok(Some(PageInfo {
        end_cursor: page_info
            .get("endCursor")
            .and_then(Value::as_str)
            .map(str::to_string),
        has_next_page: page_info
            .get("hasNextPage")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Replaces every `{"edges": [{"node": ..}]}` envelope declared by `fields`
/// with the plain list of nodes, descending through lists.
pub(crate) fn unwrap_edges(fields: &[QueryField], value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                unwrap_edges(fields, item);
            }
        }
        Value::Object(map) => {
            for field in fields {
                let Some(child) = map.get_mut(field.name()) else {
                    continue;
                };
                if !field.has_edges() {
                    unwrap_edges(field.children(), child);
                    continue;
                }
                if let Some(mut nodes) = take_nodes(child) {
                    for node in &mut nodes {
                        unwrap_edges(field.children(), node);
                    }
                    *child = Value::Array(nodes);
                } else if !child.is_null() {
                    warn!(field = %field.name(), "expected an edge envelope");
                }
            }
        }
        _ => {}
    }
}

fn take_nodes(envelope: &mut Value) -> Option<Vec<Value>> {
    let edges = envelope.get_mut("edges")?.as_array_mut()?;
    Some(
        edges
            .drain(..)
            .map(|mut edge| edge.get_mut("node").map(Value::take).unwrap_or(Value::Null))
            .collect(),
    )
}
