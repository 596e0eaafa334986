//! Connection handle for a single cluster
//!
//! Wraps one pooled `reqwest::Client` plus the cluster's node list. Requests
//! rotate across nodes round-robin; each call makes exactly one attempt.

use crate::bulk::{encode_bulk_body, BulkAction};
use crate::config::ClusterConnectionConfig;
use crate::error::{Error, Result};
use crate::query::{Query, SearchRequest};
use crate::response::{
    BulkResponse, ClearScrollResponse, DeleteByQueryResponse, ErrorResponse, GetResponse,
    SearchResponse, WriteResponse,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;
use url::Url;

const NDJSON: &str = "application/x-ndjson";

/// Live connection to one cluster
pub struct ConnectionHandle {
    cluster: String,
    client: reqwest::Client,
    nodes: Vec<Url>,
    next_node: AtomicUsize,
    credentials: Option<(String, String)>,
    closed: AtomicBool,
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("cluster", &self.cluster)
            .field("nodes", &self.nodes)
            .field("authenticated", &self.credentials.is_some())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ConnectionHandle {
    /// Build a handle from config. Fails when no usable host remains or the
    /// HTTP client cannot be constructed.
    pub fn connect(config: &ClusterConnectionConfig) -> Result<Self> {
        let nodes = config.validate()?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.socket_timeout())
            .pool_idle_timeout(config.connection_request_timeout())
            .build()?;

        let credentials = config
            .credentials()
            .map(|(user, pass)| (user.to_string(), pass.to_string()));

        Ok(Self {
            cluster: config.name.clone(),
            client,
            nodes,
            next_node: AtomicUsize::new(0),
            credentials,
            closed: AtomicBool::new(false),
        })
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster
    }

    pub fn nodes(&self) -> &[Url] {
        &self.nodes
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Mark the handle closed. Pooled connections are released once the last
    /// in-flight request drops its reference.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::HandleClosed(self.cluster.clone()));
        }
        debug!(cluster = %self.cluster, "Connection handle closed");
        Ok(())
    }

    fn next_node(&self) -> &Url {
        let i = self.next_node.fetch_add(1, Ordering::Relaxed);
        &self.nodes[i % self.nodes.len()]
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let node = self.next_node();
        let mut url = node.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Node URL {} cannot carry a path", node)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        if self.is_closed() {
            return Err(Error::HandleClosed(self.cluster.clone()));
        }
        let url = self.url(segments)?;
        let builder = self.client.request(method, url);
        Ok(match &self.credentials {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        })
    }

    /// Liveness probe against the cluster root
    pub async fn ping(&self) -> Result<bool> {
        let response = self.request(Method::HEAD, &[])?.send().await?;
        Ok(response.status().is_success())
    }

    /// Index a document, letting the cluster assign an id when `id` is `None`
    pub async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        doc: &Map<String, Value>,
    ) -> Result<WriteResponse> {
        let builder = match id {
            Some(id) => self.request(Method::PUT, &[index, "_doc", id])?,
            None => self.request(Method::POST, &[index, "_doc"])?,
        };
        let response = builder.json(doc).send().await?;
        parse_success(response).await
    }

    /// Partial update of an existing document
    pub async fn update_document(
        &self,
        index: &str,
        id: &str,
        doc: &Map<String, Value>,
    ) -> Result<WriteResponse> {
        let response = self
            .request(Method::POST, &[index, "_update", id])?
            .json(&json!({ "doc": doc }))
            .send()
            .await?;
        parse_success(response).await
    }

    /// Delete a document. A missing document is not an error; the response
    /// carries `result: not_found`.
    pub async fn delete_document(&self, index: &str, id: &str) -> Result<WriteResponse> {
        let response = self.request(Method::DELETE, &[index, "_doc", id])?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            let body: Value = response.json().await?;
            if body.get("error").is_none() {
                return Ok(serde_json::from_value(body)?);
            }
            return Err(cluster_error(StatusCode::NOT_FOUND, &body.to_string()));
        }
        parse_success(response).await
    }

    pub async fn document_exists(&self, index: &str, id: &str) -> Result<bool> {
        let response = self.request(Method::HEAD, &[index, "_doc", id])?.send().await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(Error::Cluster {
                status: s.as_u16(),
                reason: "document existence check failed".to_string(),
            }),
        }
    }

    /// Fetch a document's source, optionally restricted to `fields`.
    /// Returns `None` when the document does not exist or carries no `_source`.
    pub async fn get_document(
        &self,
        index: &str,
        id: &str,
        fields: Option<&[String]>,
    ) -> Result<Option<Map<String, Value>>> {
        let mut builder = self.request(Method::GET, &[index, "_doc", id])?;
        if let Some(fields) = fields.filter(|f| !f.is_empty()) {
            builder = builder.query(&[("_source_includes", fields.join(","))]);
        }
        let response = builder.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            let body: Value = response.json().await?;
            if body.get("error").is_some() {
                return Err(cluster_error(StatusCode::NOT_FOUND, &body.to_string()));
            }
            return Ok(None);
        }

        let parsed: GetResponse = parse_success(response).await?;
        if !parsed.found {
            return Ok(None);
        }
        Ok(parsed.source)
    }

    /// Send a batch as one `_bulk` request
    pub async fn bulk(&self, actions: &[BulkAction]) -> Result<BulkResponse> {
        let body = encode_bulk_body(actions)?;
        let response = self
            .request(Method::POST, &["_bulk"])?
            .header(CONTENT_TYPE, NDJSON)
            .body(body)
            .send()
            .await?;
        parse_success(response).await
    }

    pub async fn delete_by_query(&self, index: &str, query: &Query) -> Result<DeleteByQueryResponse> {
        let response = self
            .request(Method::POST, &[index, "_delete_by_query"])?
            .json(&json!({ "query": query }))
            .send()
            .await?;
        parse_success(response).await
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let mut builder = self.request(Method::POST, &[request.index.as_str(), "_search"])?;
        if let Some(keep_alive) = &request.scroll {
            builder = builder.query(&[("scroll", keep_alive.as_str())]);
        }
        let response = builder.json(&request.body).send().await?;
        parse_success(response).await
    }

    /// Fetch the next page of an open scroll
    pub async fn scroll(&self, scroll_id: &str, keep_alive: &str) -> Result<SearchResponse> {
        let response = self
            .request(Method::POST, &["_search", "scroll"])?
            .json(&json!({ "scroll": keep_alive, "scroll_id": scroll_id }))
            .send()
            .await?;
        parse_success(response).await
    }

    pub async fn clear_scroll(&self, scroll_id: &str) -> Result<ClearScrollResponse> {
        let response = self
            .request(Method::DELETE, &["_search", "scroll"])?
            .json(&json!({ "scroll_id": [scroll_id] }))
            .send()
            .await?;
        parse_success(response).await
    }
}

async fn parse_success<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(cluster_error(status, &body));
    }
    Ok(response.json().await?)
}

fn cluster_error(status: StatusCode, body: &str) -> Error {
    let reason = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.error.to_string(),
        Err(_) if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body.to_string(),
    };
    Error::Cluster {
        status: status.as_u16(),
        reason,
    }
}
