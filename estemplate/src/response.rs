//! Response bodies returned by the cluster

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Search (and scroll) response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub timed_out: bool,
    /// Scroll cursor, present when the request opened a scroll window
    #[serde(rename = "_scroll_id", default, skip_serializing_if = "Option::is_none")]
    pub scroll_id: Option<String>,
    #[serde(rename = "_shards", default)]
    pub shards: ShardStats,
    pub hits: HitsResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Value>,
    /// Everything else the cluster sent (`suggest`, `profile`, `pit_id`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResponse {
    pub fn total(&self) -> u64 {
        self.hits.total.as_ref().map(|t| t.value).unwrap_or(0)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.hits.hits.iter().map(|h| h.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShardStats {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub successful: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub failed: u32,
    /// Per-shard `failures` and any other keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalHits {
    pub value: u64,
    pub relation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<HashMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<Value>>,
    /// `fields`, `inner_hits`, `matched_queries`, `_version`, `_seq_no`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Single-document get response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponse {
    #[serde(rename = "_index", default)]
    pub index: String,
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub found: bool,
    #[serde(rename = "_source", default)]
    pub source: Option<Map<String, Value>>,
}

/// Single-document write response (index, update, delete)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResponse {
    #[serde(rename = "_index", default)]
    pub index: String,
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub result: String,
}

/// Bulk response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub took: u64,
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<BulkItemResponse>,
}

/// One item of a bulk response, keyed by the action that produced it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkItemResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<BulkItemResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<BulkItemResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<BulkItemResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<BulkItemResult>,
}

impl BulkItemResponse {
    pub fn result(&self) -> Option<&BulkItemResult> {
        self.index
            .as_ref()
            .or(self.create.as_ref())
            .or(self.update.as_ref())
            .or(self.delete.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemResult {
    #[serde(rename = "_index", default)]
    pub index: String,
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCause>,
}

impl BulkResponse {
    /// Whether any item failed
    pub fn has_failures(&self) -> bool {
        self.errors || self.items.iter().any(|i| i.result().is_some_and(|r| r.error.is_some()))
    }

    /// Human-readable summary of all failed items
    pub fn failure_message(&self) -> String {
        let mut message = String::from("failure in bulk execution:");
        for (position, item) in self.items.iter().enumerate() {
            let Some(result) = item.result() else {
                continue;
            };
            if let Some(error) = &result.error {
                message.push_str(&format!(
                    "\n[{}]: index [{}], id [{}], message [{}]",
                    position, result.index, result.id, error
                ));
            }
        }
        message
    }
}

/// Delete-by-query response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteByQueryResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub deleted: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub failures: Vec<Value>,
}

/// Clear-scroll response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearScrollResponse {
    #[serde(default)]
    pub succeeded: bool,
    #[serde(default)]
    pub num_freed: u64,
}

/// Error envelope returned with non-success statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    #[serde(default)]
    pub status: u16,
}

/// `error` is usually an object, but some endpoints return a bare string
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Cause(ErrorCause),
    Message(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorCause {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl std::fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {}", self.error_type, reason),
            None => write!(f, "{}", self.error_type),
        }
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorBody::Cause(cause) => cause.fmt(f),
            ErrorBody::Message(message) => f.write_str(message),
        }
    }
}
