//! Plain data passed into template operations

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a document operation applies
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexTarget {
    pub cluster_name: String,
    pub index_name: String,
}

impl IndexTarget {
    pub fn new(cluster_name: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            index_name: index_name.into(),
        }
    }
}

/// A document to write
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Absent means the cluster generates an id on insert
    #[serde(default)]
    pub doc_id: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl DocumentRecord {
    pub fn new(doc_id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            doc_id: Some(doc_id.into()),
            fields,
        }
    }

    /// A record whose id is assigned by the cluster
    pub fn without_id(fields: Map<String, Value>) -> Self {
        Self { doc_id: None, fields }
    }

    /// Build a record from a JSON object; anything else yields no fields
    pub fn from_json(doc_id: impl Into<String>, value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(doc_id, fields)
    }

    /// The id, if present and not blank
    pub fn id(&self) -> Option<&str> {
        self.doc_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Aggregate result of a write batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: bool,
    pub failure_detail: Option<String>,
}

impl BulkOutcome {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            failure_detail: None,
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            failure_detail: Some(detail.into()),
        }
    }
}
