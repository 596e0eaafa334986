//! Bulk request encoding
//!
//! A batch is sent as one NDJSON body: an action line per item, followed by
//! a source line for index and update actions.

use crate::error::Result;
use crate::types::DocumentRecord;
use serde::Serialize;
use serde_json::{Map, Value};

/// A single action inside a bulk request
#[derive(Debug, Clone, PartialEq)]
pub enum BulkAction {
    Index {
        index: String,
        id: Option<String>,
        doc: Map<String, Value>,
    },
    Update {
        index: String,
        id: String,
        doc: Map<String, Value>,
    },
    Delete {
        index: String,
        id: String,
    },
}

#[derive(Serialize)]
struct ActionMeta<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum ActionLine<'a> {
    Index(ActionMeta<'a>),
    Update(ActionMeta<'a>),
    Delete(ActionMeta<'a>),
}

#[derive(Serialize)]
struct PartialDoc<'a> {
    doc: &'a Map<String, Value>,
}

impl BulkAction {
    pub fn index(index: &str, record: &DocumentRecord) -> Self {
        BulkAction::Index {
            index: index.to_string(),
            id: record.id().map(str::to_string),
            doc: record.fields.clone(),
        }
    }

    /// Update action, or `None` when the record has no usable id
    pub fn update(index: &str, record: &DocumentRecord) -> Option<Self> {
        record.id().map(|id| BulkAction::Update {
            index: index.to_string(),
            id: id.to_string(),
            doc: record.fields.clone(),
        })
    }

    pub fn delete(index: &str, id: &str) -> Self {
        BulkAction::Delete {
            index: index.to_string(),
            id: id.to_string(),
        }
    }

    fn write_to(&self, out: &mut String) -> Result<()> {
        match self {
            BulkAction::Index { index, id, doc } => {
                push_line(out, &ActionLine::Index(ActionMeta { index: index.as_str(), id: id.as_deref() }))?;
                push_line(out, doc)?;
            }
            BulkAction::Update { index, id, doc } => {
                push_line(out, &ActionLine::Update(ActionMeta { index: index.as_str(), id: Some(id.as_str()) }))?;
                push_line(out, &PartialDoc { doc })?;
            }
            BulkAction::Delete { index, id } => {
                push_line(out, &ActionLine::Delete(ActionMeta { index: index.as_str(), id: Some(id.as_str()) }))?;
            }
        }
        Ok(())
    }
}

fn push_line<T: Serialize>(out: &mut String, value: &T) -> Result<()> {
    out.push_str(&serde_json::to_string(value)?);
    out.push('\n');
    Ok(())
}

/// Encode actions as an NDJSON bulk body (trailing newline included)
pub fn encode_bulk_body(actions: &[BulkAction]) -> Result<String> {
    let mut body = String::new();
    for action in actions {
        action.write_to(&mut body)?;
    }
    Ok(body)
}
