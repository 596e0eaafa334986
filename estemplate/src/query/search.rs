//! Search request construction
//!
//! [`build_search_request`] turns a declarative [`SearchSpec`] into the wire
//! request in one pass. Every field is applied independently; a trailing
//! `_score` descending sort is always appended after any explicit sort.

use super::types::{Highlight, Query};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SCORE_FIELD: &str = "_score";

/// Declarative description of a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpec {
    /// Absent means no query clause is sent
    #[serde(default)]
    pub query: Option<Query>,
    /// Fields to return from `_source`; absent returns the full document
    #[serde(default)]
    pub return_fields: Option<Vec<String>>,
    #[serde(default)]
    pub from: usize,
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default)]
    pub highlight: Option<Highlight>,
    /// Sorted ascending, ahead of the score tie-break
    #[serde(default)]
    pub sort_field: Option<String>,
    #[serde(default)]
    pub scroll: Option<ScrollSpec>,
}

fn default_size() -> usize {
    10
}

impl Default for SearchSpec {
    fn default() -> Self {
        Self {
            query: None,
            return_fields: None,
            from: 0,
            size: default_size(),
            highlight: None,
            sort_field: None,
            scroll: None,
        }
    }
}

impl SearchSpec {
    pub fn new(query: Query) -> Self {
        Self {
            query: Some(query),
            ..Self::default()
        }
    }

    pub fn page(mut self, from: usize, size: usize) -> Self {
        self.from = from;
        self.size = size;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.return_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_field = Some(field.into());
        self
    }

    pub fn highlight(mut self, highlight: Highlight) -> Self {
        self.highlight = Some(highlight);
        self
    }

    pub fn scroll_minutes(mut self, ttl_minutes: u32) -> Self {
        self.scroll = Some(ScrollSpec {
            enabled: true,
            ttl_minutes,
        });
        self
    }
}

/// Scroll window settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollSpec {
    pub enabled: bool,
    pub ttl_minutes: u32,
}

impl ScrollSpec {
    /// Keep-alive value as sent on the wire, e.g. `5m`
    pub fn keep_alive(&self) -> String {
        keep_alive(self.ttl_minutes)
    }
}

pub(crate) fn keep_alive(ttl_minutes: u32) -> String {
    format!("{}m", ttl_minutes)
}

/// `_source` filtering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFilter {
    pub includes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortOptions {
    pub order: SortOrder,
}

/// One sort clause, `{"field": {"order": "asc"}}`
pub type SortClause = BTreeMap<String, SortOptions>;

fn sort_clause(field: &str, order: SortOrder) -> SortClause {
    BTreeMap::from([(field.to_string(), SortOptions { order })])
}

/// Search request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceFilter>,
    pub from: usize,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
    pub sort: Vec<SortClause>,
}

/// A fully assembled search request for one index
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub index: String,
    pub body: SearchBody,
    /// Scroll keep-alive, sent as the `scroll` query parameter
    pub scroll: Option<String>,
}

/// Build the wire request for `index` from `spec`
pub fn build_search_request(index: &str, spec: &SearchSpec) -> SearchRequest {
    let source = spec
        .return_fields
        .as_ref()
        .filter(|fields| !fields.is_empty())
        .map(|fields| SourceFilter {
            includes: fields.clone(),
        });

    let mut sort = Vec::with_capacity(2);
    if let Some(field) = spec.sort_field.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        let order = if field == SCORE_FIELD {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };
        sort.push(sort_clause(field, order));
    }
    sort.push(sort_clause(SCORE_FIELD, SortOrder::Desc));

    let scroll = spec
        .scroll
        .filter(|s| s.enabled)
        .map(|s| s.keep_alive());

    SearchRequest {
        index: index.to_string(),
        body: SearchBody {
            query: spec.query.clone(),
            source,
            from: spec.from,
            size: spec.size,
            highlight: spec.highlight.clone(),
            sort,
        },
        scroll,
    }
}
