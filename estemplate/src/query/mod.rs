//! Query values and search request construction

pub mod search;
pub mod types;

pub use search::{build_search_request, ScrollSpec, SearchBody, SearchRequest, SearchSpec};
pub use types::{BoolQuery, Highlight, HighlightField, Query, RangeParams};
