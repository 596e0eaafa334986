//! Query DSL value type
//!
//! Queries are produced by callers and serialized verbatim into the search
//! body. The template never inspects them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A query clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// Match all documents
    MatchAll(MatchAllQuery),

    /// Match query (analyzed full-text)
    Match(BTreeMap<String, MatchQuery>),

    /// Match phrase query
    MatchPhrase(BTreeMap<String, MatchPhraseQuery>),

    /// Multi-match across multiple fields
    MultiMatch(MultiMatchQuery),

    /// Term query (exact match, not analyzed)
    Term(BTreeMap<String, TermValue>),

    /// Terms query (any of several exact values)
    Terms(BTreeMap<String, Vec<Value>>),

    Range(BTreeMap<String, RangeParams>),

    /// Fuzzy query (edit distance)
    Fuzzy(BTreeMap<String, FuzzyParams>),

    Regexp(BTreeMap<String, PatternParams>),

    Wildcard(BTreeMap<String, PatternParams>),

    Prefix(BTreeMap<String, PatternParams>),

    Exists(ExistsQuery),

    Ids(IdsQuery),

    /// Bool query (must, should, must_not, filter)
    Bool(BoolQuery),

    /// Any other clause, passed through as-is
    #[serde(untagged)]
    Raw(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchAllQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchQuery {
    pub query: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuzziness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPhraseQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slop: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiMatchQuery {
    pub query: Value,
    pub fields: Vec<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermValue {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl RangeParams {
    pub fn gte(mut self, value: impl Into<Value>) -> Self {
        self.gte = Some(value.into());
        self
    }

    pub fn gt(mut self, value: impl Into<Value>) -> Self {
        self.gt = Some(value.into());
        self
    }

    pub fn lte(mut self, value: impl Into<Value>) -> Self {
        self.lte = Some(value.into());
        self
    }

    pub fn lt(mut self, value: impl Into<Value>) -> Self {
        self.lt = Some(value.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyParams {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuzziness: Option<String>,
}

/// Shared shape of regexp, wildcard and prefix clauses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternParams {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_insensitive: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistsQuery {
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdsQuery {
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Query>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Query>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Query>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Query>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<Value>,
}

impl BoolQuery {
    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    pub fn should(mut self, query: Query) -> Self {
        self.should.push(query);
        self
    }

    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    pub fn filter(mut self, query: Query) -> Self {
        self.filter.push(query);
        self
    }

    pub fn minimum_should_match(mut self, value: impl Into<Value>) -> Self {
        self.minimum_should_match = Some(value.into());
        self
    }
}

fn single<T>(field: impl Into<String>, params: T) -> BTreeMap<String, T> {
    BTreeMap::from([(field.into(), params)])
}

impl Query {
    pub fn match_all() -> Self {
        Query::MatchAll(MatchAllQuery::default())
    }

    pub fn match_query(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Match(single(
            field,
            MatchQuery {
                query: value.into(),
                operator: None,
                fuzziness: None,
                boost: None,
            },
        ))
    }

    pub fn match_phrase(field: impl Into<String>, phrase: impl Into<String>) -> Self {
        Query::MatchPhrase(single(
            field,
            MatchPhraseQuery {
                query: phrase.into(),
                slop: None,
            },
        ))
    }

    pub fn multi_match<I, S>(value: impl Into<Value>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::MultiMatch(MultiMatchQuery {
            query: value.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            match_type: None,
        })
    }

    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Term(single(
            field,
            TermValue {
                value: value.into(),
                boost: None,
            },
        ))
    }

    pub fn terms<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Query::Terms(single(field, values.into_iter().map(Into::into).collect()))
    }

    pub fn range(field: impl Into<String>, params: RangeParams) -> Self {
        Query::Range(single(field, params))
    }

    pub fn fuzzy(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Fuzzy(single(
            field,
            FuzzyParams {
                value: value.into(),
                fuzziness: None,
            },
        ))
    }

    pub fn regexp(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Query::Regexp(single(field, PatternParams::new(pattern)))
    }

    pub fn wildcard(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Query::Wildcard(single(field, PatternParams::new(pattern)))
    }

    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Query::Prefix(single(field, PatternParams::new(prefix)))
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Query::Exists(ExistsQuery {
            field: field.into(),
        })
    }

    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::Ids(IdsQuery {
            values: ids.into_iter().map(Into::into).collect(),
        })
    }

    pub fn bool(query: BoolQuery) -> Self {
        Query::Bool(query)
    }

    pub fn raw(value: Value) -> Self {
        Query::Raw(value)
    }
}

impl PatternParams {
    fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            case_insensitive: None,
        }
    }
}

/// Highlighting configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(default)]
    pub fields: BTreeMap<String, HighlightField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_fragments: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_fragments: Option<usize>,
}

impl Highlight {
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), HighlightField::default());
        self
    }

    pub fn tags(mut self, pre: impl Into<String>, post: impl Into<String>) -> Self {
        self.pre_tags = Some(vec![pre.into()]);
        self.post_tags = Some(vec![post.into()]);
        self
    }
}
