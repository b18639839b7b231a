use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

/// A node of the compiled boolean query.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Exact keyword match.
    Term { field: String, value: String },
    /// Keyword match against any of `values`.
    Terms { field: String, values: Vec<String> },
    /// Inclusive date window.
    Range {
        field: String,
        gte: DateTime<Utc>,
        lte: DateTime<Utc>,
    },
    /// The field holds a value.
    Exists { field: String },
    /// Scopes `query` to a single element of the nested array at `path`.
    ///
    /// Two `Nested` clauses over the same path may be satisfied by
    /// different elements; the fields inside one clause must all hold on
    /// the same element.
    Nested { path: String, query: Box<Query> },
    Bool(BoolQuery),
}

/// `bool` compound query.
///
/// At the top level this is the whole query tree: `must` (AND),
/// `must_not` (AND of negations) and `filter` (AND, no scoring).
/// `should` is only used by inner disjunctions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub must_not: Vec<Query>,
    pub filter: Vec<Query>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<u32>,
}

/// The compiled, request-scoped query.
pub type QueryTree = BoolQuery;

impl Query {
    pub fn term(field: &str, value: impl Into<String>) -> Self {
        Query::Term {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn terms(field: &str, values: Vec<String>) -> Self {
        Query::Terms {
            field: field.to_string(),
            values,
        }
    }

    pub fn range(field: &str, gte: DateTime<Utc>, lte: DateTime<Utc>) -> Self {
        Query::Range {
            field: field.to_string(),
            gte,
            lte,
        }
    }

    pub fn exists(field: &str) -> Self {
        Query::Exists {
            field: field.to_string(),
        }
    }

    pub fn nested(path: &str, query: Query) -> Self {
        Query::Nested {
            path: path.to_string(),
            query: Box::new(query),
        }
    }

    /// Matches when at least one of `queries` matches.
    pub fn any_of(queries: Vec<Query>) -> Self {
        Query::Bool(BoolQuery {
            should: queries,
            minimum_should_match: Some(1),
            ..BoolQuery::default()
        })
    }

    /// The engine's JSON query DSL for this node.
    pub fn to_dsl(&self) -> Value {
        match self {
            Query::Term { field, value } => json!({ "term": single(field, json!(value)) }),
            Query::Terms { field, values } => json!({ "terms": single(field, json!(values)) }),
            Query::Range { field, gte, lte } => json!({
                "range": single(field, json!({
                    "gte": gte.to_rfc3339_opts(SecondsFormat::Millis, true),
                    "lte": lte.to_rfc3339_opts(SecondsFormat::Millis, true),
                }))
            }),
            Query::Exists { field } => json!({ "exists": { "field": field } }),
            Query::Nested { path, query } => json!({
                "nested": { "path": path, "query": query.to_dsl() }
            }),
            Query::Bool(bool_query) => json!({ "bool": bool_query }),
        }
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_dsl().serialize(serializer)
    }
}
