#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use story_index::app::{self, AppState};
use story_index::config::{AppConfig, RefreshPolicy};
use story_index::error::{AppError, EngineErrorKind};
use story_index::search::client::{
    SearchEngine, SearchHit, SearchHits, SearchRequest, SearchResponse, WriteResult,
};

pub const INDEX: &str = "stories";

/// A single-node, in-memory stand-in for the search engine.
///
/// Understands the subset of the query DSL the compiler emits
/// (`bool`, `term`, `terms`, `range`, `exists`, `nested`) and evaluates
/// `nested` clauses one array element at a time.
#[derive(Default)]
pub struct InMemoryEngine {
    indices: Mutex<HashMap<String, HashMap<String, Value>>>,
    writes: Mutex<Vec<(String, String)>>,
    searches: Mutex<Vec<Value>>,
}

impl InMemoryEngine {
    pub fn with_index(index: &str) -> Self {
        let engine = Self::default();
        engine
            .indices
            .lock()
            .unwrap()
            .insert(index.to_string(), HashMap::new());
        engine
    }

    /// Operations applied so far, as `(operation, id)` pairs.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn last_search(&self) -> Option<Value> {
        self.searches.lock().unwrap().last().cloned()
    }

    pub fn stored(&self, index: &str, id: &str) -> Option<Value> {
        self.indices
            .lock()
            .unwrap()
            .get(index)
            .and_then(|docs| docs.get(id).cloned())
    }

    fn missing_index(index: &str) -> AppError {
        AppError::SearchEngine {
            kind: EngineErrorKind::IndexNotFound,
            message: format!("no such index [{index}]"),
            reason: Some("index_not_found_exception".into()),
        }
    }
}

#[async_trait]
impl SearchEngine for InMemoryEngine {
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        source: &Value,
        _refresh: RefreshPolicy,
    ) -> Result<WriteResult, AppError> {
        let mut indices = self.indices.lock().unwrap();
        let docs = indices.get_mut(index).ok_or_else(|| Self::missing_index(index))?;
        let previous = docs.insert(id.to_string(), source.clone());
        self.writes
            .lock()
            .unwrap()
            .push(("index".to_string(), id.to_string()));

        let result = if previous.is_some() { "updated" } else { "created" };
        Ok(WriteResult { result: result.into() })
    }

    async fn delete_document(
        &self,
        index: &str,
        id: &str,
        _refresh: RefreshPolicy,
    ) -> Result<WriteResult, AppError> {
        let mut indices = self.indices.lock().unwrap();
        let docs = indices.get_mut(index).ok_or_else(|| Self::missing_index(index))?;
        let previous = docs.remove(id);
        self.writes
            .lock()
            .unwrap()
            .push(("delete".to_string(), id.to_string()));

        let result = if previous.is_some() { "deleted" } else { "not_found" };
        Ok(WriteResult { result: result.into() })
    }

    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, AppError> {
        let body = serde_json::to_value(request).unwrap();
        self.searches.lock().unwrap().push(body.clone());

        let indices = self.indices.lock().unwrap();
        let docs = indices.get(index).ok_or_else(|| Self::missing_index(index))?;

        let mut matched: Vec<(String, Value)> = docs
            .iter()
            .filter(|(id, source)| {
                let mut doc = (*source).clone();
                doc["_id"] = json!(id);
                matches(&body["query"], &doc)
            })
            .map(|(id, source)| (id.clone(), source.clone()))
            .collect();

        // Sort is fixed: display_date descending
        matched.sort_by_key(|(_, source)| std::cmp::Reverse(date_of(&source["display_date"])));

        let hits = matched
            .into_iter()
            .skip(request.from as usize)
            .take(request.size as usize)
            .map(|(id, source)| SearchHit { id, source })
            .collect();

        Ok(SearchResponse {
            hits: SearchHits { hits },
        })
    }

    async fn index_exists(&self, index: &str) -> Result<bool, AppError> {
        Ok(self.indices.lock().unwrap().contains_key(index))
    }

    async fn create_index(&self, index: &str, _body: &Value) -> Result<(), AppError> {
        self.indices
            .lock()
            .unwrap()
            .insert(index.to_string(), HashMap::new());
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), AppError> {
        self.indices
            .lock()
            .unwrap()
            .remove(index)
            .map(|_| ())
            .ok_or_else(|| Self::missing_index(index))
    }

    async fn put_mapping(&self, index: &str, _mappings: &Value) -> Result<(), AppError> {
        self.index_exists(index)
            .await?
            .then_some(())
            .ok_or_else(|| Self::missing_index(index))
    }

    async fn get_mapping(&self, index: &str) -> Result<Value, AppError> {
        Ok(json!({ index: { "mappings": {} } }))
    }

    async fn health(&self) -> Result<String, AppError> {
        Ok("green".to_string())
    }
}

/// An engine that cannot be reached.
pub struct UnreachableEngine;

#[async_trait]
impl SearchEngine for UnreachableEngine {
    async fn index_document(&self, _: &str, _: &str, _: &Value, _: RefreshPolicy) -> Result<WriteResult, AppError> {
        Err(AppError::transport("connection refused"))
    }

    async fn delete_document(&self, _: &str, _: &str, _: RefreshPolicy) -> Result<WriteResult, AppError> {
        Err(AppError::transport("connection refused"))
    }

    async fn search(&self, _: &str, _: &SearchRequest) -> Result<SearchResponse, AppError> {
        Err(AppError::transport("connection refused"))
    }

    async fn index_exists(&self, _: &str) -> Result<bool, AppError> {
        Err(AppError::transport("connection refused"))
    }

    async fn create_index(&self, _: &str, _: &Value) -> Result<(), AppError> {
        Err(AppError::transport("connection refused"))
    }

    async fn delete_index(&self, _: &str) -> Result<(), AppError> {
        Err(AppError::transport("connection refused"))
    }

    async fn put_mapping(&self, _: &str, _: &Value) -> Result<(), AppError> {
        Err(AppError::transport("connection refused"))
    }

    async fn get_mapping(&self, _: &str) -> Result<Value, AppError> {
        Err(AppError::transport("connection refused"))
    }

    async fn health(&self) -> Result<String, AppError> {
        Err(AppError::transport("connection refused"))
    }
}

fn date_of(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

/// Leaf values found at a dotted path, flattening arrays on the way.
fn lookup<'a>(doc: &'a Value, field: &str) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for part in field.split('.') {
        current = current
            .into_iter()
            .flat_map(|value| match value {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .filter_map(|value| value.get(part))
            .collect();
    }
    current
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .filter(|value| !value.is_null())
        .collect()
}

/// Place one nested element back at its path so field lookups see only it.
fn scoped(path: &str, element: &Value) -> Value {
    path.rsplit('.')
        .fold(element.clone(), |inner, part| json!({ part: inner }))
}

fn single_entry(clause: &Value) -> (&String, &Value) {
    clause.as_object().unwrap().iter().next().unwrap()
}

fn matches(query: &Value, doc: &Value) -> bool {
    let (kind, body) = single_entry(query);
    match kind.as_str() {
        "bool" => {
            let all = |key: &str| {
                body.get(key)
                    .and_then(Value::as_array)
                    .map(|clauses| clauses.iter().all(|c| matches(c, doc)))
                    .unwrap_or(true)
            };
            let none = body
                .get("must_not")
                .and_then(Value::as_array)
                .map(|clauses| !clauses.iter().any(|c| matches(c, doc)))
                .unwrap_or(true);
            let should = body
                .get("should")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let minimum = body
                .get("minimum_should_match")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize;
            let should_ok = should.iter().filter(|c| matches(c, doc)).count() >= minimum;
            all("must") && all("filter") && none && should_ok
        }
        "term" => {
            let (field, expected) = single_entry(body);
            lookup(doc, field).into_iter().any(|v| v == expected)
        }
        "terms" => {
            let (field, expected) = single_entry(body);
            let expected = expected.as_array().unwrap();
            lookup(doc, field).into_iter().any(|v| expected.contains(v))
        }
        "exists" => !lookup(doc, body["field"].as_str().unwrap()).is_empty(),
        "range" => {
            let (field, bounds) = single_entry(body);
            let gte = date_of(&bounds["gte"]).unwrap();
            let lte = date_of(&bounds["lte"]).unwrap();
            lookup(doc, field)
                .into_iter()
                .filter_map(date_of)
                .any(|ts| ts >= gte && ts <= lte)
        }
        "nested" => {
            let path = body["path"].as_str().unwrap();
            lookup(doc, path)
                .into_iter()
                .any(|element| matches(&body["query"], &scoped(path, element)))
        }
        other => panic!("Unsupported query clause: {other}"),
    }
}

/// Router wired to an in-memory engine.
pub struct TestEnv {
    pub engine: Arc<InMemoryEngine>,
    pub router: Router,
}

impl TestEnv {
    pub fn start() -> Self {
        let engine = Arc::new(InMemoryEngine::with_index(INDEX));
        let config = AppConfig::new("http://localhost:9200", INDEX);
        let router = app::router(AppState::new(engine.clone(), &config));
        Self { engine, router }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
    }

    /// Helper: publish a story via the events API.
    pub async fn publish(&self, server: &axum_test::TestServer, story: Value) -> axum_test::TestResponse {
        server
            .post("/api/v1/events")
            .json(&json!({ "type": "story.publish", "payload": story }))
            .await
    }
}

/// Build a `TestServer` whose engine is down.
pub fn server_with_unreachable_engine() -> axum_test::TestServer {
    let config = AppConfig::new("http://localhost:9200", INDEX);
    let router = app::router(AppState::new(Arc::new(UnreachableEngine), &config));
    axum_test::TestServer::builder()
        .build(router)
}

/// A minimal ANS story.
pub fn story(id: &str, site: &str, display_date: &str) -> Value {
    json!({
        "_id": id,
        "type": "story",
        "canonical_website": site,
        "display_date": display_date,
        "content_elements": [{ "type": "text", "content": "Lorem ipsum" }]
    })
}
