use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{AppConfig, RefreshPolicy};
use crate::error::{AppError, EngineErrorKind};
use crate::query::tree::BoolQuery;
use crate::schema::document::fields;

/// Outcome token of a single-document write (`created`, `updated`, `deleted`, `not_found`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    pub result: String,
}

/// Body of a search request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: SearchQuery,
    pub from: u32,
    pub size: u32,
    pub sort: Vec<Value>,
}

/// Wraps the compiled tree as the top-level `bool` query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    #[serde(rename = "bool")]
    pub bool_query: BoolQuery,
}

impl SearchRequest {
    /// A request sorted by `display_date` descending, newest first.
    pub fn new(tree: BoolQuery, from: u32, size: u32) -> Self {
        Self {
            query: SearchQuery { bool_query: tree },
            from,
            size,
            sort: vec![display_date_desc()],
        }
    }
}

fn display_date_desc() -> Value {
    let mut sort = serde_json::Map::new();
    sort.insert(
        fields::DISPLAY_DATE.to_string(),
        serde_json::json!({ "order": "desc" }),
    );
    Value::Object(sort)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub hits: SearchHits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHits {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// A raw hit as returned by the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: Value,
}

/// Operations the service needs from the search engine.
///
/// Abstracted as a trait so tests can run without a real engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Create or replace the document stored under `id`.
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        source: &Value,
        refresh: RefreshPolicy,
    ) -> Result<WriteResult, AppError>;

    /// Delete the document stored under `id`. Absent documents are not an error.
    async fn delete_document(
        &self,
        index: &str,
        id: &str,
        refresh: RefreshPolicy,
    ) -> Result<WriteResult, AppError>;

    async fn search(&self, index: &str, request: &SearchRequest)
        -> Result<SearchResponse, AppError>;

    async fn index_exists(&self, index: &str) -> Result<bool, AppError>;

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), AppError>;

    async fn delete_index(&self, index: &str) -> Result<(), AppError>;

    async fn put_mapping(&self, index: &str, mappings: &Value) -> Result<(), AppError>;

    async fn get_mapping(&self, index: &str) -> Result<Value, AppError>;

    /// Cluster health status (`green`, `yellow`, `red`).
    async fn health(&self) -> Result<String, AppError>;
}

/// OpenSearch implementation of the SearchEngine, over plain HTTP.
pub struct OpenSearchClient {
    http: reqwest::Client,
    endpoint: url::Url,
}

impl OpenSearchClient {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let endpoint = config.endpoint_url()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, endpoint })
    }

    fn url(&self, segments: &[&str]) -> Result<url::Url, AppError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("Endpoint '{}' cannot carry a path", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, AppError> {
        request
            .send()
            .await
            .map_err(|e| AppError::transport(format!("Search engine request failed: {e}")))
    }
}

#[async_trait]
impl SearchEngine for OpenSearchClient {
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        source: &Value,
        refresh: RefreshPolicy,
    ) -> Result<WriteResult, AppError> {
        let url = self.url(&[index, "_doc", id])?;
        let response = self
            .send(
                self.http
                    .put(url)
                    .query(&[("refresh", refresh.as_param())])
                    .json(source),
            )
            .await?;

        read_json(response).await
    }

    async fn delete_document(
        &self,
        index: &str,
        id: &str,
        refresh: RefreshPolicy,
    ) -> Result<WriteResult, AppError> {
        let url = self.url(&[index, "_doc", id])?;
        let response = self
            .send(
                self.http
                    .delete(url)
                    .query(&[("refresh", refresh.as_param())]),
            )
            .await?;

        // A missing document answers 404 with `"result": "not_found"`;
        // a missing index answers 404 with an error body.
        let status = response.status();
        let body = read_text(response).await?;
        if status.is_success() || status == StatusCode::NOT_FOUND {
            if let Ok(result) = serde_json::from_str::<WriteResult>(&body) {
                return Ok(result);
            }
        }
        Err(parse_engine_error(status.as_u16(), &body))
    }

    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, AppError> {
        let url = self.url(&[index, "_search"])?;
        let response = self.send(self.http.post(url).json(request)).await?;
        read_json(response).await
    }

    async fn index_exists(&self, index: &str) -> Result<bool, AppError> {
        let url = self.url(&[index])?;
        let response = self.send(self.http.head(url)).await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(parse_engine_error(status.as_u16(), "")),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), AppError> {
        let url = self.url(&[index])?;
        let response = self.send(self.http.put(url).json(body)).await?;
        read_json::<Value>(response).await.map(|_| ())
    }

    async fn delete_index(&self, index: &str) -> Result<(), AppError> {
        let url = self.url(&[index])?;
        let response = self.send(self.http.delete(url)).await?;
        read_json::<Value>(response).await.map(|_| ())
    }

    async fn put_mapping(&self, index: &str, mappings: &Value) -> Result<(), AppError> {
        let url = self.url(&[index, "_mapping"])?;
        let response = self.send(self.http.put(url).json(mappings)).await?;
        read_json::<Value>(response).await.map(|_| ())
    }

    async fn get_mapping(&self, index: &str) -> Result<Value, AppError> {
        let url = self.url(&[index, "_mapping"])?;
        let response = self.send(self.http.get(url)).await?;
        read_json(response).await
    }

    async fn health(&self) -> Result<String, AppError> {
        #[derive(Deserialize)]
        struct Health {
            status: String,
        }

        let url = self.url(&["_cluster", "health"])?;
        let response = self.send(self.http.get(url)).await?;
        let health: Health = read_json(response).await?;
        Ok(health.status)
    }
}

async fn read_text(response: reqwest::Response) -> Result<String, AppError> {
    response
        .text()
        .await
        .map_err(|e| AppError::transport(format!("Failed to read engine response: {e}")))
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
    let status = response.status();
    let body = read_text(response).await?;
    if !status.is_success() {
        return Err(parse_engine_error(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| AppError::SearchEngine {
        kind: EngineErrorKind::Unavailable,
        message: format!("Unexpected engine response: {e}"),
        reason: None,
    })
}

/// Turn an engine error answer into an [`AppError::SearchEngine`].
///
/// Understands both `{"error": {"type", "reason"}}` and `{"error": "..."}` bodies.
pub fn parse_engine_error(status: u16, body: &str) -> AppError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));

    let (error_type, reason) = match error {
        Some(Value::Object(obj)) => (
            obj.get("type").and_then(Value::as_str).unwrap_or_default().to_string(),
            obj.get("reason").and_then(Value::as_str).map(str::to_string),
        ),
        Some(Value::String(s)) => (String::new(), Some(s.clone())),
        _ => (String::new(), None),
    };

    let kind = if status == 404 && error_type.is_empty() {
        // HEAD requests carry no body
        EngineErrorKind::IndexNotFound
    } else {
        EngineErrorKind::from_engine_type(&error_type, status)
    };

    let message = match (&reason, error_type.is_empty()) {
        (Some(reason), false) => format!("HTTP {status} {error_type}: {reason}"),
        (Some(reason), true) => format!("HTTP {status}: {reason}"),
        (None, _) => format!("HTTP {status}"),
    };

    AppError::SearchEngine {
        kind,
        message,
        reason: if error_type.is_empty() { None } else { Some(error_type) },
    }
}
