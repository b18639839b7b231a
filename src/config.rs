use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;
use crate::schema::mappings::MappingMode;

/// How long a write waits before it is acknowledged.
///
/// Both variants make the write visible to search before the call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Force a refresh of the affected shards (`refresh=true`).
    #[default]
    Immediate,
    /// Wait for the next scheduled refresh (`refresh=wait_for`).
    WaitFor,
}

impl RefreshPolicy {
    /// Value of the engine's `refresh` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            RefreshPolicy::Immediate => "true",
            RefreshPolicy::WaitFor => "wait_for",
        }
    }
}

/// Service configuration.
///
/// Loaded once at startup and handed to each adapter explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the search engine (e.g. `https://search.example.com`).
    pub opensearch_endpoint: String,
    /// Name of the index holding the story documents.
    #[serde(default = "default_index")]
    pub opensearch_index: String,
    /// Region of the managed engine, used by the signing layer in front of the transport.
    #[serde(default)]
    pub aws_region: Option<String>,
    /// Strict (reject undeclared fields) or loose (accept silently) index mapping.
    #[serde(default)]
    pub mapping_mode: MappingMode,
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Per-request timeout for engine calls.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_index() -> String {
    "arc-content".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl AppConfig {
    /// Load configuration from an optional `story-index.{toml,yaml,json}` file
    /// in the working directory, overridden by environment variables.
    ///
    /// Recognized variables:
    /// - `OPENSEARCH_ENDPOINT` (required)
    /// - `OPENSEARCH_INDEX` (default `arc-content`)
    /// - `AWS_REGION`
    /// - `MAPPING_MODE`: `strict` or `loose`
    /// - `REFRESH_POLICY`: `immediate` or `wait_for`
    /// - `LISTEN_ADDR`
    /// - `REQUEST_TIMEOUT_SECS`
    pub fn load() -> Result<Self, AppError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("story-index").required(false))
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Build with explicit values (useful for testing).
    pub fn new(opensearch_endpoint: impl Into<String>, opensearch_index: impl Into<String>) -> Self {
        Self {
            opensearch_endpoint: opensearch_endpoint.into(),
            opensearch_index: opensearch_index.into(),
            aws_region: None,
            mapping_mode: MappingMode::default(),
            refresh_policy: RefreshPolicy::default(),
            listen_addr: default_listen_addr(),
            request_timeout_secs: default_timeout_secs(),
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.opensearch_index.trim().is_empty() {
            return Err(AppError::Config("OPENSEARCH_INDEX cannot be empty".into()));
        }
        self.endpoint_url().map(|_| ())
    }

    /// The engine endpoint as a parsed URL.
    pub fn endpoint_url(&self) -> Result<url::Url, AppError> {
        url::Url::parse(&self.opensearch_endpoint).map_err(|e| {
            AppError::Config(format!(
                "Invalid OPENSEARCH_ENDPOINT '{}': {e}",
                self.opensearch_endpoint
            ))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
