use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Category of a failure reported by (or while reaching) the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    /// The engine could not be reached or the connection broke mid-request.
    Transport,
    /// The target index does not exist.
    IndexNotFound,
    /// The document or query does not fit the index mapping.
    SchemaMismatch,
    /// Any other 4xx answer from the engine.
    Rejected,
    /// The engine answered with a 5xx status.
    Unavailable,
}

impl EngineErrorKind {
    /// Classify an engine error `type` string (e.g. `index_not_found_exception`).
    pub fn from_engine_type(error_type: &str, status: u16) -> Self {
        match error_type {
            "index_not_found_exception" => EngineErrorKind::IndexNotFound,
            "strict_dynamic_mapping_exception"
            | "mapper_parsing_exception"
            | "document_parsing_exception"
            | "parsing_exception"
            | "x_content_parse_exception" => EngineErrorKind::SchemaMismatch,
            _ if status >= 500 => EngineErrorKind::Unavailable,
            _ => EngineErrorKind::Rejected,
        }
    }

    /// Whether the caller may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineErrorKind::Transport | EngineErrorKind::Unavailable)
    }
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineErrorKind::Transport => write!(f, "transport"),
            EngineErrorKind::IndexNotFound => write!(f, "index_not_found"),
            EngineErrorKind::SchemaMismatch => write!(f, "schema_mismatch"),
            EngineErrorKind::Rejected => write!(f, "rejected"),
            EngineErrorKind::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported event type: {0}")]
    UnsupportedEvent(String),

    #[error("Missing required parameter: arc-site or arcSite")]
    MissingScope,

    #[error("Search engine error ({kind}): {message}")]
    SearchEngine {
        kind: EngineErrorKind,
        message: String,
        reason: Option<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a transport-level engine failure.
    pub fn transport(message: impl Into<String>) -> Self {
        AppError::SearchEngine {
            kind: EngineErrorKind::Transport,
            message: message.into(),
            reason: None,
        }
    }

    /// Short machine-readable name of the error kind, used in API bodies.
    pub fn kind_name(&self) -> String {
        match self {
            AppError::Validation(_) => "validation".to_string(),
            AppError::UnsupportedEvent(_) => "unsupported_event".to_string(),
            AppError::MissingScope => "missing_scope".to_string(),
            AppError::SearchEngine { kind, .. } => kind.to_string(),
            AppError::Config(_) => "config".to_string(),
            AppError::Internal(_) => "internal".to_string(),
        }
    }
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
