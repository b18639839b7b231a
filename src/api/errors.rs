use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, EngineErrorKind};

impl AppError {
    /// HTTP status this error surfaces as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MissingScope => StatusCode::BAD_REQUEST,
            AppError::UnsupportedEvent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SearchEngine { kind, .. } => match kind {
                EngineErrorKind::SchemaMismatch | EngineErrorKind::Rejected => {
                    StatusCode::BAD_REQUEST
                }
                EngineErrorKind::Transport
                | EngineErrorKind::IndexNotFound
                | EngineErrorKind::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Renders an `AppError` as a JSON body with the matching status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let reason = match &self {
            AppError::SearchEngine { reason, .. } => reason.clone(),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind_name(),
            "reason": reason,
        });

        (status, axum::Json(body)).into_response()
    }
}
