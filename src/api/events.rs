use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::error::AppError;
use crate::ingest::events::{route, ContentEvent, OutcomeRecord};

/// Axum handler for `POST /api/v1/events`.
///
/// Applies one content lifecycle event to the index. A body that is not a
/// valid event is reported with the same error shape as any other failure.
pub async fn events_handler(
    State(state): State<AppState>,
    body: Result<Json<ContentEvent>, JsonRejection>,
) -> Result<Json<OutcomeRecord>, AppError> {
    let Json(event) = body.map_err(|rejection| {
        tracing::warn!("Rejected event body: {}", rejection.body_text());
        AppError::Validation(format!("Malformed event: {}", rejection.body_text()))
    })?;

    match route(&event, &state.writer).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            tracing::warn!(event_type = %event.event_type, "Failed to process event: {e}");
            Err(e)
        }
    }
}
