use axum::extract::{Query, State};
use axum::Json;

use crate::app::AppState;
use crate::error::AppError;
use crate::query::compiler::compile;
use crate::query::params::QueryParams;
use crate::schema::document::IndexedDocument;
use crate::search::executor::QueryExecutor;

/// Core search logic, separated from the HTTP layer for testability.
///
/// Compiles the parameters (failing fast without a site scope) and runs the
/// query with the requested page.
pub async fn search_stories(
    executor: &QueryExecutor,
    params: &QueryParams,
) -> Result<Vec<IndexedDocument>, AppError> {
    let tree = compile(params)?;
    executor.execute(tree, params.pagination()).await
}

/// Axum handler for `GET /api/v1/stories`.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<IndexedDocument>>, AppError> {
    let documents = search_stories(&state.executor, &params).await?;
    Ok(Json(documents))
}
