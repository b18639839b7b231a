use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::AppConfig;
use crate::ingest::writer::IndexWriter;
use crate::search::client::SearchEngine;
use crate::search::executor::QueryExecutor;

/// Shared, immutable state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub writer: IndexWriter,
    pub executor: QueryExecutor,
}

impl AppState {
    pub fn new(engine: Arc<dyn SearchEngine>, config: &AppConfig) -> Self {
        Self {
            writer: IndexWriter::from_config(engine.clone(), config),
            executor: QueryExecutor::from_config(engine, config),
        }
    }
}

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/events", post(api::events::events_handler))
        .route("/api/v1/stories", get(api::search::search_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
