use std::sync::Arc;

use crate::config::{AppConfig, RefreshPolicy};
use crate::error::AppError;
use crate::schema::document::IndexedDocument;
use crate::search::client::SearchEngine;

/// Applies single-document writes to the story index.
///
/// Every write is keyed by the story id and made visible to search before
/// it returns.
#[derive(Clone)]
pub struct IndexWriter {
    engine: Arc<dyn SearchEngine>,
    index_name: String,
    refresh: RefreshPolicy,
}

impl IndexWriter {
    pub fn new(engine: Arc<dyn SearchEngine>, index_name: impl Into<String>, refresh: RefreshPolicy) -> Self {
        Self {
            engine,
            index_name: index_name.into(),
            refresh,
        }
    }

    pub fn from_config(engine: Arc<dyn SearchEngine>, config: &AppConfig) -> Self {
        Self::new(engine, config.opensearch_index.clone(), config.refresh_policy)
    }

    /// Create or replace the document. Returns the engine's result token.
    pub async fn upsert(&self, doc: &IndexedDocument) -> Result<String, AppError> {
        let source = doc.to_source()?;
        let result = self
            .engine
            .index_document(&self.index_name, &doc.id, &source, self.refresh)
            .await?;

        tracing::info!(
            index = %self.index_name,
            id = %doc.id,
            result = %result.result,
            "Indexed story"
        );
        Ok(result.result)
    }

    /// Remove the document. Removing an absent document succeeds.
    pub async fn delete(&self, id: &str) -> Result<String, AppError> {
        let result = self
            .engine
            .delete_document(&self.index_name, id, self.refresh)
            .await?;

        tracing::info!(
            index = %self.index_name,
            id = %id,
            result = %result.result,
            "Deleted story"
        );
        Ok(result.result)
    }
}
