use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::query::params::Pagination;
use crate::query::tree::QueryTree;
use crate::schema::document::IndexedDocument;
use crate::search::client::{SearchEngine, SearchRequest};

/// Runs compiled queries against the story index.
#[derive(Clone)]
pub struct QueryExecutor {
    engine: Arc<dyn SearchEngine>,
    index_name: String,
}

impl QueryExecutor {
    pub fn new(engine: Arc<dyn SearchEngine>, index_name: impl Into<String>) -> Self {
        Self {
            engine,
            index_name: index_name.into(),
        }
    }

    pub fn from_config(engine: Arc<dyn SearchEngine>, config: &AppConfig) -> Self {
        Self::new(engine, config.opensearch_index.clone())
    }

    /// Issue one search and return the matching documents in engine order
    /// (newest `display_date` first).
    pub async fn execute(
        &self,
        tree: QueryTree,
        page: Pagination,
    ) -> Result<Vec<IndexedDocument>, AppError> {
        let request = SearchRequest::new(tree, page.from, page.size);
        let response = self.engine.search(&self.index_name, &request).await?;

        let documents = response
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let mut doc: IndexedDocument = serde_json::from_value(hit.source).map_err(|e| {
                    AppError::Internal(format!("Unreadable document '{}': {e}", hit.id))
                })?;
                doc.id = hit.id;
                Ok(doc)
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        tracing::debug!(
            index = %self.index_name,
            from = page.from,
            size = page.size,
            hits = documents.len(),
            "Search executed"
        );
        Ok(documents)
    }
}
