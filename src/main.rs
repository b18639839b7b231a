use std::sync::Arc;

use story_index::app::{self, AppState};
use story_index::config::AppConfig;
use story_index::search::client::{OpenSearchClient, SearchEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "story_index=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("Starting story-index server...");

    let config = AppConfig::load()?;
    tracing::info!(
        endpoint = %config.opensearch_endpoint,
        index = %config.opensearch_index,
        region = config.aws_region.as_deref().unwrap_or("-"),
        mapping_mode = %config.mapping_mode,
        "Configuration loaded"
    );

    let engine: Arc<dyn SearchEngine> = Arc::new(OpenSearchClient::new(&config)?);
    let app = app::router(AppState::new(engine, &config));

    tracing::info!("Listening on http://{}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
