use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use story_index::config::AppConfig;
use story_index::schema::mappings::{index_body, MappingMode};
use story_index::schema::setup::{ensure_index, SetupOutcome};
use story_index::search::client::{OpenSearchClient, SearchEngine};

/// Set up and inspect the story search index.
///
/// Connection settings come from the same configuration as the server
/// (`OPENSEARCH_ENDPOINT`, `OPENSEARCH_INDEX`, `MAPPING_MODE`, ...).
#[derive(Debug, Parser)]
#[command(name = "story-index-admin", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the index, or update the mappings of an existing one
    Setup {
        /// Drop and recreate an existing index (deletes all its documents)
        #[arg(long)]
        force_recreate: bool,
        /// Override the configured mapping mode (strict or loose)
        #[arg(long)]
        mode: Option<MappingMode>,
    },
    /// Print the index creation body
    Mapping {
        /// Mapping mode (strict or loose)
        #[arg(long, default_value = "strict")]
        mode: MappingMode,
    },
    /// Print the cluster health status
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Mapping { mode } => {
            println!("{}", serde_json::to_string_pretty(&index_body(mode))?);
        }
        Command::Health => {
            let (_, client) = connect()?;
            let status = client.health().await.context("Health check failed")?;
            println!("Cluster status: {status}");
        }
        Command::Setup {
            force_recreate,
            mode,
        } => {
            let (config, client) = connect()?;
            let mode = mode.unwrap_or(config.mapping_mode);

            println!("Using index '{}' at {}", config.opensearch_index, config.opensearch_endpoint);
            let status = client
                .health()
                .await
                .context("Connection test failed; check the endpoint and credentials")?;
            if status == "red" {
                bail!("Cluster status is red, refusing to touch the index");
            }

            let outcome = ensure_index(&client, &config.opensearch_index, mode, force_recreate)
                .await
                .context("Failed to set up index")?;
            println!("{}", describe(outcome, &config.opensearch_index));

            let mapping = client.get_mapping(&config.opensearch_index).await?;
            println!("Current mappings:\n{}", serde_json::to_string_pretty(&mapping)?);
        }
    }

    Ok(())
}

fn connect() -> Result<(AppConfig, OpenSearchClient)> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    let client = OpenSearchClient::new(&config)?;
    Ok((config, client))
}

fn describe(outcome: SetupOutcome, index: &str) -> String {
    match outcome {
        SetupOutcome::Created => format!("Created index '{index}' with mappings"),
        SetupOutcome::Recreated => format!("Recreated index '{index}' with mappings"),
        SetupOutcome::MappingUpdated => format!("Updated mappings for index '{index}'"),
    }
}
