//! Sextant server entry point.
//!
//! Resolves configuration (CLI > env > file > defaults), initializes tracing,
//! wires the HTTP adapters into the search pipeline and serves the API.

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sextant_api::{start_server, AppState};
use sextant_core::config::SextantConfig;
use sextant_entity::ArkeClient;
use sextant_search::SearchPipeline;
use sextant_vector::{OpenAiEmbedding, PineconeIndex};

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = SextantConfig::load_or_default(&config_file);
    config.apply_env();
    args.apply_overrides(&mut config);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    tracing::info!("Starting Sextant v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // Adapters.
    let timeout = Duration::from_secs(config.search.request_timeout_secs);
    let embedder = OpenAiEmbedding::new(&config.embedding, timeout)?;
    let index = PineconeIndex::new(&config.index, timeout)?;
    let store = ArkeClient::new(&config.entity, timeout)?;
    tracing::info!(
        model = %config.embedding.model,
        index = %config.index.index_name,
        entity_api = %config.entity.api_base,
        "Upstream adapters configured"
    );

    let pipeline = SearchPipeline::new(Arc::new(embedder), Arc::new(index), Arc::new(store))
        .with_limits(&config.search);

    start_server(&config.server, AppState::new(pipeline)).await?;

    Ok(())
}
