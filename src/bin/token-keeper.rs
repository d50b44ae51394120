use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use token_keeper::cache::CacheManager;
use token_keeper::config::metadata::JsonFileMetadata;
use token_keeper::config::proc_loader::file_to_config;
use token_keeper::server;
use token_keeper::utils::logging;
use token_keeper::utils::logging::LogLevel;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "token-keeper.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL" , value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, start logging
    // -------------------------------

    let args = Args::parse();
    let service_config = file_to_config(Path::new(&args.config))
        .await
        .with_context(|| format!("Invalid config {}", args.config))?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Register configured libraries
    // -------------------------------

    let settings = &service_config.settings;
    let cache = Arc::new(CacheManager::with_sweep_interval(settings.sweep_interval()));
    for (name, library) in &service_config.libraries {
        cache.register_library(name, library.ttl()).await?;
    }

    // -------------------------------
    // 3. Record version metadata
    // -------------------------------

    if let Some(path) = &settings.metadata_path {
        let meta = JsonFileMetadata::open(path)?;
        cache.record_metadata(&meta).await?;
    }

    // -------------------------------
    // 4. Serve until ctrl-c, then stop every sweep
    // -------------------------------

    info!("Service starting...");
    let served = server::server::start(settings, cache.clone()).await;
    cache.shutdown().await;

    served
}
