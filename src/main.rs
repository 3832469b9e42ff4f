use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use classroom_ingest::storage::{SqliteStorage, Storage};
use classroom_ingest::{Config, Pipeline};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("classroom_ingest=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(url) = std::env::args().nth(1) {
        config.url = Some(url);
    }
    let url = config
        .url
        .clone()
        .context("No URL given: pass one as the first argument or set CLASSROOM_INGEST__URL")?;

    info!("--- Starting ingest of {} at {} ---", url, Local::now().format("%Y-%m-%d %H:%M:%S"));

    let pipeline = Pipeline::new(&config).context("Failed to set up pipeline")?;
    let dataset = pipeline
        .run(&url)
        .await
        .with_context(|| format!("Failed to ingest {url}"))?;

    let storage = SqliteStorage::new(&config.database_path)
        .await
        .context("Failed to open SQLite database")?;
    storage.migrate().await?;
    storage.persist(&url, &dataset).await?;

    let json = serde_json::to_string_pretty(&dataset)?;
    match &config.output_path {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote merged dataset to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
