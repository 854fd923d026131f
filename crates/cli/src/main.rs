//! apod entry point.
//!
//! Caches the Astronomy Picture of the Day for a date and prints where the
//! image lives. Logging goes to stderr so stdout stays machine-readable.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use apod_client::ApodClient;
use apod_core::{AppConfig, CacheManager, SENTINEL_ID};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;

use args::{Cli, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let command = Cli::parse().action();

    let config = AppConfig::load().context("failed to load configuration")?;
    let client = ApodClient::from_app_config(&config).context("failed to build APOD client")?;
    let manager = CacheManager::new(&config, Arc::new(client))
        .await
        .context("failed to initialize image cache")?;

    tracing::debug!(cache_dir = %manager.layout().cache_dir.display(), "cache ready");

    run(&manager, command).await
}

async fn run(manager: &CacheManager, command: Command) -> Result<ExitCode> {
    match command {
        Command::Cache { date } => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let id = manager.ensure_cached(date).await;
            if id == SENTINEL_ID {
                eprintln!("error: could not cache the APOD for {date}; see log for details");
                return Ok(ExitCode::FAILURE);
            }
            let info = manager.get_info(id).await?;
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "id": id, "info": info }))?);
        }
        Command::Info { id } => {
            let info = manager.get_info(id).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::List => {
            for title in manager.list_all_titles().await? {
                println!("{title}");
            }
        }
        Command::Verify { id } => {
            if !manager.verify(id).await? {
                eprintln!("record {id} failed verification");
                return Ok(ExitCode::FAILURE);
            }
            println!("record {id} ok");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);

    if std::env::var("APOD_LOG_JSON").is_ok_and(|v| v == "1") {
        builder.json().init();
    } else {
        builder.init();
    }
}
