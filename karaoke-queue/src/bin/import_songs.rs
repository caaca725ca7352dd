//! import-songs - bulk catalog import
//!
//! Loads a CSV file (header row with `artist`, `title` and optionally
//! `language`, `duration_seconds`, `genre_tags`) into the song catalog.
//! `--seed` adds the sample catalog when the catalog is still empty.

use anyhow::{bail, Context, Result};
use clap::Parser;
use karaoke_common::config;
use karaoke_common::db::init_database;
use karaoke_queue::hub::LiveHub;
use karaoke_queue::queue::QueueService;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "import-songs")]
#[command(about = "Import songs into the karaoke catalog")]
#[command(version)]
struct Args {
    /// CSV file to import
    csv: Option<PathBuf>,

    /// Insert the sample catalog if no songs exist yet
    #[arg(long)]
    seed: bool,

    /// Path to TOML config file
    #[arg(short, long, env = "KARAOKE_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the SQLite database
    #[arg(short, long, env = "KARAOKE_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    if args.csv.is_none() && !args.seed {
        bail!("Nothing to do: pass a CSV file and/or --seed");
    }

    let toml = config::load_or_default(args.config.as_deref())?;
    let db_path = config::resolve_database_path(args.database.as_deref(), &toml);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to open database")?;
    // No subscribers: imports never broadcast
    let service = QueueService::new(pool.clone(), LiveHub::new(1));

    if args.seed {
        let seeded = service.seed_catalog().await?;
        info!("Seeded {} sample songs", seeded);
    }

    if let Some(path) = &args.csv {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let count = service.import_csv(&filename, &content).await?;
        info!("Imported {} songs from {}", count, path.display());
    }

    pool.close().await;
    Ok(())
}
