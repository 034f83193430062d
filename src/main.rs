use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod collection;
mod config;
mod error;
mod feed;
mod local;
mod models;
mod storage;

#[cfg(test)]
mod collection_tests;

use crate::collection::{run_cycle, CollectionConfig, CycleOptions, Services};
use crate::config::load_config;
use crate::local::{CatalogIndex, PlaylistDirectory, SongListDirectory};
use crate::storage::StorageDir;

#[derive(Parser)]
#[command(name = "radio-playlists")]
#[command(about = "Sync radio play statistics into curated playlists")]
#[command(version)]
struct Args {
    /// Path to the collection configuration JSON file
    #[arg(short = 'c', long = "config", default_value = "collections.json")]
    config_file: String,

    /// Compute playlist changes without storing them or touching the playlists
    #[arg(short = 'd', long = "dry-run")]
    dry_run: bool,

    /// Quiet mode - only log warnings and errors
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.quiet);

    // Validate that the collection configuration file exists before proceeding
    if !std::path::Path::new(&args.config_file).exists() {
        tracing::error!(
            "collection configuration file '{}' not found, specify another one with --config",
            args.config_file
        );
        return Err(anyhow::anyhow!(
            "Configuration file '{}' not found",
            args.config_file
        ));
    }

    let config = load_config()?;
    let collections = CollectionConfig::load_all_from_file(&args.config_file)?;
    info!(
        "loaded {} collections from {}",
        collections.len(),
        args.config_file
    );

    let feed = SongListDirectory::new(&config.feed_dir);
    let resolver = CatalogIndex::load(&config.catalog_file)?;
    let sink = PlaylistDirectory::new(&config.playlist_dir);
    let services = Services {
        feed: &feed,
        resolver: &resolver,
        sink: &sink,
    };

    let storage = if args.dry_run {
        StorageDir::volatile(&config.storage_dir)
    } else {
        StorageDir::new(&config.storage_dir)
    };
    let options = CycleOptions {
        channel: config.channel_id.clone(),
        resolve_delay: config.resolve_delay,
        dry_run: args.dry_run,
    };
    let now = chrono::Utc::now().timestamp();

    let reports = match run_cycle(&services, &storage, &collections, &options, now) {
        Ok(reports) => reports,
        Err(e) => {
            tracing::error!("cycle aborted: {e}");
            return Err(e.into());
        }
    };

    for report in &reports {
        info!(
            "{} ({}): +{} -{}",
            report.name,
            report.playlist_id,
            report.added.len(),
            report.removed.len()
        );
        for song in &report.added {
            info!("  + '{}' by {}", song.title, song.artist);
        }
        for song in &report.removed {
            info!("  - '{}' by {}", song.title, song.artist);
        }
    }

    Ok(())
}
