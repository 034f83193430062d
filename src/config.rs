use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_dir: PathBuf,
    pub feed_dir: PathBuf,
    pub catalog_file: PathBuf,
    pub playlist_dir: PathBuf,
    pub channel_id: String,
    /// Pause between catalog lookups
    pub resolve_delay: Duration,
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    Config::from_lookup(|key| std::env::var(key).ok())
}

impl Config {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let path = |key: &str, default: &str| {
            PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()))
        };

        let channel_id = lookup("RADIO_CHANNEL_ID")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config("RADIO_CHANNEL_ID must be set".to_string()))?;

        let resolve_delay = match lookup("RESOLVE_DELAY_MS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("RESOLVE_DELAY_MS must be a number of milliseconds, got '{raw}'"))
            })?,
            None => 0,
        };

        Ok(Config {
            storage_dir: path("STORAGE_DIR", "./storage"),
            feed_dir: path("FEED_DIR", "./feed"),
            catalog_file: path("CATALOG_FILE", "./catalog.json"),
            playlist_dir: path("PLAYLIST_DIR", "./playlists"),
            channel_id,
            resolve_delay: Duration::from_millis(resolve_delay),
        })
    }
}
