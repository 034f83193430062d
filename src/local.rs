//! File-backed stand-ins for the radio feed, the catalog search and the
//! streaming playlists, so a cycle can run from exported data.

use crate::error::{Error, Result};
use crate::feed::{search_query, PlayFeed, PlaylistSink, TrackResolver};
use crate::models::{Play, SongListResponse};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Reads `<dir>/<channel>.json` exports of the radio song list endpoint
pub struct SongListDirectory {
    dir: PathBuf,
}

impl SongListDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SongListDirectory { dir: dir.into() }
    }
}

impl PlayFeed for SongListDirectory {
    fn fetch_recent_plays(&self, channel: &str) -> Result<Vec<Play>> {
        let path = self.dir.join(format!("{channel}.json"));
        let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let response: SongListResponse =
            serde_json::from_str(&content).map_err(|e| Error::corrupt(&path, e))?;
        Ok(response.song_list.into_iter().map(Play::from).collect())
    }
}

/// Catalog lookups from a JSON object of search query -> catalog id
pub struct CatalogIndex {
    entries: HashMap<String, String>,
}

impl CatalogIndex {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let entries: HashMap<String, String> =
            serde_json::from_str(&content).map_err(|e| Error::corrupt(path, e))?;
        Ok(CatalogIndex {
            entries: entries
                .into_iter()
                .map(|(query, id)| (query.to_lowercase(), id))
                .collect(),
        })
    }
}

impl TrackResolver for CatalogIndex {
    fn resolve(&self, title: &str, artist: &str) -> Result<Option<String>> {
        let query = search_query(title, artist).to_lowercase();
        Ok(self.entries.get(&query).cloned())
    }
}

/// Playlists kept as `<dir>/<playlist_id>.json` arrays of catalog ids
pub struct PlaylistDirectory {
    dir: PathBuf,
}

impl PlaylistDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        PlaylistDirectory { dir: dir.into() }
    }

    fn path(&self, playlist_id: &str) -> PathBuf {
        self.dir.join(format!("{playlist_id}.json"))
    }

    /// Current contents of the playlist, empty if it was never written
    pub fn items(&self, playlist_id: &str) -> Result<Vec<String>> {
        let path = self.path(playlist_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::from_str(&content).map_err(|e| Error::corrupt(&path, e))
    }

    fn write_items(&self, playlist_id: &str, items: &[String]) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let path = self.path(playlist_id);
        let content = serde_json::to_string_pretty(items).map_err(|e| Error::corrupt(&path, e))?;
        fs::write(&path, content).map_err(|e| Error::io(&path, e))
    }
}

impl PlaylistSink for PlaylistDirectory {
    fn add(&self, playlist_id: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut items = self.items(playlist_id)?;
        let before = items.len();
        for id in ids {
            if !items.contains(id) {
                items.push(id.clone());
            }
        }
        info!("playlist {playlist_id}: {} items added", items.len() - before);
        self.write_items(playlist_id, &items)
    }

    fn remove(&self, playlist_id: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut items = self.items(playlist_id)?;
        let before = items.len();
        items.retain(|item| !ids.contains(item));
        info!("playlist {playlist_id}: {} items removed", before - items.len());
        self.write_items(playlist_id, &items)
    }
}
