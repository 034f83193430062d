pub mod json_file;
pub mod songs;

pub use json_file::*;
pub use songs::*;

use crate::error::Result;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Directory holding the metadata file and one record store per collection.
///
/// A volatile directory hands out in-memory copies of the files, so nothing
/// computed during a dry run reaches the disk.
#[derive(Debug, Clone)]
pub struct StorageDir {
    root: PathBuf,
    volatile: bool,
}

impl StorageDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        StorageDir {
            root: root.into(),
            volatile: false,
        }
    }

    pub fn volatile(root: impl Into<PathBuf>) -> Self {
        StorageDir {
            root: root.into(),
            volatile: true,
        }
    }

    pub fn song_store_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("songs_{collection}.json"))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join("songs_metadata.json")
    }

    pub fn song_store(&self, collection: &str) -> Result<SongStore> {
        let path = self.song_store_path(collection);
        if self.volatile {
            Ok(SongStore::new(Self::snapshot(&path)?))
        } else {
            Ok(SongStore::new(JsonFile::open(path)?))
        }
    }

    pub fn metadata_store(&self) -> Result<MetadataStore> {
        let path = self.metadata_path();
        if self.volatile {
            Ok(MetadataStore::new(Self::snapshot(&path)?))
        } else {
            Ok(MetadataStore::new(JsonFile::open(path)?))
        }
    }

    fn snapshot(path: &Path) -> Result<MemoryStore> {
        if path.exists() {
            JsonFile::open(path)?.to_memory()
        } else {
            Ok(MemoryStore::new())
        }
    }
}

/// Minimal key/value persistence used by the song and metadata stores.
///
/// Every mutating call must be durable when it returns; implementations do
/// not batch writes.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    /// Removing an absent key is a no-op
    fn delete(&mut self, key: &str) -> Result<()>;
    fn get_all(&self) -> Result<Map<String, Value>>;
}

/// Volatile store, handy for dry runs and tests
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    data: Map<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }

    fn get_all(&self) -> Result<Map<String, Value>> {
        Ok(self.data.clone())
    }
}
