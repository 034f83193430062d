use super::KeyValueStore;
use crate::error::{Error, Result};
use crate::models::{Song, SongRecord};
use serde_json::Value;

const LAST_TIMESTAMP_KEY: &str = "last_timestamp";

/// Persisted songs of one collection, keyed by catalog identifier
pub struct SongStore {
    backend: Box<dyn KeyValueStore>,
}

impl SongStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        SongStore {
            backend: Box::new(backend),
        }
    }

    /// Insert or replace the song, persisting all of its attributes
    pub fn set(&mut self, song: &Song) -> Result<()> {
        let value = serde_json::to_value(song.to_record()).map_err(|source| {
            Error::InvalidRecord {
                id: song.id.clone(),
                source,
            }
        })?;
        self.backend.set(&song.id, value)
    }

    pub fn get(&self, id: &str) -> Result<Option<Song>> {
        self.backend
            .get(id)?
            .map(|value| decode(id, value))
            .transpose()
    }

    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.backend.delete(id)
    }

    pub fn get_all(&self) -> Result<Vec<Song>> {
        self.backend
            .get_all()?
            .into_iter()
            .map(|(id, value)| decode(&id, value))
            .collect()
    }
}

fn decode(id: &str, value: Value) -> Result<Song> {
    let record: SongRecord =
        serde_json::from_value(value).map_err(|source| Error::InvalidRecord {
            id: id.to_string(),
            source,
        })?;
    Ok(Song::from_record(id, record))
}

/// Process-wide bookkeeping shared by all collections
pub struct MetadataStore {
    backend: Box<dyn KeyValueStore>,
}

impl MetadataStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        MetadataStore {
            backend: Box::new(backend),
        }
    }

    /// Timestamp of the most recent feed entry already processed
    pub fn last_timestamp(&self) -> Result<Option<i64>> {
        match self.backend.get(LAST_TIMESTAMP_KEY)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| Error::InvalidRecord {
                    id: LAST_TIMESTAMP_KEY.to_string(),
                    source,
                }),
        }
    }

    pub fn set_last_timestamp(&mut self, timestamp: i64) -> Result<()> {
        self.backend.set(LAST_TIMESTAMP_KEY, Value::from(timestamp))
    }
}
