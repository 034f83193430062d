use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A track as tracked by one collection's record store
#[derive(Debug, Clone)]
pub struct Song {
    /// Catalog identifier (e.g. a streaming service track URI)
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Epoch seconds of the most recent observed play
    pub played_at: i64,
    /// Epoch seconds marking the start of the current retention window
    pub retained_at: i64,
    /// Play counter since the last reset
    pub count: u32,
    pub in_playlist: bool,
}

impl Song {
    /// Create a freshly observed song. Its retention window starts at the play.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        played_at: i64,
    ) -> Self {
        Song {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            played_at,
            retained_at: played_at,
            count: 0,
            in_playlist: false,
        }
    }

    /// Start a new retention window at the most recent play
    pub fn retain(&mut self) {
        self.retained_at = self.played_at;
    }

    /// Whether the retention window of `deadline` seconds has elapsed at `now`
    pub fn is_past_deadline(&self, deadline: i64, now: i64) -> bool {
        now >= self.retained_at + deadline
    }

    pub fn to_record(&self) -> SongRecord {
        SongRecord {
            title: self.title.clone(),
            artist: self.artist.clone(),
            played_at: self.played_at,
            retained_at: self.retained_at,
            count: self.count,
            in_playlist: self.in_playlist,
        }
    }

    pub fn from_record(id: impl Into<String>, record: SongRecord) -> Self {
        Song {
            id: id.into(),
            title: record.title,
            artist: record.artist,
            played_at: record.played_at,
            retained_at: record.retained_at,
            count: record.count,
            in_playlist: record.in_playlist,
        }
    }
}

impl PartialEq for Song {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Song {}

/// Storage representation of a song; the catalog identifier is the key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRecord {
    pub title: String,
    pub artist: String,
    pub played_at: i64,
    pub retained_at: i64,
    pub count: u32,
    pub in_playlist: bool,
}

/// One entry of the radio's now-playing feed
#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    pub title: String,
    pub artist: String,
    pub date: DateTime<FixedOffset>,
}

/// Response structure of the radio song list endpoint
#[derive(Debug, Deserialize)]
pub struct SongListResponse {
    #[serde(rename = "songList")]
    pub song_list: Vec<RawSong>,
}

#[derive(Debug, Deserialize)]
pub struct RawSong {
    pub title: String,
    pub artist: RawArtist,
    pub date: DateTime<FixedOffset>,
}

#[derive(Debug, Deserialize)]
pub struct RawArtist {
    pub name: String,
}

impl From<RawSong> for Play {
    fn from(raw: RawSong) -> Self {
        Play {
            title: raw.title,
            artist: raw.artist.name,
            date: raw.date,
        }
    }
}
