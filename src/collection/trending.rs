use super::policy::{RetentionPolicy, WEEK};
use crate::error::Result;
use crate::models::Song;
use crate::storage::SongStore;
use tracing::debug;

/// Admits songs played often enough within one retention window
#[derive(Debug, Clone)]
pub struct TrendingPolicy {
    pub required_count: u32,
    pub deadline: i64,
}

impl Default for TrendingPolicy {
    fn default() -> Self {
        Self {
            required_count: 3,
            deadline: WEEK,
        }
    }
}

impl RetentionPolicy for TrendingPolicy {
    fn label(&self) -> &'static str {
        "trending"
    }

    fn deadline(&self) -> i64 {
        self.deadline
    }

    fn admit(&self, current: Vec<Song>, store: &mut SongStore, now: i64) -> Result<Vec<Song>> {
        let mut new_songs = Vec::new();

        for mut song in current {
            // plays from an expired window do not add up
            if song.is_past_deadline(self.deadline, now) {
                song.count = 0;
            }
            song.count = song.count.saturating_add(1);

            if song.count >= self.required_count {
                song.count = 0;
                song.retain();
                if !song.in_playlist {
                    song.in_playlist = true;
                    debug!("'{}' by {} is trending", song.title, song.artist);
                    new_songs.push(song.clone());
                }
            }

            // always written back to keep played_at current
            store.set(&song)?;
        }

        Ok(new_songs)
    }
}
