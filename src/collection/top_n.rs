use super::policy::{sweep_expired, RetentionPolicy, WEEK};
use crate::error::Result;
use crate::models::Song;
use crate::storage::SongStore;
use tracing::debug;

/// Keeps the `size` most played songs of the store in the playlist
#[derive(Debug, Clone)]
pub struct TopNPolicy {
    pub size: usize,
    pub deadline: i64,
}

impl Default for TopNPolicy {
    fn default() -> Self {
        Self {
            size: 100,
            deadline: 2 * WEEK,
        }
    }
}

impl TopNPolicy {
    /// Every stored song, highest count first; on equal counts the song
    /// played longer ago ranks higher.
    fn ranked_songs(store: &SongStore) -> Result<Vec<Song>> {
        let mut songs = store.get_all()?;
        // sort_by is stable, equal keys keep store order
        songs.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.played_at.cmp(&b.played_at))
        });
        Ok(songs)
    }
}

impl RetentionPolicy for TopNPolicy {
    fn label(&self) -> &'static str {
        "top n"
    }

    fn deadline(&self) -> i64 {
        self.deadline
    }

    fn admit(&self, current: Vec<Song>, store: &mut SongStore, now: i64) -> Result<Vec<Song>> {
        for mut song in current {
            if song.is_past_deadline(self.deadline, now) {
                song.count = 0;
            }
            song.count = song.count.saturating_add(1);
            song.retain();
            store.set(&song)?;
        }

        // expired songs are swept on eviction and must not take a slot here
        let contenders = Self::ranked_songs(store)?
            .into_iter()
            .filter(|song| !song.is_past_deadline(self.deadline, now));

        let mut new_songs = Vec::new();
        for mut song in contenders.take(self.size) {
            if !song.in_playlist {
                song.in_playlist = true;
                store.set(&song)?;
                debug!("'{}' by {} entered the top {}", song.title, song.artist, self.size);
                new_songs.push(song);
            }
        }

        Ok(new_songs)
    }

    fn evict(&self, store: &mut SongStore, now: i64) -> Result<Vec<Song>> {
        // not played anymore
        let mut old_songs = sweep_expired(store, self.deadline, now)?;

        // dropped out of the ranking; kept in storage so it can climb back
        for mut song in Self::ranked_songs(store)?.into_iter().skip(self.size) {
            if song.in_playlist {
                song.in_playlist = false;
                store.set(&song)?;
                debug!("'{}' by {} fell out of the top {}", song.title, song.artist, self.size);
                old_songs.push(song);
            }
        }

        Ok(old_songs)
    }
}
