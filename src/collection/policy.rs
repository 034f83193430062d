use crate::error::Result;
use crate::models::Song;
use crate::storage::SongStore;
use tracing::{debug, info};

pub const DAY: i64 = 24 * 60 * 60;
pub const WEEK: i64 = 7 * DAY;

/// Rules deciding which songs enter and leave a collection's playlist
pub trait RetentionPolicy {
    /// Human readable name used in logs
    fn label(&self) -> &'static str;

    /// Seconds a song stays retained after its last retain
    fn deadline(&self) -> i64;

    /// Update the reconciled songs of this cycle and return the newly admitted ones
    fn admit(&self, current: Vec<Song>, store: &mut SongStore, now: i64) -> Result<Vec<Song>>;

    /// Return the songs leaving the playlist this cycle
    fn evict(&self, store: &mut SongStore, now: i64) -> Result<Vec<Song>> {
        sweep_expired(store, self.deadline(), now)
    }
}

/// Remove every admitted song whose retention window has elapsed
pub fn sweep_expired(store: &mut SongStore, deadline: i64, now: i64) -> Result<Vec<Song>> {
    let mut old_songs = Vec::new();
    for song in store.get_all()? {
        if song.in_playlist && song.is_past_deadline(deadline, now) {
            debug!("'{}' by {} expired (retained at {})", song.title, song.artist, song.retained_at);
            store.remove(&song.id)?;
            old_songs.push(song);
        }
    }
    Ok(old_songs)
}

/// A named playlist together with its record store, evaluated for one cycle
pub struct SongCollection {
    name: String,
    playlist_id: String,
    store: SongStore,
    current_songs: Vec<Song>,
    policy: Box<dyn RetentionPolicy>,
    now: i64,
}

impl SongCollection {
    pub fn new(
        name: impl Into<String>,
        playlist_id: impl Into<String>,
        store: SongStore,
        current_songs: &[Song],
        policy: Box<dyn RetentionPolicy>,
        now: i64,
    ) -> Self {
        SongCollection {
            name: name.into(),
            playlist_id: playlist_id.into(),
            store,
            current_songs: current_songs.to_vec(),
            policy,
            now,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn playlist_id(&self) -> &str {
        &self.playlist_id
    }

    /// Songs admitted to the playlist during this cycle
    pub fn get_new_songs(&mut self) -> Result<Vec<Song>> {
        info!("get new songs for '{}' ({})", self.name, self.policy.label());
        let current = self.reconciled_songs()?;
        self.policy.admit(current, &mut self.store, self.now)
    }

    /// Songs evicted from the playlist during this cycle
    pub fn get_old_songs(&mut self) -> Result<Vec<Song>> {
        info!("get old songs for '{}' ({})", self.name, self.policy.label());
        self.policy.evict(&mut self.store, self.now)
    }

    #[cfg(test)]
    pub fn into_store(self) -> SongStore {
        self.store
    }

    /// The feed snapshot as seen by this collection: stored songs carry on
    /// with their counters, only `played_at` is taken from the feed.
    fn reconciled_songs(&self) -> Result<Vec<Song>> {
        let mut songs = Vec::with_capacity(self.current_songs.len());
        for current in &self.current_songs {
            match self.store.get(&current.id)? {
                Some(mut stored) => {
                    stored.played_at = current.played_at;
                    songs.push(stored);
                }
                None => songs.push(current.clone()),
            }
        }
        Ok(songs)
    }
}
