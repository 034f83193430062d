use crate::error::Result;
use crate::models::{Play, Song};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source of the radio's recently played tracks
#[cfg_attr(test, mockall::automock)]
pub trait PlayFeed {
    /// Recently played tracks of `channel`, most recent first
    fn fetch_recent_plays(&self, channel: &str) -> Result<Vec<Play>>;
}

/// Looks up a played track in the streaming catalog
#[cfg_attr(test, mockall::automock)]
pub trait TrackResolver {
    fn resolve(&self, title: &str, artist: &str) -> Result<Option<String>>;
}

/// External playlist that collections push their changes to.
///
/// Implementations reconcile against the live playlist contents; the
/// `in_playlist` flag kept in the stores is only a local cache.
#[cfg_attr(test, mockall::automock)]
pub trait PlaylistSink {
    fn add(&self, playlist_id: &str, ids: &[String]) -> Result<()>;
    fn remove(&self, playlist_id: &str, ids: &[String]) -> Result<()>;
}

/// Build the catalog search query for a played track.
///
/// Radio credits like "A feat. B" are turned into "A , B" so the catalog
/// matches on both artists. Only the literal `feat.` (any case) counts as a
/// credit marker.
pub fn search_query(title: &str, artist: &str) -> String {
    const FEAT: &str = "feat.";

    let mut normalized = String::with_capacity(artist.len());
    let mut rest = artist;
    while let Some(pos) = rest.to_ascii_lowercase().find(FEAT) {
        normalized.push_str(&rest[..pos]);
        normalized.push(',');
        rest = &rest[pos + FEAT.len()..];
    }
    normalized.push_str(rest);

    format!("{title} {normalized}")
}

/// Turn a raw feed into this cycle's song snapshot.
///
/// Plays are scanned most recent first and the scan stops at the entry whose
/// timestamp equals `last_timestamp`, since everything from there on was
/// handled by an earlier cycle. Returns the resolved songs and the marker to
/// persist for the next cycle (`None` when nothing new was resolved).
pub fn reconcile_feed(
    plays: Vec<Play>,
    last_timestamp: Option<i64>,
    resolver: &dyn TrackResolver,
    resolve_delay: Duration,
) -> Result<(Vec<Song>, Option<i64>)> {
    let mut songs = Vec::new();

    for (i, play) in plays.into_iter().enumerate() {
        let played_at = play.date.timestamp();
        if Some(played_at) == last_timestamp {
            debug!("reached already processed play at {played_at}");
            break;
        }

        if i > 0 && !resolve_delay.is_zero() {
            std::thread::sleep(resolve_delay);
        }

        match resolver.resolve(&play.title, &play.artist)? {
            Some(id) => songs.push(Song::new(id, play.title, play.artist, played_at)),
            None => warn!("no catalog match for '{}' by '{}'", play.title, play.artist),
        }
    }

    let marker = songs.first().map(|song| song.played_at);
    info!("resolved {} new plays from the feed", songs.len());
    Ok((songs, marker))
}
