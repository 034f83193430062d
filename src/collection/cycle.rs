use super::{CollectionConfig, SongCollection};
use crate::error::Result;
use crate::feed::{reconcile_feed, PlayFeed, PlaylistSink, TrackResolver};
use crate::models::Song;
use crate::storage::StorageDir;
use std::time::Duration;
use tracing::info;

/// External services a cycle talks to
pub struct Services<'a> {
    pub feed: &'a dyn PlayFeed,
    pub resolver: &'a dyn TrackResolver,
    pub sink: &'a dyn PlaylistSink,
}

#[derive(Debug, Clone)]
pub struct CycleOptions {
    pub channel: String,
    pub resolve_delay: Duration,
    /// Compute changes without forwarding them to the playlists
    pub dry_run: bool,
}

/// What one collection changed during a cycle
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub name: String,
    pub playlist_id: String,
    pub added: Vec<Song>,
    pub removed: Vec<Song>,
}

fn song_ids(songs: &[Song]) -> Vec<String> {
    songs.iter().map(|song| song.id.clone()).collect()
}

/// Run one polling cycle: fetch the feed once, evaluate every collection
/// against that snapshot and push the resulting changes to the playlists.
///
/// A collection's admissions and evictions are both computed before its
/// playlist is touched, so a failing collection makes no sink calls.
pub fn run_cycle(
    services: &Services,
    storage: &StorageDir,
    collections: &[CollectionConfig],
    options: &CycleOptions,
    now: i64,
) -> Result<Vec<CollectionReport>> {
    let mut metadata = storage.metadata_store()?;
    let last_timestamp = metadata.last_timestamp()?;

    let plays = services.feed.fetch_recent_plays(&options.channel)?;
    info!("fetched {} plays from channel {}", plays.len(), options.channel);

    let (current_songs, marker) = reconcile_feed(
        plays,
        last_timestamp,
        services.resolver,
        options.resolve_delay,
    )?;
    if let Some(marker) = marker {
        metadata.set_last_timestamp(marker)?;
    }

    let mut reports = Vec::with_capacity(collections.len());
    for config in collections {
        let mut collection = SongCollection::new(
            &config.name,
            &config.playlist_id,
            storage.song_store(&config.name)?,
            &current_songs,
            config.policy.build()?,
            now,
        );

        let added = collection.get_new_songs()?;
        let removed = collection.get_old_songs()?;

        if options.dry_run {
            info!(
                "dry run: '{}' would add {} and remove {} songs",
                collection.name(),
                added.len(),
                removed.len()
            );
        } else {
            if !added.is_empty() {
                info!("add {} songs to playlist '{}'", added.len(), collection.name());
                services.sink.add(collection.playlist_id(), &song_ids(&added))?;
            }
            if !removed.is_empty() {
                info!("remove {} songs from playlist '{}'", removed.len(), collection.name());
                services.sink.remove(collection.playlist_id(), &song_ids(&removed))?;
            }
        }

        reports.push(CollectionReport {
            name: config.name.clone(),
            playlist_id: config.playlist_id.clone(),
            added,
            removed,
        });
    }

    Ok(reports)
}
