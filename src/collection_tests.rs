// Multi-cycle scenarios for the collection policies and the cycle driver

#[cfg(test)]
mod tests {
    use crate::collection::*;
    use crate::error::Error;
    use crate::feed::{MockPlayFeed, MockPlaylistSink, MockTrackResolver};
    use crate::local::PlaylistDirectory;
    use crate::models::{Play, Song};
    use crate::storage::{MemoryStore, SongStore, StorageDir};
    use chrono::{DateTime, FixedOffset};
    use mockall::predicate::eq;
    use std::time::Duration;

    /// Run one cycle of a collection and hand back its store for the next one
    fn run(
        policy: Box<dyn RetentionPolicy>,
        store: SongStore,
        feed: &[Song],
        now: i64,
    ) -> (Vec<Song>, Vec<Song>, SongStore) {
        let mut collection = SongCollection::new("test", "playlist", store, feed, policy, now);
        let new_songs = collection.get_new_songs().unwrap();
        let old_songs = collection.get_old_songs().unwrap();
        (new_songs, old_songs, collection.into_store())
    }

    fn trending() -> Box<dyn RetentionPolicy> {
        Box::new(TrendingPolicy::default())
    }

    fn top(size: usize) -> Box<dyn RetentionPolicy> {
        Box::new(TopNPolicy {
            size,
            deadline: 2 * WEEK,
        })
    }

    fn seen(id: &str, played_at: i64) -> Song {
        Song::new(id, format!("Title {id}"), "Artist", played_at)
    }

    fn ids(songs: &[Song]) -> Vec<&str> {
        songs.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_trending_admits_on_third_cycle() {
        let store = SongStore::new(MemoryStore::new());

        let (new, _, store) = run(trending(), store, &[seen("A", 0)], 0);
        assert!(new.is_empty());
        assert_eq!(store.get("A").unwrap().unwrap().count, 1);

        let (new, _, store) = run(trending(), store, &[seen("A", 100)], 100);
        assert!(new.is_empty());
        assert_eq!(store.get("A").unwrap().unwrap().count, 2);

        let (new, old, store) = run(trending(), store, &[seen("A", 200)], 200);
        assert_eq!(ids(&new), vec!["A"]);
        assert!(old.is_empty());

        let a = store.get("A").unwrap().unwrap();
        assert_eq!(a.count, 0);
        assert_eq!(a.retained_at, 200);
        assert_eq!(a.played_at, 200);
        assert!(a.in_playlist);
    }

    #[test]
    fn test_trending_admits_only_once() {
        let mut store = SongStore::new(MemoryStore::new());
        let mut admissions = 0;

        for cycle in 0..9 {
            let t = cycle * 100;
            let (new, old, next) = run(trending(), store, &[seen("A", t)], t);
            admissions += new.len();
            assert!(old.is_empty());
            store = next;
        }

        assert_eq!(admissions, 1);
    }

    #[test]
    fn test_trending_count_restarts_after_deadline_gap() {
        let store = SongStore::new(MemoryStore::new());
        let (_, _, store) = run(trending(), store, &[seen("A", 0)], 0);
        let (_, _, store) = run(trending(), store, &[seen("A", 100)], 100);
        assert_eq!(store.get("A").unwrap().unwrap().count, 2);

        let later = WEEK + 1;
        let (new, _, store) = run(trending(), store, &[seen("A", later)], later);

        assert!(new.is_empty());
        assert_eq!(store.get("A").unwrap().unwrap().count, 1);
    }

    #[test]
    fn test_trending_deadline_eviction_boundary() {
        let mut store = SongStore::new(MemoryStore::new());
        let mut a = seen("A", 0);
        a.in_playlist = true;
        store.set(&a).unwrap();

        let (_, old, store) = run(trending(), store, &[], 604_799);
        assert!(old.is_empty());
        assert!(store.get("A").unwrap().is_some());

        let (_, old, store) = run(trending(), store, &[], 604_800);
        assert_eq!(ids(&old), vec!["A"]);
        assert!(store.get("A").unwrap().is_none());
    }

    #[test]
    fn test_counting_songs_are_not_swept() {
        let mut store = SongStore::new(MemoryStore::new());
        store.set(&seen("waiting", 0)).unwrap();

        let (_, old, store) = run(trending(), store, &[], 10 * WEEK);

        assert!(old.is_empty());
        assert!(store.get("waiting").unwrap().is_some());
    }

    #[test]
    fn test_deadline_eviction_applies_to_every_policy() {
        let policies: Vec<(Box<dyn RetentionPolicy>, i64)> = vec![
            (trending(), WEEK),
            (top(100), 2 * WEEK),
            (Box::new(TimeWindowPolicy::default()), 3 * WEEK),
        ];

        for (policy, deadline) in policies {
            let mut store = SongStore::new(MemoryStore::new());
            let mut expired = seen("expired", 1_000);
            expired.in_playlist = true;
            let mut fresh = seen("fresh", 1_000 + deadline);
            fresh.in_playlist = true;
            store.set(&expired).unwrap();
            store.set(&fresh).unwrap();

            let (_, old, store) = run(policy, store, &[], 1_000 + deadline);

            assert_eq!(ids(&old), vec!["expired"]);
            assert!(store.get("expired").unwrap().is_none());
            assert!(store.get("fresh").unwrap().is_some());
        }
    }

    #[test]
    fn test_top_n_displaced_song_stays_in_storage() {
        let mut store = SongStore::new(MemoryStore::new());
        let mut a = seen("a", 900);
        a.count = 5;
        a.in_playlist = true;
        let mut b = seen("b", 950);
        b.count = 3;
        b.in_playlist = true;
        let mut c = seen("c", 800);
        c.count = 3;
        for song in [&a, &b, &c] {
            store.set(song).unwrap();
        }

        // c is played and overtakes b
        let (new, old, store) = run(top(2), store, &[seen("c", 1_000)], 1_000);
        assert_eq!(ids(&new), vec!["c"]);
        assert_eq!(ids(&old), vec!["b"]);
        let b_stored = store.get("b").unwrap().unwrap();
        assert!(!b_stored.in_playlist);
        assert_eq!(b_stored.count, 3);

        // b catches up to 4 but the tie goes to c, played earlier
        let (new, old, store) = run(top(2), store, &[seen("b", 2_000)], 2_000);
        assert!(new.is_empty());
        assert!(old.is_empty());

        // one more play lifts b above c and it re-enters
        let (new, old, store) = run(top(2), store, &[seen("b", 3_000)], 3_000);
        assert_eq!(ids(&new), vec!["b"]);
        assert_eq!(ids(&old), vec!["c"]);
        assert!(store.get("c").unwrap().is_some());
    }

    #[test]
    fn test_top_n_equal_counts_rank_older_play_first() {
        let store = SongStore::new(MemoryStore::new());
        let feed = [seen("newer", 500), seen("older", 100), seen("middle", 300)];

        let (new, _, _) = run(top(2), store, &feed, 500);

        assert_eq!(ids(&new), vec!["older", "middle"]);
    }

    #[test]
    fn test_reconciliation_keeps_stored_state() {
        let mut store = SongStore::new(MemoryStore::new());
        let mut known = seen("A", 100);
        known.count = 2;
        known.title = "Stored Title".to_string();
        store.set(&known).unwrap();

        let mut from_feed = seen("A", 400);
        from_feed.title = "Feed Title".to_string();
        let (new, _, store) = run(trending(), store, &[from_feed], 400);

        assert_eq!(ids(&new), vec!["A"]);
        let a = store.get("A").unwrap().unwrap();
        assert_eq!(a.title, "Stored Title");
        assert_eq!(a.played_at, 400);
        assert_eq!(a.retained_at, 400);
    }

    #[test]
    fn test_collections_evolve_independently() {
        let feed = [seen("A", 0)];
        let trending_store = SongStore::new(MemoryStore::new());
        let top_store = SongStore::new(MemoryStore::new());

        let (trending_new, _, trending_store) = run(trending(), trending_store, &feed, 0);
        let (top_new, _, top_store) = run(top(10), top_store, &feed, 0);

        assert!(trending_new.is_empty());
        assert_eq!(ids(&top_new), vec!["A"]);
        assert!(!trending_store.get("A").unwrap().unwrap().in_playlist);
        assert!(top_store.get("A").unwrap().unwrap().in_playlist);
    }

    #[test]
    fn test_policy_config_defaults() {
        let json = r#"[
            {"name": "trending_now", "playlist_id": "p1", "policy": {"type": "trending"}},
            {"name": "top_100", "playlist_id": "p2", "policy": {"type": "top_n", "size": 50}},
            {"name": "night_out", "playlist_id": "p3", "policy": {"type": "time_window"}}
        ]"#;
        let configs: Vec<CollectionConfig> = serde_json::from_str(json).unwrap();
        CollectionConfig::validate_all(&configs).unwrap();

        assert!(matches!(
            configs[0].policy,
            PolicyConfig::Trending {
                required_count: 3,
                deadline_days: 7
            }
        ));
        assert!(matches!(
            configs[1].policy,
            PolicyConfig::TopN {
                size: 50,
                deadline_days: 14
            }
        ));
        let night = configs[2].policy.build().unwrap();
        assert_eq!(night.deadline(), 3 * WEEK);
        assert_eq!(night.label(), "time window");
    }

    #[test]
    fn test_invalid_collection_configs_are_rejected() {
        let parse = |json: &str| -> Vec<CollectionConfig> { serde_json::from_str(json).unwrap() };

        let duplicate = parse(
            r#"[{"name": "a", "playlist_id": "p", "policy": {"type": "trending"}},
                {"name": "a", "playlist_id": "q", "policy": {"type": "top_n"}}]"#,
        );
        assert!(matches!(CollectionConfig::validate_all(&duplicate), Err(Error::Config(_))));

        let bad_zone = parse(
            r#"[{"name": "n", "playlist_id": "p",
                 "policy": {"type": "time_window", "time_zone": "Mars/Olympus"}}]"#,
        );
        assert!(CollectionConfig::validate_all(&bad_zone).is_err());

        let bad_hours = parse(
            r#"[{"name": "n", "playlist_id": "p",
                 "policy": {"type": "time_window", "start_hour": 22, "end_hour": 20}}]"#,
        );
        assert!(CollectionConfig::validate_all(&bad_hours).is_err());

        let zero_count = parse(
            r#"[{"name": "t", "playlist_id": "p",
                 "policy": {"type": "trending", "required_count": 0}}]"#,
        );
        assert!(CollectionConfig::validate_all(&zero_count).is_err());

        let path_name = parse(
            r#"[{"name": "../escape", "playlist_id": "p", "policy": {"type": "trending"}}]"#,
        );
        assert!(CollectionConfig::validate_all(&path_name).is_err());
    }

    #[test]
    fn test_load_collections_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collections.json");
        std::fs::write(
            &path,
            r#"[{"name": "night_out", "playlist_id": "p",
                 "policy": {"type": "time_window", "weekday": "fri", "start_hour": 22}}]"#,
        )
        .unwrap();

        let configs = CollectionConfig::load_all_from_file(&path).unwrap();
        assert_eq!(configs.len(), 1);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            CollectionConfig::load_all_from_file(&path),
            Err(Error::Corrupt { .. })
        ));
    }

    // Cycle driver

    fn play(title: &str, date: &str) -> Play {
        Play {
            title: title.to_string(),
            artist: "Artist".to_string(),
            date: DateTime::<FixedOffset>::parse_from_rfc3339(date).unwrap(),
        }
    }

    fn trending_config(required_count: u32) -> CollectionConfig {
        CollectionConfig {
            name: "trending_now".to_string(),
            playlist_id: "pl-trending".to_string(),
            policy: PolicyConfig::Trending {
                required_count,
                deadline_days: 7,
            },
        }
    }

    fn options(dry_run: bool) -> CycleOptions {
        CycleOptions {
            channel: "virus".to_string(),
            resolve_delay: Duration::ZERO,
            dry_run,
        }
    }

    fn feed_of(plays: Vec<Play>) -> MockPlayFeed {
        let mut feed = MockPlayFeed::new();
        feed.expect_fetch_recent_plays()
            .with(eq("virus"))
            .returning(move |_| Ok(plays.clone()));
        feed
    }

    fn resolver() -> MockTrackResolver {
        let mut resolver = MockTrackResolver::new();
        resolver
            .expect_resolve()
            .returning(|title, _| Ok(Some(format!("id:{}", title.to_lowercase()))));
        resolver
    }

    #[test]
    fn test_cycle_pushes_changes_and_records_marker() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageDir::new(dir.path().join("storage"));
        let playlists = PlaylistDirectory::new(dir.path().join("playlists"));
        let plays = vec![
            play("Hit", "2024-06-01T20:10:00+02:00"),
            play("Other", "2024-06-01T20:05:00+02:00"),
        ];
        let newest = plays[0].date.timestamp();
        let feed = feed_of(plays);
        let resolver = resolver();
        let services = Services {
            feed: &feed,
            resolver: &resolver,
            sink: &playlists,
        };

        let reports = run_cycle(
            &services,
            &storage,
            &[trending_config(1)],
            &options(false),
            newest,
        )
        .unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(ids(&reports[0].added), vec!["id:hit", "id:other"]);
        assert_eq!(
            playlists.items("pl-trending").unwrap(),
            vec!["id:hit".to_string(), "id:other".to_string()]
        );
        assert_eq!(
            storage.metadata_store().unwrap().last_timestamp().unwrap(),
            Some(newest)
        );
        assert!(storage.song_store_path("trending_now").exists());
    }

    #[test]
    fn test_second_cycle_skips_processed_plays() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageDir::new(dir.path());
        let plays = vec![play("Hit", "2024-06-01T20:10:00+02:00")];
        let now = plays[0].date.timestamp();
        let feed = feed_of(plays);
        let resolver = resolver();
        let mut sink = MockPlaylistSink::new();
        sink.expect_add().times(0);
        sink.expect_remove().times(0);
        let services = Services {
            feed: &feed,
            resolver: &resolver,
            sink: &sink,
        };
        let collections = [trending_config(3)];

        run_cycle(&services, &storage, &collections, &options(false), now).unwrap();
        run_cycle(&services, &storage, &collections, &options(false), now + 900).unwrap();

        // the same feed entry is only counted once
        let store = storage.song_store("trending_now").unwrap();
        assert_eq!(store.get("id:hit").unwrap().unwrap().count, 1);
    }

    #[test]
    fn test_dry_run_leaves_disk_and_playlists_alone() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageDir::volatile(dir.path().join("storage"));
        let feed = feed_of(vec![play("Hit", "2024-06-01T20:10:00+02:00")]);
        let resolver = resolver();
        let sink = MockPlaylistSink::new();
        let services = Services {
            feed: &feed,
            resolver: &resolver,
            sink: &sink,
        };

        let reports = run_cycle(
            &services,
            &storage,
            &[trending_config(1)],
            &options(true),
            0,
        )
        .unwrap();

        assert_eq!(ids(&reports[0].added), vec!["id:hit"]);
        assert!(!dir.path().join("storage").exists());
    }

    #[test]
    fn test_upstream_failure_aborts_before_any_change() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageDir::new(dir.path());
        let mut feed = MockPlayFeed::new();
        feed.expect_fetch_recent_plays().returning(|_| {
            Err(Error::Upstream {
                service: "radio".to_string(),
                status: 401,
                body: serde_json::json!({"fault": {"faultstring": "Invalid access token"}}),
            })
        });
        let resolver = MockTrackResolver::new();
        let sink = MockPlaylistSink::new();
        let services = Services {
            feed: &feed,
            resolver: &resolver,
            sink: &sink,
        };

        let result = run_cycle(&services, &storage, &[trending_config(1)], &options(false), 0);

        assert!(matches!(result, Err(Error::Upstream { status: 401, .. })));
        assert!(!storage.song_store_path("trending_now").exists());
    }

    #[test]
    fn test_corrupt_store_aborts_collection_without_sink_calls() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageDir::new(dir.path());
        std::fs::write(storage.song_store_path("trending_now"), "{ broken").unwrap();
        let feed = feed_of(vec![play("Hit", "2024-06-01T20:10:00+02:00")]);
        let resolver = resolver();
        let sink = MockPlaylistSink::new();
        let services = Services {
            feed: &feed,
            resolver: &resolver,
            sink: &sink,
        };

        let result = run_cycle(&services, &storage, &[trending_config(1)], &options(false), 0);

        assert!(matches!(result, Err(Error::Corrupt { .. })));
    }

    #[test]
    fn test_sink_receives_removals() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageDir::new(dir.path());
        let mut store = storage.song_store("trending_now").unwrap();
        let mut stale = seen("id:stale", 0);
        stale.in_playlist = true;
        store.set(&stale).unwrap();

        let feed = feed_of(Vec::new());
        let resolver = MockTrackResolver::new();
        let mut sink = MockPlaylistSink::new();
        sink.expect_add().times(0);
        sink.expect_remove()
            .withf(|playlist_id, ids| {
                playlist_id == "pl-trending" && ids.to_vec() == vec!["id:stale".to_string()]
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let services = Services {
            feed: &feed,
            resolver: &resolver,
            sink: &sink,
        };

        let reports =
            run_cycle(&services, &storage, &[trending_config(3)], &options(false), WEEK).unwrap();

        assert_eq!(ids(&reports[0].removed), vec!["id:stale"]);
        assert!(storage
            .song_store("trending_now")
            .unwrap()
            .get("id:stale")
            .unwrap()
            .is_none());
    }
}
