use super::policy::{RetentionPolicy, WEEK};
use crate::error::Result;
use crate::models::Song;
use crate::storage::SongStore;
use chrono::{DateTime, Datelike, Timelike, Weekday};
use chrono_tz::Tz;
use tracing::debug;

/// Admits songs played during a weekly time slot, e.g. Saturday night
#[derive(Debug, Clone)]
pub struct TimeWindowPolicy {
    pub time_zone: Tz,
    pub weekday: Weekday,
    /// First hour of the slot (inclusive)
    pub start_hour: u32,
    /// End of the slot (exclusive, 24 = midnight)
    pub end_hour: u32,
    pub deadline: i64,
}

impl Default for TimeWindowPolicy {
    fn default() -> Self {
        Self {
            time_zone: chrono_tz::Europe::Zurich,
            weekday: Weekday::Sat,
            start_hour: 20,
            end_hour: 24,
            deadline: 3 * WEEK,
        }
    }
}

impl TimeWindowPolicy {
    pub fn is_in_window(&self, played_at: i64) -> bool {
        let Some(utc) = DateTime::from_timestamp(played_at, 0) else {
            return false;
        };
        let local = utc.with_timezone(&self.time_zone);
        local.weekday() == self.weekday
            && local.hour() >= self.start_hour
            && local.hour() < self.end_hour
    }
}

impl RetentionPolicy for TimeWindowPolicy {
    fn label(&self) -> &'static str {
        "time window"
    }

    fn deadline(&self) -> i64 {
        self.deadline
    }

    fn admit(&self, current: Vec<Song>, store: &mut SongStore, _now: i64) -> Result<Vec<Song>> {
        let mut new_songs = Vec::new();

        for mut song in current {
            if !self.is_in_window(song.played_at) {
                continue;
            }

            song.retain();
            if !song.in_playlist {
                song.in_playlist = true;
                debug!("'{}' by {} played in the {:?} slot", song.title, song.artist, self.weekday);
                new_songs.push(song.clone());
            }
            store.set(&song)?;
        }

        Ok(new_songs)
    }
}
