use super::policy::{RetentionPolicy, DAY};
use super::{TimeWindowPolicy, TopNPolicy, TrendingPolicy};
use crate::error::{Error, Result};
use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One playlist kept in sync by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Also names the record store file (`songs_<name>.json`)
    pub name: String,
    pub playlist_id: String,
    pub policy: PolicyConfig,
}

/// Admission rules of a collection, tagged by `type` in JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyConfig {
    Trending {
        #[serde(default = "default_required_count")]
        required_count: u32,
        #[serde(default = "default_trending_days")]
        deadline_days: u32,
    },
    TopN {
        #[serde(default = "default_size")]
        size: usize,
        #[serde(default = "default_top_n_days")]
        deadline_days: u32,
    },
    TimeWindow {
        #[serde(default = "default_time_zone")]
        time_zone: String,
        #[serde(default = "default_weekday")]
        weekday: String,
        #[serde(default = "default_start_hour")]
        start_hour: u32,
        #[serde(default = "default_end_hour")]
        end_hour: u32,
        #[serde(default = "default_time_window_days")]
        deadline_days: u32,
    },
}

fn default_required_count() -> u32 {
    3
}
fn default_trending_days() -> u32 {
    7
}
fn default_size() -> usize {
    100
}
fn default_top_n_days() -> u32 {
    14
}
fn default_time_zone() -> String {
    "Europe/Zurich".to_string()
}
fn default_weekday() -> String {
    "Saturday".to_string()
}
fn default_start_hour() -> u32 {
    20
}
fn default_end_hour() -> u32 {
    24
}
fn default_time_window_days() -> u32 {
    21
}

fn deadline(days: u32) -> Result<i64> {
    if days == 0 {
        return Err(Error::Config("deadline_days must be at least 1".to_string()));
    }
    Ok(i64::from(days) * DAY)
}

impl PolicyConfig {
    /// Validate the settings and build the policy they describe
    pub fn build(&self) -> Result<Box<dyn RetentionPolicy>> {
        match self {
            PolicyConfig::Trending {
                required_count,
                deadline_days,
            } => {
                if *required_count == 0 {
                    return Err(Error::Config("required_count must be at least 1".to_string()));
                }
                Ok(Box::new(TrendingPolicy {
                    required_count: *required_count,
                    deadline: deadline(*deadline_days)?,
                }))
            }
            PolicyConfig::TopN {
                size,
                deadline_days,
            } => {
                if *size == 0 {
                    return Err(Error::Config("size must be at least 1".to_string()));
                }
                Ok(Box::new(TopNPolicy {
                    size: *size,
                    deadline: deadline(*deadline_days)?,
                }))
            }
            PolicyConfig::TimeWindow {
                time_zone,
                weekday,
                start_hour,
                end_hour,
                deadline_days,
            } => {
                let time_zone: Tz = time_zone
                    .parse()
                    .map_err(|e| Error::Config(format!("unknown time zone '{time_zone}': {e}")))?;
                let weekday: Weekday = weekday
                    .parse()
                    .map_err(|_| Error::Config(format!("unknown weekday '{weekday}'")))?;
                if start_hour >= end_hour || *end_hour > 24 {
                    return Err(Error::Config(format!(
                        "invalid hour range {start_hour}..{end_hour}"
                    )));
                }
                Ok(Box::new(TimeWindowPolicy {
                    time_zone,
                    weekday,
                    start_hour: *start_hour,
                    end_hour: *end_hour,
                    deadline: deadline(*deadline_days)?,
                }))
            }
        }
    }
}

impl CollectionConfig {
    /// Load collection definitions from a JSON array file
    pub fn load_all_from_file(path: impl AsRef<Path>) -> Result<Vec<CollectionConfig>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let configs: Vec<CollectionConfig> =
            serde_json::from_str(&content).map_err(|e| Error::corrupt(path, e))?;
        Self::validate_all(&configs)?;
        Ok(configs)
    }

    pub fn validate_all(configs: &[CollectionConfig]) -> Result<()> {
        let mut names = HashSet::new();
        for config in configs {
            config.validate()?;
            if !names.insert(config.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate collection name '{}'",
                    config.name
                )));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let usable_name = !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !usable_name {
            return Err(Error::Config(format!(
                "collection name '{}' may only contain letters, digits, '_' and '-'",
                self.name
            )));
        }
        if self.playlist_id.trim().is_empty() {
            return Err(Error::Config(format!(
                "collection '{}' has no playlist_id",
                self.name
            )));
        }
        self.policy
            .build()
            .map(|_| ())
            .map_err(|e| match e {
                Error::Config(msg) => Error::Config(format!("collection '{}': {msg}", self.name)),
                other => other,
            })
    }
}
