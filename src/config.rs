//! Runtime settings read from the environment.
//!
//! The binary loads a `.env` file first, so every variable below may also
//! live there.
//!
//! | Variable | Default |
//! |---|---|
//! | `SPOTIFY_ACCESS_TOKEN` | required |
//! | `SPOTIFY_API_BASE` | `https://api.spotify.com/v1/` |
//! | `ETL_PAGE_SIZE` | `50` (1..=50) |
//! | `ETL_INTERVAL_HOURS` | `24` |
//! | `ETL_REFERENCE_UTC_OFFSET` | `3` |
//! | `WAREHOUSE_DIR` | unset: BigQuery is used |
//! | `BIGQUERY_PROJECT`, `BIGQUERY_DATASET`, `BIGQUERY_ACCESS_TOKEN` | required without `WAREHOUSE_DIR` |
//! | `NOTIFY_WEBHOOK_URL` | unset: notifications are logged |
//! | `ETL_TABLE_<NAME>` | see [`TableNames`] |

use std::path::PathBuf;
use std::str::FromStr;

use chrono::FixedOffset;

use crate::api::spotify::API_BASE_URL;
use crate::error::{PipelineError, Result};
use crate::models::ResourceKind;
use crate::validator::{lookback_window, DEFAULT_INTERVAL_HOURS, DEFAULT_REFERENCE_OFFSET_HOURS};

/// Largest page the Spotify API serves.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Where validated rows are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarehouseTarget {
    /// Newline-delimited JSON files in a directory.
    Local { dir: PathBuf },
    /// BigQuery dataset.
    BigQuery {
        project: String,
        dataset: String,
        access_token: String,
    },
}

/// Destination table ids, one per resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub saved_albums: String,
    pub album_tracks: String,
    pub saved_tracks: String,
    pub saved_episodes: String,
    pub saved_shows: String,
    pub top_tracks: String,
    pub recently_played: String,
    pub playlists: String,
    pub playlist_tracks: String,
    pub genres: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            saved_albums: "my_albums".to_string(),
            album_tracks: "album_tracks".to_string(),
            saved_tracks: "saved_tracks".to_string(),
            saved_episodes: "saved_episodes".to_string(),
            saved_shows: "saved_shows".to_string(),
            top_tracks: "my_top_tracks".to_string(),
            recently_played: "my_played_tracks".to_string(),
            playlists: "my_playlists".to_string(),
            playlist_tracks: "my_playlists_tracks".to_string(),
            genres: "genres".to_string(),
        }
    }
}

impl TableNames {
    /// Table holding rows of `kind`.
    pub fn for_kind(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::SavedAlbums => &self.saved_albums,
            ResourceKind::AlbumTracks => &self.album_tracks,
            ResourceKind::SavedTracks => &self.saved_tracks,
            ResourceKind::SavedEpisodes => &self.saved_episodes,
            ResourceKind::SavedShows => &self.saved_shows,
            ResourceKind::TopTracks => &self.top_tracks,
            ResourceKind::RecentlyPlayed => &self.recently_played,
            ResourceKind::Playlists => &self.playlists,
            ResourceKind::PlaylistTracks => &self.playlist_tracks,
            ResourceKind::GenreSeeds => &self.genres,
        }
    }

    /// Apply `ETL_TABLE_<NAME>` overrides.
    fn with_overrides(mut self, lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let slots: [(&str, &mut String); 10] = [
            ("SAVED_ALBUMS", &mut self.saved_albums),
            ("ALBUM_TRACKS", &mut self.album_tracks),
            ("SAVED_TRACKS", &mut self.saved_tracks),
            ("SAVED_EPISODES", &mut self.saved_episodes),
            ("SAVED_SHOWS", &mut self.saved_shows),
            ("TOP_TRACKS", &mut self.top_tracks),
            ("RECENTLY_PLAYED", &mut self.recently_played),
            ("PLAYLISTS", &mut self.playlists),
            ("PLAYLIST_TRACKS", &mut self.playlist_tracks),
            ("GENRES", &mut self.genres),
        ];
        for (name, slot) in slots {
            if let Some(table) = non_empty(lookup(&format!("ETL_TABLE_{}", name))) {
                *slot = table;
            }
        }
        self
    }
}

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub access_token: String,
    pub api_base: String,
    pub page_size: u32,
    pub interval_hours: i64,
    pub reference_offset: FixedOffset,
    pub warehouse: WarehouseTarget,
    pub webhook_url: Option<String>,
    pub tables: TableNames,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let access_token = required(&lookup, "SPOTIFY_ACCESS_TOKEN")?;
        let api_base =
            non_empty(lookup("SPOTIFY_API_BASE")).unwrap_or_else(|| API_BASE_URL.to_string());

        let page_size: u32 = parsed(&lookup, "ETL_PAGE_SIZE")?.unwrap_or(MAX_PAGE_SIZE);
        let page_size = check_page_size(page_size)?;

        let interval_hours: i64 =
            parsed(&lookup, "ETL_INTERVAL_HOURS")?.unwrap_or(DEFAULT_INTERVAL_HOURS);
        lookback_window(interval_hours).map_err(|_| {
            PipelineError::ConfigError(format!(
                "ETL_INTERVAL_HOURS must be a positive number of hours in range, got {}",
                interval_hours
            ))
        })?;

        let offset_hours: i32 =
            parsed(&lookup, "ETL_REFERENCE_UTC_OFFSET")?.unwrap_or(DEFAULT_REFERENCE_OFFSET_HOURS);
        let reference_offset = FixedOffset::east_opt(offset_hours * 3600).ok_or_else(|| {
            PipelineError::ConfigError(format!(
                "ETL_REFERENCE_UTC_OFFSET out of range: {}",
                offset_hours
            ))
        })?;

        let warehouse = match non_empty(lookup("WAREHOUSE_DIR")) {
            Some(dir) => WarehouseTarget::Local {
                dir: PathBuf::from(dir),
            },
            None => WarehouseTarget::BigQuery {
                project: required(&lookup, "BIGQUERY_PROJECT")?,
                dataset: required(&lookup, "BIGQUERY_DATASET")?,
                access_token: required(&lookup, "BIGQUERY_ACCESS_TOKEN")?,
            },
        };

        Ok(Self {
            access_token,
            api_base,
            page_size,
            interval_hours,
            reference_offset,
            warehouse,
            webhook_url: non_empty(lookup("NOTIFY_WEBHOOK_URL")),
            tables: TableNames::default().with_overrides(&lookup),
        })
    }
}

/// Reject page sizes the API would refuse.
pub fn check_page_size(page_size: u32) -> Result<u32> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(PipelineError::ConfigError(format!(
            "page size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, page_size
        )));
    }
    Ok(page_size)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    non_empty(lookup(key))
        .ok_or_else(|| PipelineError::ConfigError(format!("{} is not set", key)))
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match non_empty(lookup(key)) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| PipelineError::ConfigError(format!("{} is not valid: {}", key, raw))),
        None => Ok(None),
    }
}
