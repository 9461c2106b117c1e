//! Track-related rows.
//!
//! Saved tracks, top tracks and recently played tracks share most of
//! their columns but land in different tables with different keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::FieldValue;

/// One saved track (`saved_tracks`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SavedTrackRow {
    /// Spotify track ID.
    pub track_id: Option<String>,

    /// Track title.
    pub track_name: String,

    /// Duration in milliseconds.
    pub track_duration: i64,

    /// Whether the track has explicit content.
    pub explicit: bool,

    /// Public URL of the track.
    pub track_url: String,

    /// Whether the track is a local file.
    pub is_local: bool,

    /// Popularity score (0-100).
    pub popularity: i64,

    /// Object type, always "track".
    #[serde(rename = "type")]
    pub track_type: String,

    /// Track number on its disc (1-indexed).
    pub track_number: i64,

    pub album_type: String,
    pub album_id: Option<String>,
    pub album_name: String,
    pub album_release_date: String,
    pub album_total_tracks: i64,

    /// First listed artist.
    pub artist_id: String,
    pub artist_name: String,

    /// When the track was saved to the library.
    #[serde(rename = "aded_at")]
    pub added_at: Option<DateTime<Utc>>,
}

impl SavedTrackRow {
    /// Column name/value pairs, in table order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("track_id", self.track_id.clone().into()),
            ("track_name", self.track_name.clone().into()),
            ("track_duration", self.track_duration.into()),
            ("explicit", self.explicit.into()),
            ("track_url", self.track_url.clone().into()),
            ("is_local", self.is_local.into()),
            ("popularity", self.popularity.into()),
            ("type", self.track_type.clone().into()),
            ("track_number", self.track_number.into()),
            ("album_type", self.album_type.clone().into()),
            ("album_id", self.album_id.clone().into()),
            ("album_name", self.album_name.clone().into()),
            ("album_release_date", self.album_release_date.clone().into()),
            ("album_total_tracks", self.album_total_tracks.into()),
            ("artist_id", self.artist_id.clone().into()),
            ("artist_name", self.artist_name.clone().into()),
            ("aded_at", self.added_at.into()),
        ]
    }
}

/// One entry of the user's top tracks for a time range (`my_top_tracks`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TopTrackRow {
    /// "short_term", "medium_term" or "long_term".
    pub time_range: String,

    pub track_id: Option<String>,
    pub track_name: String,
    pub track_duration: i64,
    pub explicit: bool,
    pub track_url: String,
    pub is_local: bool,
    pub popularity: i64,

    #[serde(rename = "type")]
    pub track_type: String,

    pub track_number: i64,

    /// Object type of the nested album, always "album".
    pub album_type: String,

    /// Album kind: "album", "single" or "compilation".
    pub album_album_type: String,

    pub album_id: Option<String>,
    pub album_name: String,
    pub album_release_date: String,
    pub album_total_tracks: i64,
    pub artist_id: String,
    pub artist_name: String,
}

impl TopTrackRow {
    /// Column name/value pairs, in table order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("time_range", self.time_range.clone().into()),
            ("track_id", self.track_id.clone().into()),
            ("track_name", self.track_name.clone().into()),
            ("track_duration", self.track_duration.into()),
            ("explicit", self.explicit.into()),
            ("track_url", self.track_url.clone().into()),
            ("is_local", self.is_local.into()),
            ("popularity", self.popularity.into()),
            ("type", self.track_type.clone().into()),
            ("track_number", self.track_number.into()),
            ("album_type", self.album_type.clone().into()),
            ("album_album_type", self.album_album_type.clone().into()),
            ("album_id", self.album_id.clone().into()),
            ("album_name", self.album_name.clone().into()),
            ("album_release_date", self.album_release_date.clone().into()),
            ("album_total_tracks", self.album_total_tracks.into()),
            ("artist_id", self.artist_id.clone().into()),
            ("artist_name", self.artist_name.clone().into()),
        ]
    }
}

/// One play from the listening history (`my_played_tracks`).
///
/// Artist columns come from the album's first artist, not the track's.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayedTrackRow {
    pub song_name: String,
    pub song_url: String,
    pub song_id: Option<String>,
    pub song_release_date: String,
    pub album_name: String,
    pub album_url: String,
    pub duration_ms: i64,
    pub artist_name: String,
    pub artist_id: String,

    /// When the play happened. Primary key of the table.
    pub played_at: Option<DateTime<Utc>>,

    /// Calendar date (UTC) of `played_at`, "YYYY-MM-DD".
    #[serde(rename = "timestamp_")]
    pub played_date: Option<String>,
}

impl PlayedTrackRow {
    /// Column name/value pairs, in table order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("song_name", self.song_name.clone().into()),
            ("song_url", self.song_url.clone().into()),
            ("song_id", self.song_id.clone().into()),
            ("song_release_date", self.song_release_date.clone().into()),
            ("album_name", self.album_name.clone().into()),
            ("album_url", self.album_url.clone().into()),
            ("duration_ms", self.duration_ms.into()),
            ("artist_name", self.artist_name.clone().into()),
            ("artist_id", self.artist_id.clone().into()),
            ("played_at", self.played_at.into()),
            ("timestamp_", self.played_date.clone().into()),
        ]
    }
}
