//! Album-related rows.
//!
//! This module contains the rows for the saved-albums table and for the
//! tracks of each saved album.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::FieldValue;

/// One saved album (`my_albums`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlbumRow {
    /// Spotify album ID.
    pub album_id: Option<String>,

    /// Album title.
    pub album_name: String,

    /// Record label.
    pub album_label: String,

    /// Popularity score (0-100).
    pub album_popularity: i64,

    /// Release date as reported by the API ("YYYY", "YYYY-MM" or "YYYY-MM-DD").
    pub album_release_date: String,

    /// Total number of tracks in the album.
    pub album_total_tracks: i64,

    /// Public URL of the album.
    pub album_url: String,

    /// Object type, always "album".
    pub album_type: String,

    /// ID of the first listed artist.
    pub artist_id: String,

    /// Name of the first listed artist.
    pub artist_name: String,

    /// When the album was saved to the library.
    #[serde(rename = "aded_at")]
    pub added_at: Option<DateTime<Utc>>,
}

impl AlbumRow {
    /// Column name/value pairs, in table order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("album_id", self.album_id.clone().into()),
            ("album_name", self.album_name.clone().into()),
            ("album_label", self.album_label.clone().into()),
            ("album_popularity", self.album_popularity.into()),
            ("album_release_date", self.album_release_date.clone().into()),
            ("album_total_tracks", self.album_total_tracks.into()),
            ("album_url", self.album_url.clone().into()),
            ("album_type", self.album_type.clone().into()),
            ("artist_id", self.artist_id.clone().into()),
            ("artist_name", self.artist_name.clone().into()),
            ("aded_at", self.added_at.into()),
        ]
    }
}

/// One track of a saved album (`album_tracks`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlbumTrackRow {
    /// Album the track belongs to.
    pub album_id: String,

    /// Spotify track ID.
    pub track_id: Option<String>,

    pub track_name: String,

    /// Object type, always "track".
    pub item_type: String,

    /// Duration in milliseconds.
    pub track_duration: i64,

    pub explicit: bool,
    pub is_local: bool,

    /// Position of the track on its disc (1-indexed).
    pub track_number: i64,

    pub artist_id: String,
    pub artist_name: String,
}

impl AlbumTrackRow {
    /// Column name/value pairs, in table order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("album_id", self.album_id.clone().into()),
            ("track_id", self.track_id.clone().into()),
            ("track_name", self.track_name.clone().into()),
            ("item_type", self.item_type.clone().into()),
            ("track_duration", self.track_duration.into()),
            ("explicit", self.explicit.into()),
            ("is_local", self.is_local.into()),
            ("track_number", self.track_number.into()),
            ("artist_id", self.artist_id.clone().into()),
            ("artist_name", self.artist_name.clone().into()),
        ]
    }
}
