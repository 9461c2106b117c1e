//! Playlist-related rows.
//!
//! This module contains the rows for the user's playlists and for the
//! items of each playlist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::FieldValue;

/// One playlist owned or followed by the user (`my_playlists`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaylistRow {
    /// Spotify playlist ID.
    pub playlist_id: Option<String>,

    /// Playlist title.
    pub playlist_name: String,

    /// Public URL of the playlist.
    pub playlist_url: String,

    pub playlist_owner_id: String,

    /// Display name of the owner.
    pub playlist_owner: String,

    pub playlist_owner_url: String,
    pub playlist_owner_type: String,

    /// Whether the playlist is public. Unknown visibility maps to false.
    pub is_public: bool,

    /// Number of items in the playlist.
    pub total_track: i64,

    pub playlist_type: String,
}

impl PlaylistRow {
    /// Column name/value pairs, in table order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("playlist_id", self.playlist_id.clone().into()),
            ("playlist_name", self.playlist_name.clone().into()),
            ("playlist_url", self.playlist_url.clone().into()),
            ("playlist_owner_id", self.playlist_owner_id.clone().into()),
            ("playlist_owner", self.playlist_owner.clone().into()),
            ("playlist_owner_url", self.playlist_owner_url.clone().into()),
            ("playlist_owner_type", self.playlist_owner_type.clone().into()),
            ("is_public", self.is_public.into()),
            ("total_track", self.total_track.into()),
            ("playlist_type", self.playlist_type.clone().into()),
        ]
    }
}

/// One item of a playlist (`my_playlists_tracks`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaylistTrackRow {
    /// Playlist the item belongs to.
    pub playlist_id: String,

    pub track_id: Option<String>,
    pub track_name: String,
    pub artist_id: String,
    pub artist_name: String,
    pub artist_type: String,
    pub album_id: String,
    pub album_name: String,

    /// Album kind: "album", "single" or "compilation".
    pub album_type: String,

    pub album_release_date: String,
    pub album_total_tracks: i64,
    pub track_type: String,

    /// Duration in milliseconds.
    #[serde(rename = "duraiton")]
    pub duration: i64,

    /// When the item was added to the playlist.
    pub added_at: Option<DateTime<Utc>>,

    /// User ID of whoever added the item.
    pub added_by: String,

    pub is_explicit: bool,
}

impl PlaylistTrackRow {
    /// Column name/value pairs, in table order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("playlist_id", self.playlist_id.clone().into()),
            ("track_id", self.track_id.clone().into()),
            ("track_name", self.track_name.clone().into()),
            ("artist_id", self.artist_id.clone().into()),
            ("artist_name", self.artist_name.clone().into()),
            ("artist_type", self.artist_type.clone().into()),
            ("album_id", self.album_id.clone().into()),
            ("album_name", self.album_name.clone().into()),
            ("album_type", self.album_type.clone().into()),
            ("album_release_date", self.album_release_date.clone().into()),
            ("album_total_tracks", self.album_total_tracks.into()),
            ("track_type", self.track_type.clone().into()),
            ("duraiton", self.duration.into()),
            ("added_at", self.added_at.into()),
            ("added_by", self.added_by.clone().into()),
            ("is_explicit", self.is_explicit.into()),
        ]
    }
}
