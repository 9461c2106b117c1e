//! Common types shared across all row models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for optional text fields missing upstream.
pub const UNKNOWN_TEXT: &str = "unknown";

/// Placeholder for a missing release date.
pub const UNKNOWN_RELEASE_DATE: &str = "0000";

/// Placeholder for optional numeric fields missing upstream.
pub const UNKNOWN_NUMBER: i64 = -1;

/// Category of catalog data a job can fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    SavedAlbums,
    AlbumTracks,
    SavedTracks,
    SavedEpisodes,
    SavedShows,
    TopTracks,
    RecentlyPlayed,
    Playlists,
    PlaylistTracks,
    GenreSeeds,
}

impl ResourceKind {
    /// Kebab-case name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::SavedAlbums => "saved-albums",
            ResourceKind::AlbumTracks => "album-tracks",
            ResourceKind::SavedTracks => "saved-tracks",
            ResourceKind::SavedEpisodes => "saved-episodes",
            ResourceKind::SavedShows => "saved-shows",
            ResourceKind::TopTracks => "top-tracks",
            ResourceKind::RecentlyPlayed => "recently-played",
            ResourceKind::Playlists => "playlists",
            ResourceKind::PlaylistTracks => "playlist-tracks",
            ResourceKind::GenreSeeds => "genre-seeds",
        }
    }

    /// How the API pages through this resource.
    pub fn paging(&self) -> Paging {
        match self {
            ResourceKind::SavedAlbums
            | ResourceKind::AlbumTracks
            | ResourceKind::SavedTracks
            | ResourceKind::SavedEpisodes
            | ResourceKind::SavedShows
            | ResourceKind::TopTracks => Paging::Offset,
            ResourceKind::Playlists | ResourceKind::PlaylistTracks => Paging::Token,
            // The play history endpoint only serves the latest 50 plays.
            ResourceKind::RecentlyPlayed | ResourceKind::GenreSeeds => Paging::Single,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pagination style of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Numeric offset advanced by the number of rows already fetched.
    Offset,
    /// Continuation token (the `next` URL) handed back by the API.
    Token,
    /// Whole resource arrives in one response.
    Single,
}

/// Time window for the top-tracks endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRange {
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    /// All windows, in the order the job loads them.
    pub const ALL: [TimeRange; 3] = [
        TimeRange::ShortTerm,
        TimeRange::MediumTerm,
        TimeRange::LongTerm,
    ];

    /// API parameter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

/// A resource kind together with the request context it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    SavedAlbums,
    /// Tracks of one album; the id is copied into every row.
    AlbumTracks { album_id: String },
    SavedTracks,
    SavedEpisodes,
    SavedShows,
    TopTracks { time_range: TimeRange },
    /// Plays strictly after the given instant.
    RecentlyPlayed { after: DateTime<Utc> },
    Playlists,
    /// Items of one playlist; the id is copied into every row.
    PlaylistTracks { playlist_id: String },
    GenreSeeds,
}

impl Resource {
    /// The kind tag of this resource.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::SavedAlbums => ResourceKind::SavedAlbums,
            Resource::AlbumTracks { .. } => ResourceKind::AlbumTracks,
            Resource::SavedTracks => ResourceKind::SavedTracks,
            Resource::SavedEpisodes => ResourceKind::SavedEpisodes,
            Resource::SavedShows => ResourceKind::SavedShows,
            Resource::TopTracks { .. } => ResourceKind::TopTracks,
            Resource::RecentlyPlayed { .. } => ResourceKind::RecentlyPlayed,
            Resource::Playlists => ResourceKind::Playlists,
            Resource::PlaylistTracks { .. } => ResourceKind::PlaylistTracks,
            Resource::GenreSeeds => ResourceKind::GenreSeeds,
        }
    }
}

/// A single scalar cell of a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}
