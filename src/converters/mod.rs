//! JSON to row converters.
//!
//! This module turns raw Spotify Web API items into typed rows. Every
//! mapping is a pure function of the resource and the item.
//!
//! Two kinds of fields are distinguished:
//!
//! - **Mandatory** fields (item identifiers, nested album/show identifiers,
//!   `added_at` / `played_at`). A missing key means the upstream schema
//!   changed and fails with [`PipelineError::MappingError`]. A key that is
//!   present but `null` is kept as a null value for the validator to reject.
//! - **Optional** fields. Missing or `null` values are replaced with the
//!   sentinels from [`crate::models::common`] so every row of a kind has the
//!   same populated field set.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::models::{
    AlbumRow, AlbumTrackRow, EpisodeRow, GenreRow, PlayedTrackRow, PlaylistRow, PlaylistTrackRow,
    Resource, ResourceKind, Row, SavedTrackRow, ShowRow, TimeRange, TopTrackRow, UNKNOWN_NUMBER,
    UNKNOWN_RELEASE_DATE, UNKNOWN_TEXT,
};

static NULL: Value = Value::Null;

/// Outcome of following a key path through nested JSON.
enum Lookup<'a> {
    Absent,
    Null,
    Present(&'a Value),
}

fn lookup<'a>(json: &'a Value, path: &[&str]) -> Lookup<'a> {
    let mut current = json;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            // A null parent makes every child null rather than absent.
            None if current.is_null() => return Lookup::Null,
            None => return Lookup::Absent,
        }
    }

    if current.is_null() {
        Lookup::Null
    } else {
        Lookup::Present(current)
    }
}

fn path_name(path: &[&str]) -> String {
    if path.is_empty() {
        "item".to_string()
    } else {
        path.join(".")
    }
}

/// First-entry policy for multi-valued fields.
///
/// When an item lists several sub-entities (performing artists, show
/// languages), the first one supplies the row's columns. An absent or empty
/// list yields `null`, which downstream accessors turn into sentinels.
pub fn first_entry<'a>(json: &'a Value, path: &[&str]) -> &'a Value {
    match lookup(json, path) {
        Lookup::Present(Value::Array(entries)) => entries.first().unwrap_or(&NULL),
        _ => &NULL,
    }
}

/// A raw item being mapped, tagged with its kind for error reporting.
#[derive(Clone, Copy)]
struct Item<'a> {
    kind: ResourceKind,
    json: &'a Value,
}

impl<'a> Item<'a> {
    fn new(kind: ResourceKind, json: &'a Value) -> Self {
        Self { kind, json }
    }

    fn missing(&self, path: &[&str]) -> PipelineError {
        PipelineError::MappingError {
            kind: self.kind,
            field: path_name(path),
        }
    }

    /// Sub-item selected by the first-entry policy.
    fn first(&self, path: &[&str]) -> Item<'a> {
        Item::new(self.kind, first_entry(self.json, path))
    }

    fn text(&self, path: &[&str]) -> String {
        match lookup(self.json, path) {
            Lookup::Present(Value::String(s)) => s.clone(),
            Lookup::Present(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
            _ => UNKNOWN_TEXT.to_string(),
        }
    }

    fn release_date(&self, path: &[&str]) -> String {
        match lookup(self.json, path) {
            Lookup::Present(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => UNKNOWN_RELEASE_DATE.to_string(),
        }
    }

    fn number(&self, path: &[&str]) -> i64 {
        match lookup(self.json, path) {
            Lookup::Present(v) => v.as_i64().unwrap_or(UNKNOWN_NUMBER),
            _ => UNKNOWN_NUMBER,
        }
    }

    fn flag(&self, path: &[&str]) -> bool {
        match lookup(self.json, path) {
            Lookup::Present(v) => v.as_bool().unwrap_or(false),
            _ => false,
        }
    }

    /// Mandatory identifier (string or numeric).
    fn id(&self, path: &[&str]) -> Result<Option<String>> {
        match lookup(self.json, path) {
            Lookup::Absent => Err(self.missing(path)),
            Lookup::Null => Ok(None),
            Lookup::Present(Value::String(s)) => Ok(Some(s.clone())),
            Lookup::Present(Value::Number(n)) => Ok(Some(n.to_string())),
            Lookup::Present(_) => Err(self.missing(path)),
        }
    }

    /// Mandatory RFC 3339 timestamp.
    fn timestamp(&self, path: &[&str]) -> Result<Option<DateTime<Utc>>> {
        match lookup(self.json, path) {
            Lookup::Absent => Err(self.missing(path)),
            Lookup::Null => Ok(None),
            Lookup::Present(Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|ts| Some(ts.with_timezone(&Utc)))
                .map_err(|_| self.missing(path)),
            Lookup::Present(_) => Err(self.missing(path)),
        }
    }
}

/// Map one raw API item of `resource` into its row.
pub fn map_record(resource: &Resource, raw: &Value) -> Result<Row> {
    let item = Item::new(resource.kind(), raw);

    let row = match resource {
        Resource::SavedAlbums => Row::Album(parse_saved_album(item)?),
        Resource::AlbumTracks { album_id } => Row::AlbumTrack(parse_album_track(item, album_id)?),
        Resource::SavedTracks => Row::SavedTrack(parse_saved_track(item)?),
        Resource::SavedEpisodes => Row::Episode(parse_saved_episode(item)?),
        Resource::SavedShows => Row::Show(parse_saved_show(item)?),
        Resource::TopTracks { time_range } => Row::TopTrack(parse_top_track(item, *time_range)?),
        Resource::RecentlyPlayed { .. } => Row::PlayedTrack(parse_played_track(item)?),
        Resource::Playlists => Row::Playlist(parse_playlist(item)?),
        Resource::PlaylistTracks { playlist_id } => {
            Row::PlaylistTrack(parse_playlist_track(item, playlist_id)?)
        }
        Resource::GenreSeeds => Row::Genre(parse_genre(item)?),
    };

    Ok(row)
}

/// Saved album: `{ "added_at", "album": { ... } }`.
fn parse_saved_album(item: Item<'_>) -> Result<AlbumRow> {
    let artist = item.first(&["album", "artists"]);

    Ok(AlbumRow {
        album_id: item.id(&["album", "id"])?,
        album_name: item.text(&["album", "name"]),
        album_label: item.text(&["album", "label"]),
        album_popularity: item.number(&["album", "popularity"]),
        album_release_date: item.release_date(&["album", "release_date"]),
        album_total_tracks: item.number(&["album", "total_tracks"]),
        album_url: item.text(&["album", "external_urls", "spotify"]),
        album_type: item.text(&["album", "type"]),
        artist_id: artist.text(&["id"]),
        artist_name: artist.text(&["name"]),
        added_at: item.timestamp(&["added_at"])?,
    })
}

/// Simplified track object from `albums/{id}/tracks`.
fn parse_album_track(item: Item<'_>, album_id: &str) -> Result<AlbumTrackRow> {
    let artist = item.first(&["artists"]);

    Ok(AlbumTrackRow {
        album_id: album_id.to_string(),
        track_id: item.id(&["id"])?,
        track_name: item.text(&["name"]),
        item_type: item.text(&["type"]),
        track_duration: item.number(&["duration_ms"]),
        explicit: item.flag(&["explicit"]),
        is_local: item.flag(&["is_local"]),
        track_number: item.number(&["track_number"]),
        artist_id: artist.text(&["id"]),
        artist_name: artist.text(&["name"]),
    })
}

/// Saved track: `{ "added_at", "track": { ... } }`.
fn parse_saved_track(item: Item<'_>) -> Result<SavedTrackRow> {
    let artist = item.first(&["track", "artists"]);

    Ok(SavedTrackRow {
        track_id: item.id(&["track", "id"])?,
        track_name: item.text(&["track", "name"]),
        track_duration: item.number(&["track", "duration_ms"]),
        explicit: item.flag(&["track", "explicit"]),
        track_url: item.text(&["track", "external_urls", "spotify"]),
        is_local: item.flag(&["track", "is_local"]),
        popularity: item.number(&["track", "popularity"]),
        track_type: item.text(&["track", "type"]),
        track_number: item.number(&["track", "track_number"]),
        album_type: item.text(&["track", "album", "type"]),
        album_id: item.id(&["track", "album", "id"])?,
        album_name: item.text(&["track", "album", "name"]),
        album_release_date: item.release_date(&["track", "album", "release_date"]),
        album_total_tracks: item.number(&["track", "album", "total_tracks"]),
        artist_id: artist.text(&["id"]),
        artist_name: artist.text(&["name"]),
        added_at: item.timestamp(&["added_at"])?,
    })
}

/// Saved episode: `{ "added_at", "episode": { ..., "show": { ... } } }`.
fn parse_saved_episode(item: Item<'_>) -> Result<EpisodeRow> {
    Ok(EpisodeRow {
        episode_id: item.id(&["episode", "id"])?,
        episode_name: item.text(&["episode", "name"]),
        episode_description: item.text(&["episode", "description"]),
        episode_duration: item.number(&["episode", "duration_ms"]),
        explicit: item.flag(&["episode", "explicit"]),
        episode_url: item.text(&["episode", "external_urls", "spotify"]),
        is_externally_hosted: item.flag(&["episode", "is_externally_hosted"]),
        is_playable: item.flag(&["episode", "is_playable"]),
        language: item.text(&["episode", "language"]),
        release_date: item.release_date(&["episode", "release_date"]),
        episode_type: item.text(&["episode", "type"]),
        show_description: item.text(&["episode", "show", "description"]),
        show_explicit: item.flag(&["episode", "show", "explicit"]),
        show_url: item.text(&["episode", "show", "external_urls", "spotify"]),
        show_id: item.id(&["episode", "show", "id"])?,
        show_name: item.text(&["episode", "show", "name"]),
        show_publisher: item.text(&["episode", "show", "publisher"]),
        show_total_episodes: item.number(&["episode", "show", "total_episodes"]),
        show_is_externally_hosted: item.flag(&["episode", "show", "is_externally_hosted"]),
        show_media_type: item.text(&["episode", "show", "media_type"]),
        added_at: item.timestamp(&["added_at"])?,
    })
}

/// Saved show: `{ "added_at", "show": { ... } }`.
fn parse_saved_show(item: Item<'_>) -> Result<ShowRow> {
    let language = item.first(&["show", "languages"]);

    Ok(ShowRow {
        show_id: item.id(&["show", "id"])?,
        show_name: item.text(&["show", "name"]),
        show_description: item.text(&["show", "description"]),
        explicit: item.flag(&["show", "explicit"]),
        show_url: item.text(&["show", "external_urls", "spotify"]),
        is_externally_hosted: item.flag(&["show", "is_externally_hosted"]),
        language: language.text(&[]),
        show_type: item.text(&["show", "type"]),
        show_publisher: item.text(&["show", "publisher"]),
        show_total_episodes: item.number(&["show", "total_episodes"]),
        show_media_type: item.text(&["show", "media_type"]),
        added_at: item.timestamp(&["added_at"])?,
    })
}

/// Full track object from `me/top/tracks`.
fn parse_top_track(item: Item<'_>, time_range: TimeRange) -> Result<TopTrackRow> {
    let artist = item.first(&["artists"]);

    Ok(TopTrackRow {
        time_range: time_range.as_str().to_string(),
        track_id: item.id(&["id"])?,
        track_name: item.text(&["name"]),
        track_duration: item.number(&["duration_ms"]),
        explicit: item.flag(&["explicit"]),
        track_url: item.text(&["external_urls", "spotify"]),
        is_local: item.flag(&["is_local"]),
        popularity: item.number(&["popularity"]),
        track_type: item.text(&["type"]),
        track_number: item.number(&["track_number"]),
        album_type: item.text(&["album", "type"]),
        album_album_type: item.text(&["album", "album_type"]),
        album_id: item.id(&["album", "id"])?,
        album_name: item.text(&["album", "name"]),
        album_release_date: item.release_date(&["album", "release_date"]),
        album_total_tracks: item.number(&["album", "total_tracks"]),
        artist_id: artist.text(&["id"]),
        artist_name: artist.text(&["name"]),
    })
}

/// Play history object: `{ "played_at", "track": { ... } }`.
fn parse_played_track(item: Item<'_>) -> Result<PlayedTrackRow> {
    let artist = item.first(&["track", "album", "artists"]);
    let played_at = item.timestamp(&["played_at"])?;

    Ok(PlayedTrackRow {
        song_name: item.text(&["track", "name"]),
        song_url: item.text(&["track", "external_urls", "spotify"]),
        song_id: item.id(&["track", "id"])?,
        song_release_date: item.release_date(&["track", "album", "release_date"]),
        album_name: item.text(&["track", "album", "name"]),
        album_url: item.text(&["track", "album", "external_urls", "spotify"]),
        duration_ms: item.number(&["track", "duration_ms"]),
        artist_name: artist.text(&["name"]),
        artist_id: artist.text(&["id"]),
        played_at,
        played_date: played_at.map(|ts| ts.format("%Y-%m-%d").to_string()),
    })
}

/// Simplified playlist object from `me/playlists`.
fn parse_playlist(item: Item<'_>) -> Result<PlaylistRow> {
    Ok(PlaylistRow {
        playlist_id: item.id(&["id"])?,
        playlist_name: item.text(&["name"]),
        playlist_url: item.text(&["external_urls", "spotify"]),
        playlist_owner_id: item.text(&["owner", "id"]),
        playlist_owner: item.text(&["owner", "display_name"]),
        playlist_owner_url: item.text(&["owner", "external_urls", "spotify"]),
        playlist_owner_type: item.text(&["owner", "type"]),
        is_public: item.flag(&["public"]),
        total_track: item.number(&["tracks", "total"]),
        playlist_type: item.text(&["type"]),
    })
}

/// Playlist item: `{ "added_at", "added_by", "track": { ... } }`.
fn parse_playlist_track(item: Item<'_>, playlist_id: &str) -> Result<PlaylistTrackRow> {
    let artist = item.first(&["track", "artists"]);

    Ok(PlaylistTrackRow {
        playlist_id: playlist_id.to_string(),
        track_id: item.id(&["track", "id"])?,
        track_name: item.text(&["track", "name"]),
        artist_id: artist.text(&["id"]),
        artist_name: artist.text(&["name"]),
        artist_type: artist.text(&["type"]),
        album_id: item.text(&["track", "album", "id"]),
        album_name: item.text(&["track", "album", "name"]),
        album_type: item.text(&["track", "album", "album_type"]),
        album_release_date: item.release_date(&["track", "album", "release_date"]),
        album_total_tracks: item.number(&["track", "album", "total_tracks"]),
        track_type: item.text(&["track", "type"]),
        duration: item.number(&["track", "duration_ms"]),
        added_at: item.timestamp(&["added_at"])?,
        added_by: item.text(&["added_by", "id"]),
        is_explicit: item.flag(&["track", "explicit"]),
    })
}

/// Genre seeds arrive as bare strings.
fn parse_genre(item: Item<'_>) -> Result<GenreRow> {
    match item.json {
        Value::String(genre) => Ok(GenreRow {
            genre: Some(genre.clone()),
        }),
        Value::Null => Ok(GenreRow { genre: None }),
        _ => Err(PipelineError::MappingError {
            kind: item.kind,
            field: "genre".to_string(),
        }),
    }
}
