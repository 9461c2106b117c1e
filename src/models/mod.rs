//! Row models for warehouse tables.
//!
//! Every resource kind maps to one typed row struct with a fixed field set.
//! [`Row`] tags those structs so a single collection type flows through the
//! paginator, the validator and the loaders.

pub mod album;
pub mod common;
pub mod genre;
pub mod playlist;
pub mod show;
pub mod track;

use serde::Serialize;

// Re-exports for convenience
pub use album::{AlbumRow, AlbumTrackRow};
pub use common::{
    FieldValue, Paging, Resource, ResourceKind, TimeRange, UNKNOWN_NUMBER, UNKNOWN_RELEASE_DATE,
    UNKNOWN_TEXT,
};
pub use genre::GenreRow;
pub use playlist::{PlaylistRow, PlaylistTrackRow};
pub use show::{EpisodeRow, ShowRow};
pub use track::{PlayedTrackRow, SavedTrackRow, TopTrackRow};

/// One flattened record, ready for load.
///
/// Serializes as the bare column object of the wrapped struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Row {
    Album(AlbumRow),
    AlbumTrack(AlbumTrackRow),
    SavedTrack(SavedTrackRow),
    Episode(EpisodeRow),
    Show(ShowRow),
    TopTrack(TopTrackRow),
    PlayedTrack(PlayedTrackRow),
    Playlist(PlaylistRow),
    PlaylistTrack(PlaylistTrackRow),
    Genre(GenreRow),
}

impl Row {
    /// Resource kind this row was mapped from.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Row::Album(_) => ResourceKind::SavedAlbums,
            Row::AlbumTrack(_) => ResourceKind::AlbumTracks,
            Row::SavedTrack(_) => ResourceKind::SavedTracks,
            Row::Episode(_) => ResourceKind::SavedEpisodes,
            Row::Show(_) => ResourceKind::SavedShows,
            Row::TopTrack(_) => ResourceKind::TopTracks,
            Row::PlayedTrack(_) => ResourceKind::RecentlyPlayed,
            Row::Playlist(_) => ResourceKind::Playlists,
            Row::PlaylistTrack(_) => ResourceKind::PlaylistTracks,
            Row::Genre(_) => ResourceKind::GenreSeeds,
        }
    }

    /// Column name/value pairs, in table order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        match self {
            Row::Album(row) => row.fields(),
            Row::AlbumTrack(row) => row.fields(),
            Row::SavedTrack(row) => row.fields(),
            Row::Episode(row) => row.fields(),
            Row::Show(row) => row.fields(),
            Row::TopTrack(row) => row.fields(),
            Row::PlayedTrack(row) => row.fields(),
            Row::Playlist(row) => row.fields(),
            Row::PlaylistTrack(row) => row.fields(),
            Row::Genre(row) => row.fields(),
        }
    }

    /// Value of a single column, or `None` if the row has no such column.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields()
            .into_iter()
            .find(|(column, _)| *column == name)
            .map(|(_, value)| value)
    }
}
