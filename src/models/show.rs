//! Podcast rows: saved shows and saved episodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::FieldValue;

/// One saved show (`saved_shows`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShowRow {
    /// Spotify show ID.
    pub show_id: Option<String>,

    pub show_name: String,
    pub show_description: String,
    pub explicit: bool,
    pub show_url: String,
    pub is_externally_hosted: bool,

    /// First language listed for the show.
    pub language: String,

    #[serde(rename = "type")]
    pub show_type: String,

    pub show_publisher: String,

    #[serde(rename = "shwo_total_episodes")]
    pub show_total_episodes: i64,

    /// "audio", "video" or "mixed".
    pub show_media_type: String,

    #[serde(rename = "aded_at")]
    pub added_at: Option<DateTime<Utc>>,
}

impl ShowRow {
    /// Column name/value pairs, in table order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("show_id", self.show_id.clone().into()),
            ("show_name", self.show_name.clone().into()),
            ("show_description", self.show_description.clone().into()),
            ("explicit", self.explicit.into()),
            ("show_url", self.show_url.clone().into()),
            ("is_externally_hosted", self.is_externally_hosted.into()),
            ("language", self.language.clone().into()),
            ("type", self.show_type.clone().into()),
            ("show_publisher", self.show_publisher.clone().into()),
            ("shwo_total_episodes", self.show_total_episodes.into()),
            ("show_media_type", self.show_media_type.clone().into()),
            ("aded_at", self.added_at.into()),
        ]
    }
}

/// One saved episode with its show (`saved_episodes`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EpisodeRow {
    /// Spotify episode ID.
    pub episode_id: Option<String>,

    pub episode_name: String,
    pub episode_description: String,

    /// Duration in milliseconds.
    pub episode_duration: i64,

    pub explicit: bool,
    pub episode_url: String,
    pub is_externally_hosted: bool,
    pub is_playable: bool,
    pub language: String,
    pub release_date: String,

    #[serde(rename = "type")]
    pub episode_type: String,

    pub show_description: String,
    pub show_explicit: bool,
    pub show_url: String,

    /// Show the episode belongs to.
    pub show_id: Option<String>,

    pub show_name: String,
    pub show_publisher: String,

    #[serde(rename = "shwo_total_episodes")]
    pub show_total_episodes: i64,

    pub show_is_externally_hosted: bool,
    pub show_media_type: String,

    #[serde(rename = "aded_at")]
    pub added_at: Option<DateTime<Utc>>,
}

impl EpisodeRow {
    /// Column name/value pairs, in table order.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("episode_id", self.episode_id.clone().into()),
            ("episode_name", self.episode_name.clone().into()),
            ("episode_description", self.episode_description.clone().into()),
            ("episode_duration", self.episode_duration.into()),
            ("explicit", self.explicit.into()),
            ("episode_url", self.episode_url.clone().into()),
            ("is_externally_hosted", self.is_externally_hosted.into()),
            ("is_playable", self.is_playable.into()),
            ("language", self.language.clone().into()),
            ("release_date", self.release_date.clone().into()),
            ("type", self.episode_type.clone().into()),
            ("show_description", self.show_description.clone().into()),
            ("show_explicit", self.show_explicit.into()),
            ("show_url", self.show_url.clone().into()),
            ("show_id", self.show_id.clone().into()),
            ("show_name", self.show_name.clone().into()),
            ("show_publisher", self.show_publisher.clone().into()),
            ("shwo_total_episodes", self.show_total_episodes.into()),
            (
                "show_is_externally_hosted",
                self.show_is_externally_hosted.into(),
            ),
            ("show_media_type", self.show_media_type.clone().into()),
            ("aded_at", self.added_at.into()),
        ]
    }
}
