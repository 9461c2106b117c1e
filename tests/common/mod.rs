//! In-memory collaborators and JSON fixtures shared by integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use spotify_etl::api::{Cursor, Fetcher, Page};
use spotify_etl::error::{PipelineError, Result};
use spotify_etl::models::{Resource, Row};
use spotify_etl::notify::Notifier;
use spotify_etl::warehouse::{WarehouseLoader, WriteMode};

enum Reply {
    Page(Page),
    Fail(String),
}

/// Serves scripted pages per resource and records every request.
///
/// A resource with no replies left returns an empty page.
#[derive(Default)]
pub struct FakeFetcher {
    script: Mutex<Vec<(Resource, VecDeque<Reply>)>>,
    calls: Mutex<Vec<(Resource, Cursor)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(self, resource: Resource, pages: Vec<Page>) -> Self {
        self.push(resource, pages.into_iter().map(Reply::Page).collect());
        self
    }

    /// Serve `pages`, then fail the next request for `resource`.
    pub fn with_failure(self, resource: Resource, pages: Vec<Page>, message: &str) -> Self {
        let mut replies: Vec<Reply> = pages.into_iter().map(Reply::Page).collect();
        replies.push(Reply::Fail(message.to_string()));
        self.push(resource, replies);
        self
    }

    fn push(&self, resource: Resource, replies: Vec<Reply>) {
        self.script
            .lock()
            .unwrap()
            .push((resource, replies.into_iter().collect()));
    }

    pub fn calls(&self) -> Vec<(Resource, Cursor)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, resource: &Resource) -> Vec<Cursor> {
        self.calls()
            .into_iter()
            .filter(|(r, _)| r == resource)
            .map(|(_, cursor)| cursor)
            .collect()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch_page(
        &self,
        resource: &Resource,
        cursor: &Cursor,
        _page_size: u32,
    ) -> Result<Page> {
        self.calls
            .lock()
            .unwrap()
            .push((resource.clone(), cursor.clone()));

        let mut script = self.script.lock().unwrap();
        let reply = script
            .iter_mut()
            .find(|(r, _)| r == resource)
            .and_then(|(_, replies)| replies.pop_front());

        match reply {
            Some(Reply::Page(page)) => Ok(page),
            Some(Reply::Fail(message)) => Err(PipelineError::FetchError(message)),
            None => Ok(Page::default()),
        }
    }
}

/// One call made to [`RecordingLoader`].
#[derive(Debug, Clone)]
pub struct LoadCall {
    pub table: String,
    pub mode: WriteMode,
    pub rows: Vec<Row>,
}

/// Remembers every load; optionally fails loads into one table.
#[derive(Default)]
pub struct RecordingLoader {
    calls: Mutex<Vec<LoadCall>>,
    failing_table: Option<String>,
}

impl RecordingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(table: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_table: Some(table.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<LoadCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WarehouseLoader for RecordingLoader {
    async fn load(&self, rows: &[Row], table: &str, mode: WriteMode) -> Result<usize> {
        if self.failing_table.as_deref() == Some(table) {
            return Err(PipelineError::LoadError(format!("table {} is unavailable", table)));
        }
        self.calls.lock().unwrap().push(LoadCall {
            table: table.to_string(),
            mode,
            rows: rows.to_vec(),
        });
        Ok(rows.len())
    }
}

/// Remembers every notification as `(subject, body)`.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn page(items: Vec<Value>, total: Option<u64>, next: Option<&str>) -> Page {
    Page {
        items,
        total,
        next_cursor: next.map(|s| s.to_string()),
    }
}

pub fn saved_album(id: &str) -> Value {
    json!({
        "added_at": "2024-02-10T18:30:00Z",
        "album": {
            "id": id,
            "name": format!("Album {}", id),
            "label": "Label",
            "popularity": 50,
            "release_date": "2019-09-27",
            "total_tracks": 2,
            "external_urls": { "spotify": format!("https://open.spotify.com/album/{}", id) },
            "type": "album",
            "artists": [{ "id": "art1", "name": "Artist" }]
        }
    })
}

pub fn album_track(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Track {}", id),
        "type": "track",
        "duration_ms": 200000,
        "explicit": false,
        "is_local": false,
        "track_number": 1,
        "artists": [{ "id": "art1", "name": "Artist" }]
    })
}

pub fn saved_track(id: &str) -> Value {
    json!({
        "added_at": "2024-02-11T08:00:00Z",
        "track": {
            "id": id,
            "name": format!("Song {}", id),
            "duration_ms": 180000,
            "explicit": true,
            "popularity": 70,
            "type": "track",
            "track_number": 3,
            "album": { "id": "alb1", "name": "Album", "type": "album" },
            "artists": [{ "id": "art1", "name": "Artist" }]
        }
    })
}

pub fn top_track(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Hit {}", id),
        "popularity": 90,
        "album": { "id": "alb9", "name": "Hits", "album_type": "single" },
        "artists": [{ "id": "art9", "name": "Star" }]
    })
}

pub fn played_track(id: &str, played_at: &str) -> Value {
    json!({
        "played_at": played_at,
        "track": {
            "id": id,
            "name": format!("Song {}", id),
            "duration_ms": 210000,
            "album": {
                "name": "Album",
                "release_date": "2021",
                "artists": [{ "id": "art1", "name": "Artist" }]
            }
        }
    })
}

pub fn playlist(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Playlist {}", id),
        "public": true,
        "type": "playlist",
        "tracks": { "total": 1 },
        "owner": { "id": "me", "display_name": "Me", "type": "user" }
    })
}

pub fn playlist_item(track_id: &str, added_at: &str) -> Value {
    json!({
        "added_at": added_at,
        "added_by": { "id": "me" },
        "track": {
            "id": track_id,
            "name": format!("Song {}", track_id),
            "type": "track",
            "duration_ms": 199000,
            "album": { "id": "alb1", "name": "Album", "album_type": "album" },
            "artists": [{ "id": "art1", "name": "Artist", "type": "artist" }]
        }
    })
}
