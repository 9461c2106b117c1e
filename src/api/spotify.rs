//! Spotify Web API client.
//!
//! This module provides the production [`Fetcher`] for the Spotify Web API
//! (api.spotify.com). Requests carry a bearer token obtained elsewhere; the
//! authorization flow itself is not handled here.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, error};

use super::{Cursor, Fetcher, Page};
use crate::error::{PipelineError, Result};
use crate::models::{Paging, Resource, ResourceKind};

/// Base URL for the Spotify Web API.
pub const API_BASE_URL: &str = "https://api.spotify.com/v1/";

/// Spotify Web API client.
///
/// # Example
///
/// ```rust,no_run
/// use spotify_etl::api::{Cursor, Fetcher, SpotifyApi};
/// use spotify_etl::models::Resource;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = SpotifyApi::new("access-token")?;
///     let page = api
///         .fetch_page(&Resource::SavedTracks, &Cursor::start(), 50)
///         .await?;
///     println!("{} of {:?} saved tracks", page.items.len(), page.total);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SpotifyApi {
    client: Client,
    base_url: String,
    access_token: String,
}

impl SpotifyApi {
    /// Create a client for the public Spotify endpoint.
    pub fn new(access_token: &str) -> Result<Self> {
        Self::with_base_url(access_token, API_BASE_URL)
    }

    /// Create a client against another base URL (proxies, test servers).
    pub fn with_base_url(access_token: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("spotify-etl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        Ok(Self {
            client,
            base_url,
            access_token: access_token.to_string(),
        })
    }

    /// Make a GET request to an endpoint relative to the base URL.
    async fn get_api(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {} with params: {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(params)
            .send()
            .await?;

        read_response(response).await
    }

    /// Make a GET request to an absolute `next` URL returned by the API.
    async fn get_url(&self, url: &str) -> Result<Value> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        read_response(response).await
    }
}

#[async_trait]
impl Fetcher for SpotifyApi {
    async fn fetch_page(
        &self,
        resource: &Resource,
        cursor: &Cursor,
        page_size: u32,
    ) -> Result<Page> {
        let kind = resource.kind();

        let response = match cursor {
            Cursor::Token(next) => self.get_url(next).await?,
            Cursor::Offset(position) => {
                let (endpoint, mut params) = endpoint(resource);
                match kind {
                    ResourceKind::GenreSeeds => {}
                    _ => params.push(("limit", page_size.to_string())),
                }
                if kind.paging() == Paging::Offset {
                    // The API counts from 0.
                    params.push(("offset", position.saturating_sub(1).to_string()));
                }
                self.get_api(&endpoint, &params).await?
            }
        };

        parse_page(kind, &response)
    }
}

/// Endpoint path and fixed query parameters for a resource.
fn endpoint(resource: &Resource) -> (String, Vec<(&'static str, String)>) {
    match resource {
        Resource::SavedAlbums => ("me/albums".to_string(), Vec::new()),
        Resource::AlbumTracks { album_id } => (format!("albums/{}/tracks", album_id), Vec::new()),
        Resource::SavedTracks => ("me/tracks".to_string(), Vec::new()),
        Resource::SavedEpisodes => ("me/episodes".to_string(), Vec::new()),
        Resource::SavedShows => ("me/shows".to_string(), Vec::new()),
        Resource::TopTracks { time_range } => (
            "me/top/tracks".to_string(),
            vec![("time_range", time_range.as_str().to_string())],
        ),
        Resource::RecentlyPlayed { after } => (
            "me/player/recently-played".to_string(),
            vec![("after", after.timestamp_millis().to_string())],
        ),
        Resource::Playlists => ("me/playlists".to_string(), Vec::new()),
        Resource::PlaylistTracks { playlist_id } => {
            (format!("playlists/{}/tracks", playlist_id), Vec::new())
        }
        Resource::GenreSeeds => (
            "recommendations/available-genre-seeds".to_string(),
            Vec::new(),
        ),
    }
}

/// Check the status and decode the body of an API response.
async fn read_response(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;

    if status == StatusCode::TOO_MANY_REQUESTS {
        error!("Spotify API rate limit hit");
        return Err(PipelineError::QuotaExceeded);
    }

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|data| error_message(&data))
            .unwrap_or(body);
        error!("Spotify API error ({}): {}", status, message);

        return Err(if status == StatusCode::UNAUTHORIZED {
            PipelineError::BadCredentials(message)
        } else {
            PipelineError::FetchError(format!("{}: {}", status, message))
        });
    }

    Ok(serde_json::from_str(&body)?)
}

/// Extract the message of a Spotify error object.
///
/// Regular errors nest it (`{"error": {"status", "message"}}`), auth errors
/// use a flat string.
fn error_message(data: &Value) -> Option<String> {
    let error = data.get("error")?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(|s| s.to_string())
}

/// Split a response into a [`Page`].
fn parse_page(kind: ResourceKind, response: &Value) -> Result<Page> {
    if kind == ResourceKind::GenreSeeds {
        let items = response
            .get("genres")
            .and_then(|g| g.as_array())
            .cloned()
            .ok_or_else(|| PipelineError::FetchError("response has no genres".to_string()))?;

        return Ok(Page {
            total: Some(items.len() as u64),
            items,
            next_cursor: None,
        });
    }

    let items = response
        .get("items")
        .and_then(|i| i.as_array())
        .cloned()
        .ok_or_else(|| PipelineError::FetchError(format!("{} response has no items", kind)))?;

    Ok(Page {
        items,
        total: response.get("total").and_then(|t| t.as_u64()),
        next_cursor: response
            .get("next")
            .and_then(|n| n.as_str())
            .map(|s| s.to_string()),
    })
}
