//! Resource fetching.
//!
//! The [`Fetcher`] trait is the boundary between the pipeline and the remote
//! catalog API. [`SpotifyApi`] is the production implementation; tests inject
//! in-memory fakes.

pub mod spotify;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::Resource;

pub use spotify::SpotifyApi;

/// Position of the next page to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// 1-based position of the next item. The first page starts at 1.
    Offset(u64),
    /// Continuation token handed back with the previous page.
    Token(String),
}

impl Cursor {
    /// Cursor for the first page of any resource.
    pub fn start() -> Self {
        Cursor::Offset(1)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Offset(position) => write!(f, "offset {}", position),
            Cursor::Token(token) => write!(f, "token {}", token),
        }
    }
}

/// One page of raw records plus pagination metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Raw items in API order.
    pub items: Vec<Value>,

    /// Total number of items, for resources that report one.
    pub total: Option<u64>,

    /// Continuation token for the next page, if any.
    pub next_cursor: Option<String>,
}

/// Source of raw catalog pages.
///
/// Authentication and transport retries are the implementation's concern.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch one page of `resource` starting at `cursor`.
    async fn fetch_page(&self, resource: &Resource, cursor: &Cursor, page_size: u32)
        -> Result<Page>;
}

