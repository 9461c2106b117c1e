//! Paginated fetching.
//!
//! [`fetch_all`] drives a [`Fetcher`] across every page of a resource and
//! maps each raw record into a typed [`Row`], preserving API order.

use tracing::debug;

use crate::api::{Cursor, Fetcher, Page};
use crate::converters::map_record;
use crate::error::{PipelineError, Result};
use crate::models::{Paging, Resource, Row};

/// Fetch and map every record of `resource`.
///
/// The cursor advances by the number of rows already collected (offset
/// paging) or follows the continuation token handed back with each page
/// (token paging). Fetching stops when a page comes back short, the reported
/// total is reached, no token is returned, or the resource is single-page.
///
/// A fetch or mapping failure aborts the whole run; rows collected so far
/// are dropped. A zero `page_size` is a configuration error.
pub async fn fetch_all<F: Fetcher + ?Sized>(
    fetcher: &F,
    resource: &Resource,
    page_size: u32,
) -> Result<Vec<Row>> {
    if page_size == 0 {
        return Err(PipelineError::ConfigError(
            "page size must be at least 1".to_string(),
        ));
    }

    let kind = resource.kind();
    let paging = kind.paging();
    let mut rows: Vec<Row> = Vec::new();
    let mut cursor = Cursor::start();

    loop {
        debug!(kind = %kind, cursor = %cursor, "Fetching page");

        let page = fetcher.fetch_page(resource, &cursor, page_size).await?;
        let received = page.items.len();

        for raw in &page.items {
            rows.push(map_record(resource, raw)?);
        }

        debug!(
            kind = %kind,
            received,
            collected = rows.len(),
            total = ?page.total,
            "Page mapped"
        );

        match next_cursor(paging, &page, received, rows.len(), page_size) {
            Some(next) => cursor = next,
            None => break,
        }
    }

    Ok(rows)
}

/// Cursor of the page following `page`, or `None` when fetching is done.
fn next_cursor(
    paging: Paging,
    page: &Page,
    received: usize,
    collected: usize,
    page_size: u32,
) -> Option<Cursor> {
    if paging == Paging::Single || received < page_size as usize {
        return None;
    }
    if let Some(total) = page.total {
        if collected as u64 >= total {
            return None;
        }
    }

    match paging {
        Paging::Offset => Some(Cursor::Offset(collected as u64 + 1)),
        Paging::Token => page.next_cursor.clone().map(Cursor::Token),
        Paging::Single => None,
    }
}
