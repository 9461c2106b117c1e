//! Sanity checks on a row collection before it is loaded.
//!
//! Checks run in a fixed order (emptiness, primary key, nulls, recency) and
//! the first violation ends validation.

use std::collections::HashSet;

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use tracing::{debug, info};

use crate::error::{IntegrityError, PipelineError, Result};
use crate::models::{FieldValue, Row};

/// Default lookback window for recently played tracks.
pub const DEFAULT_INTERVAL_HOURS: i64 = 24;

/// Default reference offset for the recency check, UTC+03:00.
pub const DEFAULT_REFERENCE_OFFSET_HOURS: i32 = 3;

/// Column the recency check reads.
const PLAYED_AT: &str = "played_at";

/// Lookback bound for play timestamps.
///
/// Both the run start and each row's `played_at` are expressed in the
/// reference offset before comparing. The bound is inclusive: a play exactly
/// `interval_hours` old passes, one second more fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyCheck {
    pub now: DateTime<Utc>,
    pub interval_hours: i64,
    pub reference_offset: FixedOffset,
}

impl RecencyCheck {
    pub fn new(now: DateTime<Utc>, interval_hours: i64) -> Self {
        Self {
            now,
            interval_hours,
            reference_offset: default_reference_offset(),
        }
    }

    pub fn with_reference_offset(mut self, offset: FixedOffset) -> Self {
        self.reference_offset = offset;
        self
    }

    /// Check one timestamp against the window.
    fn check(&self, timestamp: DateTime<Utc>) -> std::result::Result<(), IntegrityError> {
        let now = self.now.with_timezone(&self.reference_offset);
        let timestamp = timestamp.with_timezone(&self.reference_offset);
        let elapsed_secs = (now - timestamp).num_seconds();
        let stale = self
            .interval_hours
            .checked_mul(3600)
            .map_or(false, |limit_secs| elapsed_secs > limit_secs);

        if stale {
            return Err(IntegrityError::StaleTimestamp {
                timestamp,
                elapsed_hours: elapsed_secs.div_euclid(3600),
                interval_hours: self.interval_hours,
            });
        }
        Ok(())
    }
}

/// Lookback window of `interval_hours`.
///
/// The interval must be positive and small enough to subtract from a
/// timestamp.
pub fn lookback_window(interval_hours: i64) -> Result<Duration> {
    if interval_hours <= 0 {
        return Err(PipelineError::ConfigError(format!(
            "interval must be a positive number of hours, got {}",
            interval_hours
        )));
    }
    Duration::try_hours(interval_hours).ok_or_else(|| {
        PipelineError::ConfigError(format!("interval of {} hours is out of range", interval_hours))
    })
}

/// UTC+03:00.
pub fn default_reference_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_REFERENCE_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix())
}

/// Validate `rows` before load.
///
/// Returns `Ok(false)` for an empty collection (nothing to load), `Ok(true)`
/// when every check passes, and an [`IntegrityError`] for the first
/// violation found. An empty `primary_key` skips the uniqueness check; a key
/// column the rows do not have is a configuration error.
pub fn validate(
    rows: &[Row],
    primary_key: &[&str],
    recency: Option<&RecencyCheck>,
) -> Result<bool> {
    if rows.is_empty() {
        info!("No rows fetched, nothing to load");
        return Ok(false);
    }

    check_primary_key(rows, primary_key)?;
    check_nulls(rows)?;
    if let Some(recency) = recency {
        check_recency(rows, recency)?;
    }

    debug!(rows = rows.len(), "Validation passed");
    Ok(true)
}

fn check_primary_key(rows: &[Row], primary_key: &[&str]) -> Result<()> {
    if primary_key.is_empty() {
        return Ok(());
    }

    let mut seen: HashSet<Vec<FieldValue>> = HashSet::with_capacity(rows.len());
    for row in rows {
        let fields = row.fields();
        let mut tuple = Vec::with_capacity(primary_key.len());
        for column in primary_key {
            let value = lookup(&fields, column).ok_or_else(|| {
                PipelineError::ConfigError(format!(
                    "primary key column `{}` does not exist on {} rows",
                    column,
                    row.kind()
                ))
            })?;
            tuple.push(value.clone());
        }
        seen.insert(tuple);
    }

    if seen.len() < rows.len() {
        return Err(IntegrityError::DuplicateKey {
            keys: primary_key.join(", "),
            duplicates: rows.len() - seen.len(),
        }
        .into());
    }
    Ok(())
}

fn check_nulls(rows: &[Row]) -> Result<()> {
    for (index, row) in rows.iter().enumerate() {
        if let Some((field, _)) = row.fields().into_iter().find(|(_, value)| value.is_null()) {
            return Err(IntegrityError::NullValue { field, row: index }.into());
        }
    }
    Ok(())
}

fn check_recency(rows: &[Row], recency: &RecencyCheck) -> Result<()> {
    for row in rows {
        match row.field(PLAYED_AT) {
            Some(FieldValue::Timestamp(played_at)) => recency.check(played_at)?,
            _ => {
                return Err(PipelineError::ConfigError(format!(
                    "recency check needs a `{}` timestamp, {} rows have none",
                    PLAYED_AT,
                    row.kind()
                )))
            }
        }
    }
    Ok(())
}

fn lookup<'a>(fields: &'a [(&'static str, FieldValue)], column: &str) -> Option<&'a FieldValue> {
    fields
        .iter()
        .find(|(name, _)| *name == column)
        .map(|(_, value)| value)
}
