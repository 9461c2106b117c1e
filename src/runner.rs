//! Job runner.
//!
//! This module wires the fetcher, validator, loader and notifier into the
//! extract-load jobs. Each job is one or more stages; a stage fetches every
//! page of its resources, validates the collection and loads it into one
//! table.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{error, info};

use crate::api::Fetcher;
use crate::config::{Settings, TableNames, MAX_PAGE_SIZE};
use crate::error::{PipelineError, Result};
use crate::models::{Resource, ResourceKind, Row, TimeRange};
use crate::notify::Notifier;
use crate::paginator::fetch_all;
use crate::validator::{
    default_reference_offset, lookback_window, validate, RecencyCheck, DEFAULT_INTERVAL_HOURS,
};
use crate::warehouse::{WarehouseLoader, WriteMode};

/// The extract-load jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    /// Saved albums, then the tracks of every loaded album.
    SavedAlbums,
    SavedTracks,
    SavedEpisodes,
    SavedShows,
    /// Top tracks for the short, medium and long term windows.
    TopTracks,
    /// Plays within the lookback interval, appended.
    RecentlyPlayed,
    /// Playlists, then the items of every loaded playlist.
    Playlists,
    Genres,
}

impl Job {
    pub fn as_str(&self) -> &'static str {
        match self {
            Job::SavedAlbums => "saved-albums",
            Job::SavedTracks => "saved-tracks",
            Job::SavedEpisodes => "saved-episodes",
            Job::SavedShows => "saved-shows",
            Job::TopTracks => "top-tracks",
            Job::RecentlyPlayed => "recently-played",
            Job::Playlists => "playlists",
            Job::Genres => "genres",
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knobs shared by every stage of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    pub page_size: u32,
    pub interval_hours: i64,
    pub reference_offset: FixedOffset,
    pub tables: TableNames,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            interval_hours: DEFAULT_INTERVAL_HOURS,
            reference_offset: default_reference_offset(),
            tables: TableNames::default(),
        }
    }
}

impl From<&Settings> for JobSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            page_size: settings.page_size,
            interval_hours: settings.interval_hours,
            reference_offset: settings.reference_offset,
            tables: settings.tables.clone(),
        }
    }
}

/// What happened to one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// This many rows were written.
    Loaded(usize),
    /// Nothing was fetched, so nothing was written.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub table: String,
    pub kind: ResourceKind,
    pub outcome: StageOutcome,
}

/// Result of a successful job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job: Job,
    pub stages: Vec<StageReport>,
}

impl JobReport {
    /// Rows written across all stages.
    pub fn rows_loaded(&self) -> usize {
        self.stages
            .iter()
            .map(|stage| match stage.outcome {
                StageOutcome::Loaded(n) => n,
                StageOutcome::Skipped => 0,
            })
            .sum()
    }
}

/// One fetch-validate-load unit.
struct StagePlan {
    kind: ResourceKind,
    resources: Vec<Resource>,
    primary_key: &'static [&'static str],
    mode: WriteMode,
    recency: Option<RecencyCheck>,
}

impl StagePlan {
    fn overwrite(resource: Resource, primary_key: &'static [&'static str]) -> Self {
        Self {
            kind: resource.kind(),
            resources: vec![resource],
            primary_key,
            mode: WriteMode::Overwrite,
            recency: None,
        }
    }
}

/// Runs extract-load jobs.
///
/// # Example
///
/// ```rust,no_run
/// use chrono::Utc;
/// use spotify_etl::notify::LogNotifier;
/// use spotify_etl::runner::{EtlRunner, Job, JobSettings};
/// use spotify_etl::warehouse::NdjsonLoader;
/// use spotify_etl::SpotifyApi;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let runner = EtlRunner::new(
///         SpotifyApi::new("access-token")?,
///         NdjsonLoader::new("warehouse"),
///         LogNotifier,
///         JobSettings::default(),
///     );
///
///     let report = runner.run(Job::SavedTracks, Utc::now()).await?;
///     println!("{} rows loaded", report.rows_loaded());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct EtlRunner<F, L, N> {
    fetcher: F,
    loader: L,
    notifier: N,
    settings: JobSettings,
}

impl<F: Fetcher, L: WarehouseLoader, N: Notifier> EtlRunner<F, L, N> {
    pub fn new(fetcher: F, loader: L, notifier: N, settings: JobSettings) -> Self {
        Self {
            fetcher,
            loader,
            notifier,
            settings,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    /// Run `job` as of `now`.
    ///
    /// `now` anchors the recently-played lookback window. The first failing
    /// stage ends the job; stages already loaded stay loaded.
    pub async fn run(&self, job: Job, now: DateTime<Utc>) -> Result<JobReport> {
        info!("Starting job {}", job);

        let mut stages = Vec::new();

        match job {
            Job::SavedAlbums => {
                let (report, albums) = self
                    .run_stage(job, StagePlan::overwrite(Resource::SavedAlbums, &["album_id"]))
                    .await?;
                let loaded = report.outcome != StageOutcome::Skipped;
                stages.push(report);

                if loaded {
                    let resources = albums
                        .iter()
                        .filter_map(|row| match row {
                            Row::Album(album) => album.album_id.clone(),
                            _ => None,
                        })
                        .map(|album_id| Resource::AlbumTracks { album_id })
                        .collect();
                    let stage = StagePlan {
                        kind: ResourceKind::AlbumTracks,
                        resources,
                        primary_key: &["album_id", "track_id"],
                        mode: WriteMode::Overwrite,
                        recency: None,
                    };
                    stages.push(self.run_stage(job, stage).await?.0);
                }
            }
            Job::SavedTracks => {
                let stage = StagePlan::overwrite(Resource::SavedTracks, &["track_id"]);
                stages.push(self.run_stage(job, stage).await?.0);
            }
            Job::SavedEpisodes => {
                let stage = StagePlan::overwrite(Resource::SavedEpisodes, &["episode_id"]);
                stages.push(self.run_stage(job, stage).await?.0);
            }
            Job::SavedShows => {
                let stage = StagePlan::overwrite(Resource::SavedShows, &["show_id"]);
                stages.push(self.run_stage(job, stage).await?.0);
            }
            Job::TopTracks => {
                let stage = StagePlan {
                    kind: ResourceKind::TopTracks,
                    resources: TimeRange::ALL
                        .iter()
                        .map(|&time_range| Resource::TopTracks { time_range })
                        .collect(),
                    primary_key: &["time_range", "track_id"],
                    mode: WriteMode::Overwrite,
                    recency: None,
                };
                stages.push(self.run_stage(job, stage).await?.0);
            }
            Job::RecentlyPlayed => {
                let interval_hours = self.settings.interval_hours;
                let after = lookback_window(interval_hours).and_then(|window| {
                    now.checked_sub_signed(window).ok_or_else(|| {
                        PipelineError::ConfigError(format!(
                            "interval of {} hours reaches before the earliest timestamp",
                            interval_hours
                        ))
                    })
                });
                let after = match after {
                    Ok(after) => after,
                    Err(e) => {
                        return Err(self
                            .report_failure(job, ResourceKind::RecentlyPlayed, e)
                            .await)
                    }
                };
                let stage = StagePlan {
                    kind: ResourceKind::RecentlyPlayed,
                    resources: vec![Resource::RecentlyPlayed { after }],
                    primary_key: &["played_at"],
                    mode: WriteMode::Append,
                    recency: Some(
                        RecencyCheck::new(now, interval_hours)
                            .with_reference_offset(self.settings.reference_offset),
                    ),
                };
                stages.push(self.run_stage(job, stage).await?.0);
            }
            Job::Playlists => {
                let (report, playlists) = self
                    .run_stage(job, StagePlan::overwrite(Resource::Playlists, &["playlist_id"]))
                    .await?;
                let loaded = report.outcome != StageOutcome::Skipped;
                stages.push(report);

                if loaded {
                    let resources = playlists
                        .iter()
                        .filter_map(|row| match row {
                            Row::Playlist(playlist) => playlist.playlist_id.clone(),
                            _ => None,
                        })
                        .map(|playlist_id| Resource::PlaylistTracks { playlist_id })
                        .collect();
                    let stage = StagePlan {
                        kind: ResourceKind::PlaylistTracks,
                        resources,
                        primary_key: &["playlist_id", "track_id", "added_at"],
                        mode: WriteMode::Overwrite,
                        recency: None,
                    };
                    stages.push(self.run_stage(job, stage).await?.0);
                }
            }
            Job::Genres => {
                let stage = StagePlan::overwrite(Resource::GenreSeeds, &["genres"]);
                stages.push(self.run_stage(job, stage).await?.0);
            }
        }

        let report = JobReport { job, stages };
        info!("Job {} finished, {} rows loaded", job, report.rows_loaded());
        Ok(report)
    }

    /// Run one stage, reporting failures to the log and the notifier.
    async fn run_stage(&self, job: Job, stage: StagePlan) -> Result<(StageReport, Vec<Row>)> {
        let kind = stage.kind;
        let table = self.settings.tables.for_kind(kind).to_string();

        match self.execute(&stage, &table).await {
            Ok((outcome, rows)) => {
                match outcome {
                    StageOutcome::Loaded(n) => {
                        self.notifier
                            .notify(
                                &format!("{}: {} loaded", job, table),
                                &format!("{} rows written to {} ({})", n, table, stage.mode),
                            )
                            .await;
                    }
                    StageOutcome::Skipped => {
                        info!(job = %job, kind = %kind, "Nothing to load into {}", table);
                    }
                }
                Ok((
                    StageReport {
                        table,
                        kind,
                        outcome,
                    },
                    rows,
                ))
            }
            Err(e) => Err(self.report_failure(job, kind, e).await),
        }
    }

    /// Log and notify a failed stage, handing the error back.
    async fn report_failure(
        &self,
        job: Job,
        kind: ResourceKind,
        e: PipelineError,
    ) -> PipelineError {
        let table = self.settings.tables.for_kind(kind);
        error!(
            job = %job,
            kind = %kind,
            stage = %e.stage(),
            table = %table,
            "Stage failed: {}",
            e
        );
        self.notifier
            .notify(
                &format!("{}: {} failed", job, e.stage()),
                &format!("{} stage for table {} failed: {}", e.stage(), table, e),
            )
            .await;
        e
    }

    async fn execute(&self, stage: &StagePlan, table: &str) -> Result<(StageOutcome, Vec<Row>)> {
        let mut rows = Vec::new();
        for resource in &stage.resources {
            rows.extend(fetch_all(&self.fetcher, resource, self.settings.page_size).await?);
        }
        info!("Fetched {} {} rows", rows.len(), stage.kind);

        if !validate(&rows, stage.primary_key, stage.recency.as_ref())? {
            return Ok((StageOutcome::Skipped, rows));
        }

        let written = self.loader.load(&rows, table, stage.mode).await?;
        Ok((StageOutcome::Loaded(written), rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_names() {
        assert_eq!(Job::RecentlyPlayed.to_string(), "recently-played");
        assert_eq!(Job::SavedAlbums.as_str(), "saved-albums");
    }

    #[test]
    fn test_rows_loaded_ignores_skipped_stages() {
        let report = JobReport {
            job: Job::Playlists,
            stages: vec![
                StageReport {
                    table: "my_playlists".to_string(),
                    kind: ResourceKind::Playlists,
                    outcome: StageOutcome::Loaded(4),
                },
                StageReport {
                    table: "my_playlists_tracks".to_string(),
                    kind: ResourceKind::PlaylistTracks,
                    outcome: StageOutcome::Skipped,
                },
            ],
        };
        assert_eq!(report.rows_loaded(), 4);
    }

    #[test]
    fn test_job_settings_from_settings() {
        let settings = Settings::from_lookup(|key| match key {
            "SPOTIFY_ACCESS_TOKEN" => Some("tok".to_string()),
            "WAREHOUSE_DIR" => Some("/tmp".to_string()),
            "ETL_PAGE_SIZE" => Some("10".to_string()),
            _ => None,
        })
        .unwrap();
        let job_settings = JobSettings::from(&settings);
        assert_eq!(job_settings.page_size, 10);
        assert_eq!(job_settings.interval_hours, 24);
    }
}
