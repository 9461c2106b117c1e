//! End-to-end job tests with in-memory collaborators.
//!
//! These tests drive the [`EtlRunner`] through complete jobs:
//! - Pagination across offset and token resources
//! - Validation failures that must not reach the warehouse
//! - Parent/child stages (album tracks, playlist tracks)
//! - Append-mode loading with the recency window

mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::*;
use serde_json::json;
use spotify_etl::api::Cursor;
use spotify_etl::error::{IntegrityError, PipelineError};
use spotify_etl::models::{FieldValue, Resource, ResourceKind, Row, TimeRange};
use spotify_etl::paginator::fetch_all;
use spotify_etl::runner::{EtlRunner, Job, JobSettings, StageOutcome};
use spotify_etl::warehouse::WriteMode;
use tokio_test::{assert_err, assert_ok};

type TestRunner = EtlRunner<FakeFetcher, RecordingLoader, RecordingNotifier>;

fn runner(fetcher: FakeFetcher) -> TestRunner {
    runner_with(fetcher, RecordingLoader::new(), JobSettings::default())
}

fn runner_with(fetcher: FakeFetcher, loader: RecordingLoader, settings: JobSettings) -> TestRunner {
    EtlRunner::new(fetcher, loader, RecordingNotifier::new(), settings)
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap()
}

fn album_tracks(album_id: &str) -> Resource {
    Resource::AlbumTracks {
        album_id: album_id.to_string(),
    }
}

fn playlist_tracks(playlist_id: &str) -> Resource {
    Resource::PlaylistTracks {
        playlist_id: playlist_id.to_string(),
    }
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_pagination_fetches_every_record() {
    let items: Vec<_> = (0..120).map(|i| saved_track(&format!("t{}", i))).collect();
    let fetcher = FakeFetcher::new().with_pages(
        Resource::SavedTracks,
        vec![
            page(items[0..50].to_vec(), Some(120), None),
            page(items[50..100].to_vec(), Some(120), None),
            page(items[100..120].to_vec(), Some(120), None),
        ],
    );

    let rows = assert_ok!(fetch_all(&fetcher, &Resource::SavedTracks, 50).await);

    assert_eq!(rows.len(), 120);
    assert_eq!(
        fetcher.calls_for(&Resource::SavedTracks),
        vec![Cursor::Offset(1), Cursor::Offset(51), Cursor::Offset(101)]
    );

    // API order is preserved
    let Row::SavedTrack(last) = &rows[119] else {
        panic!("expected saved track row");
    };
    assert_eq!(last.track_id.as_deref(), Some("t119"));
}

#[tokio::test]
async fn test_exact_multiple_with_total_needs_no_extra_call() {
    let items: Vec<_> = (0..100).map(|i| saved_track(&format!("t{}", i))).collect();
    let fetcher = FakeFetcher::new().with_pages(
        Resource::SavedTracks,
        vec![
            page(items[0..50].to_vec(), Some(100), None),
            page(items[50..100].to_vec(), Some(100), None),
        ],
    );

    let rows = assert_ok!(fetch_all(&fetcher, &Resource::SavedTracks, 50).await);

    assert_eq!(rows.len(), 100);
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test]
async fn test_full_page_then_empty_page_loads_fifty_rows() {
    let items: Vec<_> = (0..50).map(|i| saved_track(&format!("t{}", i))).collect();
    let fetcher = FakeFetcher::new().with_pages(
        Resource::SavedTracks,
        vec![page(items, None, None), page(vec![], None, None)],
    );
    let runner = runner(fetcher);

    let report = assert_ok!(runner.run(Job::SavedTracks, now()).await);

    assert_eq!(runner.fetcher().calls().len(), 2);
    assert_eq!(report.stages[0].outcome, StageOutcome::Loaded(50));

    let loads = runner.loader().calls();
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0].table, "saved_tracks");
    assert_eq!(loads[0].rows.len(), 50);
}

#[tokio::test]
async fn test_fetch_failure_discards_partial_rows() {
    let items: Vec<_> = (0..50).map(|i| saved_track(&format!("t{}", i))).collect();
    let fetcher = FakeFetcher::new().with_failure(
        Resource::SavedTracks,
        vec![page(items, Some(120), None)],
        "connection reset",
    );
    let runner = runner(fetcher);

    let err = assert_err!(runner.run(Job::SavedTracks, now()).await);

    assert!(matches!(err, PipelineError::FetchError(_)));
    assert!(runner.loader().calls().is_empty());

    let messages = runner.notifier().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, "saved-tracks: fetch failed");
    assert!(messages[0].1.contains("connection reset"));
}

#[tokio::test]
async fn test_zero_page_size_fails_without_fetching() {
    let fetcher = FakeFetcher::new().with_pages(
        Resource::SavedTracks,
        vec![page(vec![saved_track("t1")], None, None)],
    );
    let settings = JobSettings {
        page_size: 0,
        ..JobSettings::default()
    };
    let runner = runner_with(fetcher, RecordingLoader::new(), settings);

    let err = assert_err!(runner.run(Job::SavedTracks, now()).await);

    assert!(matches!(err, PipelineError::ConfigError(_)), "{:?}", err);
    assert!(runner.fetcher().calls().is_empty());
    assert!(runner.loader().calls().is_empty());
}

// ============================================================================
// Saved albums and album tracks
// ============================================================================

#[tokio::test]
async fn test_saved_albums_load_then_album_tracks() {
    let fetcher = FakeFetcher::new()
        .with_pages(
            Resource::SavedAlbums,
            vec![page(
                vec![saved_album("a1"), saved_album("a2"), saved_album("a3")],
                Some(3),
                None,
            )],
        )
        .with_pages(
            album_tracks("a1"),
            vec![page(vec![album_track("t1"), album_track("t2")], Some(2), None)],
        )
        .with_pages(album_tracks("a2"), vec![page(vec![album_track("t3")], Some(1), None)]);
    let runner = runner(fetcher);

    let report = assert_ok!(runner.run(Job::SavedAlbums, now()).await);

    assert_eq!(report.stages.len(), 2);
    assert_eq!(report.stages[0].table, "my_albums");
    assert_eq!(report.stages[0].outcome, StageOutcome::Loaded(3));
    assert_eq!(report.stages[1].kind, ResourceKind::AlbumTracks);
    assert_eq!(report.stages[1].outcome, StageOutcome::Loaded(3));
    assert_eq!(report.rows_loaded(), 6);

    let loads = runner.loader().calls();
    assert_eq!(loads[0].table, "my_albums");
    assert_eq!(loads[0].mode, WriteMode::Overwrite);
    assert_eq!(loads[0].rows.len(), 3);
    assert_eq!(loads[1].table, "album_tracks");
    assert_eq!(loads[1].mode, WriteMode::Overwrite);

    // The album id is copied into every track row
    let album_ids: Vec<_> = loads[1]
        .rows
        .iter()
        .map(|row| row.field("album_id").unwrap())
        .collect();
    assert_eq!(
        album_ids,
        vec![
            FieldValue::from("a1"),
            FieldValue::from("a1"),
            FieldValue::from("a2")
        ]
    );

    // Every album was asked for its tracks, including the empty one
    assert_eq!(runner.fetcher().calls_for(&album_tracks("a3")).len(), 1);

    let subjects: Vec<_> = runner
        .notifier()
        .messages()
        .into_iter()
        .map(|(subject, _)| subject)
        .collect();
    assert_eq!(
        subjects,
        vec!["saved-albums: my_albums loaded", "saved-albums: album_tracks loaded"]
    );
}

#[tokio::test]
async fn test_album_without_id_is_mapping_error() {
    let mut broken = saved_album("a2");
    broken["album"].as_object_mut().unwrap().remove("id");
    let fetcher = FakeFetcher::new().with_pages(
        Resource::SavedAlbums,
        vec![page(vec![saved_album("a1"), broken], Some(2), None)],
    );
    let runner = runner(fetcher);

    let err = assert_err!(runner.run(Job::SavedAlbums, now()).await);

    match err {
        PipelineError::MappingError { kind, field } => {
            assert_eq!(kind, ResourceKind::SavedAlbums);
            assert_eq!(field, "album.id");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(runner.loader().calls().is_empty());
    assert_eq!(runner.notifier().messages()[0].0, "saved-albums: mapping failed");
}

#[tokio::test]
async fn test_duplicate_albums_never_reach_the_warehouse() {
    let fetcher = FakeFetcher::new().with_pages(
        Resource::SavedAlbums,
        vec![page(
            vec![saved_album("a1"), saved_album("a2"), saved_album("a1")],
            Some(3),
            None,
        )],
    );
    let runner = runner(fetcher);

    let err = assert_err!(runner.run(Job::SavedAlbums, now()).await);

    assert!(matches!(
        err,
        PipelineError::IntegrityError(IntegrityError::DuplicateKey { .. })
    ));
    assert!(runner.loader().calls().is_empty());
    // The child stage never ran
    assert!(runner.fetcher().calls_for(&album_tracks("a1")).is_empty());
}

#[tokio::test]
async fn test_null_album_id_is_rejected_by_validation() {
    let mut nulled = saved_album("a1");
    nulled["album"]["id"] = json!(null);
    let fetcher = FakeFetcher::new()
        .with_pages(Resource::SavedAlbums, vec![page(vec![nulled], Some(1), None)]);
    let runner = runner(fetcher);

    let err = assert_err!(runner.run(Job::SavedAlbums, now()).await);

    match err {
        PipelineError::IntegrityError(IntegrityError::NullValue { field, row }) => {
            assert_eq!(field, "album_id");
            assert_eq!(row, 0);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(runner.loader().calls().is_empty());
}

// ============================================================================
// Playlists and playlist tracks
// ============================================================================

#[tokio::test]
async fn test_playlists_follow_tokens_then_load_items() {
    let fetcher = FakeFetcher::new()
        .with_pages(
            Resource::Playlists,
            vec![
                page(vec![playlist("p1")], Some(2), Some("playlists-page-2")),
                page(vec![playlist("p2")], Some(2), None),
            ],
        )
        .with_pages(
            playlist_tracks("p1"),
            vec![page(
                vec![
                    playlist_item("t1", "2024-01-01T00:00:00Z"),
                    // Same track added twice at different times
                    playlist_item("t1", "2024-01-05T00:00:00Z"),
                ],
                Some(2),
                None,
            )],
        )
        .with_pages(
            playlist_tracks("p2"),
            vec![page(vec![playlist_item("t1", "2024-01-01T00:00:00Z")], Some(1), None)],
        );
    let settings = JobSettings {
        page_size: 1,
        ..JobSettings::default()
    };
    let runner = runner_with(fetcher, RecordingLoader::new(), settings);

    let report = assert_ok!(runner.run(Job::Playlists, now()).await);

    assert_eq!(
        runner.fetcher().calls_for(&Resource::Playlists),
        vec![
            Cursor::Offset(1),
            Cursor::Token("playlists-page-2".to_string())
        ]
    );
    assert_eq!(report.stages[0].outcome, StageOutcome::Loaded(2));
    assert_eq!(report.stages[1].table, "my_playlists_tracks");
    assert_eq!(report.stages[1].outcome, StageOutcome::Loaded(3));
}

#[tokio::test]
async fn test_no_playlists_skips_the_whole_job() {
    let fetcher = FakeFetcher::new().with_pages(Resource::Playlists, vec![page(vec![], Some(0), None)]);
    let runner = runner(fetcher);

    let report = assert_ok!(runner.run(Job::Playlists, now()).await);

    assert_eq!(report.stages.len(), 1);
    assert_eq!(report.stages[0].outcome, StageOutcome::Skipped);
    assert_eq!(report.rows_loaded(), 0);
    assert!(runner.loader().calls().is_empty());
    assert!(runner.notifier().messages().is_empty());
    assert_eq!(runner.fetcher().calls().len(), 1);
}

// ============================================================================
// Top tracks, recently played, genres
// ============================================================================

#[tokio::test]
async fn test_top_tracks_load_all_three_windows_together() {
    let mut fetcher = FakeFetcher::new();
    for time_range in TimeRange::ALL {
        fetcher = fetcher.with_pages(
            Resource::TopTracks { time_range },
            vec![page(vec![top_track("t1"), top_track("t2")], Some(2), None)],
        );
    }
    let runner = runner(fetcher);

    let report = assert_ok!(runner.run(Job::TopTracks, now()).await);

    assert_eq!(report.stages.len(), 1);
    assert_eq!(report.stages[0].outcome, StageOutcome::Loaded(6));

    let loads = runner.loader().calls();
    assert_eq!(loads[0].table, "my_top_tracks");
    let ranges: Vec<_> = loads[0]
        .rows
        .iter()
        .map(|row| row.field("time_range").unwrap())
        .collect();
    assert_eq!(ranges[0], FieldValue::from("short_term"));
    assert_eq!(ranges[5], FieldValue::from("long_term"));
}

#[tokio::test]
async fn test_recently_played_appends_recent_plays() {
    let after = now() - Duration::hours(24);
    let resource = Resource::RecentlyPlayed { after };
    let fetcher = FakeFetcher::new().with_pages(
        resource.clone(),
        vec![page(
            vec![
                played_track("s1", "2024-03-02T10:00:00Z"),
                played_track("s2", "2024-03-02T09:00:00.123Z"),
            ],
            None,
            Some("older-plays"),
        )],
    );
    let runner = runner(fetcher);

    let report = assert_ok!(runner.run(Job::RecentlyPlayed, now()).await);

    assert_eq!(report.stages[0].table, "my_played_tracks");
    assert_eq!(report.stages[0].outcome, StageOutcome::Loaded(2));
    // Single request; the `next` link is not followed
    assert_eq!(runner.fetcher().calls_for(&resource).len(), 1);

    let loads = runner.loader().calls();
    assert_eq!(loads[0].mode, WriteMode::Append);
    assert_eq!(
        loads[0].rows[0].field("timestamp_"),
        Some(FieldValue::from("2024-03-02"))
    );
}

#[tokio::test]
async fn test_recently_played_rejects_stale_plays() {
    let after = now() - Duration::hours(24);
    let fetcher = FakeFetcher::new().with_pages(
        Resource::RecentlyPlayed { after },
        vec![page(
            vec![
                played_track("s1", "2024-03-02T10:00:00Z"),
                played_track("s2", "2024-03-01T11:59:59Z"),
            ],
            None,
            None,
        )],
    );
    let runner = runner(fetcher);

    let err = assert_err!(runner.run(Job::RecentlyPlayed, now()).await);

    match err {
        PipelineError::IntegrityError(IntegrityError::StaleTimestamp {
            elapsed_hours,
            interval_hours,
            ..
        }) => {
            assert_eq!(elapsed_hours, 24);
            assert_eq!(interval_hours, 24);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(runner.loader().calls().is_empty());
    assert_eq!(runner.notifier().messages()[0].0, "recently-played: validate failed");
}

#[tokio::test]
async fn test_recently_played_with_no_plays_is_skipped() {
    let runner = runner(FakeFetcher::new());

    let report = assert_ok!(runner.run(Job::RecentlyPlayed, now()).await);

    assert_eq!(report.stages[0].outcome, StageOutcome::Skipped);
    assert!(runner.loader().calls().is_empty());
}

#[tokio::test]
async fn test_out_of_range_interval_is_config_error() {
    let settings = JobSettings {
        interval_hours: 9_000_000_000_000_000,
        ..JobSettings::default()
    };
    let runner = runner_with(FakeFetcher::new(), RecordingLoader::new(), settings);

    let err = assert_err!(runner.run(Job::RecentlyPlayed, now()).await);

    assert!(matches!(err, PipelineError::ConfigError(_)), "{:?}", err);
    assert!(runner.fetcher().calls().is_empty());
    assert!(runner.loader().calls().is_empty());
    assert_eq!(runner.notifier().messages()[0].0, "recently-played: config failed");
}

#[tokio::test]
async fn test_genres_load_into_configured_table() {
    let fetcher = FakeFetcher::new().with_pages(
        Resource::GenreSeeds,
        vec![page(vec![json!("acoustic"), json!("jazz")], Some(2), None)],
    );
    let mut settings = JobSettings::default();
    settings.tables.genres = "genre_seeds".to_string();
    let runner = runner_with(fetcher, RecordingLoader::new(), settings);

    let report = assert_ok!(runner.run(Job::Genres, now()).await);

    assert_eq!(report.stages[0].table, "genre_seeds");
    assert_eq!(runner.loader().calls()[0].rows.len(), 2);
}

// ============================================================================
// Load failures
// ============================================================================

#[tokio::test]
async fn test_load_failure_is_reported() {
    let fetcher = FakeFetcher::new().with_pages(
        Resource::SavedTracks,
        vec![page(vec![saved_track("t1")], Some(1), None)],
    );
    let runner = runner_with(
        fetcher,
        RecordingLoader::failing_on("saved_tracks"),
        JobSettings::default(),
    );

    let err = assert_err!(runner.run(Job::SavedTracks, now()).await);

    assert!(matches!(err, PipelineError::LoadError(_)));
    let messages = runner.notifier().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, "saved-tracks: load failed");
}

#[tokio::test]
async fn test_child_load_failure_keeps_parent_load() {
    let fetcher = FakeFetcher::new()
        .with_pages(Resource::SavedAlbums, vec![page(vec![saved_album("a1")], Some(1), None)])
        .with_pages(album_tracks("a1"), vec![page(vec![album_track("t1")], Some(1), None)]);
    let runner = runner_with(
        fetcher,
        RecordingLoader::failing_on("album_tracks"),
        JobSettings::default(),
    );

    let err = assert_err!(runner.run(Job::SavedAlbums, now()).await);

    assert_eq!(err.to_string(), "Load error: table album_tracks is unavailable");
    let loads = runner.loader().calls();
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0].table, "my_albums");
}
