use chrono::Utc;
use clap::{Parser, ValueEnum};
use spotify_etl::config::{check_page_size, WarehouseTarget};
use spotify_etl::notify::{LogNotifier, Notifier, WebhookNotifier};
use spotify_etl::validator::lookback_window;
use spotify_etl::warehouse::{BigQueryLoader, NdjsonLoader, WarehouseLoader};
use spotify_etl::{EtlRunner, Job, JobSettings, Settings, SpotifyApi, StageOutcome};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spotify-etl")]
#[command(about = "Load Spotify library data into a warehouse", long_about = None)]
struct Cli {
    /// Job to run
    #[arg(value_enum)]
    job: JobArg,

    /// Lookback window for recently-played, in hours (overrides ETL_INTERVAL_HOURS)
    #[arg(long)]
    interval_hours: Option<i64>,

    /// Items per API request, 1 to 50 (overrides ETL_PAGE_SIZE)
    #[arg(long)]
    page_size: Option<u32>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum JobArg {
    SavedAlbums,
    SavedTracks,
    SavedEpisodes,
    SavedShows,
    TopTracks,
    RecentlyPlayed,
    Playlists,
    Genres,
}

impl From<JobArg> for Job {
    fn from(job: JobArg) -> Self {
        match job {
            JobArg::SavedAlbums => Job::SavedAlbums,
            JobArg::SavedTracks => Job::SavedTracks,
            JobArg::SavedEpisodes => Job::SavedEpisodes,
            JobArg::SavedShows => Job::SavedShows,
            JobArg::TopTracks => Job::TopTracks,
            JobArg::RecentlyPlayed => Job::RecentlyPlayed,
            JobArg::Playlists => Job::Playlists,
            JobArg::Genres => Job::Genres,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let mut job_settings = JobSettings::from(&settings);
    if let Some(hours) = cli.interval_hours {
        lookback_window(hours)?;
        job_settings.interval_hours = hours;
    }
    if let Some(size) = cli.page_size {
        job_settings.page_size = check_page_size(size)?;
    }

    let fetcher = SpotifyApi::with_base_url(&settings.access_token, &settings.api_base)?;

    let loader: Box<dyn WarehouseLoader> = match &settings.warehouse {
        WarehouseTarget::Local { dir } => Box::new(NdjsonLoader::new(dir)),
        WarehouseTarget::BigQuery {
            project,
            dataset,
            access_token,
        } => Box::new(BigQueryLoader::new(project, dataset, access_token)?),
    };

    let notifier: Box<dyn Notifier> = match &settings.webhook_url {
        Some(url) => Box::new(WebhookNotifier::new(url)?),
        None => Box::new(LogNotifier),
    };

    let job = Job::from(cli.job);
    let runner = EtlRunner::new(fetcher, loader, notifier, job_settings);
    let report = runner.run(job, Utc::now()).await?;

    for stage in &report.stages {
        match stage.outcome {
            StageOutcome::Loaded(rows) => println!("✅ {}: {} rows loaded", stage.table, rows),
            StageOutcome::Skipped => println!("➖ {}: nothing to load", stage.table),
        }
    }

    Ok(())
}
