//! BigQuery warehouse loader.
//!
//! Rows are sent as newline-delimited JSON in a multipart load-job upload
//! (`uploadType=multipart`), then the job is polled until BigQuery reports
//! it `DONE`. The destination table must already exist.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use super::{to_ndjson, WarehouseLoader, WriteMode};
use crate::error::{PipelineError, Result};
use crate::models::Row;

/// Root of the BigQuery REST API.
pub const BIGQUERY_ROOT_URL: &str = "https://bigquery.googleapis.com";

/// Multipart boundary for load-job uploads.
const BOUNDARY: &str = "spotify_etl_load_job";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_MAX_POLLS: u32 = 300;

/// Loads rows into `<project>.<dataset>.<table>` through BigQuery load jobs.
#[derive(Debug, Clone)]
pub struct BigQueryLoader {
    client: Client,
    root_url: String,
    project: String,
    dataset: String,
    access_token: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl BigQueryLoader {
    /// Create a loader for `project.dataset`, authenticated with an OAuth
    /// bearer token.
    pub fn new(project: &str, dataset: &str, access_token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("spotify-etl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            root_url: BIGQUERY_ROOT_URL.to_string(),
            project: project.to_string(),
            dataset: dataset.to_string(),
            access_token: access_token.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        })
    }

    /// Send requests to another API root (emulators, test servers).
    pub fn with_endpoint(mut self, root_url: &str) -> Self {
        self.root_url = root_url.trim_end_matches('/').to_string();
        self
    }

    /// Set the delay between job status polls and how many polls to make.
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/upload/bigquery/v2/projects/{}/jobs?uploadType=multipart",
            self.root_url, self.project
        )
    }

    fn job_url(&self, job_id: &str) -> String {
        format!(
            "{}/bigquery/v2/projects/{}/jobs/{}",
            self.root_url, self.project, job_id
        )
    }

    /// Load-job configuration for `table`.
    fn job_config(&self, table: &str, mode: WriteMode) -> Value {
        json!({
            "configuration": {
                "load": {
                    "destinationTable": {
                        "projectId": self.project,
                        "datasetId": self.dataset,
                        "tableId": table,
                    },
                    "sourceFormat": "NEWLINE_DELIMITED_JSON",
                    "writeDisposition": mode.disposition(),
                    "createDisposition": "CREATE_NEVER",
                }
            }
        })
    }

    /// Submit the load job and return the job resource.
    async fn insert_job(&self, table: &str, mode: WriteMode, ndjson: &str) -> Result<Value> {
        let body = multipart_body(&self.job_config(table, mode), ndjson);
        let url = self.upload_url();
        debug!("POST {} ({} bytes)", url, body.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", BOUNDARY),
            )
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        read_response(response).await
    }

    /// Poll the job until it is `DONE`.
    async fn wait_for_job(&self, job: Value) -> Result<()> {
        let job_id = job
            .pointer("/jobReference/jobId")
            .and_then(|id| id.as_str())
            .map(|id| id.to_string())
            .ok_or_else(|| PipelineError::LoadError("load job has no jobId".to_string()))?;
        let location = job
            .pointer("/jobReference/location")
            .and_then(|l| l.as_str())
            .map(|l| l.to_string());

        let mut job = job;
        for _ in 0..self.max_polls {
            let state = job.pointer("/status/state").and_then(|s| s.as_str());
            if state == Some("DONE") {
                return job_result(&job);
            }
            debug!("Load job {} is {}", job_id, state.unwrap_or("PENDING"));

            tokio::time::sleep(self.poll_interval).await;

            let mut request = self
                .client
                .get(self.job_url(&job_id))
                .bearer_auth(&self.access_token);
            if let Some(location) = &location {
                request = request.query(&[("location", location)]);
            }
            let response = request.send().await.map_err(transport_error)?;
            job = read_response(response).await?;
        }

        Err(PipelineError::LoadError(format!(
            "load job {} did not finish after {} polls",
            job_id, self.max_polls
        )))
    }
}

#[async_trait]
impl WarehouseLoader for BigQueryLoader {
    async fn load(&self, rows: &[Row], table: &str, mode: WriteMode) -> Result<usize> {
        let ndjson = to_ndjson(rows)?;

        info!(
            "Loading {} rows into {}.{}.{} ({})",
            rows.len(),
            self.project,
            self.dataset,
            table,
            mode
        );

        let job = self.insert_job(table, mode, &ndjson).await?;
        self.wait_for_job(job).await?;

        Ok(rows.len())
    }
}

/// Assemble a `multipart/related` body: job configuration, then the data.
fn multipart_body(config: &Value, ndjson: &str) -> String {
    format!(
        "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{config}\r\n\
         --{b}\r\nContent-Type: application/octet-stream\r\n\r\n{data}\r\n--{b}--\r\n",
        b = BOUNDARY,
        config = config,
        data = ndjson,
    )
}

fn transport_error(e: reqwest::Error) -> PipelineError {
    PipelineError::LoadError(format!("request failed: {}", e))
}

async fn read_response(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|data| {
                data.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(|m| m.to_string())
            })
            .unwrap_or(body);
        error!("BigQuery API error ({}): {}", status, message);
        return Err(PipelineError::LoadError(format!("{}: {}", status, message)));
    }

    serde_json::from_str(&body)
        .map_err(|e| PipelineError::LoadError(format!("invalid BigQuery response: {}", e)))
}

/// Outcome of a finished job.
fn job_result(job: &Value) -> Result<()> {
    match job.pointer("/status/errorResult") {
        Some(err) => {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            Err(PipelineError::LoadError(format!("load job failed: {}", message)))
        }
        None => Ok(()),
    }
}
