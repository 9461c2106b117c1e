//! Run notifications.
//!
//! Notification is best-effort: a [`Notifier`] never fails the run, it logs
//! its own delivery problems instead.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Receives one message per finished stage.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str);
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Box<T> {
    async fn notify(&self, subject: &str, body: &str) {
        (**self).notify(subject, body).await
    }
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        info!(subject, "{}", body);
    }
}

/// POSTs `{"subject", "body"}` JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("spotify-etl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        debug!("POST {}", self.url);

        let payload = json!({ "subject": subject, "body": body });
        match self.client.post(&self.url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => warn!(
                "Notification webhook returned {} for '{}'",
                response.status(),
                subject
            ),
            Err(e) => warn!("Could not deliver notification '{}': {}", subject, e),
        }
    }
}
