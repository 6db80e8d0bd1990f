use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use super::backend::NotifyBackend;

/// Webhook delivery backend.
///
/// Posts each chunk as JSON to a relay endpoint that owns the actual
/// messaging session. After a failed send it fires a best-effort session
/// reset, on the theory that the relay's session has gone stale.
pub struct WebhookNotifier {
    webhook_url: String,
    http: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Self {
        // Bounded so a dead relay stalls one send, not the whole cycle.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");
        Self { webhook_url, http }
    }

    async fn post(&self, payload: &serde_json::Value) -> anyhow::Result<()> {
        let resp = self.http.post(&self.webhook_url).json(payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Webhook returned non-success");
            anyhow::bail!("Webhook returned {status}");
        }
        Ok(())
    }

    async fn reset_session(&self, destination: &str) {
        let payload = json!({ "destination": destination, "reset": true });
        if let Err(e) = self.post(&payload).await {
            warn!(destination, error = %e, "Session reset failed");
        }
    }
}

#[async_trait]
impl NotifyBackend for WebhookNotifier {
    async fn send(&self, destination: &str, text: &str) -> anyhow::Result<()> {
        let payload = json!({ "destination": destination, "text": text });

        if let Err(e) = self.post(&payload).await {
            self.reset_session(destination).await;
            return Err(e);
        }
        Ok(())
    }
}
