use async_trait::async_trait;
use tracing::info;

use super::backend::NotifyBackend;

/// Log-only backend, used when no webhook is configured.
///
/// Always reports success, so the pipeline records and dedups exactly as
/// it would with real delivery.
pub struct NoopNotifier;

#[async_trait]
impl NotifyBackend for NoopNotifier {
    async fn send(&self, destination: &str, text: &str) -> anyhow::Result<()> {
        info!(destination, "Notification (log only):\n{text}");
        Ok(())
    }
}
