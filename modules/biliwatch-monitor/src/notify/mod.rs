pub mod backend;
pub mod noop;
pub mod webhook;

pub use backend::NotifyBackend;
pub use noop::NoopNotifier;
pub use webhook::WebhookNotifier;

use tracing::info;

/// Webhook endpoint for outgoing notifications. Unset means log-only.
pub const WEBHOOK_URL_ENV: &str = "BILIWATCH_WEBHOOK_URL";

/// Pick the delivery backend from the environment: the webhook relay when
/// one is configured, otherwise the log-only sink.
pub fn from_env() -> Box<dyn NotifyBackend> {
    match std::env::var(WEBHOOK_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => {
            info!("Notifying via webhook relay");
            Box::new(WebhookNotifier::new(url))
        }
        _ => {
            info!("No webhook configured, notifications go to the log only");
            Box::new(NoopNotifier)
        }
    }
}
