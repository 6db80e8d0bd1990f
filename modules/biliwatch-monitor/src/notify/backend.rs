use async_trait::async_trait;

/// Pluggable delivery backend for composed notifications.
///
/// An `Err` from `send` means the message may not have arrived; the caller
/// treats the record as not yet notified and leaves it eligible for the
/// next cycle. Delivery failure must never abort a cycle.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    /// Deliver one message chunk to the named destination.
    async fn send(&self, destination: &str, text: &str) -> anyhow::Result<()>;
}
