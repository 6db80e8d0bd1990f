use std::time::Duration;

use rand::Rng;
use tracing::warn;

use biliwatch_common::VideoRecord;

use crate::providers::SearchProvider;

/// Bounded retry for a single provider rung.
///
/// A provider gets `1 + max_retries` attempts. Success is terminal even
/// when the result list is empty; exhausted retries collapse to an empty
/// list so the chain falls through instead of aborting the cycle.
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub async fn run(
        &self,
        provider: &dyn SearchProvider,
        keyword: &str,
        limit: usize,
    ) -> Vec<VideoRecord> {
        for attempt in 0..=self.max_retries {
            match provider.search(keyword, limit).await {
                Ok(records) => return records,
                Err(err) if attempt < self.max_retries => {
                    warn!(
                        keyword,
                        provider = %provider.kind(),
                        attempt = attempt + 1,
                        error = %err,
                        "Search failed, retrying"
                    );
                    tokio::time::sleep(self.delay()).await;
                }
                Err(err) => {
                    warn!(
                        keyword,
                        provider = %provider.kind(),
                        error = %err,
                        "Search failed, retries exhausted"
                    );
                }
            }
        }
        Vec::new()
    }

    // Zero backoff means zero delay, so tests and synthetic runs never sleep.
    fn delay(&self) -> Duration {
        if self.backoff.is_zero() {
            return Duration::ZERO;
        }
        self.backoff + Duration::from_millis(rand::rng().random_range(0..1000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{make_record, ScriptedProvider, Step};
    use biliwatch_common::ProviderKind;

    #[tokio::test]
    async fn failing_provider_gets_one_plus_max_retries_attempts() {
        let provider = ScriptedProvider::failing(ProviderKind::Api);
        let policy = RetryPolicy::new(2, Duration::ZERO);

        let records = policy.run(&provider, "demo", 3).await;

        assert!(records.is_empty());
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn success_returns_immediately() {
        let provider =
            ScriptedProvider::returning(ProviderKind::Api, vec![make_record("BV1aa111")]);
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let records = policy.run(&provider, "demo", 3).await;

        assert_eq!(records.len(), 1);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        let provider = ScriptedProvider::new(ProviderKind::Api)
            .step(Step::Transport)
            .step(Step::Records(vec![make_record("BV1aa111")]));
        let policy = RetryPolicy::new(1, Duration::ZERO);

        let records = policy.run(&provider, "demo", 3).await;

        assert_eq!(records.len(), 1);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn empty_success_is_terminal() {
        let provider = ScriptedProvider::empty(ProviderKind::Api);
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let records = policy.run(&provider, "demo", 3).await;

        assert!(records.is_empty());
        assert_eq!(provider.calls(), 1);
    }
}
