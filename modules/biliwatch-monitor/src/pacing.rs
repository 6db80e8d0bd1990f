use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

/// Randomized delays between outbound actions.
///
/// Keeps the request rhythm irregular so the periodic traffic does not
/// present a machine-regular fingerprint. Ranges are whole seconds.
pub struct Pacing {
    search_delay: RangeInclusive<u64>,
    gap_delay: RangeInclusive<u64>,
}

impl Pacing {
    /// Production rhythm: 2-8s ahead of each search, 3-10s between
    /// keywords and between sends.
    pub fn standard() -> Self {
        Self {
            search_delay: 2..=8,
            gap_delay: 3..=10,
        }
    }

    /// No delays. For tests and synthetic runs.
    pub fn none() -> Self {
        Self {
            search_delay: 0..=0,
            gap_delay: 0..=0,
        }
    }

    pub async fn before_search(&self) {
        jittered_sleep(&self.search_delay).await;
    }

    pub async fn between_actions(&self) {
        jittered_sleep(&self.gap_delay).await;
    }
}

async fn jittered_sleep(range: &RangeInclusive<u64>) {
    let ms = rand::rng().random_range(*range.start() * 1000..=*range.end() * 1000);
    if ms == 0 {
        return;
    }
    debug!(delay_ms = ms, "Pacing delay");
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn none_pacing_never_sleeps() {
        let pacing = Pacing::none();
        let start = tokio::time::Instant::now();

        pacing.before_search().await;
        pacing.between_actions().await;

        assert_eq!(tokio::time::Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn standard_pacing_waits_within_bounds() {
        let pacing = Pacing::standard();
        let start = tokio::time::Instant::now();

        pacing.before_search().await;

        let waited = tokio::time::Instant::now() - start;
        assert!(waited >= Duration::from_secs(2));
        assert!(waited <= Duration::from_secs(8));
    }
}
