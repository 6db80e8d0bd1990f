use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use biliwatch_common::{Config, ProviderKind};

use crate::compose::{self, MAX_MESSAGE_CHARS};
use crate::dedup::DedupStore;
use crate::notify::NotifyBackend;
use crate::pacing::Pacing;
use crate::providers::{search_with_fallback, SearchProvider};
use crate::retry::RetryPolicy;

/// How many results to ask providers for per keyword. The send cutoff is
/// config.send_count, which is usually much smaller.
const PAGE_SIZE: usize = 20;

/// Counters from one monitoring cycle.
#[derive(Debug, Default)]
pub struct CycleStats {
    pub keywords_searched: u32,
    pub records_seen: u32,
    pub records_new: u32,
    pub sends_attempted: u32,
    pub sends_delivered: u32,
    pub providers_used: Vec<(String, ProviderKind)>,
}

impl std::fmt::Display for CycleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Cycle Complete ===")?;
        writeln!(f, "Keywords searched: {}", self.keywords_searched)?;
        writeln!(f, "Records seen:      {}", self.records_seen)?;
        writeln!(f, "Records new:       {}", self.records_new)?;
        writeln!(f, "Sends attempted:   {}", self.sends_attempted)?;
        writeln!(f, "Sends delivered:   {}", self.sends_delivered)?;
        if !self.providers_used.is_empty() {
            writeln!(f, "\nProviders:")?;
            for (keyword, provider) in &self.providers_used {
                writeln!(f, "  {keyword}: {provider}")?;
            }
        }
        Ok(())
    }
}

/// Which of `wanted` appear in `title`, case-insensitively.
///
/// An empty filter means no filtering: everything passes, nothing is
/// reported as a hit.
pub fn match_keywords(title: &str, wanted: &[String]) -> Vec<String> {
    let lower = title.to_lowercase();
    wanted
        .iter()
        .filter(|w| !w.is_empty() && lower.contains(&w.to_lowercase()))
        .cloned()
        .collect()
}

/// The periodic search → dedup → notify loop.
pub struct Poller {
    config: Config,
    providers: Vec<Box<dyn SearchProvider>>,
    retry: RetryPolicy,
    pacing: Pacing,
    notifier: Box<dyn NotifyBackend>,
    store: DedupStore,
}

impl Poller {
    pub fn new(
        config: Config,
        providers: Vec<Box<dyn SearchProvider>>,
        retry: RetryPolicy,
        pacing: Pacing,
        notifier: Box<dyn NotifyBackend>,
        store: DedupStore,
    ) -> Self {
        Self {
            config,
            providers,
            retry,
            pacing,
            notifier,
            store,
        }
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    /// One full pass over the configured keywords.
    ///
    /// Nothing in here aborts the pass: provider failures fall through the
    /// chain, delivery failures leave the record eligible for next time.
    /// State is flushed once at the end, and only when something changed.
    pub async fn run_cycle(&mut self) -> CycleStats {
        let mut stats = CycleStats::default();
        let keywords = self.config.search_keywords.clone();

        for (i, keyword) in keywords.iter().enumerate() {
            if i > 0 {
                self.pacing.between_actions().await;
            }
            self.process_keyword(keyword, &mut stats).await;
            stats.keywords_searched += 1;
        }

        if self.store.dirty() {
            if let Err(err) = self.store.flush() {
                error!(error = %err, "Failed to persist dedup state");
            }
        }

        info!("{stats}");
        stats
    }

    async fn process_keyword(&mut self, keyword: &str, stats: &mut CycleStats) {
        let mut result = search_with_fallback(
            &self.providers,
            &self.retry,
            &self.pacing,
            keyword,
            PAGE_SIZE,
        )
        .await;

        if let Some(provider) = result.provider {
            stats.providers_used.push((keyword.to_string(), provider));
        }

        // Only the head of the result list is notification-worthy; the rest
        // is never sent and never recorded.
        result.records.truncate(self.config.send_count);
        stats.records_seen += result.records.len() as u32;

        let mut first_send_done = false;
        for record in &result.records {
            let matched = match_keywords(&record.title, &self.config.match_keywords);
            if !self.config.match_keywords.is_empty() && matched.is_empty() {
                debug!(keyword, title = %record.title, "No match keyword hit, skipping");
                continue;
            }

            let key = record.dedup_key();
            if key.is_empty() {
                warn!(keyword, title = %record.title, "Record has no usable dedup key, skipping");
                continue;
            }
            if self.store.contains(key) {
                debug!(keyword, key, "Already notified, skipping");
                continue;
            }
            stats.records_new += 1;

            if first_send_done {
                self.pacing.between_actions().await;
            }
            first_send_done = true;

            let text = compose::compose(record, keyword, &matched);
            stats.sends_attempted += 1;

            if self.deliver(&text).await {
                self.store.record(key);
                stats.sends_delivered += 1;
                info!(keyword, key, title = %record.title, "Notified");
            } else {
                warn!(keyword, key, "Delivery failed, record stays eligible");
            }
        }
    }

    /// Send one composed text, chunked to the message budget. All chunks
    /// must go through for the record to count as delivered.
    async fn deliver(&self, text: &str) -> bool {
        for chunk in compose::split(text, MAX_MESSAGE_CHARS) {
            if let Err(err) = self
                .notifier
                .send(&self.config.notify_destination, &chunk)
                .await
            {
                warn!(error = %err, "Notification send failed");
                return false;
            }
        }
        true
    }

    /// Run cycles forever: one immediately, then one per interval tick.
    /// Ctrl-C stops the loop; dirty state is flushed on the way out.
    pub async fn run(&mut self) -> Result<()> {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.check_interval_seconds));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
            tokio::select! {
                _ = self.run_cycle() => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received mid-cycle");
                    break;
                }
            }
        }

        if self.store.dirty() {
            self.store.flush()?;
        }
        Ok(())
    }
}
