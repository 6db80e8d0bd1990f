pub mod api;
pub mod browser;
pub mod stealth;
pub mod synthetic;

#[cfg(test)]
mod chain_tests;

pub use api::ApiProvider;
pub use browser::BrowserProvider;
pub use stealth::StealthProvider;
pub use synthetic::SyntheticProvider;

use async_trait::async_trait;
use tracing::{info, warn};

use biliwatch_common::{Config, ProviderKind, ProviderMode, SearchError, SearchResult, VideoRecord};

use crate::pacing::Pacing;
use crate::retry::RetryPolicy;

/// One way of turning a keyword into video records.
///
/// Implementations are ordered in a chain from cheapest to most expensive;
/// `search_with_fallback` walks that chain.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<VideoRecord>, SearchError>;

    fn kind(&self) -> ProviderKind;
}

/// Build the provider chain for the configured mode.
///
/// Each mode starts at its named rung and keeps the slower rungs below as
/// fallbacks. Synthetic stands alone so offline runs never touch the network.
pub fn provider_chain(config: &Config) -> Vec<Box<dyn SearchProvider>> {
    match config.mode {
        ProviderMode::Api => vec![
            Box::new(ApiProvider::new()),
            Box::new(StealthProvider::new()),
            Box::new(BrowserProvider::new()),
        ],
        ProviderMode::Stealth => vec![
            Box::new(StealthProvider::new()),
            Box::new(BrowserProvider::new()),
        ],
        ProviderMode::Browser => vec![Box::new(BrowserProvider::new())],
        ProviderMode::Synthetic => vec![Box::new(SyntheticProvider::new())],
    }
}

/// Run one keyword through the chain, first non-empty result wins.
///
/// A rung that stays empty after its retries (blocked, erroring, or simply
/// no hits) falls through to the next. An exhausted chain is an empty
/// result, never an error; the cycle moves on to the next keyword.
pub async fn search_with_fallback(
    providers: &[Box<dyn SearchProvider>],
    retry: &RetryPolicy,
    pacing: &Pacing,
    keyword: &str,
    limit: usize,
) -> SearchResult {
    for provider in providers {
        pacing.before_search().await;

        let records = retry.run(provider.as_ref(), keyword, limit).await;
        if !records.is_empty() {
            info!(
                keyword,
                provider = %provider.kind(),
                count = records.len(),
                "Provider returned records"
            );
            return SearchResult {
                keyword: keyword.to_string(),
                provider: Some(provider.kind()),
                records,
            };
        }

        info!(keyword, provider = %provider.kind(), "Provider empty, falling through");
    }

    warn!(keyword, "All providers exhausted without results");
    SearchResult::empty(keyword)
}
