use async_trait::async_trait;

use bili_client::{BiliClient, BiliError};
use biliwatch_common::types::video_url;
use biliwatch_common::{ProviderKind, SearchError, VideoRecord};

use super::SearchProvider;

/// First rung of the chain: the official web search API.
///
/// Fastest and richest source, but also the first thing the anti-crawler
/// shuts off. Blocked responses push the chain down to the page scrape.
pub struct ApiProvider {
    client: BiliClient,
}

impl ApiProvider {
    pub fn new() -> Self {
        Self {
            client: BiliClient::new(),
        }
    }
}

impl Default for ApiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for ApiProvider {
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<VideoRecord>, SearchError> {
        let items = self
            .client
            .search_videos(keyword, 1, limit.max(1) as u32)
            .await
            .map_err(map_error)?;

        let records = items
            .into_iter()
            .map(|item| {
                let url = if item.bvid.is_empty() {
                    item.arcurl.clone()
                } else {
                    video_url(&item.bvid)
                };
                VideoRecord {
                    bvid: item.bvid,
                    title: item.title,
                    author: item.author,
                    url,
                    play: item.play,
                    like: item.like,
                    duration: item.duration,
                    pubdate: item.pubdate,
                }
            })
            .collect();

        Ok(records)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Api
    }
}

fn map_error(err: BiliError) -> SearchError {
    match err {
        BiliError::Blocked(status) => SearchError::Blocked(format!("HTTP {status}")),
        BiliError::Envelope { code, message } => {
            SearchError::Blocked(format!("API code {code}: {message}"))
        }
        BiliError::Network(msg) => SearchError::Transport(msg),
        BiliError::Api { status, message } => {
            SearchError::Transport(format!("HTTP {status}: {message}"))
        }
        BiliError::Parse(msg) => SearchError::Parse(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_onto_search_errors() {
        assert!(matches!(
            map_error(BiliError::Blocked(412)),
            SearchError::Blocked(_)
        ));
        assert!(matches!(
            map_error(BiliError::Envelope {
                code: -412,
                message: "intercepted".to_string()
            }),
            SearchError::Blocked(_)
        ));
        assert!(matches!(
            map_error(BiliError::Network("timeout".to_string())),
            SearchError::Transport(_)
        ));
        assert!(matches!(
            map_error(BiliError::Parse("bad json".to_string())),
            SearchError::Parse(_)
        ));
    }
}
