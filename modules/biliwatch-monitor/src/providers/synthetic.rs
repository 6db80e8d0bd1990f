use async_trait::async_trait;

use biliwatch_common::types::video_url;
use biliwatch_common::{ProviderKind, SearchError, VideoRecord};

use super::SearchProvider;

/// Offline provider generating deterministic records from the keyword.
///
/// Lets the whole pipeline run end to end with no network and no browser,
/// for demos and for exercising delivery plumbing. Same keyword, same
/// records, so dedup behaves exactly as it would against a real source.
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn fingerprint(keyword: &str) -> u32 {
    keyword
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32))
}

#[async_trait]
impl SearchProvider for SyntheticProvider {
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<VideoRecord>, SearchError> {
        let tag = fingerprint(keyword);
        let records = (1..=limit.max(1) as u64)
            .map(|n| {
                let bvid = format!("BV1sy{tag:08x}{n:02}");
                VideoRecord {
                    url: video_url(&bvid),
                    bvid,
                    title: format!("{keyword} 精选视频 {n}"),
                    author: "演示UP主".to_string(),
                    play: n * 12_345,
                    like: n * 678,
                    duration: "12:34".to_string(),
                    pubdate: 1_700_000_000 + (n as i64) * 86_400,
                }
            })
            .collect();
        Ok(records)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Synthetic
    }
}
