use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use biliwatch_common::types::parse_view_count;
use biliwatch_common::{ProviderKind, SearchError, VideoRecord};

use super::SearchProvider;

pub(crate) const SEARCH_URL: &str = "https://search.bilibili.com/all";

/// Rotated per request so repeated searches do not present one fingerprint.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Second rung: fetch the human search page with browser-like headers and
/// scrape the result cards out of the HTML.
///
/// Scraped records carry id, title, author, view count, and URL only. Likes,
/// duration, and publish time stay at their zero values.
pub struct StealthProvider {
    client: reqwest::Client,
}

impl StealthProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

impl Default for StealthProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn pick_user_agent() -> &'static str {
    let idx = rand::rng().random_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

#[async_trait]
impl SearchProvider for StealthProvider {
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<VideoRecord>, SearchError> {
        tracing::info!(keyword, "Scraping search page");

        let resp = self
            .client
            .get(SEARCH_URL)
            .header("User-Agent", pick_user_agent())
            .header("Referer", "https://www.bilibili.com/")
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8")
            .query(&[("keyword", keyword), ("search_type", "video")])
            .send()
            .await
            .map_err(|err| SearchError::Transport(err.to_string()))?;

        let status = resp.status();
        if status.as_u16() == 412 || status.as_u16() == 403 {
            return Err(SearchError::Blocked(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(SearchError::Transport(format!("HTTP {status}")));
        }

        let html = resp
            .text()
            .await
            .map_err(|err| SearchError::Transport(err.to_string()))?;

        let mut records = parse_search_page(&html)?;
        records.truncate(limit);
        Ok(records)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Stealth
    }
}

/// Pull video records out of search page HTML.
///
/// Works on the result card blocks: a card missing its title or link is
/// skipped, duplicate cards for the same video collapse to one. A page with
/// no card blocks at all is a parse failure, since it usually means a
/// challenge page was served instead of results.
pub(crate) fn parse_search_page(html: &str) -> Result<Vec<VideoRecord>, SearchError> {
    let card_re = regex::Regex::new(r#"(?s)<div class="bili-video-card[^"]*"[^>]*>(.*?)</div>"#)
        .expect("valid regex");
    let title_re = regex::Regex::new(r#"title="([^"]*)""#).expect("valid regex");
    let href_re = regex::Regex::new(r#"href="//([^"]+)""#).expect("valid regex");
    let bvid_re = regex::Regex::new(r"/video/(BV[0-9A-Za-z]+)").expect("valid regex");
    let author_re = regex::Regex::new(
        r#"<span[^>]*class="[^"]*bili-video-card__info--author[^"]*"[^>]*>([^<]*)</span>"#,
    )
    .expect("valid regex");
    let view_re = regex::Regex::new(
        r#"<span[^>]*class="[^"]*bili-video-card__stats--item[^"]*"[^>]*>\s*([^<]+?)\s*</span>"#,
    )
    .expect("valid regex");

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    let mut cards = 0usize;

    for card in card_re.captures_iter(html) {
        cards += 1;
        let block = &card[1];

        let Some(title) = title_re.captures(block).map(|c| c[1].trim().to_string()) else {
            continue;
        };
        let Some(href) = href_re.captures(block).map(|c| c[1].to_string()) else {
            continue;
        };
        if title.is_empty() {
            continue;
        }

        let url = format!("https://{href}");
        let bvid = bvid_re
            .captures(&href)
            .map(|c| c[1].to_string())
            .unwrap_or_default();

        let key = if bvid.is_empty() { &url } else { &bvid };
        if !seen.insert(key.clone()) {
            continue;
        }

        let author = author_re
            .captures(block)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default();
        let play = view_re
            .captures(block)
            .map(|c| parse_view_count(&c[1]))
            .unwrap_or(0);

        records.push(VideoRecord {
            bvid,
            title,
            author,
            url,
            play,
            ..Default::default()
        });
    }

    if cards == 0 {
        return Err(SearchError::Parse(
            "no video cards matched in search page".to_string(),
        ));
    }

    Ok(records)
}
