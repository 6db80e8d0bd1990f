use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use tracing::{info, warn};

use biliwatch_common::types::video_url;
use biliwatch_common::{ProviderKind, SearchError, VideoRecord};

use super::stealth;
use super::SearchProvider;

/// Retry budget for transient Chrome failures ("Cannot fork" and friends).
const BROWSER_MAX_ATTEMPTS: u32 = 3;
/// Backoff base for Chrome retries; actual delay is base * 3^attempt + jitter.
const BROWSER_RETRY_BASE: Duration = Duration::from_secs(3);
/// Hard cap on one Chrome invocation, page load included.
const BROWSER_TIMEOUT: Duration = Duration::from_secs(30);

/// Last rung: render the search page in headless Chromium and scan the
/// dumped DOM.
///
/// Slowest option by far, but it survives markup that only exists after
/// client-side rendering. Failures degrade to an empty result so the rest
/// of the cycle keeps going.
pub struct BrowserProvider {
    chrome_bin: String,
}

impl BrowserProvider {
    pub fn new() -> Self {
        Self {
            chrome_bin: std::env::var("CHROME_BIN").unwrap_or_else(|_| "chromium".to_string()),
        }
    }

    /// Launch Chrome --dump-dom and return the rendered DOM.
    /// Retries transient fork/launch failures up to BROWSER_MAX_ATTEMPTS times,
    /// backing off exponentially (3s, 9s) with up to 1s of jitter.
    async fn dump_dom(&self, url: &str) -> Result<String> {
        for attempt in 0..BROWSER_MAX_ATTEMPTS {
            let tmp_dir = tempfile::tempdir().context("Failed to create temp profile dir")?;

            let result = tokio::time::timeout(
                BROWSER_TIMEOUT,
                tokio::process::Command::new(&self.chrome_bin)
                    .args([
                        "--headless",
                        "--no-sandbox",
                        "--disable-gpu",
                        "--disable-dev-shm-usage",
                        &format!("--user-data-dir={}", tmp_dir.path().display()),
                        "--dump-dom",
                        url,
                    ])
                    .output(),
            )
            .await;

            match result {
                Ok(Ok(output)) => {
                    if output.status.success() {
                        if output.stdout.is_empty() {
                            if attempt + 1 < BROWSER_MAX_ATTEMPTS {
                                sleep_backoff(url, attempt, "Chrome returned empty DOM").await;
                                continue;
                            }
                        }
                        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
                    }
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    // Transient fork/resource exhaustion — retry
                    if is_transient(&stderr) && attempt + 1 < BROWSER_MAX_ATTEMPTS {
                        sleep_backoff(url, attempt, "Chrome cannot fork").await;
                        continue;
                    }
                    warn!(url, stderr = %stderr, "Chrome exited with error");
                    return Ok(String::new());
                }
                Ok(Err(e)) => {
                    // Failed to launch process at all — retry on transient errors
                    if is_transient(&e.to_string()) && attempt + 1 < BROWSER_MAX_ATTEMPTS {
                        sleep_backoff(url, attempt, "Chrome launch failed").await;
                        continue;
                    }
                    anyhow::bail!("Failed to run Chrome for {url}: {e}");
                }
                Err(_) => {
                    if attempt + 1 < BROWSER_MAX_ATTEMPTS {
                        sleep_backoff(url, attempt, "Chrome timed out").await;
                        continue;
                    }
                    anyhow::bail!(
                        "Chrome timed out after {}s for {url}",
                        BROWSER_TIMEOUT.as_secs()
                    );
                }
            }
        }

        Ok(String::new())
    }
}

impl Default for BrowserProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn is_transient(stderr: &str) -> bool {
    stderr.contains("Cannot fork") || stderr.contains("Resource temporarily unavailable")
}

async fn sleep_backoff(url: &str, attempt: u32, why: &str) {
    let backoff = BROWSER_RETRY_BASE * 3u32.pow(attempt);
    let jitter = Duration::from_millis(rand::rng().random_range(0..1000));
    warn!(
        url,
        attempt = attempt + 1,
        backoff_secs = backoff.as_secs(),
        "{why}, retrying after backoff"
    );
    tokio::time::sleep(backoff + jitter).await;
}

#[async_trait]
impl SearchProvider for BrowserProvider {
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<VideoRecord>, SearchError> {
        let url = search_page_url(keyword);
        info!(keyword, url, "Rendering search page in headless Chrome");

        let html = match self.dump_dom(&url).await {
            Ok(html) => html,
            Err(err) => {
                warn!(keyword, error = %err, "Chrome render failed");
                return Ok(Vec::new());
            }
        };
        if html.is_empty() {
            warn!(keyword, "Empty DOM output");
            return Ok(Vec::new());
        }

        let mut records = scan_dom(&html);
        records.truncate(limit);
        Ok(records)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Browser
    }
}

fn search_page_url(keyword: &str) -> String {
    let mut url = url::Url::parse(stealth::SEARCH_URL).expect("valid search URL");
    url.query_pairs_mut()
        .append_pair("keyword", keyword)
        .append_pair("search_type", "video");
    url.to_string()
}

/// Pull records out of a rendered DOM.
///
/// Tries the result-card markup first. When the cards are absent (layout
/// changes faster than scrape selectors do), falls back to collecting bare
/// video links, capped at 20.
fn scan_dom(html: &str) -> Vec<VideoRecord> {
    if let Ok(records) = stealth::parse_search_page(html) {
        if !records.is_empty() {
            return records;
        }
    }

    let link_re = regex::Regex::new(r"/video/(BV[0-9A-Za-z]+)").expect("valid regex");
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for cap in link_re.captures_iter(html) {
        let bvid = cap[1].to_string();
        if !seen.insert(bvid.clone()) {
            continue;
        }
        records.push(VideoRecord {
            url: video_url(&bvid),
            bvid,
            ..Default::default()
        });
        if records.len() >= 20 {
            break;
        }
    }

    records
}
