use serde::{Deserialize, Serialize};

/// A single discovered video.
///
/// Providers fill what they can: the API rung delivers every field, page
/// scrapes usually leave likes, duration, and publish time at their zero
/// values, and the message composer omits those.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub bvid: String,
    pub title: String,
    pub author: String,
    pub url: String,
    pub play: u64,
    pub like: u64,
    pub duration: String,
    pub pubdate: i64,
}

impl VideoRecord {
    /// Canonical dedup key: the platform id when present, else the URL.
    /// May be empty when a provider returned neither; such records cannot
    /// be deduplicated and the poller skips them.
    pub fn dedup_key(&self) -> &str {
        if self.bvid.is_empty() {
            &self.url
        } else {
            &self.bvid
        }
    }
}

/// Canonical watch URL for a video id.
pub fn video_url(bvid: &str) -> String {
    format!("https://www.bilibili.com/video/{bvid}")
}

/// Which provider produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Api,
    Stealth,
    Browser,
    Synthetic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Api => "api",
            ProviderKind::Stealth => "stealth",
            ProviderKind::Browser => "browser",
            ProviderKind::Synthetic => "synthetic",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered records from one keyword search, tagged with the rung that
/// produced them. `provider` is `None` when the whole chain came up empty.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub keyword: String,
    pub provider: Option<ProviderKind>,
    pub records: Vec<VideoRecord>,
}

impl SearchResult {
    pub fn empty(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            provider: None,
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a view-count string the way the platform renders it.
///
/// A 万 suffix multiplies the numeric prefix by 10^4, 亿 by 10^8. Without a
/// recognized suffix, non-digit characters are stripped and the rest parsed
/// as an integer. Anything unparseable counts as 0.
pub fn parse_view_count(text: &str) -> u64 {
    let text = text.trim();
    if let Some((prefix, _)) = text.split_once('万') {
        return (prefix.trim().parse::<f64>().unwrap_or(0.0) * 10_000.0).round() as u64;
    }
    if let Some((prefix, _)) = text.split_once('亿') {
        return (prefix.trim().parse::<f64>().unwrap_or(0.0) * 100_000_000.0).round() as u64;
    }
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Render a count back into platform style: 万 from 10^4 up, 亿 from 10^8.
pub fn render_count(n: u64) -> String {
    if n >= 100_000_000 {
        format!("{:.1}亿", n as f64 / 100_000_000.0)
    } else if n >= 10_000 {
        format!("{:.1}万", n as f64 / 10_000.0)
    } else {
        n.to_string()
    }
}

/// Normalize a duration string to `H:MM:SS`.
///
/// The search API returns `MM:SS` for short videos and occasionally a bare
/// seconds integer. Values already carrying two colons, and anything
/// unrecognized, pass through unchanged.
pub fn normalize_duration(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    if let Ok(total) = raw.parse::<u64>() {
        let h = total / 3600;
        let m = (total % 3600) / 60;
        let s = total % 60;
        return format!("{h}:{m:02}:{s:02}");
    }
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() == 2
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
    {
        return format!("0:{:0>2}:{:0>2}", parts[0], parts[1]);
    }
    raw.to_string()
}
