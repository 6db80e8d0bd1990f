pub mod error;
pub mod types;

pub use error::{BiliError, Result};
pub use types::{clean_title, SearchData, SearchEnvelope, SearchItem};

use std::time::Duration;

const BASE_URL: &str = "https://api.bilibili.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct BiliClient {
    client: reqwest::Client,
}

impl Default for BiliClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BiliClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Search videos by keyword via the web search API.
    ///
    /// HTTP 412 is the anti-crawler rejection and maps to `Blocked`. A
    /// malformed item inside the result list is logged and dropped; the
    /// rest of the list is still returned.
    pub async fn search_videos(
        &self,
        keyword: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<SearchItem>> {
        tracing::info!(keyword, page, "Searching videos via web API");

        let url = format!("{}/x/web-interface/search/type", BASE_URL);
        let resp = self
            .client
            .get(&url)
            .header("Referer", "https://www.bilibili.com/")
            .query(&[
                ("search_type", "video".to_string()),
                ("keyword", keyword.to_string()),
                ("page", page.to_string()),
                ("page_size", page_size.to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 412 {
            return Err(BiliError::Blocked(412));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BiliError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let items = parse_search_response(&body)?;
        tracing::info!(keyword, count = items.len(), "Search returned items");
        Ok(items)
    }
}

/// Decode a search API response body into cleaned video items.
///
/// Rejects a non-zero envelope code, then decodes items one by one so a
/// malformed entry is dropped without discarding its siblings.
pub fn parse_search_response(body: &str) -> Result<Vec<SearchItem>> {
    let envelope: SearchEnvelope = serde_json::from_str(body)?;

    let code = envelope
        .code
        .ok_or_else(|| BiliError::Parse("response envelope has no code field".to_string()))?;
    if code != 0 {
        return Err(BiliError::Envelope {
            code,
            message: envelope.message,
        });
    }

    let raw_items = envelope
        .data
        .and_then(|data| data.result)
        .unwrap_or_default();

    let mut items = Vec::with_capacity(raw_items.len());
    for value in raw_items {
        match serde_json::from_value::<SearchItem>(value) {
            Ok(mut item) => {
                item.title = clean_title(&item.title);
                items.push(item);
            }
            Err(err) => {
                tracing::warn!(error = %err, "Dropping malformed search item");
            }
        }
    }
    Ok(items)
}
