use serde::Deserialize;

/// Top-level envelope of the web search API.
///
/// `code` is 0 on success. A missing code means the response is not the
/// expected envelope at all (a challenge page served as JSON, usually).
#[derive(Debug, Clone, Deserialize)]
pub struct SearchEnvelope {
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
    pub data: Option<SearchData>,
}

/// Payload of a successful search response.
///
/// Items are kept as raw JSON values so one malformed entry can be dropped
/// without discarding its siblings.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub result: Option<Vec<serde_json::Value>>,
}

/// A single video entry from the search result list.
///
/// Every field defaults, since the API omits fields freely across result
/// types mixed into the same list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub bvid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub arcurl: String,
    #[serde(default)]
    pub play: u64,
    #[serde(default)]
    pub like: u64,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub pubdate: i64,
}

/// Strip the `<em>` highlight markup the search API injects into titles
/// and collapse the whitespace left behind.
pub fn clean_title(raw: &str) -> String {
    let tag_re = regex::Regex::new(r"<[^>]*>").expect("valid regex");
    let ws_re = regex::Regex::new(r"\s+").expect("valid regex");
    let stripped = tag_re.replace_all(raw, "");
    ws_re.replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_title_strips_highlight_markup() {
        assert_eq!(
            clean_title(r#"<em class="keyword">Python</em>教程 入门"#),
            "Python教程 入门"
        );
        assert_eq!(clean_title("  plain   title  "), "plain title");
        assert_eq!(clean_title(""), "");
    }
}
