use thiserror::Error;

pub type Result<T> = std::result::Result<T, BiliError>;

#[derive(Debug, Error)]
pub enum BiliError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Blocked by anti-crawler (HTTP {0})")]
    Blocked(u16),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("API envelope error (code {code}): {message}")]
    Envelope { code: i64, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for BiliError {
    fn from(err: reqwest::Error) -> Self {
        BiliError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for BiliError {
    fn from(err: serde_json::Error) -> Self {
        BiliError::Parse(err.to_string())
    }
}
