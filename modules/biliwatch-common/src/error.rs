use thiserror::Error;

/// Failure modes of a single provider search call.
///
/// All three are retryable. After retries are exhausted the chain treats the
/// provider as empty and falls through to the next rung; nothing here is
/// fatal to a cycle.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Blocked by platform: {0}")]
    Blocked(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
