pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ProviderMode};
pub use error::SearchError;
pub use types::{ProviderKind, SearchResult, VideoRecord};
