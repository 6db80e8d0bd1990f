use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which provider rung the search chain starts from.
///
/// `api`, `stealth`, and `browser` each begin at that rung and fall through
/// to the slower ones below. `synthetic` runs offline with generated data
/// and never touches the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    #[default]
    Api,
    Stealth,
    Browser,
    Synthetic,
}

impl ProviderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderMode::Api => "api",
            ProviderMode::Stealth => "stealth",
            ProviderMode::Browser => "browser",
            ProviderMode::Synthetic => "synthetic",
        }
    }
}

impl std::fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application configuration loaded from a JSON file.
///
/// Every field has a default, so a partial file is fine and a missing file
/// is materialized with the defaults on first run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Search
    pub search_keywords: Vec<String>,
    pub match_keywords: Vec<String>,
    pub mode: ProviderMode,

    // Delivery
    pub notify_destination: String,
    pub send_count: usize,

    // Pacing and retries
    pub check_interval_seconds: u64,
    pub max_retries: u32,
    pub retry_backoff_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_keywords: vec!["Python教程".to_string(), "编程学习".to_string()],
            match_keywords: Vec::new(),
            mode: ProviderMode::default(),
            notify_destination: "文件传输助手".to_string(),
            send_count: 3,
            check_interval_seconds: 1800,
            max_retries: 3,
            retry_backoff_secs: 10,
        }
    }
}

impl Config {
    /// Read the config file, creating it with defaults when absent.
    ///
    /// A file that exists but fails to parse is an error rather than a
    /// silent fallback, so a typo never quietly reverts settings.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        let config = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Invalid config file {}", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let config = Self::default();
                let pretty = serde_json::to_string_pretty(&config)?;
                fs::write(path, pretty)
                    .with_context(|| format!("Failed to write default config to {}", path.display()))?;
                info!("Created default config at {}", path.display());
                config
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read config file {}", path.display()));
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.search_keywords.is_empty() {
            bail!("Config must list at least one search keyword");
        }
        if self.check_interval_seconds == 0 {
            bail!("check_interval_seconds must be greater than zero");
        }
        if self.send_count == 0 {
            bail!("send_count must be greater than zero");
        }
        if self.retry_backoff_secs == 0 {
            bail!("retry_backoff_secs must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode, ProviderMode::Api);
        assert_eq!(config.check_interval_seconds, 1800);
        assert_eq!(config.send_count, 3);
        assert!(config.match_keywords.is_empty());
    }

    #[test]
    fn missing_file_is_materialized_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config.send_count, 3);
        assert!(path.exists());

        // Second load reads the file it just wrote.
        let reloaded = Config::load_or_init(&path).unwrap();
        assert_eq!(reloaded.search_keywords, config.search_keywords);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"search_keywords": ["rust"], "send_count": 1}"#).unwrap();

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config.search_keywords, vec!["rust".to_string()]);
        assert_eq!(config.send_count, 1);
        assert_eq!(config.check_interval_seconds, 1800);
        assert_eq!(config.notify_destination, "文件传输助手");
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        assert!(Config::load_or_init(&path).is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"search_keywords": []}"#).unwrap();
        assert!(Config::load_or_init(&path).is_err());

        fs::write(&path, r#"{"check_interval_seconds": 0}"#).unwrap();
        assert!(Config::load_or_init(&path).is_err());

        // Zero backoff would hammer the search endpoint on every retry.
        fs::write(
            &path,
            r#"{"search_keywords": ["rust"], "retry_backoff_secs": 0}"#,
        )
        .unwrap();
        assert!(Config::load_or_init(&path).is_err());
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"search_keywords": ["rust"], "legacy_option": true}"#,
        )
        .unwrap();

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config.search_keywords, vec!["rust".to_string()]);
    }

    #[test]
    fn mode_parses_lowercase_names() {
        let config: Config = serde_json::from_str(r#"{"mode": "synthetic"}"#).unwrap();
        assert_eq!(config.mode, ProviderMode::Synthetic);
        assert_eq!(config.mode.to_string(), "synthetic");
    }
}
