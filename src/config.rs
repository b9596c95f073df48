//! Configuration file parser for ~/.config/gazette/config.toml.
//!
//! The config file is optional. A missing or empty file yields
//! `Config::default()`. Unknown keys are accepted but logged, since they are
//! usually typos.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::journal::QUOTABLE_BASE_URL;
use crate::providers::{
    ProviderKind, ProviderSettings, GUARDIAN_BASE_URL, MEDIASTACK_BASE_URL, NEWSAPI_BASE_URL,
};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Connection overrides for one provider.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Used when the provider's environment variable is unset.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotesConfig {
    /// Fetch quotes over HTTP instead of using the built-in library.
    pub remote: bool,
    pub base_url: String,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            remote: true,
            base_url: QUOTABLE_BASE_URL.to_string(),
        }
    }
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serve canned articles and built-in quotes; no network access.
    pub offline: bool,

    /// Simulated latency before each offline provider answer.
    pub offline_delay_ms: u64,

    pub request_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub min_check_interval_secs: u64,

    /// Defaults to `gazette.db` in the config directory.
    pub database_path: Option<PathBuf>,

    /// Providers to consult, in order. Empty means the built-in order.
    pub provider_priority: Vec<ProviderKind>,

    pub mediastack: ProviderConfig,
    pub newsapi: ProviderConfig,
    pub guardian: ProviderConfig,
    pub quotes: QuotesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            offline: false,
            offline_delay_ms: 0,
            request_timeout_secs: 10,
            poll_interval_secs: 60,
            min_check_interval_secs: 30,
            database_path: None,
            provider_priority: Vec::new(),
            mediastack: ProviderConfig::default(),
            newsapi: ProviderConfig::default(),
            guardian: ProviderConfig::default(),
            quotes: QuotesConfig::default(),
        }
    }
}

const KNOWN_KEYS: &[&str] = &[
    "offline",
    "offline_delay_ms",
    "request_timeout_secs",
    "poll_interval_secs",
    "min_check_interval_secs",
    "database_path",
    "provider_priority",
    "mediastack",
    "newsapi",
    "guardian",
    "quotes",
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML or wrong value types → `Err(ConfigError::Parse)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse TOML text; empty text yields the defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in unknown_keys(&raw) {
                tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            offline = config.offline,
            poll_interval_secs = config.poll_interval_secs,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn min_check_interval(&self) -> Duration {
        Duration::from_secs(self.min_check_interval_secs)
    }

    pub fn offline_delay(&self) -> Duration {
        Duration::from_millis(self.offline_delay_ms)
    }

    /// Configured provider order with duplicates removed, or the built-in order.
    pub fn priority(&self) -> Vec<ProviderKind> {
        if self.provider_priority.is_empty() {
            return ProviderKind::PRIORITY.to_vec();
        }
        let mut order = Vec::with_capacity(self.provider_priority.len());
        for kind in &self.provider_priority {
            if !order.contains(kind) {
                order.push(*kind);
            }
        }
        order
    }

    pub fn provider(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::MediaStack => &self.mediastack,
            ProviderKind::NewsApi => &self.newsapi,
            ProviderKind::Guardian => &self.guardian,
        }
    }

    /// Connection settings for `kind`, with the API key taken from the
    /// environment first and the config file second.
    pub fn provider_settings(&self, kind: ProviderKind) -> ProviderSettings {
        let section = self.provider(kind);
        let base_url = section
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(kind).to_string());
        let key = resolve_api_key(std::env::var(api_key_env(kind)).ok(), section.api_key.as_deref());

        ProviderSettings::new(base_url)
            .with_api_key(key)
            .with_timeout(self.request_timeout())
    }
}

/// Environment variable consulted for `kind`'s API key.
pub fn api_key_env(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::MediaStack => "MEDIASTACK_API_KEY",
        ProviderKind::NewsApi => "NEWSAPI_API_KEY",
        ProviderKind::Guardian => "GUARDIAN_API_KEY",
    }
}

fn default_base_url(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::MediaStack => MEDIASTACK_BASE_URL,
        ProviderKind::NewsApi => NEWSAPI_BASE_URL,
        ProviderKind::Guardian => GUARDIAN_BASE_URL,
    }
}

/// Env var takes precedence over the config file. Blank values count as unset.
fn resolve_api_key(from_env: Option<String>, from_file: Option<&str>) -> Option<SecretString> {
    from_env
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            from_file
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .map(SecretString::from)
}

/// Dotted paths of keys this version does not understand.
fn unknown_keys(raw: &toml::Table) -> Vec<String> {
    let mut unknown = Vec::new();
    for (key, value) in raw {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            unknown.push(key.clone());
            continue;
        }
        let allowed: &[&str] = match key.as_str() {
            "mediastack" | "newsapi" | "guardian" => &["api_key", "base_url"],
            "quotes" => &["remote", "base_url"],
            _ => continue,
        };
        if let Some(table) = value.as_table() {
            for nested in table.keys() {
                if !allowed.contains(&nested.as_str()) {
                    unknown.push(format!("{key}.{nested}"));
                }
            }
        }
    }
    unknown
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn write_config(name: &str, content: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("gazette_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.offline);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.min_check_interval(), Duration::from_secs(30));
        assert_eq!(config.offline_delay(), Duration::ZERO);
        assert_eq!(config.priority(), ProviderKind::PRIORITY.to_vec());
        assert!(config.quotes.remote);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/gazette_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.poll_interval_secs, 60);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (dir, path) = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.request_timeout_secs, 10);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
offline = true
offline_delay_ms = 250
request_timeout_secs = 5
poll_interval_secs = 120
min_check_interval_secs = 0
database_path = "/var/lib/gazette/news.db"
provider_priority = ["guardian", "newsapi", "guardian"]

[mediastack]
api_key = "ms-key"

[guardian]
base_url = "http://localhost:9000"

[quotes]
remote = false
"#;
        let (dir, path) = write_config("full", content);
        let config = Config::load(&path).unwrap();

        assert!(config.offline);
        assert_eq!(config.offline_delay(), Duration::from_millis(250));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.poll_interval(), Duration::from_secs(120));
        assert_eq!(config.min_check_interval(), Duration::ZERO);
        assert_eq!(
            config.database_path.as_deref(),
            Some(Path::new("/var/lib/gazette/news.db"))
        );
        assert_eq!(
            config.priority(),
            vec![ProviderKind::Guardian, ProviderKind::NewsApi]
        );
        assert_eq!(config.mediastack.api_key.as_deref(), Some("ms-key"));
        assert!(!config.quotes.remote);
        assert_eq!(config.quotes.base_url, QUOTABLE_BASE_URL);

        let guardian = config.provider_settings(ProviderKind::Guardian);
        assert_eq!(guardian.base_url, "http://localhost:9000");
        assert_eq!(guardian.timeout, Duration::from_secs(5));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::parse("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_wrong_type_returns_error() {
        assert!(Config::parse("poll_interval_secs = \"often\"\n").is_err());
    }

    #[test]
    fn test_unknown_provider_in_priority_is_error() {
        assert!(Config::parse("provider_priority = [\"bbc\"]\n").is_err());
    }

    #[test]
    fn test_unknown_keys_accepted_and_reported() {
        let content = r#"
offline = true
totally_fake_key = 1

[newsapi]
apikey = "typo"
"#;
        let config = Config::parse(content).unwrap();
        assert!(config.offline);

        let raw: toml::Table = content.parse().unwrap();
        let mut unknown = unknown_keys(&raw);
        unknown.sort();
        assert_eq!(unknown, vec!["newsapi.apikey", "totally_fake_key"]);
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_env_key_wins_over_file() {
        let key = resolve_api_key(Some("from-env".into()), Some("from-file")).unwrap();
        assert_eq!(key.expose_secret(), "from-env");

        let key = resolve_api_key(Some("  ".into()), Some("from-file")).unwrap();
        assert_eq!(key.expose_secret(), "from-file");

        assert!(resolve_api_key(None, Some("")).is_none());
        assert!(resolve_api_key(None, None).is_none());
    }

    #[test]
    fn test_debug_masks_api_keys() {
        let mut config = Config::default();
        config.newsapi.api_key = Some("super-secret-key-12345".to_string());

        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-key-12345"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
