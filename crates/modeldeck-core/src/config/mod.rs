use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration for modeldeck.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Base URL of the listing site (model pages, rankings, apps).
    pub site_base: String,
    /// Base URL of the JSON API.
    pub api_base: String,
    /// Optional bearer token for the JSON API.
    pub api_key: String,
    /// Path of the SQLite cache; empty means `<data dir>/models.db`.
    pub db_path: String,
    pub scrape: ScrapeConfig,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_base: "https://openrouter.ai".to_string(),
            api_base: "https://openrouter.ai/api/v1".to_string(),
            api_key: String::new(),
            db_path: String::new(),
            scrape: ScrapeConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Resolved path of the SQLite cache file.
    pub fn database_path(&self) -> PathBuf {
        if self.db_path.is_empty() {
            get_data_dir().join("models.db")
        } else {
            PathBuf::from(&self.db_path)
        }
    }

    /// Public page URL for a fully qualified model id.
    pub fn model_url(&self, model_id: &str) -> String {
        format!("{}/{}", self.site_base.trim_end_matches('/'), model_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapeConfig {
    /// Concurrent per-model workers.
    pub workers: usize,
    pub http_timeout_secs: u64,
    /// Navigation budget for a rendered page.
    pub page_timeout_secs: u64,
    /// Post-load wait for client-side rendering.
    pub settle_delay_secs: u64,
    /// Model ids to process in addition to the API listing. Seeded with the
    /// known ids the listing has been seen to omit.
    pub extra_model_ids: Vec<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            workers: 6,
            http_timeout_secs: 15,
            page_timeout_secs: 60,
            settle_delay_secs: 5,
            extra_model_ids: crate::normalize::defaults::EXTRA_MODEL_IDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Get the default configuration file path.
pub fn get_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".modeldeck")
        .join("config.json")
}

/// Get the modeldeck data directory.
pub fn get_data_dir() -> PathBuf {
    let path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".modeldeck");
    std::fs::create_dir_all(&path).ok();
    path
}

/// Load configuration from file or create default. `MODELDECK_API_KEY`
/// overrides the configured API key either way.
pub fn load_config(config_path: Option<&Path>) -> Config {
    let path = config_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(get_config_path);

    let mut cfg = if path.exists() {
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Config>(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse config from {}: {}", path.display(), e);
                    tracing::warn!("Using default configuration.");
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config from {}: {}", path.display(), e);
                tracing::warn!("Using default configuration.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Ok(key) = std::env::var("MODELDECK_API_KEY") {
        if !key.is_empty() {
            cfg.api_key = key;
        }
    }

    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.site_base, "https://openrouter.ai");
        assert_eq!(cfg.scrape.workers, 6);
        assert_eq!(cfg.server.port, 8080);
        assert!(cfg.api_key.is_empty());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let cfg = Config::default();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.site_base, cfg.site_base);
        assert_eq!(parsed.scrape.workers, cfg.scrape.workers);
    }

    #[test]
    fn test_config_camelcase_compat() {
        let json = r#"{
            "siteBase": "https://listing.example",
            "scrape": { "settleDelaySecs": 2, "extraModelIds": ["acme/foo-bar"] }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.site_base, "https://listing.example");
        assert_eq!(cfg.scrape.settle_delay_secs, 2);
        assert_eq!(cfg.scrape.extra_model_ids, vec!["acme/foo-bar"]);
        // Unspecified fields keep their defaults.
        assert_eq!(cfg.scrape.workers, 6);
    }

    #[test]
    fn test_model_url() {
        let cfg = Config::default();
        assert_eq!(
            cfg.model_url("acme/foo-bar"),
            "https://openrouter.ai/acme/foo-bar"
        );
    }
}
