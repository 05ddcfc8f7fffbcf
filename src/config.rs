use crate::common::constants::{
    BROWSER_USER_AGENT, DEFAULT_COUNTRY, DEFAULT_FALLBACK_CITY, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_INDEX_NAME, DEFAULT_INDEX_URL, DEFAULT_MAX_CONCURRENCY, DEFAULT_OUTPUT_FILE,
    DEFAULT_REGIONS,
};
use crate::common::error::{ConfigError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const CONFIG_PATH_ENV: &str = "NIGHTLIST_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub regions: BTreeMap<String, RegionConfig>,
    pub fallback_city: String,
    pub country: String,
    pub fetch: FetchConfig,
    pub index: IndexConfig,
    pub output_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionConfig {
    pub url: String,
    /// City used when a row's location is unknown
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub name: String,
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        let regions = DEFAULT_REGIONS
            .iter()
            .map(|(id, url, city)| {
                (
                    id.to_string(),
                    RegionConfig {
                        url: url.to_string(),
                        city: Some(city.to_string()),
                    },
                )
            })
            .collect();

        Self {
            regions,
            fallback_city: DEFAULT_FALLBACK_CITY.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            fetch: FetchConfig::default(),
            index: IndexConfig::default(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_INDEX_URL.to_string(),
            api_key: None,
            name: DEFAULT_INDEX_NAME.to_string(),
            enabled: false,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Config {
    /// Load config from `$NIGHTLIST_CONFIG` (or `config.toml`) if present, then apply env overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = if Path::new(&path).exists() {
            info!("Loading config from {}", path);
            Self::from_file(&path)?
        } else {
            debug!("No config file at {}, using defaults", path);
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Environment names kept compatible with the existing deployment
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("MEILI_URL") {
            self.index.url = url;
        }
        if let Ok(key) = std::env::var("MEILI_MASTER_KEY") {
            if !key.trim().is_empty() {
                self.index.api_key = Some(key);
            }
        }
        if let Ok(flag) = std::env::var("SAVE_TO_MEILISEARCH") {
            self.index.enabled = flag.eq_ignore_ascii_case("true") || flag == "1";
        }
        if let Ok(file) = std::env::var("OUTPUT_FILE") {
            self.output_file = file;
        }
        if let Ok(raw) = std::env::var("NIGHTLIST_MAX_CONCURRENCY") {
            self.fetch.max_concurrency = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "NIGHTLIST_MAX_CONCURRENCY".to_string(),
                message: format!("'{}' is not a positive integer", raw),
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.regions.is_empty() {
            return Err(ConfigError::NoRegions);
        }
        if self.fetch.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "fetch.max_concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn region_ids(&self) -> Vec<String> {
        self.regions.keys().cloned().collect()
    }

    pub fn region_url(&self, region: &str) -> Option<&str> {
        self.regions.get(region).map(|r| r.url.as_str())
    }

    /// Fallback city for rows of `region` whose location is unknown
    pub fn fallback_city_for(&self, region: &str) -> &str {
        self.regions
            .get(region)
            .and_then(|r| r.city.as_deref())
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(&self.fallback_city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_all_regions() {
        let config = Config::default();
        assert_eq!(config.regions.len(), 11);
        assert_eq!(
            config.region_url("la"),
            Some("https://19hz.info/eventlisting_LosAngeles.php")
        );
        assert_eq!(config.fallback_city_for("seattle"), "Seattle");
        assert_eq!(config.fallback_city_for("nowhere"), "Los Angeles");
        assert_eq!(config.fetch.max_concurrency, 11);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            fallback_city = "Austin"

            [regions.austin]
            url = "https://example.com/austin"

            [fetch]
            max_concurrency = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.region_ids(), vec!["austin".to_string()]);
        assert_eq!(config.fallback_city_for("austin"), "Austin");
        assert_eq!(config.fetch.max_concurrency, 3);
        assert_eq!(config.fetch.timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
        assert_eq!(config.country, "United States");
        assert_eq!(config.index.name, "events");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(Config::from_toml_str("regions = {}").is_err());
        assert!(Config::from_toml_str("[fetch]\nmax_concurrency = 0").is_err());
        assert!(Config::from_toml_str("fallback_city = [").is_err());
    }
}
