//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use scholarline_core::PacingPolicy;
use scholarline_core::pacing::{DEFAULT_MAX_DELAY, DEFAULT_MIN_DELAY};
use scholarline_semantic_scholar::ApiConfig;
use scholarline_semantic_scholar::config::{API_KEY_ENV, DEFAULT_API_URL, DEFAULT_MAX_RETRIES};

/// Global configuration for scholarline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub workers: WorkersConfig,
    pub pacing: PacingConfig,
    pub http: HttpConfig,
    pub s2: S2Config,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_dir: PathBuf,
    pub compression_level: i32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("."),
            compression_level: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub default: usize,
    pub max: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            default: scholarline_harvest::DEFAULT_WORKERS,
            max: scholarline_harvest::MAX_WORKERS,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_ms: DEFAULT_MIN_DELAY.as_millis() as u64,
            max_ms: DEFAULT_MAX_DELAY.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: scholarline_core::http::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct S2Config {
    pub api_url: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub api_key: Option<String>,
}

impl Default for S2Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()),
        }
    }
}

/// Per-invocation overrides from command-line flags
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub workers: Option<usize>,
    pub min_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./scholarline.toml (current directory)
    /// 2. ~/.config/scholarline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("scholarline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "scholarline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Worker count: flag, else file default, capped at `workers.max`
    /// (itself never above [`MAX_WORKERS`](scholarline_harvest::MAX_WORKERS))
    pub fn worker_count(&self, flag: Option<usize>) -> Result<usize> {
        let requested = flag.unwrap_or(self.workers.default);
        anyhow::ensure!(requested >= 1, "worker count must be at least 1");
        let cap = self.workers.max.clamp(1, scholarline_harvest::MAX_WORKERS);
        if requested > cap {
            log::warn!("Requested {requested} workers, capped at {cap}");
        }
        Ok(requested.min(cap))
    }

    pub fn pacing_policy(&self, overrides: &Overrides) -> Result<PacingPolicy> {
        let min = overrides.min_delay_ms.unwrap_or(self.pacing.min_ms);
        let max = overrides.max_delay_ms.unwrap_or(self.pacing.max_ms);
        PacingPolicy::from_millis(min, max).map_err(anyhow::Error::msg)
    }

    pub fn harvest_config(&self, overrides: &Overrides) -> Result<scholarline_harvest::Config> {
        Ok(scholarline_harvest::Config {
            workers: self.worker_count(overrides.workers)?,
            pacing: self.pacing_policy(overrides)?,
        })
    }

    pub fn api_config(&self, overrides: &Overrides) -> ApiConfig {
        ApiConfig {
            api_key: self.s2.api_key.clone(),
            timeout: Duration::from_secs(overrides.timeout_secs.unwrap_or(self.http.timeout_secs)),
            max_retries: overrides.max_retries.unwrap_or(self.http.max_retries),
            ..ApiConfig::default().with_api_url(&self.s2.api_url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.output.default_dir, PathBuf::from("."));
        assert_eq!(config.output.compression_level, 3);
        assert_eq!(config.workers.default, 5);
        assert_eq!(config.pacing.min_ms, 500);
        assert_eq!(config.pacing.max_ms, 2500);
    }

    #[test]
    fn expand_env_var_simple() {
        std::env::set_var("SCHOLARLINE_TEST_VAR", "test_value");
        assert_eq!(
            expand_env_var("${SCHOLARLINE_TEST_VAR}"),
            Some("test_value".to_string())
        );
        std::env::remove_var("SCHOLARLINE_TEST_VAR");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(expand_env_var("literal"), Some("literal".to_string()));
    }

    #[test]
    fn expand_env_var_missing() {
        assert_eq!(expand_env_var("${NONEXISTENT_VAR_12345}"), None);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[output]
default_dir = "/tmp/data"
compression_level = 5

[workers]
default = 4
max = 8

[pacing]
min_ms = 100
max_ms = 200

[s2]
api_url = "http://localhost:8080/graph/v1"
api_key = "literal-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.output.default_dir, PathBuf::from("/tmp/data"));
        assert_eq!(config.output.compression_level, 5);
        assert_eq!(config.workers.default, 4);
        assert_eq!(config.workers.max, 8);
        assert_eq!(config.pacing.max_ms, 200);
        assert_eq!(config.http.max_retries, DEFAULT_MAX_RETRIES);

        let api = config.api_config(&Overrides::default());
        assert_eq!(api.api_url, "http://localhost:8080/graph/v1/");
        assert_eq!(api.api_key.as_deref(), Some("literal-key"));
    }

    #[test]
    fn overrides_win() {
        let config = Config::default();
        let overrides = Overrides {
            workers: Some(2),
            min_delay_ms: Some(0),
            max_delay_ms: Some(0),
            timeout_secs: Some(5),
            max_retries: Some(0),
        };
        let harvest = config.harvest_config(&overrides).unwrap();
        assert_eq!(harvest.workers, 2);
        assert!(harvest.pacing.is_disabled());

        let api = config.api_config(&overrides);
        assert_eq!(api.timeout, Duration::from_secs(5));
        assert_eq!(api.max_retries, 0);
    }

    #[test]
    fn workers_capped_and_validated() {
        let config = Config {
            workers: WorkersConfig { default: 5, max: 3 },
            ..Default::default()
        };
        assert_eq!(config.worker_count(Some(20)).unwrap(), 3);
        assert!(config.worker_count(Some(0)).is_err());

        // A configured maximum above the hard bound is clamped
        let config = Config {
            workers: WorkersConfig { default: 5, max: 8 },
            ..Default::default()
        };
        assert_eq!(config.worker_count(Some(8)).unwrap(), 5);
        assert_eq!(config.worker_count(None).unwrap(), 5);
    }

    #[test]
    fn inverted_pacing_rejected() {
        let overrides = Overrides {
            min_delay_ms: Some(3000),
            max_delay_ms: Some(1000),
            ..Default::default()
        };
        let err = Config::default().pacing_policy(&overrides).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }
}
