use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::Platform;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "PUSH_CONFIG";

/// Environment variable overriding `listen_addr`.
pub const LISTEN_ADDR_ENV: &str = "PUSH_LISTEN_ADDR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Config file not found at {0}")]
    NotFound(PathBuf),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Provider variant per platform. Platforms without an entry are unroutable.
    #[serde(default)]
    pub providers: BTreeMap<Platform, ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// APNs with PKCS#12 certificate authentication.
    Apns {
        certificate_path: PathBuf,
        #[serde(default)]
        certificate_password: String,
        #[serde(default)]
        sandbox: bool,
        /// Default topic when a request carries none.
        #[serde(default)]
        topic: Option<String>,
    },
    /// Accepts everything and only logs.
    Noop,
}

/// Dispatch engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_per_attempt_timeout_ms")]
    pub per_attempt_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    #[serde(default = "default_cancel_grace_period_ms")]
    pub cancel_grace_period_ms: u64,
    /// Whole-call deadline; the dispatch cancels itself when it elapses.
    #[serde(default)]
    pub call_deadline_ms: Option<u64>,
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,
    /// Per-platform batch cap, overriding `default_batch_size`.
    #[serde(default)]
    pub max_batch_size: BTreeMap<Platform, usize>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8088".to_string()
}

fn default_max_concurrency() -> usize {
    10
}

fn default_per_attempt_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    200
}

fn default_backoff_cap_ms() -> u64 {
    5_000
}

fn default_cancel_grace_period_ms() -> u64 {
    2_000
}

fn default_batch_size() -> usize {
    1000
}

impl Config {
    /// Load from `$PUSH_CONFIG`, or `push.toml` in the working directory.
    ///
    /// A missing default file yields the default config; a missing file named
    /// explicitly through the environment is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from(Path::new(&path))?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(addr) = std::env::var(LISTEN_ADDR_ENV) {
            config.listen_addr = addr;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("push.toml")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dispatch.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            dispatch: DispatchConfig::default(),
            providers: BTreeMap::new(),
        }
    }
}

impl DispatchConfig {
    /// Batch cap for a platform.
    pub fn batch_size_for(&self, platform: Platform) -> usize {
        self.max_batch_size
            .get(&platform)
            .copied()
            .unwrap_or(self.default_batch_size)
    }

    pub fn per_attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.per_attempt_timeout_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }

    pub fn cancel_grace_period(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_period_ms)
    }

    pub fn call_deadline(&self) -> Option<Duration> {
        self.call_deadline_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be > 0".into()));
        }
        if self.per_attempt_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "per_attempt_timeout_ms must be > 0".into(),
            ));
        }
        if self.backoff_base_ms == 0 {
            return Err(ConfigError::Invalid("backoff_base_ms must be > 0".into()));
        }
        if self.cancel_grace_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "cancel_grace_period_ms must be > 0".into(),
            ));
        }
        if self.backoff_cap_ms < self.backoff_base_ms {
            return Err(ConfigError::Invalid(format!(
                "backoff_cap_ms ({}) is below backoff_base_ms ({})",
                self.backoff_cap_ms, self.backoff_base_ms
            )));
        }
        if self.call_deadline_ms == Some(0) {
            return Err(ConfigError::Invalid("call_deadline_ms must be > 0".into()));
        }
        if self.default_batch_size == 0 {
            return Err(ConfigError::Invalid("default_batch_size must be > 0".into()));
        }
        if let Some((platform, _)) = self.max_batch_size.iter().find(|(_, size)| **size == 0) {
            return Err(ConfigError::Invalid(format!(
                "max_batch_size for {platform} must be > 0"
            )));
        }
        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            per_attempt_timeout_ms: default_per_attempt_timeout_ms(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            cancel_grace_period_ms: default_cancel_grace_period_ms(),
            call_deadline_ms: None,
            default_batch_size: default_batch_size(),
            max_batch_size: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dispatch.max_concurrency, 10);
        assert_eq!(config.dispatch.max_retries, 2);
        assert_eq!(config.dispatch.per_attempt_timeout(), Duration::from_secs(10));
        assert_eq!(config.dispatch.batch_size_for(Platform::Ios), 1000);
        assert!(config.providers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let config = Config::from_toml_str(
            r#"
            listen_addr = "127.0.0.1:9000"

            [dispatch]
            max_retries = 5
            call_deadline_ms = 30000

            [dispatch.max_batch_size]
            ios = 100

            [providers.ios]
            kind = "apns"
            certificate_path = "cert.p12"
            sandbox = true

            [providers.webpush]
            kind = "noop"
            "#,
        )
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.dispatch.max_retries, 5);
        assert_eq!(config.dispatch.max_concurrency, 10);
        assert_eq!(config.dispatch.call_deadline(), Some(Duration::from_secs(30)));
        assert_eq!(config.dispatch.batch_size_for(Platform::Ios), 100);
        assert_eq!(config.dispatch.batch_size_for(Platform::Android), 1000);
        assert_eq!(config.providers[&Platform::Webpush], ProviderConfig::Noop);
        assert!(matches!(
            config.providers[&Platform::Ios],
            ProviderConfig::Apns { sandbox: true, .. }
        ));
    }

    #[test]
    fn test_invalid_backoff() {
        let err = Config::from_toml_str(
            r#"
            [dispatch]
            backoff_base_ms = 1000
            backoff_cap_ms = 10
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_durations_rejected() {
        for toml in [
            "[dispatch]\nbackoff_base_ms = 0\n",
            "[dispatch]\nbackoff_base_ms = 0\nbackoff_cap_ms = 0\n",
            "[dispatch]\ncancel_grace_period_ms = 0\n",
            "[dispatch]\nper_attempt_timeout_ms = 0\n",
            "[dispatch]\ncall_deadline_ms = 0\n",
        ] {
            let err = Config::from_toml_str(toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{toml:?}");
        }
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = Config::from_toml_str(
            r#"
            [dispatch.max_batch_size]
            android = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_platform_key_rejected() {
        let err = Config::from_toml_str(
            r#"
            [providers.huawei]
            kind = "noop"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/push.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
