//! Runner configuration: which symbols, which provider, how many workers.
//!
//! ```toml
//! symbols = ["EUR/USD", "XAU/USD"]
//! interval = "1h"
//! bar_count = 100
//! threads = 4
//!
//! [provider]
//! kind = "twelve_data"
//! api_key_env = "TWELVE_API_KEY"
//! min_request_interval_ms = 8000
//!
//! [engine]
//! confidence_threshold = 8
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use signallab_core::config::{ConfigError, EngineConfig};
use signallab_core::data::{
    parse_interval, CircuitBreaker, CsvProvider, MarketDataProvider, ProviderError,
    RequestPacer, SyntheticProvider, TwelveDataProvider, TwelveDataSettings,
};

pub const DEFAULT_API_KEY_ENV: &str = "TWELVE_API_KEY";

#[derive(Debug, Error)]
pub enum RunnerConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("engine config: {0}")]
    Engine(#[from] ConfigError),

    #[error("unsupported interval '{0}'")]
    Interval(String),

    #[error("bar_count must be positive")]
    BarCount,

    #[error("environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("provider setup failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    TwelveData {
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
        #[serde(default = "default_base_url")]
        base_url: String,
        #[serde(default = "default_min_request_interval_ms")]
        min_request_interval_ms: u64,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
        #[serde(default = "default_max_retries")]
        max_retries: u32,
    },
    Csv {
        dir: PathBuf,
    },
    Synthetic {
        #[serde(default)]
        without_volume: bool,
    },
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_base_url() -> String {
    signallab_core::data::twelve_data::DEFAULT_BASE_URL.to_string()
}

fn default_min_request_interval_ms() -> u64 {
    8000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::TwelveData {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            min_request_interval_ms: default_min_request_interval_ms(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl ProviderConfig {
    /// Build the provider, reading the API key from the process environment.
    pub fn build(&self) -> Result<Box<dyn MarketDataProvider>, RunnerConfigError> {
        self.build_with_env(|key| std::env::var(key).ok())
    }

    /// Build the provider with an explicit environment lookup.
    ///
    /// The HTTP provider gets one [`RequestPacer`] that every worker and
    /// every retry draws from, so the batch shares one request budget.
    pub fn build_with_env(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Box<dyn MarketDataProvider>, RunnerConfigError> {
        match self {
            ProviderConfig::TwelveData {
                api_key_env,
                base_url,
                min_request_interval_ms,
                timeout_secs,
                max_retries,
            } => {
                let api_key = lookup(api_key_env)
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| RunnerConfigError::MissingApiKey(api_key_env.clone()))?;
                let settings = TwelveDataSettings {
                    base_url: base_url.clone(),
                    timeout: Duration::from_secs(*timeout_secs),
                    max_retries: *max_retries,
                    ..TwelveDataSettings::new(api_key)
                };
                let pacer = Arc::new(RequestPacer::new(Duration::from_millis(
                    *min_request_interval_ms,
                )));
                Ok(Box::new(TwelveDataProvider::new(
                    settings,
                    Arc::new(CircuitBreaker::default_provider()),
                    pacer,
                )?))
            }
            ProviderConfig::Csv { dir } => Ok(Box::new(CsvProvider::new(dir.clone()))),
            ProviderConfig::Synthetic { without_volume } => Ok(Box::new(if *without_volume {
                SyntheticProvider::without_volume()
            } else {
                SyntheticProvider::new()
            })),
        }
    }
}

/// Full batch-run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub symbols: Vec<String>,
    pub interval: String,
    pub bar_count: usize,
    /// Worker threads for the batch pool.
    pub threads: usize,
    pub provider: ProviderConfig,
    pub engine: EngineConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            symbols: vec![
                "EUR/USD".to_string(),
                "GBP/USD".to_string(),
                "XAU/USD".to_string(),
            ],
            interval: "1h".to_string(),
            bar_count: 100,
            threads: 4,
            provider: ProviderConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn from_file(path: &Path) -> Result<Self, RunnerConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| RunnerConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, RunnerConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| RunnerConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, RunnerConfigError> {
        toml::to_string_pretty(self).map_err(|e| RunnerConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), RunnerConfigError> {
        self.engine.validate()?;
        if parse_interval(&self.interval).is_none() {
            return Err(RunnerConfigError::Interval(self.interval.clone()));
        }
        if self.bar_count == 0 {
            return Err(RunnerConfigError::BarCount);
        }
        Ok(())
    }

    /// Worker count, never below one.
    pub fn worker_threads(&self) -> usize {
        self.threads.max(1)
    }
}
