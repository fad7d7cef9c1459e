use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{VestaError, VestaResult};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VestaConfig {
    pub backend: BackendConfig,
    pub sync: SyncConfig,
    pub flow: FlowConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Where the widget backend lives and how long requests may run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Transcript sync engine timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_sync_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Guided inquiry flow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default = "default_site_base_url")]
    pub site_base_url: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

fn default_api_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_debounce_ms() -> u64 {
    2_000
}

fn default_sync_timeout() -> u64 {
    30
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

fn default_site_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_max_results() -> usize {
    3
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vesta")
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_sync_timeout(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            site_base_url: default_site_base_url(),
            max_results: default_max_results(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

/// Install the global tracing subscriber per the logging section. Intended
/// for binaries and examples embedding the engine; calling it twice is a
/// no-op.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

impl VestaConfig {
    /// Load configuration from an optional `vesta.toml` next to the process,
    /// overridden by `VESTA_*` environment variables
    /// (e.g. `VESTA_BACKEND__API_BASE_URL`).
    pub fn load() -> VestaResult<Self> {
        dotenvy::dotenv().ok();

        let settings = ConfigBuilder::builder()
            .add_source(File::with_name("vesta").required(false))
            .add_source(Environment::with_prefix("VESTA").separator("__"))
            .build()?;

        let config: VestaConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> VestaResult<()> {
        if self.backend.api_base_url.trim().is_empty() {
            return Err(VestaError::InvalidConfigValue {
                key: "backend.api_base_url".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.flow.max_results == 0 {
            return Err(VestaError::InvalidConfigValue {
                key: "flow.max_results".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.sync.debounce_ms == 0 {
            return Err(VestaError::InvalidConfigValue {
                key: "sync.debounce_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VestaConfig::default();
        assert_eq!(config.sync.debounce_ms, 2_000);
        assert_eq!(config.sync.request_timeout_secs, 30);
        assert_eq!(config.sync.retry_delay_ms, 5_000);
        assert_eq!(config.flow.max_results, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_zero_max_results() {
        let mut config = VestaConfig::default();
        config.flow.max_results = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let mut config = VestaConfig::default();
        config.backend.api_base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_passes_validation() {
        assert!(VestaConfig::default().validate().is_ok());
    }
}
