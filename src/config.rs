// src/config.rs
use crate::domain::errors::{AppError, AppResult};
use crate::domain::models::{Exchange, HistoryPeriod};
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Accepted debounce window for search-as-you-type, in milliseconds.
pub const SEARCH_DEBOUNCE_RANGE_MS: (u64, u64) = (120, 180);

/// Dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Market data provider
    pub api: ApiConfig,

    /// Search behaviour
    pub search: SearchConfig,

    /// Initial dashboard state
    pub dashboard: DashboardConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the provider, e.g. "http://localhost:3000"
    pub base_url: String,

    /// Per-request timeout
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub default_exchange: Exchange,
    pub default_period: HistoryPeriod,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "warn", "error")
    pub level: String,

    /// Log to file
    pub to_file: bool,

    /// Log file path
    pub file_path: Option<String>,
}

impl Config {
    /// `CONFIG_FILE` wins when it points at an existing file. A missing file
    /// is seeded from the environment so it can be edited for the next run.
    pub fn load() -> AppResult<Self> {
        dotenv().ok();

        let Ok(path) = env::var("CONFIG_FILE") else {
            return Self::from_env();
        };
        if Path::new(&path).exists() {
            return Self::from_file(&path);
        }

        let config = Self::from_env()?;
        config.to_file(&path)?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let base_url = env::var("MARKET_API_BASE_URL").unwrap_or(defaults.api.base_url);
        Url::parse(&base_url).map_err(|e| {
            AppError::Config(format!("Invalid MARKET_API_BASE_URL {}: {}", base_url, e))
        })?;

        let api_config = ApiConfig {
            base_url,
            timeout_ms: env::var("MARKET_API_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.api.timeout_ms),
        };

        let search_config = SearchConfig {
            debounce_ms: clamp_debounce(
                env::var("SEARCH_DEBOUNCE_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.search.debounce_ms),
            ),
            cache_ttl_secs: env::var("SEARCH_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.search.cache_ttl_secs),
        };

        let default_exchange = match env::var("DEFAULT_EXCHANGE") {
            Ok(value) => value
                .parse::<Exchange>()
                .map_err(|e| AppError::Config(format!("Invalid DEFAULT_EXCHANGE: {}", e)))?,
            Err(_) => defaults.dashboard.default_exchange,
        };
        let default_period = match env::var("DEFAULT_PERIOD") {
            Ok(value) => value
                .parse::<HistoryPeriod>()
                .map_err(|e| AppError::Config(format!("Invalid DEFAULT_PERIOD: {}", e)))?,
            Err(_) => defaults.dashboard.default_period,
        };

        let logging_config = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            to_file: env::var("LOG_TO_FILE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            file_path: env::var("LOG_FILE_PATH").ok(),
        };

        Ok(Config {
            api: api_config,
            search: search_config,
            dashboard: DashboardConfig {
                default_exchange,
                default_period,
            },
            logging: logging_config,
        })
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut config: Config = serde_json::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        Url::parse(&config.api.base_url).map_err(|e| {
            AppError::Config(format!("Invalid api.base_url {}: {}", config.api.base_url, e))
        })?;
        config.search.debounce_ms = clamp_debounce(config.search.debounce_ms);

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, contents).map_err(|e| {
            AppError::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(clamp_debounce(self.search.debounce_ms))
    }

    pub fn search_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.search.cache_ttl_secs)
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> AppResult<()> {
        let mut builder = env_logger::Builder::new();

        // Set log level
        let log_level = match self.logging.level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        };

        builder.filter_level(log_level);

        // Configure output
        if self.logging.to_file {
            if let Some(file_path) = &self.logging.file_path {
                let file = File::create(file_path).map_err(|e| {
                    AppError::Config(format!("Failed to create log file: {}", e))
                })?;

                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
        }

        builder
            .try_init()
            .map_err(|e| AppError::Config(format!("Failed to initialize logger: {}", e)))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:3000".to_string(),
                timeout_ms: 8000,
            },
            search: SearchConfig {
                debounce_ms: 150,
                cache_ttl_secs: 60,
            },
            dashboard: DashboardConfig {
                default_exchange: Exchange::Primary,
                default_period: HistoryPeriod::OneMonth,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                to_file: false,
                file_path: None,
            },
        }
    }
}

fn clamp_debounce(ms: u64) -> u64 {
    ms.clamp(SEARCH_DEBOUNCE_RANGE_MS.0, SEARCH_DEBOUNCE_RANGE_MS.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debounce_is_clamped_into_window() {
        assert_eq!(clamp_debounce(0), 120);
        assert_eq!(clamp_debounce(150), 150);
        assert_eq!(clamp_debounce(1000), 180);

        let mut config = Config::default();
        config.search.debounce_ms = 5;
        assert_eq!(config.search_debounce(), Duration::from_millis(120));
    }

    #[test]
    fn file_round_trip() {
        let path = env::temp_dir().join(format!("dashboard-config-{}.json", std::process::id()));
        let mut config = Config::default();
        config.dashboard.default_exchange = Exchange::Secondary;
        config.dashboard.default_period = HistoryPeriod::ThreeYears;

        config.to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn file_with_bad_base_url_is_rejected() {
        let path = env::temp_dir().join(format!("dashboard-bad-url-{}.json", std::process::id()));
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        config.search.debounce_ms = 900;

        config.to_file(&path).unwrap();
        let err = Config::from_file(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);

        assert!(matches!(err, AppError::Config(msg) if msg.contains("api.base_url")));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = Config::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
