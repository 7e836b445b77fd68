use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::models::MIN_INTERVAL_SECS;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "nl-NL,nl;q=0.9,en-US;q=0.8,en;q=0.7";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub monitor: MonitorSettings,
    pub scraper: ScraperConfig,
    pub notifications: NotificationsConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub state_file: PathBuf,
    pub min_interval_secs: u64,
    pub item_jitter_min_ms: u64,
    pub item_jitter_max_ms: u64,
    pub sweep_jitter_max_secs: u64,
    pub startup_grace_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub request_timeout_secs: u64,
    pub allowed_hosts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// "discord" posts to the alert sink as a webhook url, "log" only traces.
    pub transport: String,
    pub default_alert_sink: Option<String>,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    pub directory: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            monitor: MonitorSettings::default(),
            scraper: ScraperConfig::default(),
            notifications: NotificationsConfig {
                transport: "discord".to_string(),
                default_alert_sink: None,
                username: "Stock Watcher".to_string(),
            },
            metrics: MetricsConfig {
                enabled: false,
                port: 9001,
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("stock_state.json"),
            min_interval_secs: MIN_INTERVAL_SECS,
            item_jitter_min_ms: 1500,
            item_jitter_max_ms: 4000,
            sweep_jitter_max_secs: 10,
            startup_grace_secs: 3,
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            request_timeout_secs: 20,
            allowed_hosts: vec!["bol.com".to_string(), "mediamarkt".to_string()],
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let defaults = Config::try_from(&AppConfig::default())?;

        let s = Config::builder()
            // Start with built-in defaults so every file is optional
            .add_source(defaults)
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix "STOCKWATCH"
            .add_source(Environment::with_prefix("STOCKWATCH").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Legacy variable for the initial alert destination
        if config.notifications.default_alert_sink.is_none() {
            config.notifications.default_alert_sink =
                env::var("ALERT_SINK").ok().filter(|s| !s.trim().is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        if self.monitor.min_interval_secs == 0 {
            return Err(ConfigError::Message("Monitor min_interval_secs must be greater than 0".into()));
        }

        if self.monitor.item_jitter_min_ms > self.monitor.item_jitter_max_ms {
            return Err(ConfigError::Message(
                "Monitor item_jitter_min_ms cannot exceed item_jitter_max_ms".into(),
            ));
        }

        if self.scraper.request_timeout_secs == 0 {
            return Err(ConfigError::Message("Scraper request_timeout_secs must be greater than 0".into()));
        }

        if self.scraper.allowed_hosts.iter().all(|h| h.trim().is_empty()) {
            return Err(ConfigError::Message("Scraper allowed_hosts must not be empty".into()));
        }

        if !matches!(self.notifications.transport.as_str(), "discord" | "log") {
            return Err(ConfigError::Message(format!(
                "Unknown notification transport '{}'",
                self.notifications.transport
            )));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::Message("Metrics port must be greater than 0".into()));
        }

        Ok(())
    }
}
