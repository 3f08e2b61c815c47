use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use crate::fetcher::RetryPolicy;
use crate::models::NewPrinterSource;

/// Poll ticks never run more often than this, whatever the config says.
pub const MIN_POLL_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub printers: Vec<NewPrinterSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub enabled: bool,
    /// Seconds between poll ticks; values below 30 are raised to 30.
    pub interval_secs: u64,
    pub connect_timeout_ms: u64,
    pub read_timeout_secs: u64,
    /// Attempts for the primary counter request (1 = no retry).
    pub max_attempts: u32,
    /// Overall budget for polling one source, alternates included. Must cover the
    /// fetcher's worst case.
    pub poll_timeout_secs: u64,
    /// Sources polled at the same time.
    pub concurrency: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 300,
            connect_timeout_ms: 3000,
            read_timeout_secs: 15,
            max_attempts: 2,
            poll_timeout_secs: 120,
            concurrency: 4,
        }
    }
}

impl PollingConfig {
    pub fn effective_interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
        }
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.polling.connect_timeout_ms > 0,
            "polling.connect_timeout_ms must be > 0, got {}",
            self.polling.connect_timeout_ms
        );
        anyhow::ensure!(
            self.polling.read_timeout_secs > 0,
            "polling.read_timeout_secs must be > 0, got {}",
            self.polling.read_timeout_secs
        );
        anyhow::ensure!(
            self.polling.max_attempts >= 1,
            "polling.max_attempts must be >= 1, got {}",
            self.polling.max_attempts
        );
        anyhow::ensure!(
            self.polling.poll_timeout_secs > 0,
            "polling.poll_timeout_secs must be > 0, got {}",
            self.polling.poll_timeout_secs
        );
        let worst_case = self.polling.retry_policy().worst_case();
        anyhow::ensure!(
            self.polling.poll_timeout() >= worst_case,
            "polling.poll_timeout_secs ({}) must cover a full fetch with retries and alternates ({}s)",
            self.polling.poll_timeout_secs,
            worst_case.as_secs_f64().ceil()
        );
        anyhow::ensure!(
            self.polling.concurrency > 0,
            "polling.concurrency must be > 0, got {}",
            self.polling.concurrency
        );

        let mut names = HashSet::new();
        for printer in &self.printers {
            let name = printer.name.trim();
            anyhow::ensure!(!name.is_empty(), "printers[].name must be non-empty");
            anyhow::ensure!(
                !printer.counter_url.trim().is_empty(),
                "printers[{name}].counter_url must be non-empty"
            );
            anyhow::ensure!(names.insert(name), "duplicate printer name {name:?}");
        }
        Ok(())
    }
}
