use crate::domain::simulator::SimulatorConfig;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub stream: StreamSettings,
    pub history: HistorySettings,
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StreamSettings {
    pub path: String,
    pub reconnect: ReconnectPolicy,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            path: "/ws".to_string(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Backoff applied after the stream drops. `close()` never reconnects.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
    /// Consecutive failed attempts before giving up; unlimited when absent
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            multiplier: 2.0,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn next_backoff(&self, current: Duration) -> Duration {
        let max = Duration::from_millis(self.max_backoff_ms);
        let next = current.as_secs_f64() * self.multiplier.max(1.0);
        Duration::from_secs_f64(next.min(max.as_secs_f64()))
    }

    /// Whether another attempt is allowed after `attempts` failures.
    pub fn allows(&self, attempts: u32) -> bool {
        self.enabled && self.max_attempts.is_none_or(|max| attempts < max)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HistorySettings {
    pub hours: u32,
    pub limit: Option<u32>,
    pub chart_width: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            hours: 24,
            limit: None,
            chart_width: 60,
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// WebSocket address derived from the HTTP base address.
    pub fn stream_url(&self) -> String {
        let url = self.api_url(&self.stream.path);
        if let Some(rest) = url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            url
        }
    }
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/speedometer").required(false))
        .add_source(config::Environment::with_prefix("SPEEDOMETER").separator("__"))
        .build()
        .context("Failed to read speedometer configuration")?;

    settings
        .try_deserialize()
        .context("Invalid speedometer configuration")
}
