// HTTP client for the telemetry server REST endpoints
use crate::application::error::ClientError;
use crate::application::telemetry_api::{HistorySource, SimulatorBackend};
use crate::domain::history::HistoryPoint;
use crate::domain::simulator::{SimulatorConfig, SimulatorState};
use crate::infrastructure::config::AppConfig;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};

/// Epoch values above this are taken as milliseconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

#[derive(Debug, Clone)]
pub struct HttpTelemetryApi {
    client: reqwest::Client,
    config: AppConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRequest {
    base_speed: f64,
    speed_variation: f64,
    change_interval: f64,
    acceleration_factor: f64,
}

impl From<&SimulatorConfig> for StartRequest {
    fn from(config: &SimulatorConfig) -> Self {
        Self {
            base_speed: config.base_speed,
            speed_variation: config.speed_variation,
            change_interval: config.change_interval,
            acceleration_factor: config.acceleration_factor,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    timestamp: WireTimestamp,
    speed: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Epoch(f64),
    Text(String),
}

impl WireTimestamp {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            WireTimestamp::Epoch(value) => {
                let millis = if value.abs() > EPOCH_MILLIS_THRESHOLD {
                    *value
                } else {
                    value * 1000.0
                };
                Utc.timestamp_millis_opt(millis.round() as i64).single()
            }
            WireTimestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|t| t.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    // Naive ISO timestamps are UTC
                    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|t| t.and_utc())
                }),
        }
    }
}

impl HttpTelemetryApi {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, config })
    }

    /// Liveness probe, used once at startup.
    pub async fn check_health(&self) -> Result<(), ClientError> {
        let response = self
            .client
            .get(self.config.api_url("/health"))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await.map(|_| ())
    }

    fn parse_history(body: &str) -> Result<Vec<HistoryPoint>, ClientError> {
        let records: Vec<HistoryRecord> = serde_json::from_str(body)
            .map_err(|e| ClientError::Protocol(format!("invalid history payload: {}", e)))?;

        let total = records.len();
        let points: Vec<HistoryPoint> = records
            .into_iter()
            .filter_map(|r| r.timestamp.to_utc().map(|t| HistoryPoint::new(t, r.speed)))
            .collect();

        if points.len() < total {
            tracing::debug!(
                skipped = total - points.len(),
                "Skipped history records with unreadable timestamps"
            );
        }
        Ok(points)
    }

    fn parse_status(body: &str) -> Result<SimulatorState, ClientError> {
        let status: StatusResponse = serde_json::from_str(body)
            .map_err(|e| ClientError::Protocol(format!("invalid status payload: {}", e)))?;

        match status.status.as_str() {
            "running" => Ok(SimulatorState::Running),
            "stopped" => Ok(SimulatorState::Stopped),
            other => Err(ClientError::Protocol(format!(
                "unknown simulator status '{}'",
                other
            ))),
        }
    }
}

fn transport(e: reqwest::Error) -> ClientError {
    ClientError::Transport(e.to_string())
}

/// Maps the status code onto the error taxonomy and returns the body text.
async fn ensure_success(response: Response) -> Result<String, ClientError> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;

    if status.is_success() {
        Ok(body)
    } else if status == StatusCode::CONFLICT {
        Err(ClientError::StateConflict(body))
    } else {
        Err(ClientError::Transport(format!(
            "server answered {}: {}",
            status, body
        )))
    }
}

#[async_trait]
impl HistorySource for HttpTelemetryApi {
    async fn fetch_history(&self, hours: u32) -> Result<Vec<HistoryPoint>, ClientError> {
        let mut request = self
            .client
            .get(self.config.api_url("/history"))
            .query(&[("hours", hours)]);
        if let Some(limit) = self.config.history.limit {
            request = request.query(&[("limit", limit)]);
        }

        tracing::debug!(hours, "Fetching history");
        let response = request.send().await.map_err(transport)?;
        let body = ensure_success(response).await?;
        Self::parse_history(&body)
    }
}

#[async_trait]
impl SimulatorBackend for HttpTelemetryApi {
    async fn start(&self, config: &SimulatorConfig) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.config.api_url("/simulator/start"))
            .json(&StartRequest::from(config))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await.map(|_| ())
    }

    async fn stop(&self) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.config.api_url("/simulator/stop"))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await.map(|_| ())
    }

    async fn status(&self) -> Result<SimulatorState, ClientError> {
        let response = self
            .client
            .get(self.config.api_url("/simulator/status"))
            .send()
            .await
            .map_err(transport)?;
        let body = ensure_success(response).await?;
        Self::parse_status(&body)
    }
}
