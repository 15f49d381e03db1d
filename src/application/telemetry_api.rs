// Contracts for the telemetry server
use crate::application::error::ClientError;
use crate::domain::history::HistoryPoint;
use crate::domain::simulator::{SimulatorConfig, SimulatorState};
use async_trait::async_trait;

#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Points recorded during the trailing `hours`, in any order
    async fn fetch_history(&self, hours: u32) -> Result<Vec<HistoryPoint>, ClientError>;
}

#[async_trait]
pub trait SimulatorBackend: Send + Sync {
    async fn start(&self, config: &SimulatorConfig) -> Result<(), ClientError>;

    async fn stop(&self) -> Result<(), ClientError>;

    async fn status(&self) -> Result<SimulatorState, ClientError>;
}
