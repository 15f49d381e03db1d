// Simulator session controller - Run state and configuration edits
use crate::application::error::{ClientError, ConfigEditError, ControlError, PendingCall};
#[cfg(test)]
use crate::application::telemetry_api::SimulatorBackend;
use crate::domain::simulator::{ConfigField, SimulatorConfig, SimulatorState};

/// Tracks whether the simulator runs and owns the configuration sent on start.
///
/// Each transition is split into `begin_*` and `finish_*` so the console can
/// run the call on a separate task while it keeps handling samples. Only one
/// call may be outstanding at a time.
#[derive(Debug, Clone)]
pub struct SessionController {
    state: SimulatorState,
    config: SimulatorConfig,
    pending: Option<PendingCall>,
}

impl SessionController {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            state: SimulatorState::Stopped,
            config,
            pending: None,
        }
    }

    pub fn state(&self) -> SimulatorState {
        self.state
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn pending(&self) -> Option<PendingCall> {
        self.pending
    }

    /// Configuration may only change while stopped and idle.
    pub fn is_editable(&self) -> bool {
        self.state == SimulatorState::Stopped && self.pending.is_none()
    }

    /// Replaces a single field with `raw` parsed as a float. Bounds are not
    /// checked; the backend decides what to make of odd values.
    pub fn update_config_field(
        &mut self,
        field: ConfigField,
        raw: &str,
    ) -> Result<f64, ConfigEditError> {
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| ConfigEditError::InvalidNumber {
                field: field.to_string(),
                raw: raw.to_string(),
            })?;

        match field {
            ConfigField::ChangeInterval if value <= 0.0 => {
                tracing::warn!(value, "changeInterval is not positive, sending as-is");
            }
            ConfigField::SpeedVariation if value < 0.0 => {
                tracing::warn!(value, "speedVariation is negative, sending as-is");
            }
            _ => {}
        }

        self.config.set(field, value);
        Ok(value)
    }

    pub fn begin_start(&mut self) -> Result<SimulatorConfig, ControlError> {
        self.claim(PendingCall::Start, SimulatorState::Stopped, "start")?;
        Ok(self.config)
    }

    pub fn finish_start(&mut self, result: Result<(), ClientError>) -> Result<(), ClientError> {
        self.settle(PendingCall::Start, result.map(|_| SimulatorState::Running), SimulatorState::Running)
    }

    pub fn begin_stop(&mut self) -> Result<(), ControlError> {
        self.claim(PendingCall::Stop, SimulatorState::Running, "stop")
    }

    pub fn finish_stop(&mut self, result: Result<(), ClientError>) -> Result<(), ClientError> {
        self.settle(PendingCall::Stop, result.map(|_| SimulatorState::Stopped), SimulatorState::Stopped)
    }

    pub fn begin_refresh(&mut self) -> Result<(), ControlError> {
        if let Some(pending) = self.pending {
            return Err(ControlError::InFlight(pending));
        }
        self.pending = Some(PendingCall::Status);
        Ok(())
    }

    pub fn finish_refresh(
        &mut self,
        result: Result<SimulatorState, ClientError>,
    ) -> Result<SimulatorState, ClientError> {
        self.clear(PendingCall::Status);
        let state = result?;
        if state != self.state {
            tracing::info!(from = %self.state, to = %state, "Simulator state refreshed");
        }
        self.state = state;
        Ok(state)
    }

    #[cfg(test)]
    pub async fn start(&mut self, backend: &dyn SimulatorBackend) -> Result<(), ControlError> {
        let config = self.begin_start()?;
        let result = backend.start(&config).await;
        Ok(self.finish_start(result)?)
    }

    #[cfg(test)]
    pub async fn stop(&mut self, backend: &dyn SimulatorBackend) -> Result<(), ControlError> {
        self.begin_stop()?;
        let result = backend.stop().await;
        Ok(self.finish_stop(result)?)
    }

    #[cfg(test)]
    pub async fn refresh_status(
        &mut self,
        backend: &dyn SimulatorBackend,
    ) -> Result<SimulatorState, ControlError> {
        self.begin_refresh()?;
        let result = backend.status().await;
        Ok(self.finish_refresh(result)?)
    }

    fn claim(
        &mut self,
        call: PendingCall,
        required: SimulatorState,
        action: &'static str,
    ) -> Result<(), ControlError> {
        if let Some(pending) = self.pending {
            return Err(ControlError::InFlight(pending));
        }
        if self.state != required {
            return Err(ControlError::Unavailable {
                action,
                state: self.state,
            });
        }
        self.pending = Some(call);
        Ok(())
    }

    fn settle(
        &mut self,
        call: PendingCall,
        result: Result<SimulatorState, ClientError>,
        target: SimulatorState,
    ) -> Result<(), ClientError> {
        self.clear(call);
        match result {
            Ok(state) => {
                tracing::info!(%state, "Simulator {} confirmed", call);
                self.state = state;
                Ok(())
            }
            // The server is already where we wanted it
            Err(ClientError::StateConflict(detail)) => {
                tracing::info!(%detail, "Simulator {} was a no-op", call);
                self.state = target;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, state = %self.state, "Simulator {} failed", call);
                Err(e)
            }
        }
    }

    fn clear(&mut self, call: PendingCall) {
        if self.pending == Some(call) {
            self.pending = None;
        } else {
            tracing::debug!(?call, pending = ?self.pending, "Settled call was not the pending one");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Backend that answers from canned results and records what it was sent.
    struct FakeBackend {
        start_result: Result<(), ClientError>,
        stop_result: Result<(), ClientError>,
        status_result: Result<SimulatorState, ClientError>,
        started_with: Mutex<Vec<SimulatorConfig>>,
    }

    impl FakeBackend {
        fn ok() -> Self {
            Self {
                start_result: Ok(()),
                stop_result: Ok(()),
                status_result: Ok(SimulatorState::Stopped),
                started_with: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SimulatorBackend for FakeBackend {
        async fn start(&self, config: &SimulatorConfig) -> Result<(), ClientError> {
            self.started_with.lock().unwrap().push(*config);
            self.start_result.clone()
        }

        async fn stop(&self) -> Result<(), ClientError> {
            self.stop_result.clone()
        }

        async fn status(&self) -> Result<SimulatorState, ClientError> {
            self.status_result.clone()
        }
    }

    #[test]
    fn test_update_touches_only_named_field() {
        let mut controller = SessionController::new(SimulatorConfig::default());
        let before = *controller.config();

        for field in ConfigField::ALL {
            let mut controller = controller.clone();
            controller.update_config_field(field, "99.5").unwrap();
            for other in ConfigField::ALL {
                let expected = if other == field { 99.5 } else { before.get(other) };
                assert_eq!(controller.config().get(other), expected, "{other} after editing {field}");
            }
        }

        controller.update_config_field(ConfigField::BaseSpeed, " 12 ").unwrap();
        assert_eq!(controller.config().base_speed, 12.0);
    }

    #[test]
    fn test_update_rejects_non_numbers_without_change() {
        let mut controller = SessionController::new(SimulatorConfig::default());
        let err = controller
            .update_config_field(ConfigField::BaseSpeed, "fast")
            .unwrap_err();
        assert!(matches!(err, ConfigEditError::InvalidNumber { .. }));
        assert_eq!(*controller.config(), SimulatorConfig::default());
    }

    #[test]
    fn test_update_accepts_out_of_range_values() {
        let mut controller = SessionController::new(SimulatorConfig::default());
        controller.update_config_field(ConfigField::ChangeInterval, "0").unwrap();
        controller.update_config_field(ConfigField::BaseSpeed, "-15").unwrap();
        assert_eq!(controller.config().change_interval, 0.0);
        assert_eq!(controller.config().base_speed, -15.0);
    }

    #[tokio::test]
    async fn test_start_success_runs() {
        let backend = FakeBackend::ok();
        let mut controller = SessionController::new(SimulatorConfig::default());

        controller.start(&backend).await.unwrap();
        assert_eq!(controller.state(), SimulatorState::Running);
        assert_eq!(controller.pending(), None);
        assert!(!controller.is_editable());
    }

    #[tokio::test]
    async fn test_start_failure_stays_stopped() {
        let backend = FakeBackend {
            start_result: Err(ClientError::Transport("connection refused".into())),
            ..FakeBackend::ok()
        };
        let mut controller = SessionController::new(SimulatorConfig::default());

        let err = controller.start(&backend).await.unwrap_err();
        assert!(matches!(err, ControlError::Client(ClientError::Transport(_))));
        assert_eq!(controller.state(), SimulatorState::Stopped);
        assert!(controller.is_editable());
    }

    #[tokio::test]
    async fn test_start_with_zero_interval_is_sent() {
        let backend = FakeBackend::ok();
        let mut controller = SessionController::new(SimulatorConfig::default());
        controller.update_config_field(ConfigField::ChangeInterval, "0").unwrap();

        controller.start(&backend).await.unwrap();
        let sent = backend.started_with.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].change_interval, 0.0);
        assert_eq!(controller.state(), SimulatorState::Running);
    }

    #[tokio::test]
    async fn test_conflict_counts_as_success() {
        let backend = FakeBackend {
            start_result: Err(ClientError::StateConflict("already running".into())),
            stop_result: Err(ClientError::StateConflict("already stopped".into())),
            ..FakeBackend::ok()
        };
        let mut controller = SessionController::new(SimulatorConfig::default());

        controller.start(&backend).await.unwrap();
        assert_eq!(controller.state(), SimulatorState::Running);
        controller.stop(&backend).await.unwrap();
        assert_eq!(controller.state(), SimulatorState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_failure_stays_running() {
        let backend = FakeBackend {
            stop_result: Err(ClientError::Transport("timed out".into())),
            ..FakeBackend::ok()
        };
        let mut controller = SessionController::new(SimulatorConfig::default());
        controller.start(&backend).await.unwrap();

        assert!(controller.stop(&backend).await.is_err());
        assert_eq!(controller.state(), SimulatorState::Running);
    }

    #[test]
    fn test_overlapping_calls_are_refused() {
        let mut controller = SessionController::new(SimulatorConfig::default());
        controller.begin_start().unwrap();

        assert_eq!(
            controller.begin_start().unwrap_err(),
            ControlError::InFlight(PendingCall::Start)
        );
        assert_eq!(
            controller.begin_refresh().unwrap_err(),
            ControlError::InFlight(PendingCall::Start)
        );
        assert!(!controller.is_editable());

        controller.finish_start(Ok(())).unwrap();
        assert_eq!(controller.state(), SimulatorState::Running);
        controller.begin_stop().unwrap();
    }

    #[test]
    fn test_action_must_match_state() {
        let mut controller = SessionController::new(SimulatorConfig::default());
        assert_eq!(
            controller.begin_stop().unwrap_err(),
            ControlError::Unavailable {
                action: "stop",
                state: SimulatorState::Stopped
            }
        );
        assert_eq!(controller.pending(), None);
    }

    #[tokio::test]
    async fn test_refresh_adopts_reported_state() {
        let backend = FakeBackend {
            status_result: Ok(SimulatorState::Running),
            ..FakeBackend::ok()
        };
        let mut controller = SessionController::new(SimulatorConfig::default());

        let state = controller.refresh_status(&backend).await.unwrap();
        assert_eq!(state, SimulatorState::Running);
        assert_eq!(controller.state(), SimulatorState::Running);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_state() {
        let backend = FakeBackend {
            status_result: Err(ClientError::Transport("unreachable".into())),
            ..FakeBackend::ok()
        };
        let mut controller = SessionController::new(SimulatorConfig::default());

        assert!(controller.refresh_status(&backend).await.is_err());
        assert_eq!(controller.state(), SimulatorState::Stopped);
        assert_eq!(controller.pending(), None);
    }
}
