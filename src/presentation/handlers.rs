// Console event handlers
use crate::application::error::ClientError;
use crate::application::telemetry_api::{HistorySource, SimulatorBackend};
use crate::domain::history::HistoryPoint;
use crate::domain::simulator::SimulatorState;
use crate::infrastructure::stream_client::StreamEvent;
use crate::presentation::app_state::{AppState, LinkStatus};
use crate::presentation::commands::Command;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Collaborators the handlers call out to.
#[derive(Clone)]
pub struct Services {
    pub backend: Arc<dyn SimulatorBackend>,
    pub history: Arc<dyn HistorySource>,
}

/// Result of an outbound call, delivered back to the event loop.
#[derive(Debug)]
pub enum CallOutcome {
    Started(Result<(), ClientError>),
    Stopped(Result<(), ClientError>),
    Status(Result<SimulatorState, ClientError>),
    History {
        hours: u32,
        result: Result<Vec<HistoryPoint>, ClientError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Redraw,
    Help,
    Quit,
}

pub fn handle_command(
    state: &mut AppState,
    services: &Services,
    tasks: &mut JoinSet<CallOutcome>,
    command: Command,
) -> Flow {
    match command {
        Command::Toggle => {
            state.display.toggle();
            state.notice = None;
        }
        Command::Start => match state.session.begin_start() {
            Ok(config) => {
                let backend = services.backend.clone();
                tasks.spawn(async move { CallOutcome::Started(backend.start(&config).await) });
            }
            Err(e) => state.fail(e.to_string()),
        },
        Command::Stop => match state.session.begin_stop() {
            Ok(()) => {
                let backend = services.backend.clone();
                tasks.spawn(async move { CallOutcome::Stopped(backend.stop().await) });
            }
            Err(e) => state.fail(e.to_string()),
        },
        Command::Status => match state.session.begin_refresh() {
            Ok(()) => {
                let backend = services.backend.clone();
                tasks.spawn(async move { CallOutcome::Status(backend.status().await) });
            }
            Err(e) => state.fail(e.to_string()),
        },
        Command::Set { field, raw } => {
            if !state.session.is_editable() {
                state.fail("configuration is locked while the simulator is running or busy");
            } else {
                match state.session.update_config_field(field, &raw) {
                    Ok(value) => state.inform(format!("{} set to {}", field, value)),
                    Err(e) => state.fail(e.to_string()),
                }
            }
        }
        Command::History => {
            if state.history.begin_load() {
                let source = services.history.clone();
                let hours = state.history_hours;
                tasks.spawn(async move {
                    CallOutcome::History {
                        hours,
                        result: source.fetch_history(hours).await,
                    }
                });
            } else {
                state.fail("history is already loading");
            }
        }
        Command::Show => {}
        Command::Help => return Flow::Help,
        Command::Quit => return Flow::Quit,
    }
    Flow::Redraw
}

/// Applies a stream event. Returns true when the readout should be reprinted.
pub fn handle_stream_event(state: &mut AppState, event: StreamEvent) -> bool {
    match event {
        StreamEvent::Sample(sample) => state.display.on_sample(sample),
        StreamEvent::Connected => {
            state.link = LinkStatus::Connected;
            true
        }
        StreamEvent::Disconnected { reason, retry_in } => {
            state.link = match retry_in {
                Some(retry_in) => LinkStatus::Reconnecting { reason, retry_in },
                None => LinkStatus::Offline { reason },
            };
            true
        }
    }
}

pub fn handle_outcome(state: &mut AppState, outcome: CallOutcome) {
    match outcome {
        CallOutcome::Started(result) => match state.session.finish_start(result) {
            Ok(()) => state.inform("simulator started"),
            Err(e) => state.fail(format!("start failed: {}", e)),
        },
        CallOutcome::Stopped(result) => match state.session.finish_stop(result) {
            Ok(()) => state.inform("simulator stopped"),
            Err(e) => state.fail(format!("stop failed: {}", e)),
        },
        CallOutcome::Status(result) => match state.session.finish_refresh(result) {
            Ok(sim_state) => state.inform(format!("simulator is {}", sim_state)),
            Err(e) => state.fail(format!("status check failed: {}", e)),
        },
        CallOutcome::History { hours, result } => match state.history.finish_load(hours, result) {
            Ok(count) => state.inform(format!("loaded {} history points", count)),
            Err(e) => state.fail(format!("history load failed: {}", e)),
        },
    }
}
