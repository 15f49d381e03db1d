// Console state owned by the event loop
use crate::application::history_cache::HistoryCache;
use crate::application::session_controller::SessionController;
use crate::domain::simulator::SimulatorConfig;
use crate::domain::speed::DisplayState;
use std::time::Duration;

/// Health of the live stream, shown next to the readout.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkStatus {
    Connecting,
    Connected,
    Reconnecting { reason: String, retry_in: Duration },
    Offline { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Error(String),
}

pub struct AppState {
    pub display: DisplayState,
    pub session: SessionController,
    pub history: HistoryCache,
    pub link: LinkStatus,
    pub notice: Option<Notice>,
    pub history_hours: u32,
    pub chart_width: usize,
}

impl AppState {
    pub fn new(simulator: SimulatorConfig, history_hours: u32, chart_width: usize) -> Self {
        Self {
            display: DisplayState::new(),
            session: SessionController::new(simulator),
            history: HistoryCache::new(),
            link: LinkStatus::Connecting,
            notice: None,
            history_hours,
            chart_width,
        }
    }

    pub fn inform(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice::Info(text.into()));
    }

    pub fn fail(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice::Error(text.into()));
    }
}
