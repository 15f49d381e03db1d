// Speed sample and the live/paused display state machine
use chrono::{DateTime, Utc};
use std::fmt;

pub const DEFAULT_UNIT: &str = "km/h";

/// One speed measurement as delivered by the telemetry stream.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedSample {
    pub speed: f64,
    pub unit: String,
    pub received_at: DateTime<Utc>,
}

impl SpeedSample {
    pub fn new(speed: f64, unit: impl Into<String>) -> Self {
        Self {
            speed,
            unit: unit.into(),
            received_at: Utc::now(),
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, DEFAULT_UNIT)
    }

    /// Compares the measurement only, ignoring when it was received.
    #[cfg(test)]
    pub fn same_reading(&self, other: &SpeedSample) -> bool {
        self.speed == other.speed && self.unit == other.unit
    }
}

impl fmt::Display for SpeedSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} {}", self.speed, self.unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Live,
    Paused,
}

impl DisplayMode {
    pub fn flipped(self) -> Self {
        match self {
            DisplayMode::Live => DisplayMode::Paused,
            DisplayMode::Paused => DisplayMode::Live,
        }
    }
}

/// Read-only snapshot handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayView {
    pub mode: DisplayMode,
    pub visible: SpeedSample,
    pub last_known: SpeedSample,
}

/// Decides what the readout shows while samples keep arriving.
///
/// `last_known` always tracks the most recent arrival, whatever the mode.
/// Only `visible` is frozen while paused.
#[derive(Debug, Clone)]
pub struct DisplayState {
    mode: DisplayMode,
    visible: SpeedSample,
    last_known: SpeedSample,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayState {
    pub fn new() -> Self {
        Self {
            mode: DisplayMode::Live,
            visible: SpeedSample::zero(),
            last_known: SpeedSample::zero(),
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    #[cfg(test)]
    pub fn visible(&self) -> &SpeedSample {
        &self.visible
    }

    #[cfg(test)]
    pub fn last_known(&self) -> &SpeedSample {
        &self.last_known
    }

    /// Records an arrival. Returns true when the visible value changed.
    pub fn on_sample(&mut self, sample: SpeedSample) -> bool {
        let shown = self.mode == DisplayMode::Live;
        if shown {
            self.visible = sample.clone();
        }
        self.last_known = sample;
        shown
    }

    /// Flips between live and paused. Resuming shows the freshest value
    /// immediately, even if nothing arrived while paused.
    pub fn toggle(&mut self) -> DisplayMode {
        self.mode = self.mode.flipped();
        if self.mode == DisplayMode::Live {
            self.visible = self.last_known.clone();
        }
        self.mode
    }

    pub fn render(&self) -> DisplayView {
        DisplayView {
            mode: self.mode,
            visible: self.visible.clone(),
            last_known: self.last_known.clone(),
        }
    }
}
