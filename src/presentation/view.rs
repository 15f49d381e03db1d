// Text rendering of the readout, controls and history chart
use crate::application::error::PendingCall;
use crate::application::history_cache::HistoryCache;
use crate::application::session_controller::SessionController;
use crate::domain::simulator::{ConfigField, SimulatorState};
use crate::domain::speed::{DisplayMode, DisplayView};
use crate::presentation::app_state::{AppState, LinkStatus, Notice};
use chrono::Local;
use std::fmt::Write;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub const HELP: &str = "\
Commands:
  p | toggle              pause or resume the live readout
  start | stop            start or stop the simulator
  set <field> <value>     edit a simulator field while stopped
                          (baseSpeed, speedVariation, changeInterval, accelerationFactor)
  h | history             reload the speed history
  s | status              ask the server for the simulator status
  show                    redraw the screen (or just press enter)
  q | quit                leave";

pub fn render_link(link: &LinkStatus) -> String {
    match link {
        LinkStatus::Connecting => "connecting…".to_string(),
        LinkStatus::Connected => "live".to_string(),
        LinkStatus::Reconnecting { reason, retry_in } => {
            format!("reconnecting in {:.1}s ({})", retry_in.as_secs_f64(), reason)
        }
        LinkStatus::Offline { reason } => format!("offline ({})", reason),
    }
}

/// One-line readout, printed on every visible update.
pub fn render_readout(view: &DisplayView, link: &LinkStatus) -> String {
    let mut line = match view.mode {
        DisplayMode::Live => format!("Live Speed  {}   [p] Pause", view.visible),
        DisplayMode::Paused => format!(
            "Paused  {}   Last recorded: {}   [p] Resume",
            view.visible, view.last_known
        ),
    };
    if *link != LinkStatus::Connected {
        let _ = write!(line, "   [stream {}]", render_link(link));
    }
    line
}

pub fn render_controls(session: &SessionController) -> String {
    let mut out = String::from("Simulator Controls\n");
    let locked = if session.is_editable() { "" } else { "  (locked)" };

    for field in ConfigField::ALL {
        let _ = writeln!(
            out,
            "  {:<24} {:>8}{}",
            format!("{}:", field.label()),
            session.config().get(field),
            locked
        );
    }

    let action = match (session.pending(), session.state()) {
        (Some(PendingCall::Start), _) => "starting…".to_string(),
        (Some(PendingCall::Stop), _) => "stopping…".to_string(),
        (Some(PendingCall::Status), _) => "checking status…".to_string(),
        (None, SimulatorState::Stopped) => "[start] Start Simulator".to_string(),
        (None, SimulatorState::Running) => "[stop] Stop Simulator".to_string(),
    };
    let _ = write!(out, "  simulator {} - {}", session.state(), action);
    out
}

/// Bar heights scaled from zero (or the lowest negative reading) to the peak.
pub fn sparkline(speeds: &[f64]) -> String {
    let Some(max) = speeds.iter().copied().reduce(f64::max) else {
        return String::new();
    };
    let min = speeds.iter().copied().fold(0.0, f64::min);
    let span = max - min;
    let top = SPARK_LEVELS.len() - 1;

    speeds
        .iter()
        .map(|speed| {
            if span <= 0.0 {
                return SPARK_LEVELS[0];
            }
            let level = ((speed - min) / span * top as f64).round() as usize;
            SPARK_LEVELS[level.min(top)]
        })
        .collect()
}

pub fn render_history(cache: &HistoryCache, hours: u32, width: usize) -> String {
    let window = cache.window();
    let mut out = format!("Speed History (Last {} Hours)", hours);
    if cache.is_loading() {
        out.push_str("  loading…");
    } else if let Some(loaded_at) = cache.loaded_at() {
        let _ = write!(out, "  updated {}", loaded_at.with_timezone(&Local).format("%H:%M:%S"));
    }

    let (Some(first), Some(last), Some(min), Some(max)) = (
        window.first(),
        window.latest(),
        window.min_speed(),
        window.max_speed(),
    ) else {
        out.push_str("\n  No history data");
        return out;
    };

    let speeds: Vec<f64> = window.downsample(width).iter().map(|p| p.speed).collect();
    let _ = write!(
        out,
        "\n  {}\n  {} .. {}   min {:.1}  max {:.1}  ({} points)",
        sparkline(&speeds),
        first.timestamp.with_timezone(&Local).format("%H:%M:%S"),
        last.timestamp.with_timezone(&Local).format("%H:%M:%S"),
        min,
        max,
        window.len()
    );
    out
}

pub fn render_screen(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Speedometer ===");
    let _ = writeln!(out, "{}", render_readout(&state.display.render(), &state.link));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{}",
        render_history(&state.history, state.history_hours, state.chart_width)
    );
    let _ = writeln!(out);
    let _ = write!(out, "{}", render_controls(&state.session));

    match &state.notice {
        Some(Notice::Info(text)) => {
            let _ = write!(out, "\n* {}", text);
        }
        Some(Notice::Error(text)) => {
            let _ = write!(out, "\n! {}", text);
        }
        None => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::HistoryPoint;
    use crate::domain::simulator::SimulatorConfig;
    use crate::domain::speed::{DisplayState, SpeedSample};
    use std::time::Duration;

    #[test]
    fn test_live_readout() {
        let mut display = DisplayState::new();
        display.on_sample(SpeedSample::new(42.0, "km/h"));
        assert_eq!(
            render_readout(&display.render(), &LinkStatus::Connected),
            "Live Speed  42.0 km/h   [p] Pause"
        );
    }

    #[test]
    fn test_paused_readout_shows_last_recorded() {
        let mut display = DisplayState::new();
        display.on_sample(SpeedSample::new(42.0, "km/h"));
        display.toggle();
        display.on_sample(SpeedSample::new(50.04, "km/h"));

        let line = render_readout(
            &display.render(),
            &LinkStatus::Reconnecting {
                reason: "stream ended".to_string(),
                retry_in: Duration::from_secs(2),
            },
        );
        assert_eq!(
            line,
            "Paused  42.0 km/h   Last recorded: 50.0 km/h   [p] Resume   [stream reconnecting in 2.0s (stream ended)]"
        );
    }

    #[test]
    fn test_controls_lock_while_running() {
        let mut session = SessionController::new(SimulatorConfig::default());
        let stopped = render_controls(&session);
        assert!(stopped.contains("[start] Start Simulator"));
        assert!(!stopped.contains("(locked)"));

        session.begin_start().unwrap();
        assert!(render_controls(&session).contains("starting…"));
        session.finish_start(Ok(())).unwrap();

        let running = render_controls(&session);
        assert!(running.contains("[stop] Stop Simulator"));
        assert_eq!(running.matches("(locked)").count(), 4);
    }

    #[test]
    fn test_sparkline_starts_at_zero() {
        assert_eq!(sparkline(&[0.0, 35.0, 70.0]), "▁▅█");
        assert_eq!(sparkline(&[0.0, 0.0]), "▁▁");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn test_empty_history() {
        let mut cache = HistoryCache::new();
        assert_eq!(
            render_history(&cache, 24, 60),
            "Speed History (Last 24 Hours)\n  No history data"
        );

        cache.begin_load();
        assert_eq!(
            render_history(&cache, 24, 60),
            "Speed History (Last 24 Hours)  loading…\n  No history data"
        );
    }

    #[test]
    fn test_history_chart_summary() {
        let mut cache = HistoryCache::new();
        let now = chrono::Utc::now();
        let points = (0..120)
            .map(|i| HistoryPoint::new(now - chrono::Duration::minutes(120 - i), (i % 40) as f64))
            .collect();
        cache.finish_load(24, Ok(points)).unwrap();

        let text = render_history(&cache, 24, 30);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("updated"));
        assert_eq!(lines[1].trim().chars().count(), 30);
        assert!(lines[2].contains("min 0.0  max 39.0  (120 points)"));
    }
}
