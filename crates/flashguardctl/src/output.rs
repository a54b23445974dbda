//! Output formatting - plain ASCII terminal output
//!
//! Renderers return strings so commands decide where they go and tests can
//! inspect them with color turned off.

use flashguard_common::{
    BoardState, ColorMode, DispatchPayload, DispatchState, EnvironmentalRecord, EvidenceProvider,
    PrimaryTruthPayload, SocialSignal, StatusSnapshot, ToolResponse,
};
use owo_colors::OwoColorize;
use std::fmt::Write;
use std::io::IsTerminal;

/// Applies colors only when enabled
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    /// `auto` colors only an interactive stdout without $NO_COLOR
    pub fn for_mode(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Always => Self::new(true),
            ColorMode::Never => Self::new(false),
            ColorMode::Auto => Self::new(
                std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
            ),
        }
    }

    pub fn red(&self, s: &str) -> String {
        if self.enabled {
            s.bright_red().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        if self.enabled {
            s.bright_green().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn yellow(&self, s: &str) -> String {
        if self.enabled {
            s.yellow().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn cyan(&self, s: &str) -> String {
        if self.enabled {
            s.cyan().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn bold(&self, s: &str) -> String {
        if self.enabled {
            s.bold().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn dim(&self, s: &str) -> String {
        if self.enabled {
            s.dimmed().to_string()
        } else {
            s.to_string()
        }
    }
}

fn meters(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2} m", v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn sensor_lines(out: &mut String, sensor: &EnvironmentalRecord, p: &Painter) {
    let status = if sensor.status.is_empty() { "(unset)" } else { &sensor.status };
    let _ = writeln!(out, "  Location:   {}", sensor.location);
    if let Some(basin) = &sensor.river_basin {
        let _ = writeln!(out, "  River:      {}", basin);
    }
    let _ = writeln!(out, "  Gauge:      {}", meters(sensor.river_gauge_meters));
    let _ = writeln!(out, "  Threshold:  {}", meters(sensor.critical_threshold_meters));
    let _ = writeln!(out, "  Status:     {}", status);
    if let Some(rain) = sensor.rainfall_mm_per_hr {
        let _ = writeln!(out, "  Rainfall:   {:.1} mm/hr", rain);
    }
    if let Some(ts) = sensor.timestamp {
        let _ = writeln!(out, "  Observed:   {}", ts.to_rfc3339());
    }
    if let Some(source) = &sensor.data_source {
        let _ = writeln!(out, "  [source: {}]", p.cyan(source));
    }
}

/// `check` output
pub fn render_primary(resp: &ToolResponse<PrimaryTruthPayload>, p: &Painter) -> String {
    let mut out = String::new();
    let payload = &resp.payload;
    let _ = writeln!(out, "{}", p.bold("[SENSOR TRUTH]"));
    match &payload.sensor_truth {
        Some(sensor) => {
            sensor_lines(&mut out, sensor, p);
            let verdict = if payload.critical {
                p.red("[CRITICAL]")
            } else {
                p.green("[NOT CRITICAL]")
            };
            let _ = writeln!(out, "  {}", verdict);
            if payload.status_disagrees_with_gauge {
                let _ = writeln!(
                    out,
                    "  {} status reads NORMAL but the gauge is at or over threshold",
                    p.yellow("[WARNING]")
                );
            }
        }
        None => {
            let _ = writeln!(out, "  Location:   {}", payload.location);
            let _ = writeln!(out, "  {}", p.dim("No sensor record; treated as not critical."));
        }
    }
    out
}

/// `signal` output
pub fn render_signal(resp: &ToolResponse<SocialSignal>, p: &Painter) -> String {
    let mut out = String::new();
    let signal = &resp.payload;
    let _ = writeln!(out, "{}", p.bold("[CITIZEN SIGNAL]"));
    let _ = writeln!(out, "  Location:   {}", signal.location);
    let _ = writeln!(out, "  Reports:    {}", signal.verified_reports_count);
    let _ = writeln!(out, "  Confidence: {}", signal.confidence);
    for highlight in &signal.highlights {
        let _ = writeln!(out, "  * {}", highlight);
    }
    let _ = writeln!(out, "  [source: {}]", p.cyan(&signal.data_source));
    let _ = writeln!(out, "  {}", p.dim("Signal only; citizen reports never authorize a dispatch."));
    out
}

/// `dispatch` output
pub fn render_dispatch(resp: &ToolResponse<DispatchPayload>, p: &Painter) -> String {
    let mut out = String::new();
    let payload = &resp.payload;
    let headline = match payload.state {
        DispatchState::Authorized => p.green(&resp.message),
        DispatchState::SensorBlocked => p.yellow(&resp.message),
        DispatchState::ArbiterBlocked => p.red(&resp.message),
    };
    let _ = writeln!(out, "{}", p.bold("[DISPATCH]"));
    let _ = writeln!(out, "  {}", headline);
    let _ = writeln!(out, "  Location:   {}", payload.location);
    let _ = writeln!(out, "  State:      {}", payload.state);
    let _ = writeln!(out, "  Reason:     {}", payload.reason);
    if let Some(plan) = &payload.action_plan {
        let _ = writeln!(out, "  Plan:       {}", plan);
    }
    if let Some(verdict) = &payload.verdict {
        let channels: Vec<String> = verdict
            .channels_consulted()
            .iter()
            .map(|c| c.to_string())
            .collect();
        let _ = writeln!(
            out,
            "  Verdict:    {} ({}; primary critical: {}, secondary critical: {})",
            verdict.decision(),
            verdict.reason_code(),
            verdict.primary_critical(),
            verdict.secondary_critical()
        );
        let _ = writeln!(out, "  Consulted:  {}", channels.join(", "));
    }
    if payload.requires_manual_verification {
        let _ = writeln!(out, "  {} manual verification required", p.red("[ESCALATE]"));
    }
    out
}

/// Status board for `ask`
pub fn render_board(snapshot: &StatusSnapshot, p: &Painter) -> String {
    let mut out = String::new();
    let label = match snapshot.state {
        BoardState::Critical => p.red(snapshot.state.label()),
        BoardState::Normal => p.green(snapshot.state.label()),
        BoardState::Unknown => p.yellow(snapshot.state.label()),
        BoardState::Ready => p.bold(snapshot.state.label()),
    };
    let _ = writeln!(out, "{}", p.bold("[STATUS BOARD]"));
    let _ = writeln!(out, "  {}", label);
    let _ = writeln!(out, "  {}", p.dim(snapshot.state.subtitle()));
    if let Some(location) = &snapshot.location {
        let _ = writeln!(out, "  Location:   {}", location);
    }
    if let Some(sensor) = &snapshot.sensor {
        let _ = writeln!(
            out,
            "  Gauge:      {} / {}",
            meters(sensor.river_gauge_meters),
            meters(sensor.critical_threshold_meters)
        );
    }
    if let Some(source) = &snapshot.source {
        let _ = writeln!(out, "  [source: {}]", p.cyan(source));
    }
    if snapshot.location.is_some() {
        let _ = writeln!(out, "  Citizen reports: {}", snapshot.citizen_reports);
    }
    if let Some(state) = snapshot.last_dispatch {
        let _ = writeln!(out, "  Last dispatch: {}", state);
    }
    out
}

/// `locations` output, one line per id with the channels it has
pub fn render_locations(evidence: &dyn EvidenceProvider, p: &Painter) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", p.bold("[LOCATIONS]"));
    for location in evidence.locations() {
        let mark = |present: bool, name: &str| {
            if present {
                format!("[{}]", name)
            } else {
                p.dim(&format!("[no {}]", name))
            }
        };
        let _ = writeln!(
            out,
            "  {:<16} {} {} {}",
            location,
            mark(evidence.primary(&location).is_some(), "sensor"),
            mark(evidence.secondary(&location).is_some(), "secondary"),
            mark(evidence.social(&location).is_some(), "citizen"),
        );
    }
    out
}
