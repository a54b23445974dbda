//! Decision context: last-known status for presentation layers.
//!
//! Read model only. The dispatch gate never reads it; front-ends update it
//! after they look a location up or run a dispatch, then render a snapshot.

use crate::classifier::{is_critical_with_thresholds, GateThresholds};
use crate::evidence::EvidenceProvider;
use crate::gate::{DispatchOutcome, DispatchState};
use crate::types::EnvironmentalRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Headline state of the status board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardState {
    /// Nothing selected yet
    Ready,
    /// Location has no primary record
    Unknown,
    /// Sensors below threshold, alert suppressed
    Normal,
    /// Sensors critical, dispatch may be requested
    Critical,
}

impl BoardState {
    pub fn label(&self) -> &'static str {
        match self {
            BoardState::Ready => "READY",
            BoardState::Unknown => "UNKNOWN LOCATION",
            BoardState::Normal => "NORMAL (NO ALERT)",
            BoardState::Critical => "CRITICAL",
        }
    }

    pub fn subtitle(&self) -> &'static str {
        match self {
            BoardState::Ready => "Awaiting a location check.",
            BoardState::Unknown => "Location not in the evidence table.",
            BoardState::Normal | BoardState::Critical => {
                "Decision is grounded in sensor truth; citizen reports are treated as signal."
            }
        }
    }
}

/// Point-in-time copy of the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: BoardState,
    pub location: Option<String>,
    pub sensor: Option<EnvironmentalRecord>,
    pub source: Option<String>,
    /// Verified citizen reports for the location (KPI only)
    pub citizen_reports: u32,
    pub last_dispatch: Option<DispatchState>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            state: BoardState::Ready,
            location: None,
            sensor: None,
            source: None,
            citizen_reports: 0,
            last_dispatch: None,
            updated_at: None,
        }
    }
}

/// Shared status board
#[derive(Debug, Default)]
pub struct StatusBoard {
    inner: RwLock<StatusSnapshot>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the board at a location, or clear it with `None`
    pub fn observe(
        &self,
        location: Option<&str>,
        evidence: &dyn EvidenceProvider,
        thresholds: &GateThresholds,
    ) -> StatusSnapshot {
        let next = match location {
            None => StatusSnapshot::default(),
            Some(loc) => {
                let sensor = evidence.primary(loc);
                let state = match sensor {
                    None => BoardState::Unknown,
                    Some(_) if is_critical_with_thresholds(sensor, thresholds) => BoardState::Critical,
                    Some(_) => BoardState::Normal,
                };
                StatusSnapshot {
                    state,
                    location: Some(loc.to_string()),
                    sensor: sensor.cloned(),
                    source: sensor.and_then(|s| s.data_source.clone()),
                    citizen_reports: evidence
                        .social(loc)
                        .map(|s| s.verified_reports_count)
                        .unwrap_or(0),
                    last_dispatch: None,
                    updated_at: Some(Utc::now()),
                }
            }
        };

        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = next.clone();
        next
    }

    /// Remember the terminal state of a dispatch for the same location
    pub fn record_dispatch(&self, outcome: &DispatchOutcome) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if guard.location.as_deref() == Some(outcome.location.as_str()) {
            guard.last_dispatch = Some(outcome.state);
            guard.updated_at = Some(Utc::now());
        }
    }

    pub fn reset(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = StatusSnapshot::default();
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
