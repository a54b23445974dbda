//! Dispatch gate: sensor gate then cross-validation gate.
//!
//! ```text
//! PENDING ──sensor not critical──► SENSOR_BLOCKED   (no action needed)
//!    │
//!    └─critical─► arbiter ──BLOCK──► ARBITER_BLOCKED (escalate to a human)
//!                    │
//!                    └─APPROVE──► AUTHORIZED
//! ```
//!
//! Each request is a fresh, terminal run. The gate never partially executes a
//! dispatch and has no side effects beyond returning the outcome.

use crate::arbiter::{Arbiter, NemesisArbiter, Verdict};
use crate::classifier::{is_critical_with_thresholds, GateThresholds};
use crate::error::{FlashGuardError, Result};
use crate::evidence::EvidenceProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Reason given when the sensor gate denies
pub const SENSORS_NOT_CRITICAL: &str = "Dispatch blocked: sensors not critical.";

/// Terminal state of one dispatch request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchState {
    /// Sensors are not critical; the arbiter was never consulted
    SensorBlocked,
    /// Sensors critical but corroboration failed
    ArbiterBlocked,
    Authorized,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchState::SensorBlocked => write!(f, "SENSOR_BLOCKED"),
            DispatchState::ArbiterBlocked => write!(f, "ARBITER_BLOCKED"),
            DispatchState::Authorized => write!(f, "AUTHORIZED"),
        }
    }
}

/// Result of a dispatch request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub location: String,
    pub action_plan: String,
    pub state: DispatchState,
    /// Arbiter verdict, absent when the sensor gate denied
    pub verdict: Option<Verdict>,
    pub reason: String,
}

impl DispatchOutcome {
    pub fn authorized(&self) -> bool {
        self.state == DispatchState::Authorized
    }

    /// Only arbiter denials call for a human
    pub fn requires_manual_verification(&self) -> bool {
        self.state == DispatchState::ArbiterBlocked
    }

    pub fn blocked_reason(&self) -> Option<&str> {
        if self.authorized() {
            None
        } else {
            Some(&self.reason)
        }
    }
}

/// Two-stage short-circuiting dispatch gate
#[derive(Debug, Clone)]
pub struct DispatchGate<A: Arbiter = NemesisArbiter> {
    arbiter: A,
    thresholds: GateThresholds,
}

impl DispatchGate<NemesisArbiter> {
    pub fn new() -> Self {
        Self::with_thresholds(GateThresholds::default())
    }

    /// Gate whose sensor rule and arbiter share the same thresholds
    pub fn with_thresholds(thresholds: GateThresholds) -> Self {
        Self {
            arbiter: NemesisArbiter::with_thresholds(thresholds.clone()),
            thresholds,
        }
    }

    /// Gate that takes its sensor-rule thresholds from `arbiter`
    pub fn from_arbiter(arbiter: NemesisArbiter) -> Self {
        let thresholds = arbiter.thresholds().clone();
        Self { arbiter, thresholds }
    }
}

impl Default for DispatchGate<NemesisArbiter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Arbiter> DispatchGate<A> {
    /// Gate over a custom arbiter.
    ///
    /// `thresholds` drive the sensor stage only. The caller keeps them equal
    /// to whatever the arbiter applies to the primary channel, otherwise the
    /// two stages can disagree about the same record.
    pub fn with_arbiter(arbiter: A, thresholds: GateThresholds) -> Self {
        Self { arbiter, thresholds }
    }

    pub fn arbiter(&self) -> &A {
        &self.arbiter
    }

    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }

    /// Decide whether to authorize `action_plan` for `location`.
    ///
    /// Errors only on invocation misuse (empty location or plan). Missing or
    /// malformed evidence yields a denial, never an error.
    pub fn request_dispatch(
        &self,
        evidence: &dyn EvidenceProvider,
        location: &str,
        action_plan: &str,
    ) -> Result<DispatchOutcome> {
        if location.trim().is_empty() {
            return Err(FlashGuardError::InvocationMisuse(
                "location must not be empty".to_string(),
            ));
        }
        if action_plan.trim().is_empty() {
            return Err(FlashGuardError::InvocationMisuse(
                "action plan must not be empty".to_string(),
            ));
        }

        let primary = evidence.primary(location);

        // Gate 1: sensors
        if !is_critical_with_thresholds(primary, &self.thresholds) {
            warn!(location, "dispatch denied: sensors not critical");
            return Ok(DispatchOutcome {
                location: location.to_string(),
                action_plan: action_plan.to_string(),
                state: DispatchState::SensorBlocked,
                verdict: None,
                reason: SENSORS_NOT_CRITICAL.to_string(),
            });
        }

        // Gate 2: cross-validation
        let verdict = self.arbiter.arbitrate(primary, evidence.secondary(location));
        if !verdict.is_approved() {
            warn!(
                location,
                reason_code = %verdict.reason_code(),
                "dispatch denied by arbiter, manual verification required"
            );
            let reason = format!(
                "Dispatch blocked: {} Manual verification required.",
                verdict.reason()
            );
            return Ok(DispatchOutcome {
                location: location.to_string(),
                action_plan: action_plan.to_string(),
                state: DispatchState::ArbiterBlocked,
                verdict: Some(verdict),
                reason,
            });
        }

        info!(location, action_plan, "dispatch authorized");
        Ok(DispatchOutcome {
            location: location.to_string(),
            action_plan: action_plan.to_string(),
            state: DispatchState::Authorized,
            reason: verdict.reason().to_string(),
            verdict: Some(verdict),
        })
    }
}
