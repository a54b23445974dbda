//! Nemesis arbiter: cross-validates the primary channel against the
//! independent secondary channel.
//!
//! | primary | secondary | decision | reason code      |
//! |---------|-----------|----------|------------------|
//! | true    | true      | APPROVE  | both_critical    |
//! | true    | false     | BLOCK    | sources_conflict |
//! | false   | true      | BLOCK    | sources_conflict |
//! | false   | false     | BLOCK    | both_low_risk    |
//!
//! When neither channel has a record the reason code is `no_data` instead of
//! `both_low_risk`. The decision is BLOCK either way.

use crate::classifier::{
    is_critical_with_thresholds, is_secondary_critical_with_thresholds, GateThresholds,
};
use crate::types::{AdversarialRecord, Channel, EnvironmentalRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Arbitration decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approve,
    Block,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Approve => write!(f, "APPROVE"),
            Decision::Block => write!(f, "BLOCK"),
        }
    }
}

/// Machine-checkable reason for a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Both channels report danger
    BothCritical,
    /// Exactly one channel reports danger; a human must verify
    SourcesConflict,
    /// Both channels have records and neither reports danger
    BothLowRisk,
    /// Neither channel has a record for the location
    NoData,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::BothCritical => "both_critical",
            ReasonCode::SourcesConflict => "sources_conflict",
            ReasonCode::BothLowRisk => "both_low_risk",
            ReasonCode::NoData => "no_data",
        }
    }

    pub fn requires_escalation(&self) -> bool {
        matches!(self, ReasonCode::SourcesConflict)
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable arbitration result.
///
/// Fields are read-only; a verdict is re-derived, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    decision: Decision,
    reason_code: ReasonCode,
    reason: String,
    primary_critical: bool,
    secondary_critical: bool,
    channels_consulted: Vec<Channel>,
}

impl Verdict {
    /// Derive a verdict from the two channel sub-verdicts.
    ///
    /// `channels_consulted` lists the channels that supplied a record; an
    /// empty list with a (false, false) pair yields `no_data`.
    pub fn from_sub_verdicts(
        primary_critical: bool,
        secondary_critical: bool,
        mut channels_consulted: Vec<Channel>,
    ) -> Self {
        channels_consulted.sort();
        channels_consulted.dedup();

        let (decision, reason_code) = match (primary_critical, secondary_critical) {
            (true, true) => (Decision::Approve, ReasonCode::BothCritical),
            (true, false) | (false, true) => (Decision::Block, ReasonCode::SourcesConflict),
            (false, false) if channels_consulted.is_empty() => (Decision::Block, ReasonCode::NoData),
            (false, false) => (Decision::Block, ReasonCode::BothLowRisk),
        };

        let reason = match reason_code {
            ReasonCode::BothCritical => {
                "Both sources agree: danger confirmed by sensors and the independent secondary source."
                    .to_string()
            }
            ReasonCode::SourcesConflict => format!(
                "Sources conflict (primary critical: {}, secondary critical: {}); escalate for manual verification.",
                primary_critical, secondary_critical
            ),
            ReasonCode::BothLowRisk => {
                "Both sources indicate low risk for immediate auto-dispatch.".to_string()
            }
            ReasonCode::NoData => "No reliable data in either source.".to_string(),
        };

        Self {
            decision,
            reason_code,
            reason,
            primary_critical,
            secondary_critical,
            channels_consulted,
        }
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn is_approved(&self) -> bool {
        self.decision == Decision::Approve
    }

    pub fn reason_code(&self) -> ReasonCode {
        self.reason_code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn primary_critical(&self) -> bool {
        self.primary_critical
    }

    pub fn secondary_critical(&self) -> bool {
        self.secondary_critical
    }

    pub fn channels_consulted(&self) -> &[Channel] {
        &self.channels_consulted
    }
}

/// Cross-validation seam; the dispatch gate is generic over it
pub trait Arbiter: Send + Sync {
    fn arbitrate(
        &self,
        primary: Option<&EnvironmentalRecord>,
        secondary: Option<&AdversarialRecord>,
    ) -> Verdict;
}

/// Default arbiter implementing the decision table above
#[derive(Debug, Clone, Default)]
pub struct NemesisArbiter {
    thresholds: GateThresholds,
}

impl NemesisArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: GateThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }
}

impl Arbiter for NemesisArbiter {
    fn arbitrate(
        &self,
        primary: Option<&EnvironmentalRecord>,
        secondary: Option<&AdversarialRecord>,
    ) -> Verdict {
        let primary_critical = is_critical_with_thresholds(primary, &self.thresholds);
        let secondary_critical = is_secondary_critical_with_thresholds(secondary, &self.thresholds);

        let mut consulted = Vec::with_capacity(2);
        if primary.is_some() {
            consulted.push(Channel::Primary);
        }
        if secondary.is_some() {
            consulted.push(Channel::Secondary);
        }

        let verdict = Verdict::from_sub_verdicts(primary_critical, secondary_critical, consulted);
        debug!(
            decision = %verdict.decision(),
            reason_code = %verdict.reason_code(),
            primary_critical,
            secondary_critical,
            "arbitration complete"
        );
        verdict
    }
}

/// Arbitrate with default thresholds
pub fn arbitrate(
    primary: Option<&EnvironmentalRecord>,
    secondary: Option<&AdversarialRecord>,
) -> Verdict {
    NemesisArbiter::default().arbitrate(primary, secondary)
}
