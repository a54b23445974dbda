//! FlashGuard Common - evidence arbitration core for evacuation dispatch.
//!
//! Deterministic, side-effect-free rules that decide whether an evacuation
//! dispatch is authorized:
//!
//! ```text
//! caller ─► DispatchGate ─► classifier (primary) ─► [critical] NemesisArbiter (primary + secondary) ─► outcome
//! ```
//!
//! Evidence is injected per call through [`EvidenceProvider`]. Citizen reports
//! are carried for display and never gate. Orchestrators reach the core through
//! [`Capabilities`] or the name-based [`ToolRouter`].

pub mod arbiter;
pub mod audit;
pub mod capabilities;
pub mod classifier;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod evidence;
pub mod gate;
pub mod types;

pub use arbiter::{arbitrate, Arbiter, Decision, NemesisArbiter, ReasonCode, Verdict};
pub use audit::evidence_fingerprint;
pub use capabilities::{Capabilities, DispatchPayload, PrimaryTruthPayload, ToolName, ToolRouter};
pub use classifier::{
    is_critical, is_critical_with_thresholds, is_secondary_critical,
    is_secondary_critical_with_thresholds, GateThresholds, CRITICAL_SPILL_LEVEL,
};
pub use config::{ColorMode, FlashGuardConfig};
pub use context::{BoardState, StatusBoard, StatusSnapshot};
pub use envelope::ToolResponse;
pub use error::{FlashGuardError, Result};
pub use evidence::{EvidenceProvider, EvidenceStore, EvidenceTable};
pub use gate::{DispatchGate, DispatchOutcome, DispatchState, SENSORS_NOT_CRITICAL};
pub use types::{AdversarialRecord, Channel, EnvironmentalRecord, SocialSignal};
