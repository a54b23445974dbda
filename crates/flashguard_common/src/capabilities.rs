//! Capability interface exposed to orchestrators.
//!
//! Three named operations with typed inputs and outputs. An LLM tool-calling
//! loop, the CLI, or an HTTP layer all go through [`Capabilities`] directly or
//! through [`ToolRouter`] by operation name with JSON arguments.

use crate::arbiter::{Arbiter, NemesisArbiter, Verdict};
use crate::classifier::is_critical_with_thresholds;
use crate::envelope::ToolResponse;
use crate::error::{FlashGuardError, Result};
use crate::evidence::EvidenceProvider;
use crate::gate::{DispatchGate, DispatchOutcome, DispatchState};
use crate::types::{EnvironmentalRecord, SocialSignal};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Note attached to authorized dispatch payloads
pub const DISPATCH_NOTE: &str = "Evacuation broadcast authorized; response units coordinated.";

/// Operations callable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    CheckPrimaryTruth,
    CheckSecondarySignal,
    RequestDispatch,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [
        ToolName::CheckPrimaryTruth,
        ToolName::CheckSecondarySignal,
        ToolName::RequestDispatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CheckPrimaryTruth => "check_primary_truth",
            ToolName::CheckSecondarySignal => "check_secondary_signal",
            ToolName::RequestDispatch => "request_dispatch",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::CheckPrimaryTruth => {
                "Official sensor record for a location and whether it is critical."
            }
            ToolName::CheckSecondarySignal => {
                "Verified citizen reports for a location. Informational only, never gating."
            }
            ToolName::RequestDispatch => {
                "Request an evacuation dispatch. authorized=false is final for the request. \
                 verdict is null when the sensor gate denied before arbitration."
            }
        }
    }

    /// Tool declarations for orchestrators that need a schema
    pub fn declarations() -> Value {
        let tools: Vec<Value> = Self::ALL
            .iter()
            .map(|tool| {
                let mut properties = json!({
                    "location": {"type": "string", "description": "Exact location id"}
                });
                let mut required = vec!["location"];
                if *tool == ToolName::RequestDispatch {
                    properties["action_plan"] =
                        json!({"type": "string", "description": "Action to dispatch"});
                    required.push("action_plan");
                }
                json!({
                    "name": tool.as_str(),
                    "description": tool.description(),
                    "parameters": {
                        "type": "object",
                        "properties": properties,
                        "required": required,
                    }
                })
            })
            .collect();
        Value::Array(tools)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = FlashGuardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| FlashGuardError::UnknownOperation(s.to_string()))
    }
}

/// Payload of `check_primary_truth`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryTruthPayload {
    pub location: String,
    /// `None` when the location has no primary record
    pub sensor_truth: Option<EnvironmentalRecord>,
    pub critical: bool,
    pub status_disagrees_with_gauge: bool,
}

/// Payload of `request_dispatch`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPayload {
    #[serde(alias = "area")]
    pub location: String,
    pub authorized: bool,
    pub state: DispatchState,
    pub reason: String,
    pub requires_manual_verification: bool,
    /// `None` when the sensor gate denied before arbitration
    pub verdict: Option<Verdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<String>,
}

impl From<&DispatchOutcome> for DispatchPayload {
    fn from(outcome: &DispatchOutcome) -> Self {
        let authorized = outcome.authorized();
        Self {
            location: outcome.location.clone(),
            authorized,
            state: outcome.state,
            reason: outcome.reason.clone(),
            requires_manual_verification: outcome.requires_manual_verification(),
            verdict: outcome.verdict.clone(),
            action_plan: authorized.then(|| outcome.action_plan.clone()),
            dispatch: authorized.then(|| DISPATCH_NOTE.to_string()),
        }
    }
}

/// The three core operations over one evidence snapshot
#[derive(Debug, Clone)]
pub struct Capabilities<P: EvidenceProvider, A: Arbiter = NemesisArbiter> {
    evidence: P,
    gate: DispatchGate<A>,
}

impl<P: EvidenceProvider> Capabilities<P, NemesisArbiter> {
    pub fn new(evidence: P) -> Self {
        Self {
            evidence,
            gate: DispatchGate::new(),
        }
    }
}

impl<P: EvidenceProvider, A: Arbiter> Capabilities<P, A> {
    pub fn with_gate(evidence: P, gate: DispatchGate<A>) -> Self {
        Self { evidence, gate }
    }

    pub fn evidence(&self) -> &P {
        &self.evidence
    }

    pub fn gate(&self) -> &DispatchGate<A> {
        &self.gate
    }

    pub fn router(&self) -> ToolRouter<'_, P, A> {
        ToolRouter { capabilities: self }
    }

    /// Sensor truth for a location; `ok` even when no record exists
    pub fn check_primary_truth(&self, location: &str) -> ToolResponse<PrimaryTruthPayload> {
        let record = self.evidence.primary(location);
        let critical = is_critical_with_thresholds(record, self.gate.thresholds());
        let disagrees = record.map(|r| r.status_disagrees_with_gauge()).unwrap_or(false);
        if disagrees {
            warn!(location, "sensor status NORMAL while gauge is at or over threshold");
        }

        let message = match record {
            Some(_) => format!("Sensor truth loaded for {}.", location),
            None => format!(
                "No sensor record for {}; treated as not critical.",
                location
            ),
        };

        ToolResponse::success(
            PrimaryTruthPayload {
                location: location.to_string(),
                sensor_truth: record.cloned(),
                critical,
                status_disagrees_with_gauge: disagrees,
            },
            message,
        )
    }

    /// Citizen reports for a location; never consulted by the gate
    pub fn check_secondary_signal(&self, location: &str) -> ToolResponse<SocialSignal> {
        let signal = self
            .evidence
            .social(location)
            .cloned()
            .unwrap_or_else(|| SocialSignal::quiet(location));

        let message = if signal.has_reports() {
            "Citizen reports detected."
        } else {
            "No recent citizen reports found."
        };
        ToolResponse::success(signal, message)
    }

    /// Run the dispatch gate; `ok` mirrors `authorized`
    pub fn request_dispatch(
        &self,
        location: &str,
        action_plan: &str,
    ) -> Result<ToolResponse<DispatchPayload>> {
        let outcome = self
            .gate
            .request_dispatch(&self.evidence, location, action_plan)?;
        Ok(Self::dispatch_response(&outcome))
    }

    /// Same as [`Self::request_dispatch`] but also hands back the raw outcome
    pub fn request_dispatch_outcome(
        &self,
        location: &str,
        action_plan: &str,
    ) -> Result<(DispatchOutcome, ToolResponse<DispatchPayload>)> {
        let outcome = self
            .gate
            .request_dispatch(&self.evidence, location, action_plan)?;
        let response = Self::dispatch_response(&outcome);
        Ok((outcome, response))
    }

    fn dispatch_response(outcome: &DispatchOutcome) -> ToolResponse<DispatchPayload> {
        let message = match outcome.state {
            DispatchState::Authorized => "SUCCESS: Evacuation alert dispatched.",
            DispatchState::SensorBlocked => "SAFETY BLOCK: No evacuation alert sent.",
            DispatchState::ArbiterBlocked => {
                "SAFETY BLOCK: Sources disagree, manual verification required."
            }
        };
        ToolResponse::new(outcome.authorized(), DispatchPayload::from(outcome), message)
    }
}

#[derive(Debug, Deserialize)]
struct LocationArgs {
    #[serde(alias = "location_name", alias = "area_name")]
    location: String,
}

#[derive(Debug, Deserialize)]
struct DispatchArgs {
    #[serde(alias = "area_name")]
    location: String,
    action_plan: String,
}

/// Name-based entry point; always answers with an envelope
pub struct ToolRouter<'a, P: EvidenceProvider, A: Arbiter = NemesisArbiter> {
    capabilities: &'a Capabilities<P, A>,
}

impl<'a, P: EvidenceProvider, A: Arbiter> ToolRouter<'a, P, A> {
    pub fn new(capabilities: &'a Capabilities<P, A>) -> Self {
        Self { capabilities }
    }

    /// Invoke an operation by name. Errors become `ok=false` envelopes.
    pub fn invoke(&self, name: &str, args: &Value) -> ToolResponse<Value> {
        debug!(tool = name, "tool invocation");
        match self.try_invoke(name, args) {
            Ok(resp) => resp,
            Err(e) => {
                warn!(tool = name, error = %e, "tool invocation rejected");
                ToolResponse::<Value>::failure(&e)
            }
        }
    }

    fn try_invoke(&self, name: &str, args: &Value) -> Result<ToolResponse<Value>> {
        let tool: ToolName = name.parse()?;
        match tool {
            ToolName::CheckPrimaryTruth => {
                let args: LocationArgs = parse_args(tool, args)?;
                Ok(self.capabilities.check_primary_truth(&args.location).into_value())
            }
            ToolName::CheckSecondarySignal => {
                let args: LocationArgs = parse_args(tool, args)?;
                Ok(self
                    .capabilities
                    .check_secondary_signal(&args.location)
                    .into_value())
            }
            ToolName::RequestDispatch => {
                let args: DispatchArgs = parse_args(tool, args)?;
                Ok(self
                    .capabilities
                    .request_dispatch(&args.location, &args.action_plan)?
                    .into_value())
            }
        }
    }
}

fn parse_args<T: DeserializeOwned>(tool: ToolName, args: &Value) -> Result<T> {
    serde_json::from_value(args.clone()).map_err(|e| FlashGuardError::InvalidArguments {
        operation: tool.as_str().to_string(),
        reason: e.to_string(),
    })
}
