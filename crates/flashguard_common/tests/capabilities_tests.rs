//! Envelope contract of the three operations over the reference dataset.

use flashguard_common::{
    Capabilities, DispatchPayload, DispatchState, EvidenceStore, ToolName, ToolResponse,
};
use serde_json::{json, Value};

fn reference() -> Capabilities<EvidenceStore> {
    Capabilities::new(EvidenceStore::reference().unwrap())
}

fn parse(json: &str) -> Value {
    serde_json::from_str(json).unwrap()
}

// === check_primary_truth ===

#[test]
fn test_primary_truth_known_location() {
    let resp = parse(&reference().check_primary_truth("Bulacan").to_json_string());
    assert_eq!(resp["ok"], true);
    assert_eq!(resp["payload"]["sensor_truth"]["river_basin"], "Angat River");
    assert_eq!(resp["payload"]["critical"], true);
    assert_eq!(resp["payload"]["status_disagrees_with_gauge"], false);
}

#[test]
fn test_primary_truth_missing_location_is_still_ok() {
    let resp = parse(&reference().check_primary_truth("UnknownCity").to_json_string());
    assert_eq!(resp["ok"], true);
    assert!(resp["payload"]["sensor_truth"].is_null());
    assert_eq!(resp["payload"]["critical"], false);
}

// === check_secondary_signal ===

#[test]
fn test_secondary_signal_reports() {
    let resp = reference().check_secondary_signal("Marikina");
    assert!(resp.ok);
    assert_eq!(resp.payload.verified_reports_count, 3);
    assert_eq!(resp.payload.highlights.len(), 2);
    assert_eq!(resp.message, "Citizen reports detected.");
}

#[test]
fn test_secondary_signal_unknown_location() {
    let resp = reference().check_secondary_signal("Bulacan");
    assert!(resp.ok);
    assert_eq!(resp.payload.verified_reports_count, 0);
    assert_eq!(resp.payload.confidence, "LOW");
    assert_eq!(resp.payload.location, "Bulacan");
}

#[test]
fn test_citizen_reports_never_authorize() {
    // Marikina has citizen chatter but normal sensors
    let resp = reference().request_dispatch("Marikina", "Evacuate").unwrap();
    assert!(!resp.ok);
    assert_eq!(resp.payload.state, DispatchState::SensorBlocked);
}

// === request_dispatch ===

#[test]
fn test_dispatch_blocked_by_sensor() {
    let resp = parse(
        &reference()
            .request_dispatch("Rizal", "Evacuate")
            .unwrap()
            .to_json_string(),
    );
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["payload"]["authorized"], false);
    assert_eq!(resp["payload"]["state"], "SENSOR_BLOCKED");
    assert!(resp["payload"]["reason"]
        .as_str()
        .unwrap()
        .contains("Dispatch blocked"));
    assert_eq!(resp["payload"]["requires_manual_verification"], false);
    assert!(resp["payload"]["verdict"].is_null());
}

#[test]
fn test_dispatch_blocked_by_arbiter() {
    let resp = parse(
        &reference()
            .request_dispatch("Pasig", "Evacuate")
            .unwrap()
            .to_json_string(),
    );
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["payload"]["state"], "ARBITER_BLOCKED");
    assert_eq!(resp["payload"]["requires_manual_verification"], true);
    assert_eq!(resp["payload"]["verdict"]["decision"], "BLOCK");
    assert_eq!(resp["payload"]["verdict"]["primary_critical"], true);
    assert_eq!(resp["payload"]["verdict"]["secondary_critical"], false);
    assert!(resp["payload"].get("action_plan").is_none());
}

#[test]
fn test_dispatch_approved() {
    let resp = parse(
        &reference()
            .request_dispatch("Bulacan", "Evacuate")
            .unwrap()
            .to_json_string(),
    );
    assert_eq!(resp["ok"], true);
    assert_eq!(resp["message"], "SUCCESS: Evacuation alert dispatched.");
    assert_eq!(resp["payload"]["location"], "Bulacan");
    assert!(resp["payload"].get("area").is_none());
    assert_eq!(resp["payload"]["authorized"], true);
    assert_eq!(resp["payload"]["action_plan"], "Evacuate");
    assert_eq!(resp["payload"]["verdict"]["decision"], "APPROVE");
    assert!(resp["payload"]["dispatch"].is_string());
}

#[test]
fn test_dispatch_payload_accepts_area_name() {
    let payload: DispatchPayload = serde_json::from_value(json!({
        "area": "Rizal",
        "authorized": false,
        "state": "SENSOR_BLOCKED",
        "reason": "Dispatch blocked",
        "requires_manual_verification": false,
        "verdict": null
    }))
    .unwrap();
    assert_eq!(payload.location, "Rizal");
    assert!(payload.verdict.is_none());
}

#[test]
fn test_dispatch_description_documents_null_verdict() {
    let description = ToolName::RequestDispatch.description();
    assert!(description.contains("authorized=false is final"));
    assert!(description.contains("verdict is null"));
}

#[test]
fn test_dispatch_misuse_is_an_error() {
    let err = reference().request_dispatch("", "Evacuate").unwrap_err();
    assert!(err.is_invocation_misuse());
}

// === Router ===

#[test]
fn test_router_matches_typed_calls() {
    let caps = reference();
    for location in ["Bulacan", "Marikina", "Pasig", "Nowhere"] {
        let typed = caps
            .request_dispatch(location, "Evacuate")
            .unwrap()
            .into_value();
        let routed = caps.router().invoke(
            ToolName::RequestDispatch.as_str(),
            &json!({"location": location, "action_plan": "Evacuate"}),
        );
        assert_eq!(typed, routed, "router drifted for {}", location);
    }
}

#[test]
fn test_router_unknown_operation() {
    let resp: ToolResponse<Value> = reference().router().invoke("launch_rockets", &json!({}));
    assert!(!resp.ok);
    assert_eq!(resp.payload["error"], "unknown_operation");
}

#[test]
fn test_router_misuse_envelope() {
    let resp = reference()
        .router()
        .invoke("request_dispatch", &json!({"location": "", "action_plan": "Evacuate"}));
    assert!(!resp.ok);
    assert_eq!(resp.payload["error"], "invocation_misuse");
}
