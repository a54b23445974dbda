//! Loading evidence tables from disk.

use flashguard_common::{
    DispatchGate, DispatchState, EvidenceProvider, EvidenceStore, FlashGuardError,
};
use std::io::Write;

fn write_table(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_new_locations_need_no_code() {
    let file = write_table(
        r#"
[[primary]]
location = "Manila"
river_gauge_meters = 16.2
critical_threshold_meters = 15.0
status = "CRITICAL_SPILL_LEVEL"

[[secondary]]
location = "Manila"
alt_status = "CRITICAL"
inundation_m = 0.9
rescue_requests = 4

[[primary]]
location = "San Lorenzo"
river_gauge_meters = 3.2
critical_threshold_meters = 9.0
status = "NORMAL"
"#,
    );

    let store = EvidenceStore::load(file.path()).unwrap();
    assert_eq!(store.locations(), vec!["Manila", "San Lorenzo"]);

    let gate = DispatchGate::new();
    let manila = gate.request_dispatch(&store, "Manila", "Evacuate").unwrap();
    let san_lorenzo = gate.request_dispatch(&store, "San Lorenzo", "Evacuate").unwrap();
    assert_eq!(manila.state, DispatchState::Authorized);
    assert_eq!(san_lorenzo.state, DispatchState::SensorBlocked);
}

#[test]
fn test_malformed_fields_fail_safe() {
    // Sensor record without gauge or threshold loads and stays non-critical
    let file = write_table(
        r#"
[[primary]]
location = "Quiet"
status = "UNKNOWN"
"#,
    );
    let store = EvidenceStore::load(file.path()).unwrap();
    let outcome = DispatchGate::new()
        .request_dispatch(&store, "Quiet", "Evacuate")
        .unwrap();
    assert_eq!(outcome.state, DispatchState::SensorBlocked);
}

#[test]
fn test_bad_rows_do_not_disable_other_locations() {
    let file = write_table(
        r#"
[[primary]]
location = "Bulacan"
river_gauge_meters = 18.5
critical_threshold_meters = 15.0
status = "CRITICAL_SPILL_LEVEL"

[[secondary]]
location = "Bulacan"
alt_status = "SEVERE_FLOOD_WARNING"
inundation_m = 1.4
rescue_requests = 7

[[primary]]
location = "Rizal"
river_gauge_meters = "17.1"
critical_threshold_meters = 18.0
status = "NORMAL"

[[primary]]
location = "Pasig"
river_gauge_meters = 13.6
critical_threshold_meters = 13.5

[[secondary]]
location = "Pasig"
alt_status = "SEVERE_FLOOD_WARNING"
rescue_requests = -1

[[primary]]
location = "Broken"
river_gauge_meters = 1.0
critical_threshold_meters = -3.0
"#,
    );

    let store = EvidenceStore::load(file.path()).unwrap();
    let gate = DispatchGate::new();
    let state = |loc: &str| gate.request_dispatch(&store, loc, "Evacuate").unwrap().state;

    assert_eq!(state("Bulacan"), DispatchState::Authorized);
    // Unreadable gauge counts as not critical
    assert!(store.primary("Rizal").unwrap().river_gauge_meters.is_none());
    assert_eq!(state("Rizal"), DispatchState::SensorBlocked);
    // Bad rescue count is dropped, the status still corroborates
    assert!(store.secondary("Pasig").unwrap().rescue_requests.is_none());
    assert_eq!(state("Pasig"), DispatchState::Authorized);
    // Non-positive threshold can never be reached
    assert_eq!(state("Broken"), DispatchState::SensorBlocked);
}

#[test]
fn test_malformed_secondary_fails_safe_to_block() {
    let file = write_table(
        r#"
[[primary]]
location = "Valenzuela"
river_gauge_meters = 16.0
critical_threshold_meters = 15.0
status = "CRITICAL_SPILL_LEVEL"

[[secondary]]
location = "Valenzuela"
alt_status = 42
inundation_m = "deep"
rescue_requests = -1
"#,
    );

    let store = EvidenceStore::load(file.path()).unwrap();
    let outcome = DispatchGate::new()
        .request_dispatch(&store, "Valenzuela", "Evacuate")
        .unwrap();
    assert_eq!(outcome.state, DispatchState::ArbiterBlocked);
    assert!(outcome.requires_manual_verification());
}

#[test]
fn test_duplicate_location_rejected_at_load() {
    let file = write_table(
        r#"
[[primary]]
location = "Twice"
[[primary]]
location = "Twice"
"#,
    );
    let err = EvidenceStore::load(file.path()).unwrap_err();
    assert!(matches!(err, FlashGuardError::EvidenceTable(_)));
    assert!(err.to_string().contains("duplicate primary record for Twice"));
}

#[test]
fn test_unparseable_table_names_the_file() {
    let file = write_table("[[primary]\nlocation = ");
    let err = EvidenceStore::load(file.path()).unwrap_err();
    assert!(matches!(err, FlashGuardError::EvidenceTable(_)));
    assert!(err
        .to_string()
        .contains(&file.path().display().to_string()));
}

#[test]
fn test_missing_file() {
    let err = EvidenceStore::load(std::path::Path::new("/nonexistent/evidence.toml")).unwrap_err();
    assert!(matches!(err, FlashGuardError::EvidenceTable(_)));
}
