//! Criticality rules for both evidence channels.
//!
//! Pure functions. NO I/O, no panics, any input produces a bool.

use crate::types::{AdversarialRecord, EnvironmentalRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Primary status tag that marks a record critical on its own
pub const CRITICAL_SPILL_LEVEL: &str = "CRITICAL_SPILL_LEVEL";

/// Thresholds for channel criticality (configurable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateThresholds {
    /// Primary status that is critical regardless of gauge (default: CRITICAL_SPILL_LEVEL)
    pub primary_critical_status: String,
    /// Secondary statuses that are critical (default: SEVERE_FLOOD_WARNING, CRITICAL)
    pub secondary_critical_statuses: Vec<String>,
    /// Inundation depth at which the secondary channel is critical (default: 0.5 m)
    pub min_inundation_m: f64,
    /// Rescue requests at which the secondary channel is critical (default: 2)
    pub min_rescue_requests: u32,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            primary_critical_status: CRITICAL_SPILL_LEVEL.to_string(),
            secondary_critical_statuses: vec![
                "SEVERE_FLOOD_WARNING".to_string(),
                "CRITICAL".to_string(),
            ],
            min_inundation_m: 0.5,
            min_rescue_requests: 2,
        }
    }
}

/// Primary-channel criticality with default thresholds
pub fn is_critical(record: Option<&EnvironmentalRecord>) -> bool {
    is_critical_with_thresholds(record, &GateThresholds::default())
}

/// Primary-channel criticality.
///
/// `status == primary_critical_status OR gauge >= threshold`. A missing record
/// is not critical.
pub fn is_critical_with_thresholds(
    record: Option<&EnvironmentalRecord>,
    thresholds: &GateThresholds,
) -> bool {
    let Some(record) = record else {
        return false;
    };

    let by_status = !record.status.is_empty() && record.status == thresholds.primary_critical_status;
    let by_gauge = record.gauge_at_or_over_threshold();

    debug!(
        location = %record.location,
        status = %record.status,
        gauge = record.effective_gauge(),
        threshold = record.effective_threshold(),
        by_status,
        by_gauge,
        "primary criticality evaluated"
    );

    by_status || by_gauge
}

/// Secondary-channel criticality with default thresholds
pub fn is_secondary_critical(record: Option<&AdversarialRecord>) -> bool {
    is_secondary_critical_with_thresholds(record, &GateThresholds::default())
}

/// Secondary-channel criticality.
///
/// Critical status tag, OR inundation at/over the bound, OR enough rescue
/// requests. Missing fields count as zero.
pub fn is_secondary_critical_with_thresholds(
    record: Option<&AdversarialRecord>,
    thresholds: &GateThresholds,
) -> bool {
    let Some(record) = record else {
        return false;
    };

    let by_status = thresholds
        .secondary_critical_statuses
        .iter()
        .any(|s| !s.is_empty() && *s == record.alt_status);
    // NaN compares false
    let by_inundation = record
        .inundation_m
        .map(|depth| depth >= thresholds.min_inundation_m)
        .unwrap_or(false);
    let by_rescues = record
        .rescue_requests
        .map(|n| n >= thresholds.min_rescue_requests)
        .unwrap_or(false);

    debug!(
        location = %record.location,
        alt_status = %record.alt_status,
        by_status,
        by_inundation,
        by_rescues,
        "secondary criticality evaluated"
    );

    by_status || by_inundation || by_rescues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_record_is_not_critical() {
        assert!(!is_critical(None));
        assert!(!is_secondary_critical(None));
    }

    #[test]
    fn test_gauge_equal_to_threshold_is_critical() {
        let rec = EnvironmentalRecord::new("Edge", 15.0, 15.0, "");
        assert!(is_critical(Some(&rec)));
    }

    #[test]
    fn test_gauge_just_below_threshold_is_not_critical() {
        let rec = EnvironmentalRecord::new("Edge", 14.999, 15.0, "NORMAL");
        assert!(!is_critical(Some(&rec)));
    }

    #[test]
    fn test_status_alone_is_critical() {
        let rec = EnvironmentalRecord::new("Bulacan", 1.0, 15.0, CRITICAL_SPILL_LEVEL);
        assert!(is_critical(Some(&rec)));
    }

    #[test]
    fn test_unset_threshold_never_critical_by_gauge() {
        let mut rec = EnvironmentalRecord::new("Rizal", 1_000.0, 15.0, "NORMAL");
        rec.critical_threshold_meters = None;
        assert!(!is_critical(Some(&rec)));
    }

    #[test]
    fn test_nan_gauge_is_not_critical() {
        let rec = EnvironmentalRecord::new("Rizal", f64::NAN, 15.0, "");
        assert!(!is_critical(Some(&rec)));
    }

    #[test]
    fn test_empty_custom_status_never_matches_unset_tag() {
        let thresholds = GateThresholds {
            primary_critical_status: String::new(),
            ..Default::default()
        };
        let rec = EnvironmentalRecord::new("Pasig", 1.0, 13.5, "");
        assert!(!is_critical_with_thresholds(Some(&rec), &thresholds));
    }

    #[test]
    fn test_secondary_rules() {
        let by_status = AdversarialRecord::new("A", "CRITICAL", 0.0, 0);
        let by_depth = AdversarialRecord::new("B", "LOW_RISK", 0.5, 0);
        let by_rescues = AdversarialRecord::new("C", "LOW_RISK", 0.1, 2);
        let quiet = AdversarialRecord::new("D", "LOW_RISK", 0.49, 1);

        assert!(is_secondary_critical(Some(&by_status)));
        assert!(is_secondary_critical(Some(&by_depth)));
        assert!(is_secondary_critical(Some(&by_rescues)));
        assert!(!is_secondary_critical(Some(&quiet)));
    }

    #[test]
    fn test_secondary_missing_fields_are_not_critical() {
        let adv: AdversarialRecord =
            serde_json::from_str(r#"{"location": "X", "alt_status": "UNHEARD_OF"}"#).unwrap();
        assert!(!is_secondary_critical(Some(&adv)));
    }

    #[test]
    fn test_custom_thresholds() {
        let strict = GateThresholds {
            min_inundation_m: 1.0,
            min_rescue_requests: 5,
            ..Default::default()
        };
        let adv = AdversarialRecord::new("X", "LOW_RISK", 0.8, 3);
        assert!(is_secondary_critical(Some(&adv)));
        assert!(!is_secondary_critical_with_thresholds(Some(&adv), &strict));
    }
}
