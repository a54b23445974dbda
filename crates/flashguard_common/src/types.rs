//! Evidence record types for the three channels.
//!
//! Every field that can be missing in a real feed is optional, and a field of
//! the wrong shape deserializes to its fail-safe default (`None`, `""`, `0`)
//! with a warning. A malformed record is therefore still loaded and classified
//! fail-safe instead of failing the whole table.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(Option<T>),
    Malformed(IgnoredAny),
}

/// Field of unexpected shape becomes `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Valid(value) => Ok(value),
        Lenient::Malformed(_) => {
            warn!(
                expected = std::any::type_name::<T>(),
                "malformed evidence field replaced with fail-safe default"
            );
            Ok(None)
        }
    }
}

/// Field of unexpected shape becomes `T::default()`
fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

fn lenient_confidence<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient(deserializer)?.unwrap_or_else(default_confidence))
}

fn lenient_social_source<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient(deserializer)?.unwrap_or_else(default_social_source))
}

/// Evidence channel identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Official sensor feed, drives the first gate
    Primary,
    /// Independent corroborating source, only validates
    Secondary,
    /// Citizen reports, never gating
    Citizen,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Primary => write!(f, "primary"),
            Channel::Secondary => write!(f, "secondary"),
            Channel::Citizen => write!(f, "citizen"),
        }
    }
}

/// Primary channel record ("official sensor truth")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalRecord {
    pub location: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub river_basin: Option<String>,
    /// River gauge reading in meters
    #[serde(default, deserialize_with = "lenient")]
    pub river_gauge_meters: Option<f64>,
    /// Critical threshold in meters, > 0 when set
    #[serde(default, deserialize_with = "lenient")]
    pub critical_threshold_meters: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub rainfall_mm_per_hr: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub satellite_soil_saturation: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub satellite_cloud_cover: Option<String>,
    /// Status tag, "" when unset
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
}

impl EnvironmentalRecord {
    pub fn new(location: impl Into<String>, gauge: f64, threshold: f64, status: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            timestamp: None,
            river_basin: None,
            river_gauge_meters: Some(gauge),
            critical_threshold_meters: Some(threshold),
            rainfall_mm_per_hr: None,
            satellite_soil_saturation: None,
            satellite_cloud_cover: None,
            status: status.into(),
            data_source: None,
        }
    }

    /// Record with only a location and nothing else set
    pub fn empty(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            timestamp: None,
            river_basin: None,
            river_gauge_meters: None,
            critical_threshold_meters: None,
            rainfall_mm_per_hr: None,
            satellite_soil_saturation: None,
            satellite_cloud_cover: None,
            status: String::new(),
            data_source: None,
        }
    }

    pub fn with_basin(mut self, basin: impl Into<String>) -> Self {
        self.river_basin = Some(basin.into());
        self
    }

    pub fn with_rainfall(mut self, mm_per_hr: f64) -> Self {
        self.rainfall_mm_per_hr = Some(mm_per_hr);
        self
    }

    pub fn with_satellite(mut self, soil_saturation: impl Into<String>, cloud_cover: impl Into<String>) -> Self {
        self.satellite_soil_saturation = Some(soil_saturation.into());
        self.satellite_cloud_cover = Some(cloud_cover.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Gauge reading used for comparisons.
    ///
    /// An unset gauge is negative infinity so it never reaches a threshold.
    pub fn effective_gauge(&self) -> f64 {
        self.river_gauge_meters.unwrap_or(f64::NEG_INFINITY)
    }

    /// Threshold used for comparisons.
    ///
    /// Unset, non-positive or NaN thresholds become positive infinity so they
    /// can never be exceeded.
    pub fn effective_threshold(&self) -> f64 {
        match self.critical_threshold_meters {
            Some(t) if t > 0.0 => t,
            _ => f64::INFINITY,
        }
    }

    /// Whether the gauge is at or above the threshold (inclusive)
    pub fn gauge_at_or_over_threshold(&self) -> bool {
        self.effective_gauge() >= self.effective_threshold()
    }

    /// Status reads NORMAL while the gauge says otherwise.
    ///
    /// Display-only: the gauge rule alone decides criticality.
    pub fn status_disagrees_with_gauge(&self) -> bool {
        self.status == "NORMAL" && self.gauge_at_or_over_threshold()
    }
}

/// Secondary channel record ("adversarial" corroboration)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdversarialRecord {
    pub location: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub alt_status: String,
    /// Estimated inundation depth in meters
    #[serde(default, deserialize_with = "lenient")]
    pub inundation_m: Option<f64>,
    /// Independent rescue requests
    #[serde(default, deserialize_with = "lenient")]
    pub rescue_requests: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
}

impl AdversarialRecord {
    pub fn new(location: impl Into<String>, alt_status: impl Into<String>, inundation_m: f64, rescue_requests: u32) -> Self {
        Self {
            location: location.into(),
            alt_status: alt_status.into(),
            inundation_m: Some(inundation_m),
            rescue_requests: Some(rescue_requests),
            confidence: None,
            data_source: None,
        }
    }

    pub fn with_confidence(mut self, confidence: impl Into<String>) -> Self {
        self.confidence = Some(confidence.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }
}

/// Citizen report summary for a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialSignal {
    pub location: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub verified_reports_count: u32,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub highlights: Vec<String>,
    #[serde(default = "default_confidence", deserialize_with = "lenient_confidence")]
    pub confidence: String,
    #[serde(default = "default_social_source", deserialize_with = "lenient_social_source")]
    pub data_source: String,
}

fn default_confidence() -> String {
    "LOW".to_string()
}

fn default_social_source() -> String {
    "UNREPORTED".to_string()
}

impl SocialSignal {
    /// Signal for a location with no citizen reports
    pub fn quiet(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            verified_reports_count: 0,
            highlights: Vec::new(),
            confidence: default_confidence(),
            data_source: default_social_source(),
        }
    }

    pub fn has_reports(&self) -> bool {
        self.verified_reports_count > 0
    }
}
