//! FlashGuard configuration.
//!
//! Config file: `~/.config/flashguard/config.toml` or
//! `/etc/flashguard/config.toml`, overridable with `FLASHGUARD_CONFIG`.

use crate::classifier::GateThresholds;
use crate::error::{FlashGuardError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "FLASHGUARD_CONFIG";

/// Evidence source settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceConfig {
    /// TOML evidence table; the embedded reference table is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_path: Option<PathBuf>,
}

/// Overrides for the criticality thresholds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArbiterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_critical_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_critical_statuses: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_inundation_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rescue_requests: Option<u32>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when FLASHGUARD_LOG / RUST_LOG are unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Dispatch audit log settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// JSONL file; no audit log is written when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

/// Color display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when stdout is a terminal
    Auto,
    Always,
    Never,
}

impl Default for ColorMode {
    fn default() -> Self {
        Self::Auto
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub color: ColorMode,
}

/// Main FlashGuard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlashGuardConfig {
    #[serde(default)]
    pub evidence: EvidenceConfig,

    #[serde(default)]
    pub arbiter: ArbiterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub audit: AuditConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl FlashGuardConfig {
    /// `~/.config/flashguard/config.toml`, honoring XDG_CONFIG_HOME
    pub fn user_config_path() -> Option<PathBuf> {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            if !xdg.is_empty() {
                return Some(Path::new(&xdg).join("flashguard").join("config.toml"));
            }
        }
        std::env::var("HOME")
            .ok()
            .map(|home| Path::new(&home).join(".config").join("flashguard").join("config.toml"))
    }

    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/flashguard/config.toml")
    }

    /// Load configuration.
    ///
    /// Priority:
    /// 1. `explicit` path (CLI flag)
    /// 2. $FLASHGUARD_CONFIG
    /// 3. User config
    /// 4. System config
    /// 5. Defaults
    ///
    /// Explicit paths must exist; discovered paths are skipped when missing.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return Self::load_from(Path::new(&path));
            }
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::load_from(&system_path);
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            FlashGuardError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: FlashGuardConfig = toml::from_str(&contents).map_err(|e| {
            FlashGuardError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.thresholds()?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Criticality thresholds with overrides applied
    pub fn thresholds(&self) -> Result<GateThresholds> {
        let mut thresholds = GateThresholds::default();
        let arbiter = &self.arbiter;

        if let Some(status) = &arbiter.primary_critical_status {
            if status.trim().is_empty() {
                return Err(FlashGuardError::Config(
                    "arbiter.primary_critical_status must not be empty".to_string(),
                ));
            }
            thresholds.primary_critical_status = status.clone();
        }
        if let Some(statuses) = &arbiter.secondary_critical_statuses {
            thresholds.secondary_critical_statuses = statuses.clone();
        }
        if let Some(depth) = arbiter.min_inundation_m {
            if !depth.is_finite() || depth <= 0.0 {
                return Err(FlashGuardError::Config(format!(
                    "arbiter.min_inundation_m must be a positive number, got {}",
                    depth
                )));
            }
            thresholds.min_inundation_m = depth;
        }
        if let Some(rescues) = arbiter.min_rescue_requests {
            if rescues == 0 {
                return Err(FlashGuardError::Config(
                    "arbiter.min_rescue_requests must be at least 1".to_string(),
                ));
            }
            thresholds.min_rescue_requests = rescues;
        }

        Ok(thresholds)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| FlashGuardError::Config(format!("failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_gate_defaults() {
        let config = FlashGuardConfig::default();
        assert_eq!(config.thresholds().unwrap(), GateThresholds::default());
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.output.color, ColorMode::Auto);
        assert!(config.audit.log_path.is_none());
    }

    #[test]
    fn test_load_from_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[evidence]
table_path = "/srv/flashguard/evidence.toml"

[arbiter]
min_inundation_m = 0.8
min_rescue_requests = 3

[output]
color = "never"
"#
        )
        .unwrap();

        let config = FlashGuardConfig::load(Some(file.path())).unwrap();
        let thresholds = config.thresholds().unwrap();
        assert_eq!(thresholds.min_inundation_m, 0.8);
        assert_eq!(thresholds.min_rescue_requests, 3);
        assert_eq!(thresholds.primary_critical_status, "CRITICAL_SPILL_LEVEL");
        assert_eq!(
            config.evidence.table_path,
            Some(PathBuf::from("/srv/flashguard/evidence.toml"))
        );
        assert_eq!(config.output.color, ColorMode::Never);
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        let config: FlashGuardConfig = toml::from_str(
            r#"
[arbiter]
min_rescue_requests = 0
"#,
        )
        .unwrap();
        assert!(config.thresholds().is_err());

        let config: FlashGuardConfig = toml::from_str(
            r#"
[arbiter]
min_inundation_m = -1.0
"#,
        )
        .unwrap();
        assert!(config.thresholds().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = FlashGuardConfig::load(Some(Path::new("/nonexistent/flashguard.toml")))
            .unwrap_err();
        assert!(matches!(err, FlashGuardError::Config(_)));
    }

    #[test]
    fn test_round_trip_toml() {
        let config = FlashGuardConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed: FlashGuardConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
