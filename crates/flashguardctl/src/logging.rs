//! Logging for flashguardctl
//!
//! Diagnostics go to stderr through `tracing`; dispatch decisions are
//! appended to an optional JSONL audit log.

use flashguard_common::{evidence_fingerprint, DispatchOutcome, DispatchState, EvidenceProvider};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Filter override, takes precedence over RUST_LOG
pub const LOG_ENV: &str = "FLASHGUARD_LOG";

/// Audit log path override
pub const AUDIT_LOG_ENV: &str = "FLASHGUARD_AUDIT_LOG";

/// Install the stderr subscriber.
///
/// Priority: `--verbose`, $FLASHGUARD_LOG, $RUST_LOG, config level.
pub fn init_tracing(default_level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        std::env::var(LOG_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .map(EnvFilter::new)
            .or_else(|| EnvFilter::try_from_default_env().ok())
            .unwrap_or_else(|| EnvFilter::new(default_level))
    };

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// One line of the audit log per dispatch request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// RFC 3339 timestamp
    pub ts: String,

    /// Request ID (UUID)
    pub req_id: String,

    pub location: String,
    pub action_plan: String,
    pub state: DispatchState,
    pub authorized: bool,
    pub reason: String,

    /// SHA-256 of the primary and secondary records the decision used
    pub evidence_fingerprint: String,
}

impl AuditEntry {
    pub fn from_outcome(outcome: &DispatchOutcome, evidence: &dyn EvidenceProvider) -> Self {
        Self {
            ts: Self::now(),
            req_id: Self::generate_req_id(),
            location: outcome.location.clone(),
            action_plan: outcome.action_plan.clone(),
            state: outcome.state,
            authorized: outcome.authorized(),
            reason: outcome.reason.clone(),
            evidence_fingerprint: evidence_fingerprint(evidence, &outcome.location),
        }
    }

    pub fn generate_req_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

/// Destination for audit entries
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    path: Option<PathBuf>,
}

impl AuditLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Discover the audit log path
    ///
    /// Priority:
    /// 1. `--audit-log` flag
    /// 2. $FLASHGUARD_AUDIT_LOG
    /// 3. `[audit] log_path` from config
    ///
    /// Nothing is written when none is set.
    pub fn discover(flag: Option<&Path>, configured: Option<&Path>) -> Self {
        if let Some(path) = flag {
            return Self::new(Some(path.to_path_buf()));
        }
        if let Ok(path) = std::env::var(AUDIT_LOG_ENV) {
            if !path.is_empty() {
                return Self::new(Some(PathBuf::from(path)));
            }
        }
        Self::new(configured.map(Path::to_path_buf))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an entry. Failures are logged and never affect the decision.
    pub fn record(&self, entry: &AuditEntry) {
        let Some(path) = &self.path else {
            return;
        };
        match Self::append(path, entry) {
            Ok(()) => debug!(path = %path.display(), req_id = %entry.req_id, "audit entry written"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to write audit entry"),
        }
    }

    fn append(path: &Path, entry: &AuditEntry) -> std::io::Result<()> {
        let json = serde_json::to_string(entry)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}
