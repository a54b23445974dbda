//! Error types for FlashGuard.
//!
//! Classification and arbitration never fail. Only structurally invalid calls
//! and unreadable inputs (tables, config files) surface here.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlashGuardError>;

#[derive(Error, Debug)]
pub enum FlashGuardError {
    /// Caller passed an empty location or action plan
    #[error("Invalid request: {0}")]
    InvocationMisuse(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Invalid arguments for {operation}: {reason}")]
    InvalidArguments { operation: String, reason: String },

    #[error("Evidence table error: {0}")]
    EvidenceTable(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl FlashGuardError {
    pub fn code(&self) -> i32 {
        match self {
            FlashGuardError::InvocationMisuse(_) => -32602,
            FlashGuardError::UnknownOperation(_) => -32601,
            FlashGuardError::InvalidArguments { .. } => -32600,
            FlashGuardError::EvidenceTable(_) => -32010,
            FlashGuardError::Config(_) => -32011,
            FlashGuardError::Io(_) => -32006,
            FlashGuardError::Json(_) => -32700,
            FlashGuardError::Toml(_) => -32701,
        }
    }

    /// Stable snake_case name used in error envelopes
    pub fn kind(&self) -> &'static str {
        match self {
            FlashGuardError::InvocationMisuse(_) => "invocation_misuse",
            FlashGuardError::UnknownOperation(_) => "unknown_operation",
            FlashGuardError::InvalidArguments { .. } => "invalid_arguments",
            FlashGuardError::EvidenceTable(_) => "evidence_table",
            FlashGuardError::Config(_) => "config",
            FlashGuardError::Io(_) => "io",
            FlashGuardError::Json(_) => "json",
            FlashGuardError::Toml(_) => "toml",
        }
    }

    pub fn is_invocation_misuse(&self) -> bool {
        matches!(self, FlashGuardError::InvocationMisuse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misuse_is_distinguishable() {
        let err = FlashGuardError::InvocationMisuse("location must not be empty".to_string());
        assert!(err.is_invocation_misuse());
        assert_eq!(err.kind(), "invocation_misuse");
        assert_eq!(err.to_string(), "Invalid request: location must not be empty");
    }

    #[test]
    fn test_codes_are_unique() {
        let errors = vec![
            FlashGuardError::InvocationMisuse(String::new()),
            FlashGuardError::UnknownOperation(String::new()),
            FlashGuardError::InvalidArguments {
                operation: String::new(),
                reason: String::new(),
            },
            FlashGuardError::EvidenceTable(String::new()),
            FlashGuardError::Config(String::new()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
