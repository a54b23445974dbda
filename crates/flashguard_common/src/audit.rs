//! Evidence fingerprints for audit trails.
//!
//! A fingerprint is the SHA-256 of the canonical JSON of everything the gate
//! looked at for one location. Two decisions with equal fingerprints were made
//! on identical evidence.

use crate::evidence::EvidenceProvider;
use crate::types::{AdversarialRecord, EnvironmentalRecord};
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Serialize)]
struct Snapshot<'a> {
    location: &'a str,
    primary: Option<&'a EnvironmentalRecord>,
    secondary: Option<&'a AdversarialRecord>,
}

/// Hex SHA-256 of the gating evidence for `location`.
///
/// Citizen signals are excluded since they never gate.
pub fn evidence_fingerprint(evidence: &dyn EvidenceProvider, location: &str) -> String {
    let snapshot = Snapshot {
        location,
        primary: evidence.primary(location),
        secondary: evidence.secondary(location),
    };
    // Records hold only strings, numbers and options; serialization does not fail
    let bytes = serde_json::to_vec(&snapshot).unwrap_or_default();
    hex::encode(Sha256::digest(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::EvidenceStore;
    use crate::types::SocialSignal;

    #[test]
    fn test_fingerprint_is_stable() {
        let store = EvidenceStore::reference().unwrap();
        let a = evidence_fingerprint(&store, "Bulacan");
        let b = evidence_fingerprint(&store, "Bulacan");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_tracks_gating_evidence_only() {
        let base = EvidenceStore::new()
            .with_primary(EnvironmentalRecord::new("A", 1.0, 2.0, "NORMAL"));
        let with_social = base.clone().with_social(SocialSignal::quiet("A"));
        let with_secondary = base
            .clone()
            .with_secondary(AdversarialRecord::new("A", "LOW_RISK", 0.0, 0));

        let fp = evidence_fingerprint(&base, "A");
        assert_eq!(fp, evidence_fingerprint(&with_social, "A"));
        assert_ne!(fp, evidence_fingerprint(&with_secondary, "A"));
        assert_ne!(fp, evidence_fingerprint(&base, "B"));
    }
}
