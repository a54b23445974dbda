//! Evidence store: immutable per-location records for the three channels.
//!
//! The core never fetches data. Callers inject an [`EvidenceProvider`]
//! snapshot on every call; [`EvidenceStore`] is the in-memory implementation,
//! loadable from a TOML evidence table.

use crate::error::{FlashGuardError, Result};
use crate::types::{AdversarialRecord, EnvironmentalRecord, SocialSignal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Embedded reference dataset
const REFERENCE_TABLE: &str = include_str!("../data/reference_evidence.toml");

/// Read-only access to evidence, keyed by exact location id
pub trait EvidenceProvider: Send + Sync {
    fn primary(&self, location: &str) -> Option<&EnvironmentalRecord>;

    fn secondary(&self, location: &str) -> Option<&AdversarialRecord>;

    fn social(&self, location: &str) -> Option<&SocialSignal>;

    /// All location ids known to any channel, sorted
    fn locations(&self) -> Vec<String>;
}

/// On-disk shape of an evidence table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceTable {
    #[serde(default)]
    pub primary: Vec<EnvironmentalRecord>,
    #[serde(default)]
    pub secondary: Vec<AdversarialRecord>,
    #[serde(default)]
    pub social: Vec<SocialSignal>,
}

impl EvidenceTable {
    /// Reject tables whose location ids are empty or duplicated.
    ///
    /// Bad field values never reject a table: they were already defaulted at
    /// deserialization, and a non-positive threshold only draws a warning
    /// since the classifier treats it as unreachable.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for rec in &self.primary {
            check_location("primary", &rec.location)?;
            if !seen.insert(rec.location.as_str()) {
                return Err(duplicate("primary", &rec.location));
            }
            if let Some(t) = rec.critical_threshold_meters {
                if !(t > 0.0) {
                    warn!(
                        location = %rec.location,
                        threshold = t,
                        "non-positive threshold, gauge rule disabled for this record"
                    );
                }
            }
        }

        seen.clear();
        for rec in &self.secondary {
            check_location("secondary", &rec.location)?;
            if !seen.insert(rec.location.as_str()) {
                return Err(duplicate("secondary", &rec.location));
            }
        }

        seen.clear();
        for rec in &self.social {
            check_location("social", &rec.location)?;
            if !seen.insert(rec.location.as_str()) {
                return Err(duplicate("social", &rec.location));
            }
        }

        Ok(())
    }
}

fn check_location(channel: &str, location: &str) -> Result<()> {
    if location.trim().is_empty() {
        return Err(FlashGuardError::EvidenceTable(format!(
            "{} record with empty location",
            channel
        )));
    }
    Ok(())
}

fn duplicate(channel: &str, location: &str) -> FlashGuardError {
    FlashGuardError::EvidenceTable(format!("duplicate {} record for {}", channel, location))
}

/// In-memory evidence snapshot
#[derive(Debug, Clone, Default)]
pub struct EvidenceStore {
    primary: BTreeMap<String, EnvironmentalRecord>,
    secondary: BTreeMap<String, AdversarialRecord>,
    social: BTreeMap<String, SocialSignal>,
}

impl EvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference dataset shipped with the crate
    pub fn reference() -> Result<Self> {
        Self::from_toml_str(REFERENCE_TABLE)
    }

    pub fn from_table(table: EvidenceTable) -> Result<Self> {
        table.validate()?;
        let store = Self {
            primary: table
                .primary
                .into_iter()
                .map(|r| (r.location.clone(), r))
                .collect(),
            secondary: table
                .secondary
                .into_iter()
                .map(|r| (r.location.clone(), r))
                .collect(),
            social: table
                .social
                .into_iter()
                .map(|r| (r.location.clone(), r))
                .collect(),
        };
        debug!(
            primary = store.primary.len(),
            secondary = store.secondary.len(),
            social = store.social.len(),
            "evidence store built"
        );
        Ok(store)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let table: EvidenceTable = toml::from_str(contents)?;
        Self::from_table(table)
    }

    /// Load a TOML evidence table from disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            FlashGuardError::EvidenceTable(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            FlashGuardError::Toml(err) => FlashGuardError::EvidenceTable(format!(
                "failed to parse {}: {}",
                path.display(),
                err
            )),
            other => other,
        })
    }

    pub fn with_primary(mut self, record: EnvironmentalRecord) -> Self {
        self.primary.insert(record.location.clone(), record);
        self
    }

    pub fn with_secondary(mut self, record: AdversarialRecord) -> Self {
        self.secondary.insert(record.location.clone(), record);
        self
    }

    pub fn with_social(mut self, signal: SocialSignal) -> Self {
        self.social.insert(signal.location.clone(), signal);
        self
    }

    /// Export back to table form
    pub fn to_table(&self) -> EvidenceTable {
        EvidenceTable {
            primary: self.primary.values().cloned().collect(),
            secondary: self.secondary.values().cloned().collect(),
            social: self.social.values().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty() && self.social.is_empty()
    }
}

impl EvidenceProvider for EvidenceStore {
    fn primary(&self, location: &str) -> Option<&EnvironmentalRecord> {
        self.primary.get(location)
    }

    fn secondary(&self, location: &str) -> Option<&AdversarialRecord> {
        self.secondary.get(location)
    }

    fn social(&self, location: &str) -> Option<&SocialSignal> {
        self.social.get(location)
    }

    fn locations(&self) -> Vec<String> {
        let all: BTreeSet<&String> = self
            .primary
            .keys()
            .chain(self.secondary.keys())
            .chain(self.social.keys())
            .collect();
        all.into_iter().cloned().collect()
    }
}
