//! Free text to location id.
//!
//! The core only ever sees exact location ids; anything conversational is
//! resolved here first.

use flashguard_common::EvidenceProvider;

/// Maps free text to a known location id
pub trait LocationResolver {
    fn resolve(&self, text: &str) -> Option<String>;
}

/// Case-insensitive substring match against a fixed set of ids.
///
/// Longer ids are tried first so "San Lorenzo" wins over "Lorenzo"; ties are
/// broken alphabetically.
#[derive(Debug, Clone)]
pub struct KnownLocationResolver {
    ids: Vec<String>,
}

impl KnownLocationResolver {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id| !id.trim().is_empty())
            .collect();
        ids.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        ids.dedup();
        Self { ids }
    }

    /// Every location the provider knows about
    pub fn from_provider(evidence: &dyn EvidenceProvider) -> Self {
        Self::new(evidence.locations())
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

impl LocationResolver for KnownLocationResolver {
    fn resolve(&self, text: &str) -> Option<String> {
        let haystack = text.to_lowercase();
        self.ids
            .iter()
            .find(|id| haystack.contains(&id.to_lowercase()))
            .cloned()
    }
}
