//! Team-name normalization boundary.
//!
//! Slate ingestion, result feeds, and user submissions all spell team names
//! their own way ("Ohio State", "OHIO ST", "tOSU"). The engine normalizes
//! every name through this boundary before comparing anything. Alias-table
//! maintenance lives outside the engine; unknown names pass through
//! unchanged rather than erroring.

use std::collections::HashMap;
use tracing::debug;

/// Maps raw team names to canonical names
pub trait TeamNormalizer: Send + Sync {
    /// Canonical form of a single name. Unknown names pass through unchanged.
    fn normalize(&self, name: &str) -> String;

    /// Canonical forms for a batch of names, keyed by the raw input
    fn normalize_batch(&self, names: &[String]) -> HashMap<String, String> {
        names
            .iter()
            .map(|name| (name.clone(), self.normalize(name)))
            .collect()
    }
}

/// Alias-table normalizer. Lookup is case-insensitive on the trimmed raw
/// name; misses pass through (trimmed) and are logged at debug level.
pub struct AliasNormalizer {
    aliases: HashMap<String, String>,
}

impl AliasNormalizer {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(raw, canonical)| (raw.trim().to_lowercase(), canonical))
            .collect();
        Self { aliases }
    }

    /// A normalizer with no aliases; every name passes through
    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }
}

impl TeamNormalizer for AliasNormalizer {
    fn normalize(&self, name: &str) -> String {
        let trimmed = name.trim();
        match self.aliases.get(&trimmed.to_lowercase()) {
            Some(canonical) => canonical.clone(),
            None => {
                debug!(team = trimmed, "no alias for team name, passing through");
                trimmed.to_string()
            }
        }
    }
}
