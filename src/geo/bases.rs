use std::collections::HashMap;

use serde::Deserialize;
use tracing::warn;

/// Administrator-configured fixed location (e.g. a company office or yard).
/// Coordinates are optional in configuration; a partial entry is kept so the
/// name is still recognized, but it never resolves to a usable pair.
#[derive(Debug, Clone, Deserialize)]
pub struct BaseEntry {
    pub name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Lookup table from canonicalized base names to known coordinates.
///
/// Built once at startup from configuration. Lookups canonicalize the query
/// label the same way keys were canonicalized, otherwise matches silently
/// fail.
pub struct BaseRegistry {
    entries: HashMap<String, (Option<f64>, Option<f64>)>,
}

/// Trim, collapse internal whitespace to single spaces, case-fold.
pub fn canonicalize(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl BaseRegistry {
    pub fn from_entries(configured: Vec<BaseEntry>) -> Self {
        let mut entries = HashMap::new();
        for entry in configured {
            let key = canonicalize(&entry.name);
            if key.is_empty() {
                warn!("Skipping base entry with empty name");
                continue;
            }
            if entry.lat.is_none() || entry.lng.is_none() {
                warn!("Base '{}' has an incomplete coordinate pair", entry.name);
            }
            entries.insert(key, (entry.lat, entry.lng));
        }
        Self { entries }
    }

    /// Resolve a free-text label against the registry. Returns a pair only
    /// when the matched entry has both coordinates configured; a half-filled
    /// entry must never propagate into a request record.
    pub fn resolve(&self, label: &str) -> Option<(f64, f64)> {
        let key = canonicalize(label);
        if key.is_empty() {
            return None;
        }
        match self.entries.get(&key) {
            Some((Some(lat), Some(lng))) => Some((*lat, *lng)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
