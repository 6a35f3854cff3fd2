//! Prior bounds supplied by the user.
//!
//! JSON shape: an object mapping a parameter name to `[low, high]`, or a
//! dataset name to `[scaling, error, wavelength]` where each element is
//! `[low, high]` or `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Bound, BoundEntry, Chemistry, DatasetBounds};
use crate::error::ConfigurationError;
use crate::schema::builder::ParameterSchema;

/// Bounds that only gate the free-chemistry elemental ratios.
pub const RATIO_BOUNDS: [&str; 2] = ["c_h_ratio", "o_h_ratio"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bounds(BTreeMap<String, BoundEntry>);

impl Bounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_range(&mut self, name: impl Into<String>, bound: Bound) {
        self.0.insert(name.into(), BoundEntry::Range(bound));
    }

    pub fn insert_dataset(&mut self, name: impl Into<String>, bounds: DatasetBounds) {
        self.0.insert(name.into(), BoundEntry::Dataset(bounds));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Scalar range for a parameter (dataset entries are not ranges).
    pub fn range(&self, name: &str) -> Option<Bound> {
        match self.0.get(name) {
            Some(BoundEntry::Range(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn dataset(&self, name: &str) -> Option<DatasetBounds> {
        match self.0.get(name) {
            Some(BoundEntry::Dataset(d)) => Some(*d),
            _ => None,
        }
    }

    /// Every range must be finite with `low < high`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, entry) in &self.0 {
            let ranges: Vec<(String, Bound)> = match entry {
                BoundEntry::Range(b) => vec![(name.clone(), *b)],
                BoundEntry::Dataset(d) => [
                    ("scaling", d.scaling()),
                    ("error", d.error()),
                    ("wavelength", d.wavelength()),
                ]
                .into_iter()
                .filter_map(|(kind, b)| b.map(|b| (format!("{kind}_{name}"), b)))
                .collect(),
            };
            for (label, b) in ranges {
                if !b.is_valid() {
                    return Err(ConfigurationError::InvalidBound {
                        name: label,
                        low: b.low(),
                        high: b.high(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Keep only the entries that apply to this run.
    ///
    /// Retained: ranges for schema parameters drawn from a range, nuisance
    /// triples for known datasets, and the C/H and O/H ratio gates under free
    /// chemistry. Everything else is dropped with a warning, including ranges
    /// for chained P-T parameters.
    pub fn restrict_to(
        &self,
        schema: &ParameterSchema,
        chemistry: Chemistry,
        datasets: &[&str],
    ) -> Bounds {
        let mut kept = BTreeMap::new();
        for (name, entry) in &self.0 {
            let applies = match entry {
                BoundEntry::Range(_) => {
                    (schema.contains(name) && !schema.is_derived(name))
                        || (chemistry == Chemistry::Free && RATIO_BOUNDS.contains(&name.as_str()))
                }
                BoundEntry::Dataset(_) => datasets.contains(&name.as_str()),
            };
            if applies {
                kept.insert(name.clone(), *entry);
            } else {
                warn!(bound = %name, "bound does not apply to this configuration and is ignored");
            }
        }
        Bounds(kept)
    }
}
