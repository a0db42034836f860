//! Vote weight table: per-recognizer reliability scores used to
//! arbitrate overlapping candidates.
//!
//! The table maps `(recognizer, metric, optional category)` to a float.
//! It is fitted once by the [`Trainer`](crate::combine::Trainer),
//! persisted, and read-only afterwards; the combiner never mutates it
//! (fit-then-freeze). The logical key/value schema is the compatibility
//! contract; the on-disk encoding is JSON.
//!
//! Lookups never fail: a `(recognizer, category)` pair absent from the
//! table reads as weight 0, so an unknown tool simply never wins a
//! vote.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::eval::MetricName;
use crate::mention::{EntityType, RecognizerId};

/// Granularity of the fitted weights.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub enum WeightMode {
    /// One weight per recognizer and metric.
    #[default]
    Global,
    /// One weight per recognizer, metric, and entity type, with a
    /// global fallback.
    PerCategory,
}

type WeightKey = (RecognizerId, MetricName, Option<EntityType>);

/// Persisted mapping `(recognizer, metric, category) -> weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredWeights", into = "StoredWeights")]
pub struct VoteWeights {
    mode: WeightMode,
    entries: BTreeMap<WeightKey, f64>,
}

/// Flat on-disk shape: JSON objects cannot key on tuples.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredWeights {
    mode: WeightMode,
    entries: Vec<WeightEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeightEntry {
    recognizer: RecognizerId,
    metric: MetricName,
    category: Option<EntityType>,
    weight: f64,
}

impl From<VoteWeights> for StoredWeights {
    fn from(weights: VoteWeights) -> Self {
        StoredWeights {
            mode: weights.mode,
            entries: weights
                .entries
                .into_iter()
                .map(|((recognizer, metric, category), weight)| WeightEntry {
                    recognizer,
                    metric,
                    category,
                    weight,
                })
                .collect(),
        }
    }
}

impl From<StoredWeights> for VoteWeights {
    fn from(stored: StoredWeights) -> Self {
        let mut weights = VoteWeights::new(stored.mode);
        for entry in stored.entries {
            weights.set(entry.recognizer, entry.metric, entry.category, entry.weight);
        }
        weights
    }
}

impl VoteWeights {
    /// Create an empty table.
    #[must_use]
    pub fn new(mode: WeightMode) -> Self {
        Self {
            mode,
            entries: BTreeMap::new(),
        }
    }

    /// Table giving every listed recognizer weight 1 for every metric.
    ///
    /// Makes the combiner a plain majority vote when no training corpus
    /// exists.
    #[must_use]
    pub fn uniform(recognizers: &[RecognizerId]) -> Self {
        let mut weights = Self::new(WeightMode::Global);
        for recognizer in recognizers {
            for metric in MetricName::ALL {
                weights.set(recognizer.clone(), metric, None, 1.0);
            }
        }
        weights
    }

    /// Granularity this table was fitted at.
    #[must_use]
    pub fn mode(&self) -> WeightMode {
        self.mode
    }

    /// Insert or replace one weight. Negative values are clamped to 0.
    pub fn set(
        &mut self,
        recognizer: RecognizerId,
        metric: MetricName,
        category: Option<EntityType>,
        weight: f64,
    ) {
        self.entries
            .insert((recognizer, metric, category), weight.max(0.0));
    }

    /// Look up a voting weight.
    ///
    /// Tries the per-category entry first, then the recognizer's global
    /// entry, then defaults to 0.0. Never fails: a recognizer the table
    /// knows nothing about simply carries no voting power.
    #[must_use]
    pub fn get(
        &self,
        recognizer: &RecognizerId,
        metric: MetricName,
        category: Option<EntityType>,
    ) -> f64 {
        if let Some(ty) = category {
            let key = (recognizer.clone(), metric, Some(ty));
            if let Some(&weight) = self.entries.get(&key) {
                return weight;
            }
        }
        let key = (recognizer.clone(), metric, None);
        self.entries.get(&key).copied().unwrap_or(0.0)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the table to a file.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] when the file cannot be written or encoded.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let encoded = serde_json::to_string_pretty(self)
            .map_err(|e| Error::store(format!("encoding weight table: {e}")))?;
        fs::write(path, encoded)
            .map_err(|e| Error::store(format!("writing {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), entries = self.len(), "saved vote weights");
        Ok(())
    }

    /// Read a table back from a file.
    ///
    /// A missing or corrupt store is fatal: the combiner cannot vote
    /// against a table it cannot trust.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] when the file is absent, unreadable, or does
    /// not decode to the weight schema.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::store(format!("reading {}: {e}", path.display())))?;
        let weights: VoteWeights = serde_json::from_str(&content)
            .map_err(|e| Error::store(format!("decoding {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), entries = weights.len(), "loaded vote weights");
        Ok(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entry_defaults_to_zero() {
        let weights = VoteWeights::new(WeightMode::Global);
        assert_eq!(
            weights.get(&RecognizerId::Stanford, MetricName::Precision, None),
            0.0
        );
    }

    #[test]
    fn test_category_falls_back_to_global() {
        let mut weights = VoteWeights::new(WeightMode::PerCategory);
        weights.set(RecognizerId::Stanford, MetricName::Precision, None, 0.6);
        weights.set(
            RecognizerId::Stanford,
            MetricName::Precision,
            Some(EntityType::Person),
            0.9,
        );

        assert_eq!(
            weights.get(
                &RecognizerId::Stanford,
                MetricName::Precision,
                Some(EntityType::Person)
            ),
            0.9
        );
        // no location entry: global weight applies
        assert_eq!(
            weights.get(
                &RecognizerId::Stanford,
                MetricName::Precision,
                Some(EntityType::Location)
            ),
            0.6
        );
    }

    #[test]
    fn test_negative_weights_clamped() {
        let mut weights = VoteWeights::new(WeightMode::Global);
        weights.set(RecognizerId::Illinois, MetricName::Recall, None, -0.3);
        assert_eq!(
            weights.get(&RecognizerId::Illinois, MetricName::Recall, None),
            0.0
        );
    }

    #[test]
    fn test_uniform_table() {
        let weights =
            VoteWeights::uniform(&[RecognizerId::Stanford, RecognizerId::LingPipe]);
        assert_eq!(
            weights.get(&RecognizerId::LingPipe, MetricName::FMeasure, None),
            1.0
        );
        assert_eq!(
            weights.get(&RecognizerId::OpenCalais, MetricName::FMeasure, None),
            0.0
        );
    }

    #[test]
    fn test_json_schema_roundtrip() {
        let mut weights = VoteWeights::new(WeightMode::PerCategory);
        weights.set(
            RecognizerId::Other("custom-tool".into()),
            MetricName::LenientRecall,
            Some(EntityType::Meeting),
            0.42,
        );
        weights.set(RecognizerId::Spotlight, MetricName::Precision, None, 0.77);

        let encoded = serde_json::to_string(&weights).unwrap();
        let decoded: VoteWeights = serde_json::from_str(&encoded).unwrap();
        assert_eq!(weights, decoded);
    }
}
