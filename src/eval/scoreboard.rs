//! Outcome aggregation into counts and derived scores.
//!
//! A [`Scoreboard`] folds a stream of [`Outcome`]s into counts keyed by
//! `(OutcomeClass, type_correct)`, overall and per entity type. The
//! fold is associative and commutative: one board per document, merged
//! across a corpus, gives the same result as one pass over everything,
//! which is what makes per-document parallel evaluation safe.
//!
//! Derived metrics:
//!
//! | Metric | Definition |
//! |--------|------------|
//! | `Precision` | exact-span, correct-type hits / all candidates |
//! | `Recall` | exact-span, correct-type hits / all references |
//! | `FMeasure` | harmonic mean of the two |
//! | `LenientPrecision` | any correct-type positive / all candidates |
//! | `LenientRecall` | any correct-type positive / all references |
//!
//! Every ratio with an empty denominator is 0.0, never NaN.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::eval::outcome::{Outcome, OutcomeClass};
use crate::mention::EntityType;

/// Name of a derived score, used as part of the vote-weight key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum MetricName {
    /// Exact-span, correct-type precision.
    Precision,
    /// Exact-span, correct-type recall.
    Recall,
    /// Harmonic mean of precision and recall.
    FMeasure,
    /// Precision granting credit to excess/partial/irregular hits with
    /// the correct type.
    LenientPrecision,
    /// Recall granting the same partial credit.
    LenientRecall,
}

impl MetricName {
    /// All metrics a trainer fits.
    pub const ALL: [MetricName; 5] = [
        MetricName::Precision,
        MetricName::Recall,
        MetricName::FMeasure,
        MetricName::LenientPrecision,
        MetricName::LenientRecall,
    ];

    /// Human-readable label.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            MetricName::Precision => "precision",
            MetricName::Recall => "recall",
            MetricName::FMeasure => "f-measure",
            MetricName::LenientPrecision => "lenient-precision",
            MetricName::LenientRecall => "lenient-recall",
        }
    }
}

impl std::fmt::Display for MetricName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// Counts per `(OutcomeClass, type_correct)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Counts {
    cells: BTreeMap<(OutcomeClass, bool), u64>,
}

impl Counts {
    fn record(&mut self, class: OutcomeClass, type_correct: bool) {
        *self.cells.entry((class, type_correct)).or_insert(0) += 1;
    }

    fn merge(&mut self, other: &Counts) {
        for (&key, &n) in &other.cells {
            *self.cells.entry(key).or_insert(0) += n;
        }
    }

    fn get(&self, class: OutcomeClass, type_correct: bool) -> u64 {
        self.cells.get(&(class, type_correct)).copied().unwrap_or(0)
    }

    fn class_total(&self, class: OutcomeClass) -> u64 {
        self.get(class, true) + self.get(class, false)
    }

    /// Exact span and correct type.
    fn strict_hits(&self) -> u64 {
        self.get(OutcomeClass::TruePositive, true)
    }

    /// Any positive class with the correct type.
    fn lenient_hits(&self) -> u64 {
        self.get(OutcomeClass::TruePositive, true)
            + self.get(OutcomeClass::ExcessPositive, true)
            + self.get(OutcomeClass::PartialPositive, true)
            + self.get(OutcomeClass::Irregular, true)
    }

    /// Outcomes that consumed a candidate mention.
    fn candidates(&self) -> u64 {
        OutcomeClass::ALL
            .iter()
            .filter(|c| c.consumes_candidate())
            .map(|&c| self.class_total(c))
            .sum()
    }

    /// Outcomes that account for a reference mention. An irregular
    /// match counts once here even though it may have spoken for
    /// several references.
    fn references(&self) -> u64 {
        self.class_total(OutcomeClass::TruePositive)
            + self.class_total(OutcomeClass::ExcessPositive)
            + self.class_total(OutcomeClass::PartialPositive)
            + self.class_total(OutcomeClass::Irregular)
            + self.class_total(OutcomeClass::FalseNegative)
    }

    fn metric(&self, name: MetricName) -> f64 {
        match name {
            MetricName::Precision => ratio(self.strict_hits(), self.candidates()),
            MetricName::Recall => ratio(self.strict_hits(), self.references()),
            MetricName::FMeasure => {
                let p = self.metric(MetricName::Precision);
                let r = self.metric(MetricName::Recall);
                if p + r == 0.0 {
                    0.0
                } else {
                    2.0 * p * r / (p + r)
                }
            }
            MetricName::LenientPrecision => ratio(self.lenient_hits(), self.candidates()),
            MetricName::LenientRecall => ratio(self.lenient_hits(), self.references()),
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Aggregated outcome counts for one recognizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoreboard {
    overall: Counts,
    by_type: BTreeMap<EntityType, Counts>,
}

impl Scoreboard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome into the counts.
    pub fn record(&mut self, outcome: &Outcome) {
        self.overall.record(outcome.class, outcome.type_correct);
        self.by_type
            .entry(outcome.entity_type)
            .or_default()
            .record(outcome.class, outcome.type_correct);
    }

    /// Fold a batch of outcomes.
    pub fn record_all<'a>(&mut self, outcomes: impl IntoIterator<Item = &'a Outcome>) {
        for outcome in outcomes {
            self.record(outcome);
        }
    }

    /// Merge another board into this one. Associative and commutative.
    pub fn merge(&mut self, other: &Scoreboard) {
        self.overall.merge(&other.overall);
        for (ty, counts) in &other.by_type {
            self.by_type.entry(*ty).or_default().merge(counts);
        }
    }

    /// Count for one `(class, type_correct)` cell, over all types.
    #[must_use]
    pub fn count(&self, class: OutcomeClass, type_correct: bool) -> u64 {
        self.overall.get(class, type_correct)
    }

    /// Count for one cell, restricted to one entity type.
    #[must_use]
    pub fn count_for(&self, ty: EntityType, class: OutcomeClass, type_correct: bool) -> u64 {
        self.by_type
            .get(&ty)
            .map_or(0, |counts| counts.get(class, type_correct))
    }

    /// Total candidate mentions accounted for.
    #[must_use]
    pub fn candidates(&self) -> u64 {
        self.overall.candidates()
    }

    /// Total reference-accounting outcomes.
    #[must_use]
    pub fn references(&self) -> u64 {
        self.overall.references()
    }

    /// Derived score over all entity types.
    #[must_use]
    pub fn metric(&self, name: MetricName) -> f64 {
        self.overall.metric(name)
    }

    /// Derived score restricted to one entity type.
    ///
    /// A type the recognizer never touched scores 0.0 (defined, never
    /// NaN), so a fitted weight table stays total.
    #[must_use]
    pub fn metric_for(&self, ty: EntityType, name: MetricName) -> f64 {
        self.by_type.get(&ty).map_or(0.0, |counts| counts.metric(name))
    }

    /// Whether any outcome has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overall.cells.is_empty()
    }
}
