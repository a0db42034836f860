//! Fitting vote weights from a labeled corpus.
//!
//! The trainer runs the outcome classifier and scoreboard over every
//! document, once per recognizer, then reads the fitted weights off the
//! merged boards. No learning is involved; a weight is just a
//! historical score of the tool, used later to arbitrate votes.
//!
//! The output is immutable once persisted; re-fitting builds a fresh
//! table that replaces the prior one.

use std::collections::BTreeMap;

use crate::combine::weights::{VoteWeights, WeightMode};
use crate::eval::{evaluate_corpus, HandledTypes, LabeledDocument, MetricName, Scoreboard};
use crate::mention::{EntityType, RecognizerId};

/// Fits a [`VoteWeights`] table from a labeled corpus.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    mode: WeightMode,
    handled: HandledTypes,
}

impl Trainer {
    /// Create a trainer fitting at the given granularity.
    #[must_use]
    pub fn new(mode: WeightMode) -> Self {
        Self {
            mode,
            handled: HandledTypes::new(),
        }
    }

    /// Declare the entity types a recognizer is responsible for.
    ///
    /// Undeclared recognizers fall back to
    /// [`RecognizerId::default_handled_types`]. The declaration
    /// restricts false-negative accounting during evaluation.
    #[must_use]
    pub fn declare_handled(mut self, recognizer: RecognizerId, types: Vec<EntityType>) -> Self {
        self.handled.insert(recognizer, types);
        self
    }

    /// Score every recognizer over the corpus.
    ///
    /// Documents are processed in parallel when the `parallel` feature
    /// is enabled; the merged boards are identical either way.
    #[must_use]
    pub fn evaluate(&self, corpus: &[LabeledDocument]) -> BTreeMap<RecognizerId, Scoreboard> {
        evaluate_corpus(corpus, &self.handled)
    }

    /// Fit a weight table from the corpus.
    ///
    /// Every metric in [`MetricName::ALL`] is fitted. In per-category
    /// mode each entity type gets its own entry next to the global one;
    /// a category the recognizer never produced scores 0 (defined,
    /// never NaN), so combination stays well-defined.
    #[must_use]
    pub fn fit(&self, corpus: &[LabeledDocument]) -> VoteWeights {
        let boards = self.evaluate(corpus);
        let mut weights = VoteWeights::new(self.mode);

        for (recognizer, board) in &boards {
            for metric in MetricName::ALL {
                weights.set(recognizer.clone(), metric, None, board.metric(metric));
                if self.mode == WeightMode::PerCategory {
                    for ty in EntityType::ALL {
                        weights.set(
                            recognizer.clone(),
                            metric,
                            Some(ty),
                            board.metric_for(ty, metric),
                        );
                    }
                }
            }
        }

        tracing::debug!(
            documents = corpus.len(),
            recognizers = boards.len(),
            entries = weights.len(),
            "fitted vote weights"
        );
        weights
    }
}
