//! Evaluation: outcome classification and score aggregation.
//!
//! Scoring a recognizer against a gold reference happens in two steps:
//!
//! 1. [`classify_document`] partitions one document's candidate
//!    mentions against the reference set, producing one [`Outcome`] per
//!    consumed candidate and per missed reference (see
//!    [`outcome`](crate::eval::outcome) for the four-pass algorithm);
//! 2. a [`Scoreboard`] folds outcomes into counts and derived
//!    precision/recall-family metrics.
//!
//! The per-document step is pure, so corpus evaluation fans out across
//! documents and merges boards with the associative fold;
//! [`evaluate_corpus`] does exactly that, in parallel when the
//! `parallel` feature is enabled.
//!
//! ```
//! use std::collections::BTreeMap;
//! use conflux::eval::{classify_document, Scoreboard, MetricName};
//! use conflux::{EntityType, Mention, RecognizerId};
//!
//! let reference = vec![
//!     Mention::try_new("John Smith", EntityType::Person, 0, 10,
//!         RecognizerId::Other("gold".into())).unwrap(),
//! ];
//! let candidates = vec![
//!     Mention::try_new("John Smith", EntityType::Person, 0, 10,
//!         RecognizerId::Stanford).unwrap(),
//! ];
//!
//! let doc = classify_document(&reference, &candidates, &EntityType::ALL);
//! let mut board = Scoreboard::new();
//! board.record_all(&doc.outcomes);
//! assert_eq!(board.metric(MetricName::Precision), 1.0);
//! ```

pub mod outcome;
pub mod scoreboard;

pub use outcome::{classify_document, DocumentOutcomes, Outcome, OutcomeClass};
pub use scoreboard::{MetricName, Scoreboard};

use std::collections::BTreeMap;

use crate::mention::{EntityType, Mention, RecognizerId};

/// One document of a labeled corpus: the gold reference plus each
/// recognizer's output for the same text.
#[derive(Debug, Clone, Default)]
pub struct LabeledDocument {
    /// Gold-standard mention set.
    pub reference: Vec<Mention>,
    /// Output of each recognizer on the document.
    pub outputs: BTreeMap<RecognizerId, Vec<Mention>>,
}

/// Declared handled-type sets, per recognizer.
///
/// Recognizers absent from the map fall back to
/// [`RecognizerId::default_handled_types`].
pub type HandledTypes = BTreeMap<RecognizerId, Vec<EntityType>>;

/// Evaluate every recognizer over a labeled corpus.
///
/// Returns one merged [`Scoreboard`] per recognizer. Documents are
/// independent, so with the `parallel` feature they are scored
/// concurrently and the per-document boards merged afterwards; the
/// result is identical either way.
#[must_use]
pub fn evaluate_corpus(
    corpus: &[LabeledDocument],
    handled: &HandledTypes,
) -> BTreeMap<RecognizerId, Scoreboard> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        corpus
            .par_iter()
            .map(|doc| evaluate_document(doc, handled))
            .reduce(BTreeMap::new, merge_board_maps)
    }

    #[cfg(not(feature = "parallel"))]
    {
        corpus
            .iter()
            .map(|doc| evaluate_document(doc, handled))
            .fold(BTreeMap::new(), merge_board_maps)
    }
}

/// Score one document for every recognizer that ran on it.
#[must_use]
pub fn evaluate_document(
    doc: &LabeledDocument,
    handled: &HandledTypes,
) -> BTreeMap<RecognizerId, Scoreboard> {
    let mut boards = BTreeMap::new();
    for (recognizer, candidates) in &doc.outputs {
        let handled_types = handled
            .get(recognizer)
            .cloned()
            .unwrap_or_else(|| recognizer.default_handled_types());
        let outcomes = classify_document(&doc.reference, candidates, &handled_types);
        let board: &mut Scoreboard = boards.entry(recognizer.clone()).or_default();
        board.record_all(&outcomes.outcomes);
    }
    boards
}

fn merge_board_maps(
    mut acc: BTreeMap<RecognizerId, Scoreboard>,
    other: BTreeMap<RecognizerId, Scoreboard>,
) -> BTreeMap<RecognizerId, Scoreboard> {
    for (recognizer, board) in other {
        acc.entry(recognizer).or_default().merge(&board);
    }
    acc
}
