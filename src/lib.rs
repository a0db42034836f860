//! # conflux
//!
//! Multi-recognizer named-entity fusion and evaluation.
//!
//! Several independent NER tools annotate the same document; conflux
//! turns their conflicting outputs into one coherent annotation set,
//! and scores any candidate set against a gold reference:
//!
//! - **Span algebra**: a total, mutually exclusive relation over text
//!   spans ([`Span::relation_to`])
//! - **Outcome classification**: four-pass matching of candidates
//!   against a reference, yielding a precision/recall taxonomy
//!   ([`eval::classify_document`])
//! - **Scoreboards**: associative aggregation of outcomes into counts
//!   and metrics ([`eval::Scoreboard`])
//! - **Vote weights**: per-recognizer (optionally per-type) reliability
//!   scores fitted from a labeled corpus ([`combine::Trainer`],
//!   [`combine::VoteWeights`])
//! - **Fusion**: weighted-vote resolution of overlapping candidates
//!   into a non-overlapping consolidated list
//!   ([`combine::VoteCombiner`])
//!
//! # Data flow
//!
//! ```text
//! recognizers (external) ──► per-recognizer Vec<Mention>
//!                                  │
//!                                  ▼
//!                            VoteCombiner ──► consolidated Vec<Mention>
//!                                  ▲                │
//!                        VoteWeights (frozen)       ▼
//!                                  ▲          classify_document ◄── reference
//!                                  │                │
//!                               Trainer ◄────── Scoreboard
//! ```
//!
//! # Quick start
//!
//! ```
//! use std::collections::BTreeMap;
//! use conflux::combine::{Trainer, VoteCombiner, WeightMode};
//! use conflux::eval::LabeledDocument;
//! use conflux::{EntityType, Mention, RecognizerId};
//!
//! // a one-document training corpus
//! let gold = RecognizerId::Other("gold".into());
//! let corpus = vec![LabeledDocument {
//!     reference: vec![
//!         Mention::try_new("John Smith", EntityType::Person, 0, 10, gold).unwrap(),
//!     ],
//!     outputs: BTreeMap::from([(
//!         RecognizerId::Stanford,
//!         vec![Mention::try_new("John Smith", EntityType::Person, 0, 10,
//!             RecognizerId::Stanford).unwrap()],
//!     )]),
//! }];
//!
//! // fit weights, then fuse new documents with them
//! let weights = Trainer::new(WeightMode::Global).fit(&corpus);
//! let combiner = VoteCombiner::new(weights);
//! let fused = combiner.combine(&corpus[0].outputs);
//! assert_eq!(fused.len(), 1);
//! ```
//!
//! # Design notes
//!
//! - The core is pure and single-threaded per document; parallelism
//!   lives at the corpus level (`parallel` feature, across documents).
//! - Recognizer adapters are out of scope: the [`Recognizer`] trait is
//!   the seam they plug into, and the core otherwise consumes plain
//!   mention lists keyed by [`RecognizerId`].
//! - No global state, no logger singleton: diagnostics go through
//!   `tracing`, subscriber installation is the caller's business.

#![warn(missing_docs)]

pub mod combine;
pub mod error;
pub mod eval;
pub mod mention;
pub mod span;

pub use error::{Error, Result};
pub use mention::{sanitize, EntityType, Mention, RawMention, RecognizerId};
pub use span::{Span, SpanRelation};

use std::collections::BTreeMap;

/// Trait for named-entity recognizers.
///
/// The core never needs to know how a recognizer works (in-process
/// model, external binary, or HTTP service), only that it yields a
/// mention list for a document and declares which entity types it is
/// responsible for. Adapters for actual tools live outside this crate.
pub trait Recognizer: Send + Sync {
    /// Extract mentions from a document.
    ///
    /// # Errors
    ///
    /// Adapter-specific failures; per-mention validation faults should
    /// be recovered by the adapter (see [`sanitize`]), not surfaced
    /// here.
    fn recognize(&self, text: &str) -> Result<Vec<Mention>>;

    /// Identity of this tool.
    fn id(&self) -> RecognizerId;

    /// Entity types this tool is responsible for.
    ///
    /// Misses outside this set are not charged against the tool during
    /// evaluation.
    fn handled_types(&self) -> Vec<EntityType> {
        self.id().default_handled_types()
    }
}

/// Run a set of recognizers over one document.
///
/// Collects each tool's output under its id, the input shape the
/// [`combine::VoteCombiner`] consumes. Fails on the first adapter
/// error; per-mention faults are the adapters' business.
///
/// # Errors
///
/// The first error returned by any recognizer.
pub fn run_recognizers(
    recognizers: &[&dyn Recognizer],
    text: &str,
) -> Result<BTreeMap<RecognizerId, Vec<Mention>>> {
    let mut outputs = BTreeMap::new();
    for recognizer in recognizers {
        let mut mentions = recognizer.recognize(text)?;
        mentions.sort();
        outputs.insert(recognizer.id(), mentions);
    }
    Ok(outputs)
}

/// A scripted recognizer for tests and examples.
///
/// Returns a fixed mention list regardless of input text.
///
/// ```
/// use conflux::{EntityType, Mention, MockRecognizer, Recognizer, RecognizerId};
///
/// let mock = MockRecognizer::new(RecognizerId::Stanford).with_mentions(vec![
///     Mention::try_new("John", EntityType::Person, 0, 4, RecognizerId::Stanford).unwrap(),
/// ]);
/// assert_eq!(mock.recognize("John went home").unwrap().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockRecognizer {
    id: RecognizerId,
    mentions: Vec<Mention>,
    handled: Option<Vec<EntityType>>,
}

impl MockRecognizer {
    /// Create a mock with no scripted output.
    #[must_use]
    pub fn new(id: RecognizerId) -> Self {
        Self {
            id,
            mentions: Vec::new(),
            handled: None,
        }
    }

    /// Script the mentions to return.
    #[must_use]
    pub fn with_mentions(mut self, mentions: Vec<Mention>) -> Self {
        self.mentions = mentions;
        self
    }

    /// Override the declared handled-type set.
    #[must_use]
    pub fn with_handled_types(mut self, types: Vec<EntityType>) -> Self {
        self.handled = Some(types);
        self
    }
}

impl Recognizer for MockRecognizer {
    fn recognize(&self, _text: &str) -> Result<Vec<Mention>> {
        Ok(self.mentions.clone())
    }

    fn id(&self) -> RecognizerId {
        self.id.clone()
    }

    fn handled_types(&self) -> Vec<EntityType> {
        self.handled
            .clone()
            .unwrap_or_else(|| self.id.default_handled_types())
    }
}

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```
    //! use conflux::prelude::*;
    //!
    //! let span = Span::new(0, 4).unwrap();
    //! assert_eq!(span.relation_to(span), SpanRelation::Equal);
    //! ```
    pub use crate::combine::{
        CombinerConfig, Trainer, VoteCombiner, VoteWeights, WeightMode,
    };
    pub use crate::error::{Error, Result};
    pub use crate::eval::{
        classify_document, LabeledDocument, MetricName, Outcome, OutcomeClass, Scoreboard,
    };
    pub use crate::mention::{sanitize, EntityType, Mention, RawMention, RecognizerId};
    pub use crate::span::{Span, SpanRelation};
    pub use crate::{MockRecognizer, Recognizer};
}
