//! Mention types and structures.
//!
//! A [`Mention`] is one detected occurrence of an entity at a specific
//! text span, produced by one recognizer. Mentions are value objects:
//! no identity beyond their fields, with ordering and equality defined
//! by `(start, end)` then source so that re-sorting a pooled list is
//! deterministic regardless of insertion order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::span::Span;

/// Entity type classification.
///
/// This is a closed set: labels outside it are rejected at ingestion
/// with [`Error::UnknownEntityType`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EntityType {
    /// Person name
    Person,
    /// Location/Place
    Location,
    /// Organization name
    Organization,
    /// Function or title held by a person
    Function,
    /// Human production (artwork, book, software, ...)
    Production,
    /// Meeting or event
    Meeting,
    /// Date or time expression
    Date,
    /// Other/Miscellaneous entity type
    Misc,
}

impl EntityType {
    /// All members of the closed set.
    pub const ALL: [EntityType; 8] = [
        EntityType::Person,
        EntityType::Location,
        EntityType::Organization,
        EntityType::Function,
        EntityType::Production,
        EntityType::Meeting,
        EntityType::Date,
        EntityType::Misc,
    ];

    /// Convert to the standard label string.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            EntityType::Person => "PERSON",
            EntityType::Location => "LOCATION",
            EntityType::Organization => "ORGANIZATION",
            EntityType::Function => "FUNCTION",
            EntityType::Production => "PRODUCTION",
            EntityType::Meeting => "MEETING",
            EntityType::Date => "DATE",
            EntityType::Misc => "MISC",
        }
    }

    /// Parse from a label string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEntityType`] for labels outside the
    /// closed set; unknown types are an ingestion fault, not a new
    /// category.
    pub fn parse_label(label: &str) -> Result<Self> {
        match label.to_uppercase().as_str() {
            "PERSON" | "PER" => Ok(EntityType::Person),
            "LOCATION" | "LOC" => Ok(EntityType::Location),
            "ORGANIZATION" | "ORG" => Ok(EntityType::Organization),
            "FUNCTION" => Ok(EntityType::Function),
            "PRODUCTION" => Ok(EntityType::Production),
            "MEETING" => Ok(EntityType::Meeting),
            "DATE" => Ok(EntityType::Date),
            "MISC" => Ok(EntityType::Misc),
            other => Err(Error::UnknownEntityType(other.to_string())),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// Identifier of the tool that produced a mention.
///
/// The core never needs to know how a recognizer works, only which one
/// a mention came from; adapters for the actual tools live outside the
/// crate.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RecognizerId {
    /// Stanford NER
    Stanford,
    /// Illinois NET
    Illinois,
    /// LingPipe
    LingPipe,
    /// OpenCalais
    OpenCalais,
    /// DBpedia Spotlight
    Spotlight,
    /// Date-specialist tool (dates only)
    DateFinder,
    /// Output of the fusion combiner itself
    Fusion,
    /// Any other tool, identified by name
    Other(String),
}

impl RecognizerId {
    /// Entity types this tool is responsible for by default.
    ///
    /// The date specialist only ever produces dates; every other tool
    /// defaults to the full set. Used by the trainer to restrict
    /// false-negative accounting when no explicit declaration is made.
    #[must_use]
    pub fn default_handled_types(&self) -> Vec<EntityType> {
        match self {
            RecognizerId::DateFinder => vec![EntityType::Date],
            _ => EntityType::ALL.to_vec(),
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn as_label(&self) -> &str {
        match self {
            RecognizerId::Stanford => "stanford",
            RecognizerId::Illinois => "illinois",
            RecognizerId::LingPipe => "lingpipe",
            RecognizerId::OpenCalais => "opencalais",
            RecognizerId::Spotlight => "spotlight",
            RecognizerId::DateFinder => "datefinder",
            RecognizerId::Fusion => "fusion",
            RecognizerId::Other(name) => name.as_str(),
        }
    }
}

impl std::fmt::Display for RecognizerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// A recognized entity mention.
///
/// # Ordering and equality
///
/// Mentions order by `(start, end)` then source. Equality follows the
/// same key: two mentions at the same position from the same tool are
/// the same annotation for sorting and deduplication purposes, even if
/// a buggy adapter emitted diverging text for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    /// Position in the document.
    pub span: Span,
    /// Entity type classification.
    pub entity_type: EntityType,
    /// Tool which detected this mention.
    pub source: RecognizerId,
    /// Surface form in the text.
    pub text: String,
    /// Confidence reported by the tool, when it reports one (0.0-1.0).
    pub confidence: Option<f64>,
}

impl Mention {
    /// Create a new mention over an already-validated span.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        entity_type: EntityType,
        span: Span,
        source: RecognizerId,
    ) -> Self {
        Self {
            span,
            entity_type,
            source,
            text: text.into(),
            confidence: None,
        }
    }

    /// Create a mention from raw offsets, validating the span.
    ///
    /// # Errors
    ///
    /// Returns the span validation error for degenerate or inverted
    /// offsets.
    pub fn try_new(
        text: impl Into<String>,
        entity_type: EntityType,
        start: usize,
        end: usize,
        source: RecognizerId,
    ) -> Result<Self> {
        let span = Span::new(start, end)?;
        Ok(Self::new(text, entity_type, span, source))
    }

    /// Attach a confidence score, clamped to [0, 1].
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// Start offset in the document.
    #[must_use]
    pub fn start(&self) -> usize {
        self.span.start()
    }

    /// End offset in the document (exclusive).
    #[must_use]
    pub fn end(&self) -> usize {
        self.span.end()
    }
}

impl PartialEq for Mention {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Mention {}

impl Ord for Mention {
    fn cmp(&self, other: &Self) -> Ordering {
        self.span
            .cmp(&other.span)
            .then_with(|| self.source.cmp(&other.source))
    }
}

impl PartialOrd for Mention {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Mention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} {:?} ({})",
            self.entity_type, self.span, self.text, self.source
        )
    }
}

/// Unvalidated mention as produced by a recognizer adapter.
///
/// Adapters deal in raw offsets and label strings; [`RawMention::validate`]
/// is the single place where span invariants and the closed type set
/// are enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMention {
    /// Claimed start offset.
    pub start: usize,
    /// Claimed end offset.
    pub end: usize,
    /// Entity type label as emitted by the tool.
    pub label: String,
    /// Surface form in the text.
    pub text: String,
    /// Tool which detected this mention.
    pub source: RecognizerId,
    /// Confidence reported by the tool, if any.
    pub confidence: Option<f64>,
}

impl RawMention {
    /// Validate into a [`Mention`].
    ///
    /// # Errors
    ///
    /// Span faults ([`Error::DegenerateSpan`], [`Error::InvalidSpan`])
    /// and unknown type labels ([`Error::UnknownEntityType`]).
    pub fn validate(self) -> Result<Mention> {
        let entity_type = EntityType::parse_label(&self.label)?;
        let mut mention =
            Mention::try_new(self.text, entity_type, self.start, self.end, self.source)?;
        if let Some(confidence) = self.confidence {
            mention = mention.with_confidence(confidence);
        }
        Ok(mention)
    }
}

/// Validate a batch of raw mentions, dropping the offending ones.
///
/// Per-mention faults are recovered locally: the bad mention is dropped
/// with a diagnostic and the rest of the batch goes through. The result
/// is sorted by position.
#[must_use]
pub fn sanitize(raw: Vec<RawMention>) -> Vec<Mention> {
    let mut mentions: Vec<Mention> = raw
        .into_iter()
        .filter_map(|r| match r.validate() {
            Ok(mention) => Some(mention),
            Err(err) => {
                tracing::warn!(%err, "dropping invalid mention");
                None
            }
        })
        .collect();
    mentions.sort();
    mentions
}
