//! Text spans and the overlap algebra used by evaluation and fusion.
//!
//! A [`Span`] is a half-open interval `[start, end)` of offsets into a
//! document. Validation happens at construction: `start > end` and
//! `start == end` are both rejected, so every `Span` in circulation is
//! non-empty and well ordered. That makes [`Span::relation_to`] total:
//! exactly one [`SpanRelation`] holds for any pair of spans, with no
//! runtime checks inside the classification itself.
//!
//! ```text
//! A: [====]                  A: [========]        A:    [====]
//! B:        [====]           B:   [====]          B: [====]
//!    Disjoint                   ContainsExclusive    PartialOverlap
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Half-open interval `[start, end)` of offsets in a document.
///
/// Invariant: `start < end`. Enforced by [`Span::new`]; deserialized
/// spans go through the same validation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "RawSpan", into = "RawSpan")]
pub struct Span {
    start: usize,
    end: usize,
}

/// Unvalidated span shape used for (de)serialization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawSpan {
    start: usize,
    end: usize,
}

impl From<Span> for RawSpan {
    fn from(span: Span) -> Self {
        RawSpan {
            start: span.start,
            end: span.end,
        }
    }
}

impl TryFrom<RawSpan> for Span {
    type Error = Error;

    fn try_from(raw: RawSpan) -> Result<Self> {
        Span::new(raw.start, raw.end)
    }
}

impl Span {
    /// Create a validated span.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpan`] if `start > end` and
    /// [`Error::DegenerateSpan`] if `start == end`.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidSpan { start, end });
        }
        if start == end {
            return Err(Error::DegenerateSpan(start));
        }
        Ok(Span { start, end })
    }

    /// Start offset (inclusive).
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset (exclusive).
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Length of the span.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always `false`: degenerate spans cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check if two spans share at least one offset.
    ///
    /// Adjacent spans (`self.end == other.start`) do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Classify this span against another.
    ///
    /// Exactly one relation holds for any pair. `a.relation_to(b)` and
    /// `b.relation_to(a)` are inverses of each other: the symmetric
    /// relations map to themselves, the containment relations swap.
    #[must_use]
    pub fn relation_to(&self, other: Span) -> SpanRelation {
        if self.start == other.start && self.end == other.end {
            SpanRelation::Equal
        } else if !self.overlaps(other) {
            SpanRelation::Disjoint
        } else if self.start <= other.start && other.end <= self.end {
            SpanRelation::ContainsExclusive
        } else if other.start <= self.start && self.end <= other.end {
            SpanRelation::ContainedExclusive
        } else {
            SpanRelation::PartialOverlap
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{})", self.start, self.end)
    }
}

/// Relation between two spans.
///
/// Total and mutually exclusive: for any two valid spans exactly one
/// variant holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanRelation {
    /// No shared offsets.
    Disjoint,
    /// Same start and end.
    Equal,
    /// The left span strictly contains the right one.
    ContainsExclusive,
    /// The left span is strictly contained in the right one.
    ContainedExclusive,
    /// Overlapping, but neither contains the other.
    PartialOverlap,
}

impl SpanRelation {
    /// The relation seen from the other span's side.
    #[must_use]
    pub fn inverse(self) -> SpanRelation {
        match self {
            SpanRelation::ContainsExclusive => SpanRelation::ContainedExclusive,
            SpanRelation::ContainedExclusive => SpanRelation::ContainsExclusive,
            other => other,
        }
    }

    /// Whether the spans share at least one offset.
    #[must_use]
    pub fn is_overlap(self) -> bool {
        !matches!(self, SpanRelation::Disjoint)
    }
}
