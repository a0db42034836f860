//! Outcome classification: matching a candidate mention list against a
//! reference (gold) mention list.
//!
//! # The matching problem
//!
//! A candidate mention can relate to a reference mention in several
//! ways at once: exact span match, strict containment, partial
//! overlap. Which label wins is decided by running four strict passes,
//! each pass removing matched candidates from consideration by later
//! passes:
//!
//! ```text
//! Pass 1 (exact):    Ref:  [==John Smith==]     -> TruePositive
//!                    Cand: [==John Smith==]
//!
//! Pass 2 (excess):   Ref:      [==John==]       -> ExcessPositive
//!                    Cand: [==Mr John Smith==]     (candidate contains ref)
//!
//! Pass 3 (partial):  Ref:  [==New York==]       -> PartialPositive
//!                    Cand:      [==York City==]
//!
//!                    Ref:  [=A=]     [=B=]      -> Irregular
//!                    Cand:    [=========]          (straddles two refs)
//!
//! Pass 4 (residual): unmatched candidate        -> FalsePositive
//!                    unmatched reference        -> FalseNegative
//! ```
//!
//! The pass order is load-bearing: it determines which label a
//! candidate receives when several relations hold simultaneously.
//!
//! Matching works on explicit index sets (consumed candidates,
//! spoken-for references) rather than by mutating shared lists, so each
//! pass is auditable on its own.

use serde::{Deserialize, Serialize};

use crate::mention::{EntityType, Mention};
use crate::span::SpanRelation;

/// Classification of one candidate/reference pairing, or of an
/// unmatched mention.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum OutcomeClass {
    /// Candidate and reference have exactly the same span.
    TruePositive,
    /// Candidate span strictly contains the reference span.
    ExcessPositive,
    /// Candidate covers only part of the reference: contained in it, or
    /// overlapping it without containment either way.
    PartialPositive,
    /// Candidate overlaps its reference and at least one other
    /// reference mention.
    Irregular,
    /// Candidate does not intersect any reference mention.
    FalsePositive,
    /// Reference mention never spoken for by any candidate.
    FalseNegative,
}

impl OutcomeClass {
    /// All outcome classes, in pass order.
    pub const ALL: [OutcomeClass; 6] = [
        OutcomeClass::TruePositive,
        OutcomeClass::ExcessPositive,
        OutcomeClass::PartialPositive,
        OutcomeClass::Irregular,
        OutcomeClass::FalsePositive,
        OutcomeClass::FalseNegative,
    ];

    /// Whether this class accounts for a candidate mention.
    ///
    /// Every class except `FalseNegative` consumes exactly one
    /// candidate; `FalseNegative` accounts for a reference instead.
    #[must_use]
    pub fn consumes_candidate(&self) -> bool {
        !matches!(self, OutcomeClass::FalseNegative)
    }
}

/// One scored comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Spatial classification of the pairing.
    pub class: OutcomeClass,
    /// Whether the candidate's type matched the reference's.
    ///
    /// Always `false` for `FalsePositive` and `FalseNegative`, where no
    /// pairing exists.
    pub type_correct: bool,
    /// Type this outcome is counted under: the reference type for
    /// matches and misses, the candidate type for false positives.
    pub entity_type: EntityType,
}

/// All outcomes for one document, plus the totals needed to check the
/// scoring partition invariant.
#[derive(Debug, Clone, Default)]
pub struct DocumentOutcomes {
    /// One outcome per consumed candidate and per unmatched reference.
    pub outcomes: Vec<Outcome>,
    /// Number of candidate mentions evaluated.
    pub candidates_total: usize,
    /// Number of reference mentions evaluated.
    pub references_total: usize,
    /// Number of reference mentions spoken for by some match.
    pub references_matched: usize,
}

/// Match a candidate mention list against a reference list.
///
/// `handled_types` restricts false-negative accounting: a recognizer is
/// only charged a miss for reference mentions whose type it declares
/// responsibility for. Pass [`EntityType::ALL`] to charge everything.
///
/// Candidates from multiple recognizers must not be mixed in one call;
/// the classifier scores one recognizer's output at a time.
#[must_use]
pub fn classify_document(
    reference: &[Mention],
    candidates: &[Mention],
    handled_types: &[EntityType],
) -> DocumentOutcomes {
    // positional processing order, insertion order is irrelevant
    let refs = sorted_indices(reference);
    let cands = sorted_indices(candidates);

    let mut spoken_for = vec![false; reference.len()];
    let mut consumed = vec![false; candidates.len()];
    let mut outcomes = Vec::new();

    exact_pass(
        reference, candidates, &refs, &cands, &mut spoken_for, &mut consumed, &mut outcomes,
    );
    excess_pass(
        reference, candidates, &refs, &cands, &mut spoken_for, &mut consumed, &mut outcomes,
    );
    partial_pass(
        reference, candidates, &refs, &cands, &mut spoken_for, &mut consumed, &mut outcomes,
    );
    residual_pass(
        reference,
        candidates,
        &refs,
        &cands,
        &spoken_for,
        &consumed,
        handled_types,
        &mut outcomes,
    );

    DocumentOutcomes {
        outcomes,
        candidates_total: candidates.len(),
        references_total: reference.len(),
        references_matched: spoken_for.iter().filter(|&&s| s).count(),
    }
}

fn sorted_indices(mentions: &[Mention]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..mentions.len()).collect();
    // entity type as the last key so that same-span duplicates process
    // in a fixed order regardless of how the list was assembled
    order.sort_by(|&a, &b| {
        mentions[a]
            .cmp(&mentions[b])
            .then_with(|| mentions[a].entity_type.cmp(&mentions[b].entity_type))
    });
    order
}

fn matched_outcome(class: OutcomeClass, reference: &Mention, candidate: &Mention) -> Outcome {
    Outcome {
        class,
        type_correct: reference.entity_type == candidate.entity_type,
        entity_type: reference.entity_type,
    }
}

/// Pass 1: exact span matches.
fn exact_pass(
    reference: &[Mention],
    candidates: &[Mention],
    refs: &[usize],
    cands: &[usize],
    spoken_for: &mut [bool],
    consumed: &mut [bool],
    outcomes: &mut Vec<Outcome>,
) {
    for &ri in refs {
        if spoken_for[ri] {
            continue;
        }
        for &ci in cands {
            if consumed[ci] {
                continue;
            }
            if reference[ri].span.relation_to(candidates[ci].span) == SpanRelation::Equal {
                outcomes.push(matched_outcome(
                    OutcomeClass::TruePositive,
                    &reference[ri],
                    &candidates[ci],
                ));
                spoken_for[ri] = true;
                consumed[ci] = true;
                break;
            }
        }
    }
}

/// Pass 2: candidate span strictly contains the reference span.
fn excess_pass(
    reference: &[Mention],
    candidates: &[Mention],
    refs: &[usize],
    cands: &[usize],
    spoken_for: &mut [bool],
    consumed: &mut [bool],
    outcomes: &mut Vec<Outcome>,
) {
    for &ri in refs {
        if spoken_for[ri] {
            continue;
        }
        for &ci in cands {
            if consumed[ci] {
                continue;
            }
            if reference[ri].span.relation_to(candidates[ci].span)
                == SpanRelation::ContainedExclusive
            {
                outcomes.push(matched_outcome(
                    OutcomeClass::ExcessPositive,
                    &reference[ri],
                    &candidates[ci],
                ));
                spoken_for[ri] = true;
                consumed[ci] = true;
                break;
            }
        }
    }
}

/// Pass 3: partial overlaps, split into clean partials and irregular
/// candidates that straddle more than one reference mention.
fn partial_pass(
    reference: &[Mention],
    candidates: &[Mention],
    refs: &[usize],
    cands: &[usize],
    spoken_for: &mut [bool],
    consumed: &mut [bool],
    outcomes: &mut Vec<Outcome>,
) {
    for &ri in refs {
        if spoken_for[ri] {
            continue;
        }
        for &ci in cands {
            if consumed[ci] {
                continue;
            }
            // anything still overlapping lands here: genuine partial
            // overlaps, plus candidates strictly inside the reference
            // (the candidate-contains-reference case was pass 2)
            if !matches!(
                reference[ri].span.relation_to(candidates[ci].span),
                SpanRelation::PartialOverlap | SpanRelation::ContainsExclusive
            ) {
                continue;
            }

            // a candidate also touching other reference mentions is not
            // a clean boundary error
            let straddled: Vec<usize> = refs
                .iter()
                .copied()
                .filter(|&rj| {
                    rj != ri
                        && matches!(
                            candidates[ci].span.relation_to(reference[rj].span),
                            SpanRelation::ContainsExclusive
                                | SpanRelation::ContainedExclusive
                                | SpanRelation::PartialOverlap
                        )
                })
                .collect();

            let class = if straddled.is_empty() {
                OutcomeClass::PartialPositive
            } else {
                OutcomeClass::Irregular
            };
            outcomes.push(matched_outcome(class, &reference[ri], &candidates[ci]));

            spoken_for[ri] = true;
            for rj in straddled {
                spoken_for[rj] = true;
            }
            consumed[ci] = true;
            break;
        }
    }
}

/// Pass 4: everything left over.
#[allow(clippy::too_many_arguments)]
fn residual_pass(
    reference: &[Mention],
    candidates: &[Mention],
    refs: &[usize],
    cands: &[usize],
    spoken_for: &[bool],
    consumed: &[bool],
    handled_types: &[EntityType],
    outcomes: &mut Vec<Outcome>,
) {
    for &ci in cands {
        if !consumed[ci] {
            outcomes.push(Outcome {
                class: OutcomeClass::FalsePositive,
                type_correct: false,
                entity_type: candidates[ci].entity_type,
            });
        }
    }
    for &ri in refs {
        if !spoken_for[ri] && handled_types.contains(&reference[ri].entity_type) {
            outcomes.push(Outcome {
                class: OutcomeClass::FalseNegative,
                type_correct: false,
                entity_type: reference[ri].entity_type,
            });
        }
    }
}
