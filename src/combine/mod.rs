//! Fusion: merging several recognizers' mention lists into one
//! consolidated, non-overlapping annotation set.
//!
//! # Architecture
//!
//! ```text
//! recognizer A ──► [mentions] ──┐
//! recognizer B ──► [mentions] ──┼──► pool ──► overlap ──► weighted ──► winners
//! recognizer C ──► [mentions] ──┘    (sorted)  clusters     vote
//!
//! date specialist ──► DATE mentions ───────────────────────► placed first,
//!                                                            bypassing the vote
//! ```
//!
//! Every maximal run of transitively overlapping candidates forms a
//! cluster; within a cluster, each distinct `(span, type)` option is
//! scored by summing the fitted weights of the recognizers proposing
//! it, and exactly one winner is emitted. Ties break on supporter
//! count, then on the configured recognizer priority order, never on
//! map iteration order, so fusion output is byte-for-byte reproducible.
//!
//! ```
//! use std::collections::BTreeMap;
//! use conflux::combine::{CombinerConfig, VoteCombiner, VoteWeights};
//! use conflux::{EntityType, Mention, RecognizerId};
//!
//! let weights = VoteWeights::uniform(&[RecognizerId::Stanford, RecognizerId::LingPipe]);
//! let combiner = VoteCombiner::new(weights);
//!
//! let outputs = BTreeMap::from([
//!     (RecognizerId::Stanford, vec![
//!         Mention::try_new("John", EntityType::Person, 0, 4, RecognizerId::Stanford).unwrap(),
//!     ]),
//!     (RecognizerId::LingPipe, vec![
//!         Mention::try_new("John", EntityType::Person, 0, 4, RecognizerId::LingPipe).unwrap(),
//!     ]),
//! ]);
//!
//! let fused = combiner.combine(&outputs);
//! assert_eq!(fused.len(), 1);
//! assert_eq!(fused[0].entity_type, EntityType::Person);
//! ```

pub mod trainer;
pub mod weights;

pub use trainer::Trainer;
pub use weights::{VoteWeights, WeightMode};

use std::collections::{BTreeMap, BTreeSet};

use crate::eval::MetricName;
use crate::mention::{EntityType, Mention, RecognizerId};
use crate::span::Span;

/// Configuration of the vote-based combiner.
#[derive(Debug, Clone)]
pub struct CombinerConfig {
    /// Which fitted metric drives the vote.
    pub vote_metric: MetricName,
    /// Recognizer priority order for deterministic tie-breaking; tools
    /// absent from the list rank last.
    pub priority: Vec<RecognizerId>,
    /// Recognizer whose DATE mentions bypass the vote entirely.
    pub date_specialist: Option<RecognizerId>,
}

impl Default for CombinerConfig {
    fn default() -> Self {
        Self {
            vote_metric: MetricName::Precision,
            priority: Vec::new(),
            date_specialist: None,
        }
    }
}

/// Weighted-vote fusion of per-recognizer mention lists.
///
/// Holds a frozen [`VoteWeights`] table; the combiner never mutates
/// input mentions, it selects copies into a new owned output list.
#[derive(Debug, Clone)]
pub struct VoteCombiner {
    weights: VoteWeights,
    config: CombinerConfig,
}

impl VoteCombiner {
    /// Create a combiner with default configuration.
    #[must_use]
    pub fn new(weights: VoteWeights) -> Self {
        Self {
            weights,
            config: CombinerConfig::default(),
        }
    }

    /// Create a combiner with an explicit configuration.
    #[must_use]
    pub fn with_config(weights: VoteWeights, config: CombinerConfig) -> Self {
        Self { weights, config }
    }

    /// Fuse one document's per-recognizer outputs into a single
    /// consolidated mention list, sorted by position and free of
    /// overlaps.
    #[must_use]
    pub fn combine(&self, outputs: &BTreeMap<RecognizerId, Vec<Mention>>) -> Vec<Mention> {
        // date-specialist mentions are placed unconditionally
        let placed_dates = self.place_specialist_dates(outputs);

        // pool the remaining candidates, positionally sorted
        let mut pool: Vec<(&RecognizerId, &Mention)> = Vec::new();
        for (recognizer, mentions) in outputs {
            if Some(recognizer) == self.config.date_specialist.as_ref() {
                continue;
            }
            for mention in mentions {
                if self.config.date_specialist.is_some()
                    && mention.entity_type == EntityType::Date
                {
                    continue;
                }
                pool.push((recognizer, mention));
            }
        }
        pool.sort_by(|(ra, ma), (rb, mb)| {
            ma.span.cmp(&mb.span).then_with(|| ra.cmp(rb))
        });

        // transitive overlap clustering: a cluster ends where the next
        // mention starts at or past everything seen so far
        let mut winners: Vec<Mention> = Vec::new();
        let mut cluster: Vec<(&RecognizerId, &Mention)> = Vec::new();
        let mut cluster_end = 0usize;
        for (recognizer, mention) in pool {
            if !cluster.is_empty() && mention.start() >= cluster_end {
                winners.extend(self.resolve_cluster(&cluster));
                cluster.clear();
            }
            cluster_end = cluster_end.max(mention.end());
            cluster.push((recognizer, mention));
        }
        winners.extend(self.resolve_cluster(&cluster));

        // a vote winner cannot displace an already-placed date
        let mut result = placed_dates;
        for winner in winners {
            let collides = result.iter().any(|d| d.span.overlaps(winner.span));
            if collides {
                tracing::debug!(%winner, "dropping fused mention overlapping a placed date");
            } else {
                result.push(winner);
            }
        }
        result.sort();
        result
    }

    fn place_specialist_dates(
        &self,
        outputs: &BTreeMap<RecognizerId, Vec<Mention>>,
    ) -> Vec<Mention> {
        let Some(specialist) = &self.config.date_specialist else {
            return Vec::new();
        };
        let Some(mentions) = outputs.get(specialist) else {
            return Vec::new();
        };
        mentions
            .iter()
            .filter(|m| m.entity_type == EntityType::Date)
            .map(|m| retag(m))
            .collect()
    }

    /// Pick at most one winner from a group of mutually overlapping
    /// candidates.
    fn resolve_cluster(&self, cluster: &[(&RecognizerId, &Mention)]) -> Option<Mention> {
        // distinct (span, type) options with their supporters; a
        // recognizer contributes once per option even if it proposed
        // duplicates
        let mut options: BTreeMap<(Span, EntityType), BTreeSet<&RecognizerId>> =
            BTreeMap::new();
        for &(recognizer, mention) in cluster {
            options
                .entry((mention.span, mention.entity_type))
                .or_default()
                .insert(recognizer);
        }

        let mut best: Option<OptionScore> = None;
        for (&(span, entity_type), supporters) in &options {
            let score: f64 = supporters
                .iter()
                .map(|&r| {
                    self.weights
                        .get(r, self.config.vote_metric, Some(entity_type))
                })
                .sum();
            let candidate = OptionScore {
                score,
                supporters: supporters.len(),
                priority_rank: supporters
                    .iter()
                    .map(|&r| self.priority_rank(r))
                    .min()
                    .unwrap_or(usize::MAX),
                span,
                entity_type,
            };
            let replace = match &best {
                None => true,
                Some(current) => candidate.beats(current),
            };
            if replace {
                best = Some(candidate);
            }
        }

        let winner = best?;
        // representative copy: the best-ranked supporter's mention
        let mut representative: Option<(&RecognizerId, &Mention)> = None;
        for &(recognizer, mention) in cluster {
            if mention.span != winner.span || mention.entity_type != winner.entity_type {
                continue;
            }
            let better = match representative {
                None => true,
                Some((current, _)) => {
                    self.priority_rank(recognizer) < self.priority_rank(current)
                }
            };
            if better {
                representative = Some((recognizer, mention));
            }
        }
        representative.map(|(_, mention)| retag(mention))
    }

    fn priority_rank(&self, recognizer: &RecognizerId) -> usize {
        self.config
            .priority
            .iter()
            .position(|p| p == recognizer)
            .unwrap_or(self.config.priority.len())
    }
}

/// Copy a mention into the fused output, retagging its source.
fn retag(mention: &Mention) -> Mention {
    let mut out = mention.clone();
    out.source = RecognizerId::Fusion;
    out
}

/// Score of one `(span, type)` option within a cluster.
struct OptionScore {
    score: f64,
    supporters: usize,
    priority_rank: usize,
    span: Span,
    entity_type: EntityType,
}

impl OptionScore {
    /// Strictly better: higher score, then more supporters, then a
    /// better (lower) priority rank. Equal on all three keeps the
    /// incumbent, which arrived first in `(span, type)` order.
    fn beats(&self, other: &Self) -> bool {
        if self.score != other.score {
            return self.score > other.score;
        }
        if self.supporters != other.supporters {
            return self.supporters > other.supporters;
        }
        self.priority_rank < other.priority_rank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(start: usize, end: usize, ty: EntityType, source: RecognizerId) -> Mention {
        Mention::try_new("m", ty, start, end, source).unwrap()
    }

    fn weighted(entries: &[(RecognizerId, f64)]) -> VoteWeights {
        let mut weights = VoteWeights::new(WeightMode::Global);
        for (recognizer, weight) in entries {
            weights.set(recognizer.clone(), MetricName::Precision, None, *weight);
        }
        weights
    }

    #[test]
    fn test_heavier_recognizer_wins_type_conflict() {
        // same span, conflicting types: the better tool's type prevails
        let weights = weighted(&[
            (RecognizerId::Stanford, 0.7),
            (RecognizerId::Illinois, 0.9),
        ]);
        let combiner = VoteCombiner::new(weights);

        let outputs = BTreeMap::from([
            (
                RecognizerId::Stanford,
                vec![mention(0, 10, EntityType::Person, RecognizerId::Stanford)],
            ),
            (
                RecognizerId::Illinois,
                vec![mention(0, 10, EntityType::Organization, RecognizerId::Illinois)],
            ),
        ]);

        let fused = combiner.combine(&outputs);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].entity_type, EntityType::Organization);
        assert_eq!(fused[0].source, RecognizerId::Fusion);
    }

    #[test]
    fn test_more_supporters_break_score_tie() {
        let weights = weighted(&[
            (RecognizerId::Stanford, 0.5),
            (RecognizerId::Illinois, 0.5),
            (RecognizerId::LingPipe, 1.0),
        ]);
        let combiner = VoteCombiner::new(weights);

        // two tools agree on PERSON at (0,10); one heavier tool says
        // ORGANIZATION at the same span; scores tie at 1.0
        let outputs = BTreeMap::from([
            (
                RecognizerId::Stanford,
                vec![mention(0, 10, EntityType::Person, RecognizerId::Stanford)],
            ),
            (
                RecognizerId::Illinois,
                vec![mention(0, 10, EntityType::Person, RecognizerId::Illinois)],
            ),
            (
                RecognizerId::LingPipe,
                vec![mention(0, 10, EntityType::Organization, RecognizerId::LingPipe)],
            ),
        ]);

        let fused = combiner.combine(&outputs);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].entity_type, EntityType::Person);
    }

    #[test]
    fn test_priority_breaks_full_tie() {
        let weights = weighted(&[
            (RecognizerId::Stanford, 0.5),
            (RecognizerId::Illinois, 0.5),
        ]);
        let config = CombinerConfig {
            priority: vec![RecognizerId::Illinois, RecognizerId::Stanford],
            ..CombinerConfig::default()
        };
        let combiner = VoteCombiner::with_config(weights, config);

        let outputs = BTreeMap::from([
            (
                RecognizerId::Stanford,
                vec![mention(0, 10, EntityType::Person, RecognizerId::Stanford)],
            ),
            (
                RecognizerId::Illinois,
                vec![mention(0, 10, EntityType::Location, RecognizerId::Illinois)],
            ),
        ]);

        let fused = combiner.combine(&outputs);
        assert_eq!(fused.len(), 1);
        // Illinois ranks first in the configured priority order
        assert_eq!(fused[0].entity_type, EntityType::Location);
    }

    #[test]
    fn test_single_source_is_identity() {
        let combiner = VoteCombiner::new(VoteWeights::uniform(&[RecognizerId::Stanford]));
        let mentions = vec![
            mention(0, 4, EntityType::Person, RecognizerId::Stanford),
            mention(10, 18, EntityType::Location, RecognizerId::Stanford),
            mention(25, 29, EntityType::Date, RecognizerId::Stanford),
        ];
        let outputs = BTreeMap::from([(RecognizerId::Stanford, mentions.clone())]);

        let fused = combiner.combine(&outputs);
        assert_eq!(fused.len(), mentions.len());
        for (got, want) in fused.iter().zip(&mentions) {
            assert_eq!(got.span, want.span);
            assert_eq!(got.entity_type, want.entity_type);
            assert_eq!(got.text, want.text);
        }
    }

    #[test]
    fn test_transitive_clustering_single_winner() {
        // a-b overlap, b-c overlap, a-c disjoint: still one cluster
        let weights = weighted(&[
            (RecognizerId::Stanford, 0.9),
            (RecognizerId::Illinois, 0.5),
            (RecognizerId::LingPipe, 0.4),
        ]);
        let combiner = VoteCombiner::new(weights);

        let outputs = BTreeMap::from([
            (
                RecognizerId::Stanford,
                vec![mention(0, 6, EntityType::Person, RecognizerId::Stanford)],
            ),
            (
                RecognizerId::Illinois,
                vec![mention(4, 12, EntityType::Person, RecognizerId::Illinois)],
            ),
            (
                RecognizerId::LingPipe,
                vec![mention(10, 16, EntityType::Person, RecognizerId::LingPipe)],
            ),
        ]);

        let fused = combiner.combine(&outputs);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].start(), 0);
        assert_eq!(fused[0].end(), 6);
    }

    #[test]
    fn test_output_is_sorted_and_non_overlapping() {
        let weights = weighted(&[
            (RecognizerId::Stanford, 0.8),
            (RecognizerId::Illinois, 0.6),
        ]);
        let combiner = VoteCombiner::new(weights);

        let outputs = BTreeMap::from([
            (
                RecognizerId::Stanford,
                vec![
                    mention(20, 30, EntityType::Location, RecognizerId::Stanford),
                    mention(0, 8, EntityType::Person, RecognizerId::Stanford),
                ],
            ),
            (
                RecognizerId::Illinois,
                vec![mention(5, 12, EntityType::Person, RecognizerId::Illinois)],
            ),
        ]);

        let fused = combiner.combine(&outputs);
        for pair in fused.windows(2) {
            assert!(pair[0].start() <= pair[1].start());
            assert!(!pair[0].span.overlaps(pair[1].span));
        }
    }

    #[test]
    fn test_date_specialist_bypasses_vote() {
        let weights = weighted(&[(RecognizerId::Stanford, 1.0)]);
        let config = CombinerConfig {
            date_specialist: Some(RecognizerId::DateFinder),
            ..CombinerConfig::default()
        };
        let combiner = VoteCombiner::with_config(weights, config);

        let outputs = BTreeMap::from([
            (
                RecognizerId::DateFinder,
                // the specialist has no fitted weight at all
                vec![mention(0, 10, EntityType::Date, RecognizerId::DateFinder)],
            ),
            (
                RecognizerId::Stanford,
                vec![
                    // would otherwise win its cluster, but collides with
                    // the placed date
                    mention(5, 14, EntityType::Person, RecognizerId::Stanford),
                    mention(20, 26, EntityType::Person, RecognizerId::Stanford),
                    // non-specialist DATE mentions stay out of the vote
                    mention(30, 34, EntityType::Date, RecognizerId::Stanford),
                ],
            ),
        ]);

        let fused = combiner.combine(&outputs);
        assert_eq!(fused.len(), 2);
        assert_eq!(fused[0].entity_type, EntityType::Date);
        assert_eq!(fused[0].start(), 0);
        assert_eq!(fused[1].entity_type, EntityType::Person);
        assert_eq!(fused[1].start(), 20);
    }

    #[test]
    fn test_unknown_recognizer_carries_no_weight() {
        // only Stanford is in the table; the unknown tool defaults to 0
        let weights = weighted(&[(RecognizerId::Stanford, 0.1)]);
        let combiner = VoteCombiner::new(weights);

        let outputs = BTreeMap::from([
            (
                RecognizerId::Stanford,
                vec![mention(0, 10, EntityType::Person, RecognizerId::Stanford)],
            ),
            (
                RecognizerId::Other("mystery".into()),
                vec![mention(
                    0,
                    10,
                    EntityType::Location,
                    RecognizerId::Other("mystery".into()),
                )],
            ),
        ]);

        let fused = combiner.combine(&outputs);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].entity_type, EntityType::Person);
    }

    #[test]
    fn test_duplicate_proposals_count_once() {
        let weights = weighted(&[
            (RecognizerId::Stanford, 0.4),
            (RecognizerId::Illinois, 0.7),
        ]);
        let combiner = VoteCombiner::new(weights);

        let outputs = BTreeMap::from([
            (
                RecognizerId::Stanford,
                vec![
                    // duplicated proposal must not double its weight
                    mention(0, 10, EntityType::Person, RecognizerId::Stanford),
                    mention(0, 10, EntityType::Person, RecognizerId::Stanford),
                ],
            ),
            (
                RecognizerId::Illinois,
                vec![mention(0, 10, EntityType::Location, RecognizerId::Illinois)],
            ),
        ]);

        let fused = combiner.combine(&outputs);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].entity_type, EntityType::Location);
    }
}
