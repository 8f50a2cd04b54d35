use std::collections::BTreeSet;

use log::info;

use crate::annotation::{Annotation, ExonIdx};
use crate::breakpoints::BreakendIdx;
use crate::matcher::MatchSets;

/// One oriented breakpoint pair with its exon hits. `breakend` carries the
/// start-side exons, its partner carries the end-side exons.
#[derive(Debug, Clone, PartialEq)]
pub struct PairHit {
    pub breakend: BreakendIdx,
    pub start_exons: Vec<ExonIdx>,
    pub end_exons: Vec<ExonIdx>,
    /// transcripts attached to the start side
    pub start_txs: BTreeSet<String>,
    /// transcripts attached to the end side
    pub end_txs: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedPairs {
    /// both sides hit exons of a shared transcript
    pub same_transcript: Vec<PairHit>,
    /// both sides hit, but no transcript in common
    pub different_transcript: Vec<PairHit>,
    pub start_only: Vec<PairHit>,
    pub end_only: Vec<PairHit>,
}

impl ClassifiedPairs {
    pub fn is_empty(&self) -> bool {
        self.same_transcript.is_empty()
            && self.different_transcript.is_empty()
            && self.start_only.is_empty()
            && self.end_only.is_empty()
    }

    /// insertion-site candidates of all three buckets
    pub fn insertion_candidates(&self) -> impl Iterator<Item = &PairHit> {
        self.different_transcript
            .iter()
            .chain(self.start_only.iter())
            .chain(self.end_only.iter())
    }
}

/// Join start and end hits by originating breakend and bucket the pairs.
///
/// A pair is same-transcript when any transcript is reachable from both sides.
/// Its sides then keep only the exons and transcripts of the shared set.
pub fn classify_pairs(matches: &MatchSets, annotation: &Annotation) -> ClassifiedPairs {
    let mut keys: Vec<BreakendIdx> = matches
        .start
        .keys()
        .chain(matches.end.keys())
        .copied()
        .collect();
    keys.sort_unstable();
    keys.dedup();

    let mut classified = ClassifiedPairs::default();

    for idx in keys {
        match (matches.start_hits(idx), matches.end_hits(idx)) {
            (Some(start), Some(end)) => {
                let start_txs = annotation.transcripts_of(start);
                let end_txs = annotation.transcripts_of(end);
                let shared: BTreeSet<String> =
                    start_txs.intersection(&end_txs).cloned().collect();

                if shared.is_empty() {
                    classified.different_transcript.push(PairHit {
                        breakend: idx,
                        start_exons: start.clone(),
                        end_exons: end.clone(),
                        start_txs,
                        end_txs,
                    });
                } else {
                    let in_shared = |e: &&ExonIdx| {
                        annotation
                            .exon(**e)
                            .tx_names
                            .iter()
                            .any(|tx| shared.contains(tx))
                    };
                    classified.same_transcript.push(PairHit {
                        breakend: idx,
                        start_exons: start.iter().filter(in_shared).copied().collect(),
                        end_exons: end.iter().filter(in_shared).copied().collect(),
                        start_txs: shared.clone(),
                        end_txs: shared,
                    });
                }
            }
            (Some(start), None) => classified.start_only.push(PairHit {
                breakend: idx,
                start_exons: start.clone(),
                end_exons: Vec::new(),
                start_txs: annotation.transcripts_of(start),
                end_txs: BTreeSet::new(),
            }),
            (None, Some(end)) => classified.end_only.push(PairHit {
                breakend: idx,
                start_exons: Vec::new(),
                end_exons: end.clone(),
                start_txs: BTreeSet::new(),
                end_txs: annotation.transcripts_of(end),
            }),
            (None, None) => {}
        }
    }

    info!(
        "Classified pairs: {} same-transcript, {} different-transcript, {} start-only, {} end-only",
        classified.same_transcript.len(),
        classified.different_transcript.len(),
        classified.start_only.len(),
        classified.end_only.len()
    );

    classified
}
