use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::annotation::{Annotation, Boundary, BoundaryIndex, ExonIdx};
use crate::breakpoints::{BreakendIdx, BreakendSet};

/// Exon hits of each originating breakend.
///
/// `start` holds exons whose start is near the breakend itself, `end` holds
/// exons whose end is near the breakend's partner. Both are keyed by the
/// originating breakend, so one key identifies one oriented breakpoint pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSets {
    pub start: FxHashMap<BreakendIdx, Vec<ExonIdx>>,
    pub end: FxHashMap<BreakendIdx, Vec<ExonIdx>>,
}

impl MatchSets {
    pub fn start_hits(&self, idx: BreakendIdx) -> Option<&Vec<ExonIdx>> {
        self.start.get(&idx)
    }

    pub fn end_hits(&self, idx: BreakendIdx) -> Option<&Vec<ExonIdx>> {
        self.end.get(&idx)
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }

    /// number of (breakend, exon) associations on both sides
    pub fn hit_count(&self) -> usize {
        self.start.values().map(Vec::len).sum::<usize>()
            + self.end.values().map(Vec::len).sum::<usize>()
    }
}

/// Proximity join of breakends against exon boundaries, strand ignored.
/// Breakends are matched in parallel; the result does not depend on the
/// partitioning.
pub fn match_breakends(breakends: &BreakendSet, annotation: &Annotation, maxgap: u64) -> MatchSets {
    let start_index = BoundaryIndex::new(annotation, Boundary::Start, maxgap);
    let end_index = BoundaryIndex::new(annotation, Boundary::End, maxgap);

    let per_breakend: Vec<(BreakendIdx, Vec<ExonIdx>, Vec<ExonIdx>)> = (0..breakends.len())
        .into_par_iter()
        .map(|idx| {
            let bnd = breakends.get(idx);
            let partner = breakends.get(breakends.partner_of(idx));
            let start = start_index.find(&bnd.chrom, bnd.pos);
            let end = end_index.find(&partner.chrom, partner.pos);
            (idx, start, end)
        })
        .collect();

    let mut matches = MatchSets::default();
    for (idx, start, end) in per_breakend {
        if !start.is_empty() {
            debug!(
                "{} start-matches exons {:?}",
                breakends.get(idx).id,
                start
                    .iter()
                    .map(|e| annotation.exon(*e).exon_id.as_str())
                    .collect::<Vec<&str>>()
            );
            matches.start.insert(idx, start);
        }
        if !end.is_empty() {
            matches.end.insert(idx, end);
        }
    }

    info!(
        "Matched {} breakends to exon starts and {} partners to exon ends, {} exon hits (maxgap {})",
        matches.start.len(),
        matches.end.len(),
        matches.hit_count(),
        maxgap
    );

    matches
}
