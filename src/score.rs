use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::annotation::Annotation;
use crate::breakpoints::{BreakendIdx, BreakendSet};
use crate::merge::{BreakendRecord, RecordSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptScore {
    pub tx_name: String,
    /// distinct breakpoint pairs supporting a junction of the transcript
    pub supported: usize,
    /// exon count - 1
    pub expected: usize,
    pub score: f64,
}

impl TranscriptScore {
    pub fn new(tx_name: &str, supported: usize, expected: usize) -> Self {
        let score = if expected == 0 {
            0.0
        } else {
            (supported as f64 / expected as f64).min(1.0)
        };
        TranscriptScore {
            tx_name: tx_name.to_string(),
            supported,
            expected,
            score,
        }
    }

    pub fn passes(&self, minscore: f64) -> bool {
        self.score >= minscore
    }
}

/// Scores of all transcripts seen in the junction records, by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreTable {
    pub scores: BTreeMap<String, TranscriptScore>,
}

impl ScoreTable {
    pub fn get(&self, tx_name: &str) -> Option<&TranscriptScore> {
        self.scores.get(tx_name)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptScore> {
        self.scores.values()
    }

    /// names of transcripts scoring at least `minscore`
    pub fn passing(&self, minscore: f64) -> FxHashSet<String> {
        self.scores
            .values()
            .filter(|s| s.passes(minscore))
            .map(|s| s.tx_name.clone())
            .collect()
    }
}

/// Score each transcript of the junction records by the fraction of its
/// expected junctions that are supported by distinct breakpoint pairs.
pub fn score_transcripts(
    junctions: &RecordSet,
    breakends: &BreakendSet,
    annotation: &Annotation,
) -> ScoreTable {
    let tx_names: Vec<String> = junctions.tx_names().into_iter().collect();

    let scores: Vec<TranscriptScore> = tx_names
        .par_iter()
        .map(|tx| {
            let pairs: BTreeSet<(BreakendIdx, BreakendIdx)> = junctions
                .iter()
                .filter(|record| record.tx_names.contains(tx))
                .map(|record| breakends.pair_key(record.breakend))
                .collect();
            let score = TranscriptScore::new(tx, pairs.len(), annotation.expected_junctions(tx));
            debug!(
                "{}: {} of {} junctions supported, score {:.3}",
                tx, score.supported, score.expected, score.score
            );
            score
        })
        .collect();

    ScoreTable {
        scores: scores
            .into_iter()
            .map(|s| (s.tx_name.clone(), s))
            .collect(),
    }
}

/// Narrow junction records to passing transcripts; records left without any
/// transcript are dropped.
pub fn filter_junctions(junctions: RecordSet, passing: &FxHashSet<String>) -> RecordSet {
    let before = junctions.len();
    let kept: RecordSet = junctions
        .into_records()
        .into_iter()
        .filter_map(|mut record| {
            record.tx_names.retain(|tx| passing.contains(tx));
            (!record.tx_names.is_empty()).then_some(record)
        })
        .collect();
    info!(
        "{} of {} junction records pass the transcript score filter",
        kept.len(),
        before
    );
    kept
}

/// An insertion-site record flagged with the transcripts that also carry a
/// validated junction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionSite {
    pub record: BreakendRecord,
    pub tx_validated: BTreeMap<String, bool>,
    pub junction_validated: bool,
}

impl InsertionSite {
    pub fn flag(record: BreakendRecord, passing: &FxHashSet<String>) -> Self {
        let tx_validated: BTreeMap<String, bool> = record
            .tx_names
            .iter()
            .map(|tx| (tx.clone(), passing.contains(tx)))
            .collect();
        let junction_validated = tx_validated.values().any(|v| *v);
        InsertionSite {
            record,
            tx_validated,
            junction_validated,
        }
    }
}

pub fn flag_insertions(insertions: RecordSet, passing: &FxHashSet<String>) -> Vec<InsertionSite> {
    let sites: Vec<InsertionSite> = insertions
        .into_records()
        .into_iter()
        .map(|record| InsertionSite::flag(record, passing))
        .collect();
    info!(
        "{} insertion-site records: {} junction validated, {} without exon hits",
        sites.len(),
        sites.iter().filter(|s| s.junction_validated).count(),
        sites.iter().filter(|s| !s.record.is_annotated()).count()
    );
    sites
}
