use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use serde::Serialize;

use crate::annotation::{Annotation, ExonIdx};
use crate::breakpoints::{BreakendIdx, BreakendSet};
use crate::classify::{ClassifiedPairs, PairHit};

/// A breakend with the exons and transcripts it was matched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakendRecord {
    pub breakend: BreakendIdx,
    pub exon_ids: BTreeSet<String>,
    pub tx_names: BTreeSet<String>,
    /// filled in by gene resolution
    pub gene_symbols: BTreeSet<String>,
}

impl BreakendRecord {
    /// unannotated record, used for partner completion
    pub fn bare(breakend: BreakendIdx) -> Self {
        BreakendRecord {
            breakend,
            exon_ids: BTreeSet::new(),
            tx_names: BTreeSet::new(),
            gene_symbols: BTreeSet::new(),
        }
    }

    pub fn from_hits(
        breakend: BreakendIdx,
        exons: &[ExonIdx],
        tx_names: &BTreeSet<String>,
        annotation: &Annotation,
    ) -> Self {
        BreakendRecord {
            breakend,
            exon_ids: exons
                .iter()
                .map(|e| annotation.exon(*e).exon_id.clone())
                .collect(),
            tx_names: tx_names.clone(),
            gene_symbols: BTreeSet::new(),
        }
    }

    /// union of annotations of the same breakend
    pub fn merge(&mut self, other: &BreakendRecord) {
        debug_assert_eq!(self.breakend, other.breakend);
        self.exon_ids.extend(other.exon_ids.iter().cloned());
        self.tx_names.extend(other.tx_names.iter().cloned());
        self.gene_symbols.extend(other.gene_symbols.iter().cloned());
    }

    pub fn is_annotated(&self) -> bool {
        !self.exon_ids.is_empty() || !self.tx_names.is_empty()
    }
}

/// One record per breakend, ordered by breakend index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordSet {
    records: BTreeMap<BreakendIdx, BreakendRecord>,
}

impl RecordSet {
    pub fn new() -> Self {
        RecordSet {
            records: BTreeMap::new(),
        }
    }

    /// insert, merging into an existing record of the same breakend
    pub fn add(&mut self, record: BreakendRecord) {
        match self.records.get_mut(&record.breakend) {
            Some(existing) => existing.merge(&record),
            None => {
                self.records.insert(record.breakend, record);
            }
        }
    }

    pub fn contains(&self, idx: BreakendIdx) -> bool {
        self.records.contains_key(&idx)
    }

    pub fn get(&self, idx: BreakendIdx) -> Option<&BreakendRecord> {
        self.records.get(&idx)
    }

    pub fn remove(&mut self, idx: BreakendIdx) -> Option<BreakendRecord> {
        self.records.remove(&idx)
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&BreakendRecord) -> bool,
    {
        self.records.retain(|_, record| f(record));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BreakendRecord> {
        self.records.values()
    }

    pub fn into_records(self) -> Vec<BreakendRecord> {
        self.records.into_values().collect()
    }

    /// every transcript name carried by any record
    pub fn tx_names(&self) -> BTreeSet<String> {
        self.records
            .values()
            .flat_map(|r| r.tx_names.iter().cloned())
            .collect()
    }
}

impl FromIterator<BreakendRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = BreakendRecord>>(iter: I) -> Self {
        let mut set = RecordSet::new();
        for record in iter {
            set.add(record);
        }
        set
    }
}

/// the two records a pair hit contributes: start side on the breakend, end
/// side on its partner. Empty sides contribute nothing.
fn records_of_hit<'a>(
    hit: &'a PairHit,
    breakends: &'a BreakendSet,
    annotation: &'a Annotation,
) -> impl Iterator<Item = BreakendRecord> + 'a {
    let start = (!hit.start_exons.is_empty()).then(|| {
        BreakendRecord::from_hits(hit.breakend, &hit.start_exons, &hit.start_txs, annotation)
    });
    let end = (!hit.end_exons.is_empty()).then(|| {
        BreakendRecord::from_hits(
            breakends.partner_of(hit.breakend),
            &hit.end_exons,
            &hit.end_txs,
            annotation,
        )
    });
    start.into_iter().chain(end)
}

/// RT-1: a record whose exon set equals its partner's and holds at most one
/// exon carries no junction signal and is dropped. Records without a partner
/// record are kept.
pub fn rt1_filter(records: RecordSet, breakends: &BreakendSet) -> RecordSet {
    let before = records.len();
    let dropped: Vec<BreakendIdx> = records
        .iter()
        .filter(|record| {
            let partner = breakends.partner_of(record.breakend);
            match records.get(partner) {
                Some(partner_record) => {
                    partner_record.exon_ids == record.exon_ids && record.exon_ids.len() <= 1
                }
                None => false,
            }
        })
        .map(|record| record.breakend)
        .collect();

    let mut records = records;
    for idx in dropped {
        debug!("RT-1 drops breakend {}", breakends.get(idx).id);
        records.remove(idx);
    }

    info!("RT-1 kept {} of {} junction records", records.len(), before);
    records
}

/// Junction records from same-transcript pairs, merged per breakend and
/// filtered by RT-1.
pub fn junction_records(
    classified: &ClassifiedPairs,
    breakends: &BreakendSet,
    annotation: &Annotation,
) -> RecordSet {
    let merged: RecordSet = classified
        .same_transcript
        .iter()
        .flat_map(|hit| records_of_hit(hit, breakends, annotation))
        .collect();
    rt1_filter(merged, breakends)
}

/// Insertion-site records from the one-sided and different-transcript pairs,
/// merged per breakend. Breakends already reported as junctions are removed
/// and every remaining record gets its partner, annotated or not.
pub fn insertion_records(
    classified: &ClassifiedPairs,
    breakends: &BreakendSet,
    annotation: &Annotation,
    junctions: &RecordSet,
) -> RecordSet {
    let mut records: RecordSet = classified
        .insertion_candidates()
        .flat_map(|hit| records_of_hit(hit, breakends, annotation))
        .collect();

    records.retain(|record| !junctions.contains(record.breakend));

    let missing_partners: Vec<BreakendIdx> = records
        .iter()
        .map(|record| breakends.partner_of(record.breakend))
        .filter(|partner| !records.contains(*partner))
        .collect();
    for partner in missing_partners {
        records.add(BreakendRecord::bare(partner));
    }

    info!("Collected {} insertion-site records", records.len());
    records
}
