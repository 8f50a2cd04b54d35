use std::collections::BTreeSet;

use log::{debug, info, warn};
use rust_lapper::{Interval, Lapper};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::breakpoints::Strand;
use crate::chromosome::{ChromMapping, ChromStyle};
use crate::error::{RtError, RtResult};

/// index of an exon inside an [`Annotation`]
pub type ExonIdx = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exon {
    pub exon_id: String,
    pub chrom: String,
    /// 1-based, inclusive
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub gene_id: String,
    pub tx_names: Vec<String>,
}

impl Exon {
    pub fn boundary(&self, side: Boundary) -> u64 {
        match side {
            Boundary::Start => self.start,
            Boundary::End => self.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptInfo {
    pub tx_name: String,
    pub gene_id: String,
    /// None when the source does not supply it; derived from the exons then.
    pub exon_count: Option<usize>,
}

/// Read-only annotation snapshot: exons with their transcript membership,
/// transcript exon counts and transcript -> gene -> symbol resolution.
#[derive(Debug, Clone)]
pub struct Annotation {
    exons: Vec<Exon>,
    tx_exon_count: FxHashMap<String, usize>,
    /// counts supplied by the source; they survive chromosome pruning
    explicit_exon_count: FxHashMap<String, usize>,
    tx_genes: FxHashMap<String, BTreeSet<String>>,
    gene_symbols: FxHashMap<String, String>,
    chroms: ChromMapping,
}

impl Annotation {
    /// `transcripts` may be partial: transcripts only referenced by exons get
    /// their exon count and gene from the exon rows.
    pub fn new(
        exons: Vec<Exon>,
        transcripts: Vec<TranscriptInfo>,
        gene_symbols: Vec<(String, String)>,
    ) -> RtResult<Self> {
        if exons.is_empty() {
            return Err(RtError::InvalidInput(
                "Annotation snapshot has no exons".to_string(),
            ));
        }

        let mut chroms = ChromMapping::new();
        let mut tx_genes: FxHashMap<String, BTreeSet<String>> = FxHashMap::default();

        for exon in exons.iter() {
            if exon.end < exon.start {
                return Err(RtError::InvalidInput(format!(
                    "Exon {} has end {} before start {}",
                    exon.exon_id, exon.end, exon.start
                )));
            }
            chroms.add_chrom(&exon.chrom);
            for tx in exon.tx_names.iter() {
                if !exon.gene_id.is_empty() {
                    tx_genes
                        .entry(tx.clone())
                        .or_default()
                        .insert(exon.gene_id.clone());
                }
            }
        }

        let mut explicit_exon_count: FxHashMap<String, usize> = FxHashMap::default();
        for tx in transcripts {
            if let Some(count) = tx.exon_count {
                explicit_exon_count.insert(tx.tx_name.clone(), count);
            }
            if !tx.gene_id.is_empty() {
                tx_genes.entry(tx.tx_name).or_default().insert(tx.gene_id);
            }
        }

        let gene_symbols = gene_symbols
            .into_iter()
            .filter(|(_, symbol)| !symbol.is_empty())
            .collect::<FxHashMap<String, String>>();

        let tx_exon_count = count_exons(&exons, &explicit_exon_count);

        Ok(Annotation {
            exons,
            tx_exon_count,
            explicit_exon_count,
            tx_genes,
            gene_symbols,
            chroms,
        })
    }

    /// New snapshot renamed into `style` and restricted to canonical
    /// chromosomes. Exon counts are recounted over the kept exons unless the
    /// source supplied them. `self` is left untouched.
    pub fn normalized(&self, style: ChromStyle) -> RtResult<Annotation> {
        let dropped: FxHashSet<String> = self.chroms.non_canonical().into_iter().collect();

        let mut chroms = ChromMapping::new();
        let exons: Vec<Exon> = self
            .exons
            .iter()
            .filter(|exon| !dropped.contains(&exon.chrom))
            .map(|exon| {
                let mut exon = exon.clone();
                exon.chrom = style.rename(&exon.chrom);
                chroms.add_chrom(&exon.chrom);
                exon
            })
            .collect();

        if exons.is_empty() {
            return Err(RtError::InvalidInput(
                "Annotation has no exons on canonical chromosomes".to_string(),
            ));
        }

        let tx_exon_count = count_exons(&exons, &self.explicit_exon_count);
        let normalized = Annotation {
            exons,
            tx_exon_count,
            explicit_exon_count: self.explicit_exon_count.clone(),
            tx_genes: self.tx_genes.clone(),
            gene_symbols: self.gene_symbols.clone(),
            chroms,
        };

        info!(
            "Normalized annotation to {:?} style: {} of {} exons on {} chromosomes",
            style,
            normalized.len(),
            self.exons.len(),
            normalized.chroms.get_size()
        );
        debug!("Annotation chromosomes: {:?}", normalized.chrom_names());

        Ok(normalized)
    }

    pub fn exons(&self) -> &[Exon] {
        &self.exons
    }

    pub fn exon(&self, idx: ExonIdx) -> &Exon {
        &self.exons[idx]
    }

    pub fn len(&self) -> usize {
        self.exons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exons.is_empty()
    }

    pub fn chrom_names(&self) -> Vec<String> {
        self.chroms.get_chrom_names()
    }

    pub fn exon_count(&self, tx_name: &str) -> Option<usize> {
        self.tx_exon_count.get(tx_name).copied()
    }

    /// adjacent exon pairs of the transcript
    pub fn expected_junctions(&self, tx_name: &str) -> usize {
        self.exon_count(tx_name)
            .map(|n| n.saturating_sub(1))
            .unwrap_or(0)
    }

    /// transcript names of a set of exons
    pub fn transcripts_of(&self, exon_idxs: &[ExonIdx]) -> BTreeSet<String> {
        exon_idxs
            .iter()
            .flat_map(|idx| self.exons[*idx].tx_names.iter().cloned())
            .collect()
    }

    /// Gene symbols of a transcript. Transcripts without a gene, or genes
    /// without a symbol, resolve to nothing.
    pub fn gene_symbols_of(&self, tx_name: &str) -> BTreeSet<String> {
        match self.tx_genes.get(tx_name) {
            Some(genes) => genes
                .iter()
                .filter_map(|gene_id| self.gene_symbols.get(gene_id).cloned())
                .collect(),
            None => {
                debug!("Transcript {} has no gene", tx_name);
                BTreeSet::new()
            }
        }
    }
}

/// exons per transcript; `explicit` entries win
fn count_exons(
    exons: &[Exon],
    explicit: &FxHashMap<String, usize>,
) -> FxHashMap<String, usize> {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for tx in exons.iter().flat_map(|exon| exon.tx_names.iter()) {
        *counts.entry(tx.clone()).or_insert(0) += 1;
    }
    counts.extend(explicit.iter().map(|(tx, n)| (tx.clone(), *n)));
    counts
}

type IV = Interval<u64, ExonIdx>;

/// Per-chromosome index over one exon boundary, widened by `maxgap` on both
/// sides so that a point query returns every boundary within the gap.
#[derive(Debug, Clone)]
pub struct BoundaryIndex {
    tree: FxHashMap<String, Lapper<u64, ExonIdx>>,
    pub side: Boundary,
    pub maxgap: u64,
}

impl BoundaryIndex {
    pub fn new(annotation: &Annotation, side: Boundary, maxgap: u64) -> Self {
        let mut chrom_ivs: FxHashMap<String, Vec<IV>> = FxHashMap::default();
        for (idx, exon) in annotation.exons().iter().enumerate() {
            let boundary = exon.boundary(side);
            chrom_ivs.entry(exon.chrom.clone()).or_default().push(Interval {
                start: boundary.saturating_sub(maxgap),
                stop: boundary.saturating_add(maxgap).saturating_add(1),
                val: idx,
            });
        }

        let tree = chrom_ivs
            .into_iter()
            .map(|(chrom, ivs)| (chrom, Lapper::new(ivs)))
            .collect::<FxHashMap<String, Lapper<u64, ExonIdx>>>();

        if tree.is_empty() {
            warn!("Boundary index for {:?} is empty", side);
        }

        BoundaryIndex { tree, side, maxgap }
    }

    /// exons whose boundary lies within `maxgap` of `pos`, sorted
    pub fn find(&self, chrom: &str, pos: u64) -> Vec<ExonIdx> {
        match self.tree.get(chrom) {
            Some(lapper) => {
                let mut hits = lapper
                    .find(pos, pos.saturating_add(1))
                    .map(|iv| iv.val)
                    .collect::<Vec<ExonIdx>>();
                hits.sort_unstable();
                hits
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{exon, tx1_annotation};

    #[test]
    fn test_exon_count_is_derived() {
        let anno = tx1_annotation();
        assert_eq!(anno.exon_count("TX1"), Some(5));
        assert_eq!(anno.expected_junctions("TX1"), 4);
        assert_eq!(anno.expected_junctions("NOPE"), 0);
    }

    #[test]
    fn test_explicit_exon_count_wins() {
        let exons = vec![exon("E1", "chr1", 100, 200, "G1", &["T1"])];
        let anno = Annotation::new(
            exons,
            vec![TranscriptInfo {
                tx_name: "T1".to_string(),
                gene_id: "G1".to_string(),
                exon_count: Some(7),
            }],
            vec![],
        )
        .unwrap();
        assert_eq!(anno.expected_junctions("T1"), 6);
    }

    #[test]
    fn test_gene_symbol_resolution() {
        let exons = vec![
            exon("E1", "chr1", 100, 200, "G1", &["T1", "T2"]),
            exon("E2", "chr1", 300, 400, "G2", &["T2"]),
            exon("E3", "chr1", 500, 600, "G3", &["T3"]),
        ];
        let anno = Annotation::new(
            exons,
            vec![],
            vec![
                ("G1".to_string(), "ABC".to_string()),
                ("G2".to_string(), "XYZ".to_string()),
            ],
        )
        .unwrap();

        assert_eq!(
            anno.gene_symbols_of("T1").into_iter().collect::<Vec<_>>(),
            vec!["ABC".to_string()]
        );
        assert_eq!(anno.gene_symbols_of("T2").len(), 2);
        assert!(anno.gene_symbols_of("T3").is_empty());
        assert!(anno.gene_symbols_of("T4").is_empty());
    }

    #[test]
    fn test_empty_annotation_is_rejected() {
        assert!(matches!(
            Annotation::new(vec![], vec![], vec![]),
            Err(RtError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_normalized_renames_and_prunes() {
        let exons = vec![
            exon("E1", "1", 100, 200, "G1", &["T1"]),
            exon("E2", "GL000220.1", 100, 200, "G1", &["T1"]),
            exon("E3", "MT", 100, 200, "G9", &["T9"]),
        ];
        let anno = Annotation::new(exons, vec![], vec![]).unwrap();
        let norm = anno.normalized(ChromStyle::Ucsc).unwrap();
        assert_eq!(norm.len(), 1);
        assert_eq!(norm.exon(0).chrom, "chr1");
        assert_eq!(norm.chrom_names(), vec!["chr1".to_string()]);
        // the source snapshot is untouched
        assert_eq!(anno.len(), 3);
        assert_eq!(anno.exon(0).chrom, "1");
        // pruned copies no longer count
        assert_eq!(anno.exon_count("T1"), Some(2));
        assert_eq!(norm.exon_count("T1"), Some(1));
        assert_eq!(norm.exon_count("T9"), None);
    }

    #[test]
    fn test_normalized_keeps_explicit_exon_count() {
        let exons = vec![
            exon("E1", "chr1", 100, 200, "G1", &["T1", "T2"]),
            exon("E2", "chr1_KI270706v1_random", 300, 400, "G1", &["T1", "T2"]),
        ];
        let anno = Annotation::new(
            exons,
            vec![TranscriptInfo {
                tx_name: "T2".to_string(),
                gene_id: "G1".to_string(),
                exon_count: Some(4),
            }],
            vec![],
        )
        .unwrap();
        let norm = anno.normalized(ChromStyle::Ucsc).unwrap();
        assert_eq!(norm.exon_count("T1"), Some(1));
        assert_eq!(norm.exon_count("T2"), Some(4));
    }

    #[test]
    fn test_normalized_without_canonical_exons_fails() {
        let exons = vec![exon("E1", "chrUn_x", 100, 200, "G1", &["T1"])];
        let anno = Annotation::new(exons, vec![], vec![]).unwrap();
        assert!(anno.normalized(ChromStyle::Ucsc).is_err());
    }

    #[test]
    fn test_boundary_index_is_inclusive() {
        let exons = vec![exon("E1", "chr1", 1000, 1500, "G1", &["T1"])];
        let anno = Annotation::new(exons, vec![], vec![]).unwrap();

        let starts = BoundaryIndex::new(&anno, Boundary::Start, 100);
        assert_eq!(starts.find("chr1", 1100), vec![0]);
        assert_eq!(starts.find("chr1", 900), vec![0]);
        assert!(starts.find("chr1", 1101).is_empty());
        assert!(starts.find("chr1", 899).is_empty());
        assert!(starts.find("chr2", 1000).is_empty());

        let ends = BoundaryIndex::new(&anno, Boundary::End, 0);
        assert_eq!(ends.find("chr1", 1500), vec![0]);
        assert!(ends.find("chr1", 1501).is_empty());
        assert!(ends.find("chr1", 1499).is_empty());
    }

    #[test]
    fn test_boundary_index_near_zero() {
        let exons = vec![exon("E1", "chr1", 10, 50, "G1", &["T1"])];
        let anno = Annotation::new(exons, vec![], vec![]).unwrap();
        let starts = BoundaryIndex::new(&anno, Boundary::Start, 100);
        assert_eq!(starts.find("chr1", 0), vec![0]);
        assert_eq!(starts.find("chr1", 110), vec![0]);
        assert!(starts.find("chr1", 111).is_empty());
    }
}
