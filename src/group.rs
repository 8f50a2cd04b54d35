use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::annotation::Annotation;
use crate::breakpoints::{BreakendIdx, BreakendSet};
use crate::error::{RtError, RtResult};
use crate::merge::BreakendRecord;
use crate::score::InsertionSite;

/// Everything reported for one gene symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneResult {
    pub gene_symbol: String,
    pub junctions: Vec<BreakendRecord>,
    pub insertion_sites: Vec<InsertionSite>,
}

impl GeneResult {
    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty() && self.insertion_sites.is_empty()
    }
}

/// union of the gene symbols of all transcripts of the record
pub fn resolve_gene_symbols(record: &mut BreakendRecord, annotation: &Annotation) {
    let symbols: BTreeSet<String> = record
        .tx_names
        .iter()
        .flat_map(|tx| annotation.gene_symbols_of(tx))
        .collect();
    record.gene_symbols.extend(symbols);
}

/// Partition junction and insertion-site records by gene symbol.
///
/// A record appears under every symbol it resolves to. Insertion sites bring
/// their partner along even when the partner resolves to no gene. Genes are
/// ordered by symbol.
pub fn group_by_gene(
    junctions: Vec<BreakendRecord>,
    insertion_sites: Vec<InsertionSite>,
    breakends: &BreakendSet,
    annotation: &Annotation,
) -> RtResult<IndexMap<String, GeneResult>> {
    let junctions: Vec<BreakendRecord> = junctions
        .into_iter()
        .map(|mut record| {
            resolve_gene_symbols(&mut record, annotation);
            record
        })
        .collect();
    let insertion_sites: Vec<InsertionSite> = insertion_sites
        .into_iter()
        .map(|mut site| {
            resolve_gene_symbols(&mut site.record, annotation);
            site
        })
        .collect();

    let site_by_breakend: FxHashMap<BreakendIdx, usize> = insertion_sites
        .iter()
        .enumerate()
        .map(|(i, site)| (site.record.breakend, i))
        .collect();

    let genes: Vec<String> = junctions
        .iter()
        .flat_map(|r| r.gene_symbols.iter())
        .chain(insertion_sites.iter().flat_map(|s| s.record.gene_symbols.iter()))
        .cloned()
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();

    let results: Vec<GeneResult> = genes
        .par_iter()
        .map(|gene| -> RtResult<GeneResult> {
            let gene_junctions: Vec<BreakendRecord> = junctions
                .iter()
                .filter(|r| r.gene_symbols.contains(gene))
                .cloned()
                .collect();

            let mut included: FxHashSet<BreakendIdx> = FxHashSet::default();
            let mut site_idxs: Vec<usize> = Vec::new();
            for (i, site) in insertion_sites.iter().enumerate() {
                if !site.record.gene_symbols.contains(gene) {
                    continue;
                }
                if included.insert(site.record.breakend) {
                    site_idxs.push(i);
                }
                let partner = breakends.partner_of(site.record.breakend);
                let partner_site = *site_by_breakend.get(&partner).ok_or_else(|| {
                    RtError::Inconsistent(format!(
                        "Insertion site {} has no record for partner {}",
                        breakends.get(site.record.breakend).id,
                        breakends.get(partner).id
                    ))
                })?;
                if included.insert(partner) {
                    site_idxs.push(partner_site);
                }
            }
            site_idxs.sort_unstable();

            debug!(
                "{}: {} junction records, {} insertion-site records",
                gene,
                gene_junctions.len(),
                site_idxs.len()
            );

            Ok(GeneResult {
                gene_symbol: gene.clone(),
                junctions: gene_junctions,
                insertion_sites: site_idxs
                    .into_iter()
                    .map(|i| insertion_sites[i].clone())
                    .collect(),
            })
        })
        .collect::<RtResult<Vec<GeneResult>>>()?;

    info!("Grouped events into {} genes", results.len());

    Ok(results
        .into_iter()
        .map(|r| (r.gene_symbol.clone(), r))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    fn record(idx: BreakendIdx, txs: &[&str]) -> BreakendRecord {
        BreakendRecord {
            tx_names: txs.iter().map(|s| s.to_string()).collect(),
            ..BreakendRecord::bare(idx)
        }
    }

    fn site(idx: BreakendIdx, txs: &[&str]) -> InsertionSite {
        InsertionSite::flag(record(idx, txs), &FxHashSet::default())
    }

    #[test]
    fn test_partner_follows_insertion_site() {
        let bnds = breakend_set(insertion_breakends());
        let anno = tx1_annotation();
        let c1 = bnds.idx_of("C1").unwrap();
        let d1 = bnds.idx_of("D1").unwrap();

        let groups = group_by_gene(vec![], vec![site(c1, &["TX1"]), site(d1, &[])], &bnds, &anno)
            .unwrap();

        assert_eq!(groups.len(), 1);
        let gene1 = &groups["GENE1"];
        assert!(gene1.junctions.is_empty());
        let members: Vec<BreakendIdx> = gene1
            .insertion_sites
            .iter()
            .map(|s| s.record.breakend)
            .collect();
        assert_eq!(members.len(), 2);
        assert!(members.contains(&c1) && members.contains(&d1));
    }

    #[test]
    fn test_missing_partner_record_is_inconsistent() {
        let bnds = breakend_set(insertion_breakends());
        let anno = tx1_annotation();
        let c1 = bnds.idx_of("C1").unwrap();
        let res = group_by_gene(vec![], vec![site(c1, &["TX1"])], &bnds, &anno);
        assert!(matches!(res, Err(RtError::Inconsistent(_))));
    }

    #[test]
    fn test_record_under_every_gene() {
        let bnds = breakend_set(intronic_breakends());
        let anno = tx1_annotation();
        let groups = group_by_gene(
            vec![record(0, &["TX1", "TX2"]), record(1, &["TX1"])],
            vec![],
            &bnds,
            &anno,
        )
        .unwrap();

        assert_eq!(
            groups.keys().cloned().collect::<Vec<_>>(),
            vec!["GENE1".to_string(), "GENE2".to_string()]
        );
        assert_eq!(groups["GENE1"].junctions.len(), 2);
        assert_eq!(groups["GENE2"].junctions.len(), 1);
        assert!(groups["GENE1"].junctions[0].gene_symbols.contains("GENE2"));
    }

    #[test]
    fn test_unresolved_transcripts_are_skipped() {
        let bnds = breakend_set(intronic_breakends());
        let anno = tx1_annotation();
        let groups = group_by_gene(vec![record(0, &["UNKNOWN"])], vec![], &bnds, &anno).unwrap();
        assert!(groups.is_empty());
    }
}
