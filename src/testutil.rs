use crate::annotation::{Annotation, Exon};
use crate::breakpoints::{Breakend, BreakendSet, Strand};

pub fn exon(id: &str, chrom: &str, start: u64, end: u64, gene: &str, txs: &[&str]) -> Exon {
    Exon {
        exon_id: id.to_string(),
        chrom: chrom.to_string(),
        start,
        end,
        strand: Strand::Forward,
        gene_id: gene.to_string(),
        tx_names: txs.iter().map(|t| t.to_string()).collect(),
    }
}

/// TX1 (gene G1 / GENE1): five 100bp exons at 1000, 2000, .. 5000 on `chrom`.
/// TX2 (gene G2 / GENE2): two exons on chr2-like `chrom2`.
pub fn tx_exons(chrom: &str, chrom2: &str) -> Vec<Exon> {
    let mut exons = (1..=5u64)
        .map(|i| {
            exon(
                &format!("E{}", i),
                chrom,
                i * 1000,
                i * 1000 + 100,
                "G1",
                &["TX1"],
            )
        })
        .collect::<Vec<Exon>>();
    exons.push(exon("F1", chrom2, 10000, 10200, "G2", &["TX2"]));
    exons.push(exon("F2", chrom2, 11000, 11200, "G2", &["TX2"]));
    exons
}

pub fn symbols() -> Vec<(String, String)> {
    vec![
        ("G1".to_string(), "GENE1".to_string()),
        ("G2".to_string(), "GENE2".to_string()),
    ]
}

pub fn tx1_annotation() -> Annotation {
    Annotation::new(tx_exons("chr1", "chr2"), vec![], symbols()).unwrap()
}

pub fn bnd(id: &str, chrom: &str, pos: u64, partner: &str) -> Breakend {
    Breakend::new(id, chrom, pos, Strand::Unknown, partner)
}

/// two intronic deletions of TX1: exon1|exon2 and exon3|exon4
pub fn intronic_breakends() -> Vec<Breakend> {
    vec![
        bnd("A1", "chr1", 2010, "B1"),
        bnd("B1", "chr1", 1095, "A1"),
        bnd("A2", "chr1", 4010, "B2"),
        bnd("B2", "chr1", 3095, "A2"),
    ]
}

/// start side of exon5 joined to deep intergenic chr5
pub fn insertion_breakends() -> Vec<Breakend> {
    vec![
        bnd("C1", "chr1", 5005, "D1"),
        bnd("D1", "chr5", 500000, "C1"),
    ]
}

pub fn breakend_set(breakends: Vec<Breakend>) -> BreakendSet {
    BreakendSet::new(breakends).unwrap()
}
