pub const DEFAULT_MAXGAP: u64 = 100;
pub const DEFAULT_MINSCORE: f64 = 0.4;

/// canonical sequence levels kept from the annotation, in the order of the
/// reference sequence dictionary (first 24 levels).
pub const CANONICAL_CHROMS: [&str; 24] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "X", "Y",
];

pub const MISSING_FIELD: &str = ".";

pub const RESULT_TABLE_HEADER: [&str; 12] = [
    "gene_symbol",
    "category",
    "breakend_id",
    "chrom",
    "pos",
    "strand",
    "partner_id",
    "exon_ids",
    "transcript_names",
    "gene_symbols",
    "transcript_validated",
    "junction_validated",
];

pub const SCORE_TABLE_HEADER: [&str; 5] =
    ["transcript_name", "supported", "expected", "score", "passed"];
