use std::collections::BTreeSet;
use std::path::Path;

use crate::constants::MISSING_FIELD;

pub fn trim_chr_prefix_to_upper(chrom: &str) -> String {
    let upper = chrom.to_ascii_uppercase();
    upper.strip_prefix("CHR").unwrap_or(&upper).to_string()
}

pub fn pad_chrom_prefix(chrom: &str) -> String {
    if chrom.starts_with("chr") {
        chrom.to_string()
    } else {
        format!("chr{}", chrom)
    }
}

pub fn is_gz_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// comma-joined set, `.` for an empty set.
pub fn join_set(set: &BTreeSet<String>) -> String {
    if set.is_empty() {
        MISSING_FIELD.to_string()
    } else {
        set.iter().map(String::as_str).collect::<Vec<&str>>().join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_chr_prefix() {
        assert_eq!(trim_chr_prefix_to_upper("chr1"), "1");
        assert_eq!(trim_chr_prefix_to_upper("chrX"), "X");
        assert_eq!(trim_chr_prefix_to_upper("x"), "X");
        assert_eq!(trim_chr_prefix_to_upper("Chr22"), "22");
    }

    #[test]
    fn test_gz_suffix() {
        assert!(is_gz_path("out.tsv.gz"));
        assert!(!is_gz_path("out.tsv"));
        assert!(is_gz_path("/data/exons.GZ"));
    }

    #[test]
    fn test_join_set() {
        let mut s = BTreeSet::new();
        assert_eq!(join_set(&s), ".");
        s.insert("b".to_string());
        s.insert("a".to_string());
        assert_eq!(join_set(&s), "a,b");
    }
}
