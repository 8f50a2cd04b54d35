use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::CANONICAL_CHROMS;
use crate::utils::{pad_chrom_prefix, trim_chr_prefix_to_upper};

/// Chromosome naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChromStyle {
    /// `chr1`, `chrX`
    Ucsc,
    /// `1`, `X`
    Ncbi,
}

impl ChromStyle {
    pub fn of(chrom: &str) -> ChromStyle {
        if chrom.to_ascii_lowercase().starts_with("chr") {
            ChromStyle::Ucsc
        } else {
            ChromStyle::Ncbi
        }
    }

    /// (UCSC, NCBI) name counts
    pub fn tally<'a, I>(names: I) -> (usize, usize)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (mut ucsc, mut ncbi) = (0usize, 0usize);
        for name in names {
            match ChromStyle::of(name) {
                ChromStyle::Ucsc => ucsc += 1,
                ChromStyle::Ncbi => ncbi += 1,
            }
        }
        (ucsc, ncbi)
    }

    /// Majority style of a set of names; ties and empty input fall back to UCSC.
    /// Names in the minority style will not match the normalized annotation.
    pub fn detect<'a, I>(names: I) -> ChromStyle
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (ucsc, ncbi) = ChromStyle::tally(names);
        let style = if ncbi > ucsc {
            ChromStyle::Ncbi
        } else {
            ChromStyle::Ucsc
        };
        if ucsc > 0 && ncbi > 0 {
            warn!(
                "Mixed chromosome naming: {} UCSC-style and {} NCBI-style names, using {:?}; \
                 the {} minority names will not match any exon",
                ucsc,
                ncbi,
                style,
                ucsc.min(ncbi)
            );
        }
        style
    }

    /// Rename `chrom` into this style. Mitochondrial names are unified to
    /// `chrM` / `MT`.
    pub fn rename(&self, chrom: &str) -> String {
        let core = trim_chr_prefix_to_upper(chrom);
        let core = match core.as_str() {
            "M" | "MT" => match self {
                ChromStyle::Ucsc => "M".to_string(),
                ChromStyle::Ncbi => "MT".to_string(),
            },
            _ => core,
        };
        match self {
            ChromStyle::Ucsc => pad_chrom_prefix(&core),
            ChromStyle::Ncbi => core,
        }
    }
}

pub fn is_canonical(chrom: &str) -> bool {
    let core = trim_chr_prefix_to_upper(chrom);
    CANONICAL_CHROMS.contains(&core.as_str())
}

/// Registry of chromosome names seen in a snapshot, in first-seen order.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChromMapping {
    pub name2id: IndexMap<String, u16>,
}

impl ChromMapping {
    pub fn new() -> ChromMapping {
        ChromMapping {
            name2id: IndexMap::new(),
        }
    }

    pub fn add_chrom(&mut self, chrom: &str) -> u16 {
        if let Some(idx) = self.name2id.get(chrom) {
            *idx
        } else {
            let idx = self.name2id.len() as u16;
            self.name2id.insert(chrom.to_string(), idx);
            idx
        }
    }

    pub fn get_size(&self) -> usize {
        self.name2id.len()
    }

    pub fn get_chrom_names(&self) -> Vec<String> {
        self.name2id.keys().cloned().collect()
    }

    /// Names that would be pruned by the canonical restriction.
    pub fn non_canonical(&self) -> Vec<String> {
        let dropped: Vec<String> = self
            .name2id
            .keys()
            .filter(|name| !is_canonical(name))
            .cloned()
            .collect();
        if !dropped.is_empty() {
            info!(
                "Drop {} non-canonical chromosomes from annotation",
                dropped.len()
            );
            debug!("Dropped chromosomes: {:?}", dropped);
        }
        dropped
    }
}
