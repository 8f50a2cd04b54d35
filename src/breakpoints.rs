use std::fmt;
use std::str::FromStr;

use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::chromosome::ChromStyle;
use crate::error::{RtError, RtResult};

/// index of a breakend inside a [`BreakendSet`]
pub type BreakendIdx = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
    Unknown,
}

impl FromStr for Strand {
    type Err = RtError;

    fn from_str(s: &str) -> RtResult<Self> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "*" | "." => Ok(Strand::Unknown),
            other => Err(RtError::InvalidInput(format!(
                "Invalid strand '{}', expected one of + - *",
                other
            ))),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
            Strand::Unknown => "*",
        };
        write!(f, "{}", c)
    }
}

/// One end of a structural variant. `partner` holds the id of the other end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakend {
    pub id: String,
    pub chrom: String,
    pub pos: u64,
    pub strand: Strand,
    pub partner: String,
}

impl Breakend {
    pub fn new(id: &str, chrom: &str, pos: u64, strand: Strand, partner: &str) -> Self {
        Breakend {
            id: id.to_string(),
            chrom: chrom.to_string(),
            pos,
            strand,
            partner: partner.to_string(),
        }
    }

    /// `id  chrom  pos  strand  partner_id`, tab separated.
    pub fn parse_tsv_line(s: &str) -> RtResult<Self> {
        let mut parts = s.split('\t');
        let id = parts
            .next()
            .filter(|x| !x.is_empty())
            .ok_or_else(|| RtError::InvalidInput("Missing breakend id".to_string()))?
            .to_string();
        let chrom = parts
            .next()
            .ok_or_else(|| RtError::InvalidInput(format!("Missing chrom for {}", id)))?
            .to_string();
        let pos = parts
            .next()
            .ok_or_else(|| RtError::InvalidInput(format!("Missing pos for {}", id)))?
            .trim()
            .parse()?;
        let strand = parts
            .next()
            .ok_or_else(|| RtError::InvalidInput(format!("Missing strand for {}", id)))?
            .trim()
            .parse()?;
        let partner = parts
            .next()
            .ok_or_else(|| RtError::InvalidInput(format!("Missing partner for {}", id)))?
            .trim()
            .to_string();

        Ok(Breakend {
            id,
            chrom,
            pos,
            strand,
            partner,
        })
    }
}

/// Validated, immutable breakend collection with explicit partner resolution.
#[derive(Debug, Clone)]
pub struct BreakendSet {
    breakends: Vec<Breakend>,
    partners: Vec<BreakendIdx>,
    id2idx: FxHashMap<String, BreakendIdx>,
}

impl BreakendSet {
    /// Fails when the collection is empty, ids repeat, or a partner reference
    /// is missing or not reciprocal.
    pub fn new(breakends: Vec<Breakend>) -> RtResult<Self> {
        if breakends.is_empty() {
            return Err(RtError::InvalidInput(
                "Breakend collection is empty".to_string(),
            ));
        }

        let mut id2idx = FxHashMap::default();
        for (idx, bnd) in breakends.iter().enumerate() {
            if id2idx.insert(bnd.id.clone(), idx).is_some() {
                return Err(RtError::InvalidInput(format!(
                    "Duplicated breakend id {}",
                    bnd.id
                )));
            }
        }

        let mut partners = Vec::with_capacity(breakends.len());
        for bnd in breakends.iter() {
            let partner_idx = *id2idx.get(&bnd.partner).ok_or_else(|| {
                RtError::InvalidInput(format!(
                    "Partner {} of breakend {} is not in the collection",
                    bnd.partner, bnd.id
                ))
            })?;
            if partner_idx == id2idx[&bnd.id] {
                return Err(RtError::InvalidInput(format!(
                    "Breakend {} is its own partner",
                    bnd.id
                )));
            }
            if breakends[partner_idx].partner != bnd.id {
                return Err(RtError::InvalidInput(format!(
                    "Breakend pairing is not symmetric: {} -> {} -> {}",
                    bnd.id, bnd.partner, breakends[partner_idx].partner
                )));
            }
            partners.push(partner_idx);
        }

        debug!("Loaded {} breakends", breakends.len());

        Ok(BreakendSet {
            breakends,
            partners,
            id2idx,
        })
    }

    pub fn len(&self) -> usize {
        self.breakends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakends.is_empty()
    }

    pub fn get(&self, idx: BreakendIdx) -> &Breakend {
        &self.breakends[idx]
    }

    pub fn idx_of(&self, id: &str) -> Option<BreakendIdx> {
        self.id2idx.get(id).copied()
    }

    pub fn partner_of(&self, idx: BreakendIdx) -> BreakendIdx {
        self.partners[idx]
    }

    /// unordered key of the breakpoint pair containing `idx`
    pub fn pair_key(&self, idx: BreakendIdx) -> (BreakendIdx, BreakendIdx) {
        let partner = self.partners[idx];
        (idx.min(partner), idx.max(partner))
    }

    pub fn iter(&self) -> impl Iterator<Item = (BreakendIdx, &Breakend)> {
        self.breakends.iter().enumerate()
    }

    pub fn chrom_style(&self) -> ChromStyle {
        ChromStyle::detect(self.breakends.iter().map(|b| b.chrom.as_str()))
    }
}
