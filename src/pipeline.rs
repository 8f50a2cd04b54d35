use indexmap::IndexMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::breakpoints::BreakendSet;
use crate::classify::classify_pairs;
use crate::constants::{DEFAULT_MAXGAP, DEFAULT_MINSCORE};
use crate::error::{RtError, RtResult};
use crate::group::{group_by_gene, GeneResult};
use crate::matcher::match_breakends;
use crate::merge::{insertion_records, junction_records};
use crate::score::{filter_junctions, flag_insertions, score_transcripts, ScoreTable};

/// Tolerance and score threshold of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RtParams {
    /// max distance between a breakend and an exon boundary
    pub maxgap: u64,
    /// min fraction of a transcript's junctions that must be observed
    pub minscore: f64,
}

impl Default for RtParams {
    fn default() -> Self {
        RtParams {
            maxgap: DEFAULT_MAXGAP,
            minscore: DEFAULT_MINSCORE,
        }
    }
}

impl RtParams {
    pub fn validate(&self) -> RtResult<()> {
        if !(0.0..=1.0).contains(&self.minscore) {
            return Err(RtError::InvalidInput(format!(
                "minscore must be within [0, 1], got {}",
                self.minscore
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RtOutcome {
    Events(IndexMap<String, GeneResult>),
    NoEvents,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RtReport {
    pub params: RtParams,
    pub scores: ScoreTable,
    pub outcome: RtOutcome,
}

impl RtReport {
    pub fn genes(&self) -> Option<&IndexMap<String, GeneResult>> {
        match &self.outcome {
            RtOutcome::Events(genes) => Some(genes),
            RtOutcome::NoEvents => None,
        }
    }

    pub fn has_events(&self) -> bool {
        matches!(self.outcome, RtOutcome::Events(_))
    }
}

/// Detect retrotransposed transcript events.
///
/// The annotation is normalized to the chromosome style of the breakends and
/// restricted to canonical chromosomes before matching; the caller's snapshot
/// is not modified.
pub fn rt_detect(
    breakends: &BreakendSet,
    annotation: &Annotation,
    params: &RtParams,
) -> RtResult<RtReport> {
    params.validate()?;
    if breakends.is_empty() {
        return Err(RtError::InvalidInput(
            "Breakend collection is empty".to_string(),
        ));
    }
    if annotation.is_empty() {
        return Err(RtError::InvalidInput(
            "Annotation snapshot is empty".to_string(),
        ));
    }

    info!(
        "Searching {} breakends against {} exons (maxgap {}, minscore {})",
        breakends.len(),
        annotation.len(),
        params.maxgap,
        params.minscore
    );

    let annotation = annotation.normalized(breakends.chrom_style())?;

    let matches = match_breakends(breakends, &annotation, params.maxgap);
    let classified = classify_pairs(&matches, &annotation);

    let junctions = junction_records(&classified, breakends, &annotation);
    let insertions = insertion_records(&classified, breakends, &annotation, &junctions);

    let scores = score_transcripts(&junctions, breakends, &annotation);
    let passing = scores.passing(params.minscore);
    info!(
        "{} of {} transcripts reach minscore {}",
        passing.len(),
        scores.len(),
        params.minscore
    );

    let junctions = filter_junctions(junctions, &passing);
    let insertion_sites = flag_insertions(insertions, &passing);

    if junctions.is_empty() && insertion_sites.is_empty() {
        info!("No event detected");
        return Ok(RtReport {
            params: *params,
            scores,
            outcome: RtOutcome::NoEvents,
        });
    }

    let genes = group_by_gene(
        junctions.into_records(),
        insertion_sites,
        breakends,
        &annotation,
    )?;

    let outcome = if genes.is_empty() {
        warn!("Candidate records found, but none resolve to a gene symbol");
        info!("No event detected");
        RtOutcome::NoEvents
    } else {
        RtOutcome::Events(genes)
    };

    Ok(RtReport {
        params: *params,
        scores,
        outcome,
    })
}
