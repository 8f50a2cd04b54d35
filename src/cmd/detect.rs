use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use log::{error, info};
use serde::Serialize;

use crate::constants::{DEFAULT_MAXGAP, DEFAULT_MINSCORE};
use crate::io::{read_annotation_file, read_breakends_file};
use crate::output::{save_json, save_results, save_scores};
use crate::pipeline::{rt_detect, RtParams};

#[derive(Parser, Debug, Serialize)]
#[command(name = "rtdetect detect")]
#[command(about = "
Detect retrotransposed transcripts from paired breakends and an exon annotation.
", long_about = None)]
#[clap(after_long_help = r#"
Examples:

rtdetect detect --breakends sample.bnd.tsv --exons exons.tsv.gz -o sample.rt.tsv

Format of the breakend table (tab separated, '#' lines are skipped):
id \t chrom \t pos \t strand \t partner_id

Format of the exon table, one row per exon per transcript:
chrom \t start \t end \t strand \t exon_id \t transcript_name \t gene_id \t gene_symbol

"#)]
pub struct DetectCli {
    /// breakend table, plain or gzipped
    #[arg(short, long)]
    pub breakends: PathBuf,

    /// exon annotation table, plain or gzipped
    #[arg(short, long)]
    pub exons: PathBuf,

    /// max distance between a breakend and an exon boundary
    #[arg(short, long, default_value_t = DEFAULT_MAXGAP)]
    pub maxgap: u64,

    /// min fraction of a transcript's junctions observed to keep its junction records
    #[arg(short = 's', long, default_value_t = DEFAULT_MINSCORE)]
    pub minscore: f64,

    /// per-gene result table; gzipped when the name ends in .gz
    #[arg(short, long)]
    pub output: PathBuf,

    /// per-transcript score table
    #[arg(long)]
    pub score_output: Option<PathBuf>,

    /// full report as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// number of threads
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Verbose mode
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

fn check_output_dir(flag: &str, path: &Path) -> bool {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return true,
    };
    if !parent.exists() {
        error!("{}: parent dir {} does not exist", flag, parent.display());
        return false;
    }
    true
}

impl DetectCli {
    pub fn params(&self) -> RtParams {
        RtParams {
            maxgap: self.maxgap,
            minscore: self.minscore,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut is_ok = true;

        if !self.breakends.exists() {
            error!(
                "--breakends: file {} does not exist",
                self.breakends.display()
            );
            is_ok = false;
        }

        if !self.exons.exists() {
            error!("--exons: file {} does not exist", self.exons.display());
            is_ok = false;
        }

        if !(0.0..=1.0).contains(&self.minscore) {
            error!("--minscore: {} is not within [0, 1]", self.minscore);
            is_ok = false;
        }

        if self.threads == 0 {
            error!("--threads: must be at least 1");
            is_ok = false;
        }

        is_ok &= check_output_dir("--output", &self.output);
        if let Some(p) = &self.score_output {
            is_ok &= check_output_dir("--score-output", p);
        }
        if let Some(p) = &self.json {
            is_ok &= check_output_dir("--json", p);
        }

        if !is_ok {
            bail!("Please check the input arguments!");
        }
        Ok(())
    }
}

fn greetings(args: &DetectCli) {
    match serde_json::to_string_pretty(&args) {
        Ok(json) => eprintln!("Parsed arguments:\n{}", json),
        Err(e) => eprintln!("Failed to print arguments: {}", e),
    }
}

pub fn run_detect(cli: &DetectCli) -> Result<()> {
    greetings(cli);
    cli.validate()?;

    let breakends = read_breakends_file(&cli.breakends)?;
    let annotation = read_annotation_file(&cli.exons)?;
    let params = cli.params();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build()?;
    let report = pool.install(|| rt_detect(&breakends, &annotation, &params))?;

    match report.genes() {
        Some(genes) => info!("Found candidate events in {} genes", genes.len()),
        None => info!("No retrotransposed transcript found"),
    }

    save_results(&cli.output, &report, &breakends)?;
    if let Some(path) = &cli.score_output {
        save_scores(path, &report)?;
    }
    if let Some(path) = &cli.json {
        save_json(path, &report)?;
    }

    info!("Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const BREAKENDS: &str = "#id\tchrom\tpos\tstrand\tpartner\n\
                             A1\tchr1\t2010\t+\tB1\n\
                             B1\tchr1\t1095\t-\tA1\n\
                             A2\tchr1\t4010\t+\tB2\n\
                             B2\tchr1\t3095\t-\tA2\n\
                             C1\tchr1\t5005\t+\tD1\n\
                             D1\tchr5\t500000\t-\tC1\n";

    fn exon_table() -> String {
        let mut text = String::new();
        for i in 1..=5u64 {
            text.push_str(&format!(
                "1\t{}\t{}\t+\tE{}\tTX1\tG1\tGENE1\n",
                i * 1000,
                i * 1000 + 100,
                i
            ));
        }
        text.push_str("GL000220.1\t100\t200\t+\tU1\tTX9\tG9\tGENE9\n");
        text
    }

    fn cli(dir: &Path) -> DetectCli {
        DetectCli {
            breakends: dir.join("bnd.tsv"),
            exons: dir.join("exons.tsv"),
            maxgap: 50,
            minscore: DEFAULT_MINSCORE,
            output: dir.join("out.tsv"),
            score_output: Some(dir.join("scores.tsv")),
            json: Some(dir.join("report.json")),
            threads: 2,
            verbose: false,
        }
    }

    #[test]
    fn test_run_detect_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("bnd.tsv"), BREAKENDS).unwrap();
        fs::write(dir.join("exons.tsv"), exon_table()).unwrap();

        let cli = cli(dir);
        run_detect(&cli).unwrap();

        let out = fs::read_to_string(&cli.output).unwrap();
        let rows: Vec<&str> = out.lines().collect();
        assert!(rows[0].starts_with("gene_symbol\tcategory"));
        assert_eq!(rows.len(), 7);
        assert!(rows[1..].iter().all(|r| r.starts_with("GENE1\t")));

        let scores = fs::read_to_string(dir.join("scores.tsv")).unwrap();
        assert!(scores.contains("TX1\t2\t4\t0.5000\ttrue"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("report.json")).unwrap()).unwrap();
        assert!(json["outcome"]["Events"]["GENE1"].is_object());
    }

    #[test]
    fn test_validate_rejects_bad_arguments() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("bnd.tsv"), BREAKENDS).unwrap();
        fs::write(dir.join("exons.tsv"), exon_table()).unwrap();
        assert!(cli(dir).validate().is_ok());

        let mut bad = cli(dir);
        bad.minscore = 2.0;
        assert!(bad.validate().is_err());

        let mut bad = cli(dir);
        bad.threads = 0;
        assert!(bad.validate().is_err());

        let mut bad = cli(dir);
        bad.exons = dir.join("missing.tsv");
        assert!(bad.validate().is_err());

        let mut bad = cli(dir);
        bad.json = Some(dir.join("no_such_dir").join("report.json"));
        assert!(bad.validate().is_err());
    }
}
