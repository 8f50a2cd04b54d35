use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::{write::GzEncoder, Compression};
use log::info;

use crate::breakpoints::BreakendSet;
use crate::constants::{MISSING_FIELD, RESULT_TABLE_HEADER, SCORE_TABLE_HEADER};
use crate::merge::BreakendRecord;
use crate::pipeline::{RtOutcome, RtReport};
use crate::utils::{is_gz_path, join_set};

/// Buffered writer that gzips when the path ends in `.gz`.
pub struct TableWriter {
    file_name: String,
    inner: Option<Box<dyn Write>>,
    gz: Option<GzEncoder<BufWriter<File>>>,
}

impl TableWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(&path)?;
        let fname = path.as_ref().to_string_lossy().to_string();

        if is_gz_path(&path) {
            Ok(TableWriter {
                file_name: fname,
                inner: None,
                gz: Some(GzEncoder::new(BufWriter::new(file), Compression::default())),
            })
        } else {
            Ok(TableWriter {
                file_name: fname,
                inner: Some(Box::new(BufWriter::new(file))),
                gz: None,
            })
        }
    }

    pub fn write_line(&mut self, fields: &[String]) -> io::Result<()> {
        let mut line = fields.join("\t");
        line.push('\n');
        self.write_all_bytes(line.as_bytes())
    }

    pub fn write_all_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if let Some(gz) = self.gz.as_mut() {
            gz.write_all(bytes)
        } else if let Some(w) = self.inner.as_mut() {
            w.write_all(bytes)
        } else {
            Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("Writer for {} has been finished", self.file_name),
            ))
        }
    }

    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(gz) = self.gz.take() {
            let mut buf = gz.finish()?;
            buf.flush()?;
        }
        if let Some(mut w) = self.inner.take() {
            w.flush()?;
        }
        Ok(())
    }
}

impl Drop for TableWriter {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            log::error!("Can not finish writer {}: {}", self.file_name, e);
        }
    }
}

fn record_fields(
    gene: &str,
    category: &str,
    record: &BreakendRecord,
    breakends: &BreakendSet,
) -> Vec<String> {
    let bnd = breakends.get(record.breakend);
    vec![
        gene.to_string(),
        category.to_string(),
        bnd.id.clone(),
        bnd.chrom.clone(),
        bnd.pos.to_string(),
        bnd.strand.to_string(),
        bnd.partner.clone(),
        join_set(&record.exon_ids),
        join_set(&record.tx_names),
        join_set(&record.gene_symbols),
    ]
}

/// Render the per-gene result table; a single header line when there are no
/// events.
pub fn result_lines(report: &RtReport, breakends: &BreakendSet) -> Vec<Vec<String>> {
    let mut lines = vec![RESULT_TABLE_HEADER.iter().map(|s| s.to_string()).collect()];

    let genes = match &report.outcome {
        RtOutcome::Events(genes) => genes,
        RtOutcome::NoEvents => return lines,
    };

    for (gene, result) in genes.iter() {
        for record in result.junctions.iter() {
            let mut fields = record_fields(gene, "junction", record, breakends);
            fields.push(MISSING_FIELD.to_string());
            fields.push(MISSING_FIELD.to_string());
            lines.push(fields);
        }
        for site in result.insertion_sites.iter() {
            let mut fields = record_fields(gene, "insertion_site", &site.record, breakends);
            let validated = if site.tx_validated.is_empty() {
                MISSING_FIELD.to_string()
            } else {
                site.tx_validated
                    .iter()
                    .map(|(tx, v)| format!("{}:{}", tx, v))
                    .collect::<Vec<String>>()
                    .join(",")
            };
            fields.push(validated);
            fields.push(site.junction_validated.to_string());
            lines.push(fields);
        }
    }
    lines
}

pub fn score_lines(report: &RtReport) -> Vec<Vec<String>> {
    let mut lines = vec![SCORE_TABLE_HEADER.iter().map(|s| s.to_string()).collect()];
    for score in report.scores.iter() {
        lines.push(vec![
            score.tx_name.clone(),
            score.supported.to_string(),
            score.expected.to_string(),
            format!("{:.4}", score.score),
            score.passes(report.params.minscore).to_string(),
        ]);
    }
    lines
}

fn write_lines<P: AsRef<Path>>(path: P, lines: &[Vec<String>]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = TableWriter::new(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    for line in lines {
        writer.write_line(line)?;
    }
    writer.finish()?;
    Ok(())
}

pub fn save_results<P: AsRef<Path>>(
    path: P,
    report: &RtReport,
    breakends: &BreakendSet,
) -> Result<()> {
    let lines = result_lines(report, breakends);
    info!(
        "Saving {} result rows to {}",
        lines.len() - 1,
        path.as_ref().display()
    );
    write_lines(path, &lines)
}

pub fn save_scores<P: AsRef<Path>>(path: P, report: &RtReport) -> Result<()> {
    info!(
        "Saving {} transcript scores to {}",
        report.scores.len(),
        path.as_ref().display()
    );
    write_lines(path, &score_lines(report))
}

pub fn save_json<P: AsRef<Path>>(path: P, report: &RtReport) -> Result<()> {
    let path = path.as_ref();
    let mut writer = TableWriter::new(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    let json = serde_json::to_vec_pretty(report)?;
    writer.write_all_bytes(&json)?;
    writer.finish()?;
    info!("Saved JSON report to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{rt_detect, RtParams};
    use crate::testutil::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::Builder;

    fn report() -> (RtReport, BreakendSet) {
        let mut all = intronic_breakends();
        all.extend(insertion_breakends());
        let bnds = breakend_set(all);
        let params = RtParams {
            maxgap: 50,
            minscore: 0.4,
        };
        (rt_detect(&bnds, &tx1_annotation(), &params).unwrap(), bnds)
    }

    #[test]
    fn test_result_lines() {
        let (report, bnds) = report();
        let lines = result_lines(&report, &bnds);
        // header + 4 junctions + 2 insertion-site rows
        assert_eq!(lines.len(), 7);
        assert!(lines.iter().all(|l| l.len() == RESULT_TABLE_HEADER.len()));

        let c1 = lines.iter().find(|l| l[2] == "C1").unwrap();
        assert_eq!(c1[1], "insertion_site");
        assert_eq!(c1[7], "E5");
        assert_eq!(c1[10], "TX1:true");
        assert_eq!(c1[11], "true");

        let d1 = lines.iter().find(|l| l[2] == "D1").unwrap();
        assert_eq!(d1[0], "GENE1");
        assert_eq!(d1[7], ".");
        assert_eq!(d1[11], "false");
    }

    #[test]
    fn test_score_lines() {
        let (report, _) = report();
        let lines = score_lines(&report);
        assert_eq!(lines[1], vec!["TX1", "2", "4", "0.5000", "true"]);
    }

    #[test]
    fn test_save_gz_round_trip() {
        let (report, bnds) = report();
        let file = Builder::new().suffix(".tsv.gz").tempfile().unwrap();
        save_results(file.path(), &report, &bnds).unwrap();

        let mut text = String::new();
        GzDecoder::new(File::open(file.path()).unwrap())
            .read_to_string(&mut text)
            .unwrap();

        assert!(text.starts_with("gene_symbol\tcategory"));
        assert_eq!(text.lines().count(), 7);
    }

    #[test]
    fn test_save_plain_scores() {
        let (report, _) = report();
        let file = Builder::new().suffix(".tsv").tempfile().unwrap();
        save_scores(file.path(), &report).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(text.lines().next(), Some("transcript_name\tsupported\texpected\tscore\tpassed"));
        assert!(text.contains("TX1\t2\t4\t0.5000\ttrue"));
    }
}
