use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use flate2::read::MultiGzDecoder;
use indexmap::IndexMap;
use log::info;

use crate::annotation::{Annotation, Exon};
use crate::breakpoints::{Breakend, BreakendSet, Strand};
use crate::constants::MISSING_FIELD;
use crate::utils::is_gz_path;

/// Line reader over a plain or gzip file, chosen by the `.gz` suffix.
pub struct TableReader {
    file_name: String,
    inner: Box<dyn BufRead>,
}

impl TableReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let inner: Box<dyn BufRead> = if is_gz_path(path) {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(TableReader {
            file_name: path.display().to_string(),
            inner,
        })
    }

    pub fn from_reader<R: BufRead + 'static>(name: &str, reader: R) -> Self {
        TableReader {
            file_name: name.to_string(),
            inner: Box::new(reader),
        }
    }

    /// Non-empty, non-comment lines with their 1-based line number.
    pub fn data_lines(self) -> impl Iterator<Item = Result<(usize, String)>> {
        let file_name = self.file_name;
        self.inner
            .lines()
            .enumerate()
            .filter_map(move |(i, line)| match line {
                Ok(line) => {
                    let trimmed = line.trim_end_matches('\r');
                    if trimmed.is_empty() || trimmed.starts_with('#') {
                        None
                    } else {
                        Some(Ok((i + 1, trimmed.to_string())))
                    }
                }
                Err(e) => Some(Err(anyhow!("Failed to read {}: {}", file_name, e))),
            })
    }
}

/// `id  chrom  pos  strand  partner_id`
pub fn read_breakends(reader: TableReader) -> Result<BreakendSet> {
    let name = reader.file_name.clone();
    let mut breakends = Vec::new();
    for line in reader.data_lines() {
        let (lineno, line) = line?;
        let bnd = Breakend::parse_tsv_line(&line)
            .with_context(|| format!("{}:{}: malformed breakend row", name, lineno))?;
        breakends.push(bnd);
    }
    info!("Read {} breakends from {}", breakends.len(), name);
    BreakendSet::new(breakends).with_context(|| format!("Invalid breakends in {}", name))
}

pub fn read_breakends_file<P: AsRef<Path>>(path: P) -> Result<BreakendSet> {
    read_breakends(TableReader::new(path)?)
}

/// One row of the exon table: an exon in one transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ExonRow {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub exon_id: String,
    pub tx_name: String,
    pub gene_id: String,
    pub gene_symbol: Option<String>,
}

impl ExonRow {
    /// `chrom  start  end  strand  exon_id  transcript_name  gene_id  gene_symbol`
    pub fn parse_tsv_line(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('\t').map(str::trim).collect();
        if parts.len() < 8 {
            return Err(anyhow!(
                "Expected 8 columns in exon row, found {}",
                parts.len()
            ));
        }
        let optional = |v: &str| -> Option<String> {
            if v.is_empty() || v == MISSING_FIELD {
                None
            } else {
                Some(v.to_string())
            }
        };

        Ok(ExonRow {
            chrom: parts[0].to_string(),
            start: parts[1]
                .parse()
                .with_context(|| format!("Invalid exon start '{}'", parts[1]))?,
            end: parts[2]
                .parse()
                .with_context(|| format!("Invalid exon end '{}'", parts[2]))?,
            strand: parts[3].parse()?,
            exon_id: parts[4].to_string(),
            tx_name: parts[5].to_string(),
            gene_id: optional(parts[6]).unwrap_or_default(),
            gene_symbol: optional(parts[7]),
        })
    }
}

/// Build the annotation snapshot from exon rows; rows of the same exon in
/// different transcripts collapse into one exon.
pub fn read_annotation(reader: TableReader) -> Result<Annotation> {
    let name = reader.file_name.clone();
    let mut exons: IndexMap<(String, String, u64, u64), Exon> = IndexMap::new();
    let mut symbols: IndexMap<String, String> = IndexMap::new();
    let mut rows = 0usize;

    for line in reader.data_lines() {
        let (lineno, line) = line?;
        let row = ExonRow::parse_tsv_line(&line)
            .with_context(|| format!("{}:{}: malformed exon row", name, lineno))?;
        rows += 1;

        if let Some(symbol) = row.gene_symbol.as_ref() {
            if !row.gene_id.is_empty() {
                symbols.insert(row.gene_id.clone(), symbol.clone());
            }
        }

        let key = (row.exon_id.clone(), row.chrom.clone(), row.start, row.end);
        let exon = exons.entry(key).or_insert_with(|| Exon {
            exon_id: row.exon_id.clone(),
            chrom: row.chrom.clone(),
            start: row.start,
            end: row.end,
            strand: row.strand,
            gene_id: row.gene_id.clone(),
            tx_names: Vec::new(),
        });
        if !exon.tx_names.contains(&row.tx_name) {
            exon.tx_names.push(row.tx_name);
        }
    }

    info!(
        "Read {} exon rows ({} exons, {} gene symbols) from {}",
        rows,
        exons.len(),
        symbols.len(),
        name
    );

    Annotation::new(
        exons.into_values().collect(),
        Vec::new(),
        symbols.into_iter().collect(),
    )
    .with_context(|| format!("Invalid annotation in {}", name))
}

pub fn read_annotation_file<P: AsRef<Path>>(path: P) -> Result<Annotation> {
    read_annotation(TableReader::new(path)?)
}
