use crate::error::{CliError, Result};
use anyhow::anyhow;
use primerpp::core::alignment::LibraryEntry;
use primerpp::core::models::sequence::is_iupac;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, warn};

/// Reads a FASTA repeat library.
///
/// A header may end in `*WEIGHT` (e.g. `>Alu consensus *1.5`) to scale that
/// entry's similarity scores. Entries without any bases are skipped.
pub fn read_library(path: &Path) -> Result<Vec<LibraryEntry>> {
    debug!("Loading sequence library from file: {:?}", path);
    let file = std::fs::File::open(path)?;
    parse_library(std::io::BufReader::new(file)).map_err(|source| CliError::FileParsing {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_library<R: BufRead>(reader: R) -> anyhow::Result<Vec<LibraryEntry>> {
    let mut entries = Vec::new();
    let mut current: Option<(String, f64, String)> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            if let Some(entry) = current.take() {
                push_entry(&mut entries, entry);
            }
            let (name, weight) = parse_header(header, line_no + 1)?;
            current = Some((name, weight, String::new()));
            continue;
        }

        let Some((_, _, sequence)) = current.as_mut() else {
            return Err(anyhow!("line {}: sequence data before the first '>' header", line_no + 1));
        };
        for (column, base) in line.bytes().enumerate() {
            if base.is_ascii_whitespace() {
                continue;
            }
            if !is_iupac(base) {
                return Err(anyhow!(
                    "line {}, column {}: '{}' is not a nucleotide code",
                    line_no + 1,
                    column + 1,
                    base as char
                ));
            }
            sequence.push(base.to_ascii_uppercase() as char);
        }
    }
    if let Some(entry) = current.take() {
        push_entry(&mut entries, entry);
    }
    Ok(entries)
}

fn parse_header(header: &str, line_no: usize) -> anyhow::Result<(String, f64)> {
    match header.rsplit_once('*') {
        Some((name, weight)) => {
            let weight: f64 = weight
                .trim()
                .parse()
                .map_err(|_| anyhow!("line {}: invalid weight '{}' in header", line_no, weight.trim()))?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(anyhow!("line {}: weight must be non-negative, got {}", line_no, weight));
            }
            Ok((name.trim().to_string(), weight))
        }
        None => Ok((header.trim().to_string(), 1.0)),
    }
}

fn push_entry(entries: &mut Vec<LibraryEntry>, (name, weight, sequence): (String, f64, String)) {
    if sequence.is_empty() {
        warn!("Skipping library entry '{}' because it has no sequence.", name);
        return;
    }
    entries.push(LibraryEntry::new(name, sequence).with_weight(weight));
}
