//! Raw-to-CSV normalization
//!
//! The raw Pima files are column-aligned with runs of blanks between
//! fields and a leading indent on most rows. Normalization strips the
//! indent and collapses every blank run into a single comma so the
//! result can be read by a regular CSV reader.

use crate::error::{PimaError, Result};
use regex::Regex;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A raw input file paired with the CSV file it normalizes into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub raw: PathBuf,
    pub csv: PathBuf,
}

impl FilePair {
    pub fn new(raw: impl Into<PathBuf>, csv: impl Into<PathBuf>) -> Self {
        Self {
            raw: raw.into(),
            csv: csv.into(),
        }
    }
}

/// Line normalizer for whitespace-delimited tables
#[derive(Debug, Clone)]
pub struct Normalizer {
    leading: Regex,
    trailing: Regex,
    separator: Regex,
}

impl Normalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            leading: Regex::new(r"^[ \t]+")?,
            trailing: Regex::new(r"[ \t]+$")?,
            separator: Regex::new(r"[ \t]+")?,
        })
    }

    /// Normalize a single line (without its terminator).
    pub fn normalize_line(&self, line: &str) -> String {
        let line = line.trim_end_matches(['\r', '\n']);
        let line = self.leading.replace(line, "");
        let line = self.trailing.replace(&line, "");
        self.separator.replace_all(&line, ",").into_owned()
    }

    /// Normalize `raw` into `csv`, returning the number of lines written.
    pub fn normalize_file(&self, raw: &Path, csv: &Path) -> Result<usize> {
        let input = fs::File::open(raw).map_err(|e| {
            PimaError::DataError(format!("cannot open {}: {}", raw.display(), e))
        })?;

        if let Some(parent) = csv.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut output = BufWriter::new(fs::File::create(csv)?);

        let mut written = 0usize;
        for line in BufReader::new(input).lines() {
            let line = line?;
            writeln!(output, "{}", self.normalize_line(&line))?;
            written += 1;
        }
        output.flush()?;

        debug!(raw = %raw.display(), csv = %csv.display(), lines = written, "Normalized file");
        Ok(written)
    }

    /// Normalize each pair in order; returns line counts in the same order.
    pub fn normalize_pairs(&self, pairs: &[FilePair]) -> Result<Vec<usize>> {
        let counts = pairs
            .iter()
            .map(|pair| self.normalize_file(&pair.raw, &pair.csv))
            .collect::<Result<Vec<_>>>()?;
        info!(files = pairs.len(), "Raw datasets normalized");
        Ok(counts)
    }
}

/// Convenience wrapper over [`Normalizer::normalize_line`].
pub fn normalize_line(line: &str) -> Result<String> {
    Ok(Normalizer::new()?.normalize_line(line))
}
