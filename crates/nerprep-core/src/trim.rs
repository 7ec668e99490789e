//! # Section Trimmer
//!
//! Keeps only the part of a document between a start marker and an end
//! marker. Annual reports carry a long preamble before "Item 1" and a tail
//! after "Mine Safety Disclosures"; both are dropped. Matching is
//! case-insensitive and line based.
//!
//! The end marker only counts once the line number exceeds
//! [`TrimConfig::min_end_line`], so a table of contents near the top of
//! the file cannot end the section early.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConllError, Result};
use crate::naming::{SECTION_SUFFIX, with_suffix};

/// Configuration for the trimmer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimConfig {
    /// Literal text opening the retained section
    pub start_marker: String,
    /// Literal text closing the retained section
    pub end_marker: String,
    /// The end marker is ignored on lines numbered at or below this
    pub min_end_line: usize,
    /// Skip lines consisting of a lone `.` (tokenizer debris)
    pub drop_lone_periods: bool,
    /// Suffix added to the trimmed file name
    pub suffix: String,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            start_marker: "item 1".to_string(),
            end_marker: "mine safety disclosures".to_string(),
            min_end_line: 150,
            drop_lone_periods: true,
            suffix: SECTION_SUFFIX.to_string(),
        }
    }
}

impl TrimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markers(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_marker = start.into();
        self.end_marker = end.into();
        self
    }

    pub fn with_min_end_line(mut self, line: usize) -> Self {
        self.min_end_line = line;
        self
    }

    pub fn with_drop_lone_periods(mut self, drop: bool) -> Self {
        self.drop_lone_periods = drop;
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}

/// What the trimmer found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimReport {
    pub lines_read: usize,
    pub lines_retained: usize,
    /// 1-based line of the first start marker, if any
    pub start_line: Option<usize>,
    /// 1-based line of the accepted end marker, if any
    pub end_line: Option<usize>,
}

impl TrimReport {
    /// Whether anything was retained at all.
    pub fn found_section(&self) -> bool {
        self.start_line.is_some()
    }
}

/// Compiled section trimmer.
#[derive(Debug, Clone)]
pub struct SectionTrimmer {
    config: TrimConfig,
    start: Regex,
    end: Regex,
}

fn literal_matcher(marker: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(&regex::escape(marker))
        .case_insensitive(true)
        .build()?)
}

impl SectionTrimmer {
    /// Compile the markers of `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConllError::Marker` if a marker cannot be compiled
    /// (for instance when it exceeds the regex size limit).
    pub fn new(config: TrimConfig) -> Result<Self> {
        Ok(Self {
            start: literal_matcher(&config.start_marker)?,
            end: literal_matcher(&config.end_marker)?,
            config,
        })
    }

    pub fn config(&self) -> &TrimConfig {
        &self.config
    }

    /// Copy the retained section of `reader` into `writer`.
    pub fn trim_stream<R: BufRead, W: Write>(
        &self,
        reader: R,
        mut writer: W,
    ) -> Result<TrimReport> {
        let mut report = TrimReport::default();

        for line in reader.lines() {
            let line = line?;
            report.lines_read += 1;
            let line_no = report.lines_read;

            if self.config.drop_lone_periods && line.trim() == "." {
                continue;
            }
            if report.start_line.is_none() && self.start.is_match(&line) {
                debug!(line = line_no, "section start marker");
                report.start_line = Some(line_no);
            }
            if report.start_line.is_some() {
                writeln!(writer, "{line}")?;
                report.lines_retained += 1;
            }
            if line_no > self.config.min_end_line && self.end.is_match(&line) {
                debug!(line = line_no, "section end marker");
                report.end_line = Some(line_no);
                break;
            }
        }

        writer.flush()?;
        Ok(report)
    }

    /// Trim an in-memory document.
    pub fn trim_str(&self, text: &str) -> Result<(String, TrimReport)> {
        let mut out = Vec::new();
        let report = self.trim_stream(Cursor::new(text), &mut out)?;
        let trimmed = String::from_utf8(out)
            .map_err(|e| ConllError::Stream(std::io::Error::other(e)))?;
        Ok((trimmed, report))
    }

    /// Where [`trim_file`](Self::trim_file) writes the trimmed copy of `path`.
    pub fn trimmed_path(&self, path: &Path) -> Result<PathBuf> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ConllError::BadFileName(path.to_path_buf()))?;
        Ok(path.with_file_name(with_suffix(name, &self.config.suffix)))
    }

    /// Trim `input` into `output`, leaving `input` untouched.
    pub fn trim_copy(&self, input: &Path, output: &Path) -> Result<TrimReport> {
        if input == output {
            return Err(ConllError::BadFileName(input.to_path_buf()));
        }
        let source = File::open(input).map_err(|e| ConllError::from(e).at(input))?;
        let out = File::create(output).map_err(|e| ConllError::from(e).at(output))?;
        let report = self
            .trim_stream(BufReader::new(source), BufWriter::new(out))
            .map_err(|e| e.at(output))?;

        if report.found_section() {
            info!(
                file = %output.display(),
                start = report.start_line,
                end = report.end_line,
                retained = report.lines_retained,
                "trimmed section"
            );
        } else {
            info!(file = %output.display(), "no start marker, nothing retained");
        }
        Ok(report)
    }

    /// Trim `intermediate` into `output`, then delete `intermediate`.
    ///
    /// The intermediate file is removed only after the trimmed copy has been
    /// written completely; on any error it is left in place.
    pub fn trim_file(&self, intermediate: PathBuf, output: &Path) -> Result<TrimReport> {
        let report = self.trim_copy(&intermediate, output)?;
        fs::remove_file(&intermediate).map_err(|e| ConllError::from(e).at(&intermediate))?;
        Ok(report)
    }
}
