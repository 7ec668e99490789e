//! # Corpus Transcoding
//!
//! File-level driver: reads every export in a directory, transcodes it and
//! writes the training file next to its siblings in the output directory.
//! One bad file never stops the batch; failures are logged and collected.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConllError, Result};
use crate::naming::output_name;
use crate::reader::SentenceReader;
use crate::transcode::{TranscodeOptions, TranscodeSummary, Transcoder};
use crate::trim::{SectionTrimmer, TrimConfig, TrimReport};

/// Extension of WebAnno CoNLL exports.
pub const EXPORT_EXTENSION: &str = "conll";

/// Configuration for a corpus run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusOptions {
    pub transcode: TranscodeOptions,
    /// Trim each output to its section after transcoding
    pub trim: Option<TrimConfig>,
    /// Descend one level into per-domain subdirectories
    pub recursive: bool,
}

/// A successfully transcoded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub summary: TranscodeSummary,
    pub trim: Option<TrimReport>,
}

/// A file that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub input: PathBuf,
    pub error: String,
}

/// Result of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub processed: Vec<FileOutcome>,
    pub failed: Vec<FileFailure>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Transcodes files and directories of exports.
#[derive(Debug, Clone)]
pub struct CorpusTranscoder {
    transcoder: Transcoder,
    trimmer: Option<SectionTrimmer>,
    recursive: bool,
}

impl CorpusTranscoder {
    /// Build a corpus transcoder, compiling the trim markers if trimming is on.
    pub fn new(options: CorpusOptions) -> Result<Self> {
        let trimmer = options.trim.map(SectionTrimmer::new).transpose()?;
        Ok(Self {
            transcoder: Transcoder::new(options.transcode),
            trimmer,
            recursive: options.recursive,
        })
    }

    /// Transcode a single export into `output_dir`.
    ///
    /// Nothing is written unless the whole document transcodes cleanly.
    pub fn transcode_file(&self, input: &Path, output_dir: &Path) -> Result<FileOutcome> {
        let name = output_name(input, self.transcoder.options().format)?;
        let reader = SentenceReader::open(input)?;
        let transcoded = self.transcoder.run(reader).map_err(|e| e.at(input))?;

        fs::create_dir_all(output_dir).map_err(|e| ConllError::from(e).at(output_dir))?;
        let written = output_dir.join(name);
        fs::write(&written, &transcoded.output).map_err(|e| ConllError::from(e).at(&written))?;

        let (output, trim) = match &self.trimmer {
            Some(trimmer) => {
                let trimmed = trimmer.trimmed_path(&written)?;
                let report = trimmer.trim_file(written, &trimmed)?;
                (trimmed, Some(report))
            }
            None => (written, None),
        };

        info!(
            input = %input.display(),
            output = %output.display(),
            sentences = transcoded.summary.sentences,
            spans = transcoded.summary.machine.spans,
            "transcoded"
        );
        Ok(FileOutcome {
            input: input.to_path_buf(),
            output,
            summary: transcoded.summary,
            trim,
        })
    }

    /// Transcode every export under `input_dir`.
    ///
    /// With `recursive` set, exports inside immediate subdirectories are
    /// written to the same-named subdirectory of `output_dir`.
    ///
    /// # Errors
    ///
    /// Fails only if `input_dir` itself cannot be listed; per-file errors
    /// end up in [`BatchReport::failed`].
    pub fn transcode_dir(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        self.transcode_level(input_dir, output_dir, self.recursive, &mut report)?;
        info!(
            processed = report.processed.len(),
            failed = report.failed.len(),
            "batch complete"
        );
        Ok(report)
    }

    fn transcode_level(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        descend: bool,
        report: &mut BatchReport,
    ) -> Result<()> {
        let (files, dirs) = list_exports(input_dir)?;

        for file in files {
            match self.transcode_file(&file, output_dir) {
                Ok(outcome) => report.processed.push(outcome),
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "skipping file");
                    report.failed.push(FileFailure {
                        input: file,
                        error: e.to_string(),
                    });
                }
            }
        }

        if descend {
            for dir in dirs {
                let Some(domain) = dir.file_name() else {
                    continue;
                };
                let target = output_dir.join(domain);
                if let Err(e) = self.transcode_level(&dir, &target, false, report) {
                    warn!(dir = %dir.display(), error = %e, "skipping directory");
                }
            }
        }
        Ok(())
    }
}

/// Sorted export files and subdirectories of `dir`.
fn list_exports(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ConllError::from(e).at(dir))? {
        let path = entry.map_err(|e| ConllError::from(e).at(dir))?.path();
        if path.is_dir() {
            dirs.push(path);
        } else if path.extension().and_then(|e| e.to_str()) == Some(EXPORT_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    dirs.sort();
    Ok((files, dirs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::TabularMode;
    use crate::transcode::OutputFormat;

    const EXPORT: &str = "Cover O\n\nItem B-START\n1 O\n\nWe O\nsell O\ncoal B-GOODS\n. O\n";

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let exports = dir.path().join("conll");
        fs::create_dir_all(exports.join("mining")).unwrap();
        fs::write(exports.join("Peabody%2520Energy.conll"), EXPORT).unwrap();
        fs::write(exports.join("broken.conll"), "lonely\n").unwrap();
        fs::write(exports.join("notes.txt"), "ignored").unwrap();
        fs::write(exports.join("mining").join("Arch.conll"), EXPORT).unwrap();
        dir
    }

    #[test]
    fn test_batch_skips_bad_files() {
        let dir = setup();
        let out = dir.path().join("out");
        let corpus = CorpusTranscoder::new(CorpusOptions::default()).unwrap();
        let report = corpus.transcode_dir(&dir.path().join("conll"), &out).unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].input.ends_with("broken.conll"));
        assert_eq!(
            fs::read_to_string(out.join("Peabody Energy.train")).unwrap(),
            "1\nWe sell <START:GOODS> coal <END> .\n"
        );
        assert!(!out.join("broken.train").exists());
    }

    #[test]
    fn test_recursive_preserves_domains() {
        let dir = setup();
        let out = dir.path().join("out");
        let options = CorpusOptions {
            transcode: TranscodeOptions::new()
                .with_format(OutputFormat::Tabular)
                .with_tabular_mode(TabularMode::EntitiesOnly),
            recursive: true,
            ..CorpusOptions::default()
        };
        let report = CorpusTranscoder::new(options)
            .unwrap()
            .transcode_dir(&dir.path().join("conll"), &out)
            .unwrap();

        assert_eq!(report.processed.len(), 2);
        assert_eq!(
            fs::read_to_string(out.join("mining").join("Arch.tsv")).unwrap(),
            "We\tO\nsell\tO\ncoal\tGOODS\n.\tO\n"
        );
    }

    #[test]
    fn test_trim_post_pass_replaces_intermediate() {
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join("acme.conll");
        fs::write(&export, "Intro O\n\nItem B-START\n1 O\n\nBody O\n").unwrap();
        let out = dir.path().join("out");

        let options = CorpusOptions {
            trim: Some(TrimConfig::new().with_markers("body", "never")),
            ..CorpusOptions::default()
        };
        let outcome = CorpusTranscoder::new(options)
            .unwrap()
            .transcode_file(&export, &out)
            .unwrap();

        assert_eq!(outcome.output, out.join("acme-p1.train"));
        assert!(!out.join("acme.train").exists());
        assert_eq!(fs::read_to_string(&outcome.output).unwrap(), "Body\n");
        assert_eq!(outcome.trim.unwrap().start_line, Some(2));
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let dir = setup();
        let out = dir.path().join("out");
        let corpus = CorpusTranscoder::new(CorpusOptions::default()).unwrap();
        let input = dir.path().join("conll").join("Peabody%2520Energy.conll");

        corpus.transcode_file(&input, &out).unwrap();
        let first = fs::read(out.join("Peabody Energy.train")).unwrap();
        corpus.transcode_file(&input, &out).unwrap();
        let second = fs::read(out.join("Peabody Energy.train")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_input_dir_is_error() {
        let corpus = CorpusTranscoder::new(CorpusOptions::default()).unwrap();
        let err = corpus
            .transcode_dir(Path::new("/no/such/dir"), Path::new("/tmp/unused"))
            .unwrap_err();
        assert!(matches!(err, ConllError::Io { .. }));
    }

    #[test]
    fn test_report_serializes() {
        let report = BatchReport {
            processed: Vec::new(),
            failed: vec![FileFailure {
                input: PathBuf::from("a.conll"),
                error: "bad".into(),
            }],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"failed\""));
        assert!(report.has_failures());
    }
}
