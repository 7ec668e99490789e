//! # Transcoder
//!
//! Drives sentences through the [`SpanMachine`] into one of the format
//! emitters and reports what happened along the way.

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::emit::{BracketedEmitter, Emitter, TabularEmitter, TabularMode};
use crate::error::Result;
use crate::machine::{MachineStats, SpanMachine, Step};
use crate::reader::SentenceReader;
use crate::types::{Document, Sentence};

/// Target training format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// `<START:LABEL> ... <END>` inline spans, one sentence per line.
    #[default]
    Bracketed,
    /// `token\tlabel` records.
    Tabular,
}

impl OutputFormat {
    /// File extension used for this format's output files.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Bracketed => "train",
            OutputFormat::Tabular => "tsv",
        }
    }
}

/// Configuration for transcoding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranscodeOptions {
    /// Which format to emit
    pub format: OutputFormat,
    /// Sentence filter for the tab-separated format
    pub tabular_mode: TabularMode,
    /// Emit nothing for documents that never open a retention window
    pub require_window: bool,
}

impl TranscodeOptions {
    /// Create transcoding options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the tab-separated sentence filter.
    pub fn with_tabular_mode(mut self, mode: TabularMode) -> Self {
        self.tabular_mode = mode;
        self
    }

    /// Require a `B-START` before anything is emitted.
    pub fn with_require_window(mut self, required: bool) -> Self {
        self.require_window = required;
        self
    }
}

/// Per-document transcoding summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeSummary {
    /// Sentences pulled from the input.
    pub sentences: usize,
    /// Lines of output produced.
    pub output_lines: usize,
    #[serde(flatten)]
    pub machine: MachineStats,
}

/// A rendered document together with its summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoded {
    pub output: String,
    pub summary: TranscodeSummary,
}

/// Transcodes documents according to a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct Transcoder {
    options: TranscodeOptions,
}

impl Transcoder {
    pub fn new(options: TranscodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TranscodeOptions {
        &self.options
    }

    /// Transcode a lazily parsed sentence stream.
    ///
    /// Stops pulling sentences once the document's `B-END` is reached, so
    /// lines after the retention window are never parsed.
    pub fn run<I>(&self, sentences: I) -> Result<Transcoded>
    where
        I: IntoIterator<Item = Result<Sentence>>,
    {
        match self.options.format {
            OutputFormat::Bracketed => self.drive(sentences, BracketedEmitter::new()),
            OutputFormat::Tabular => {
                self.drive(sentences, TabularEmitter::new(self.options.tabular_mode))
            }
        }
    }

    /// Transcode a raw export stream.
    pub fn run_reader<R: BufRead>(&self, reader: R) -> Result<Transcoded> {
        self.run(SentenceReader::new(reader))
    }

    /// Transcode an already loaded document.
    pub fn run_document(&self, document: &Document) -> Result<Transcoded> {
        self.run(document.sentences.iter().cloned().map(Ok))
    }

    fn drive<I, E>(&self, sentences: I, mut emitter: E) -> Result<Transcoded>
    where
        I: IntoIterator<Item = Result<Sentence>>,
        E: Emitter,
    {
        let mut machine = SpanMachine::new();
        let mut count = 0;

        for sentence in sentences {
            let sentence = sentence?;
            count += 1;
            if machine.feed_sentence(&sentence, &mut emitter) == Step::Halt {
                break;
            }
        }

        let stats = machine.stats().clone();
        let mut output = emitter.finish();
        if self.options.require_window && !stats.saw_start {
            debug!("no retention window found, discarding output");
            output.clear();
        }

        Ok(Transcoded {
            summary: TranscodeSummary {
                sentences: count,
                output_lines: output.lines().count(),
                machine: stats,
            },
            output,
        })
    }
}
