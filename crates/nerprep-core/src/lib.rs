//! # nerprep Core
//!
//! Turns WebAnno CoNLL exports into training files for NER backends.
//! A [`SentenceReader`] parses the export, the [`SpanMachine`] interprets
//! the BIO tag stream, and an emitter renders either the bracketed inline
//! format or the tab-separated token format.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::io::Cursor;
//! use nerprep_core::Transcoder;
//!
//! let export = "t0 O\nt1 B-GOODS\nt2 I-GOODS\nt3 O\n";
//! let result = Transcoder::default().run_reader(Cursor::new(export)).unwrap();
//!
//! assert_eq!(result.output, "t0 <START:GOODS> t1 t2 <END> t3\n");
//! ```
pub mod corpus;
pub mod emit;
pub mod error;
pub mod machine;
pub mod naming;
pub mod reader;
pub mod tags;
pub mod transcode;
pub mod trim;
pub mod types;

// Re-export primary API
pub use corpus::{BatchReport, CorpusOptions, CorpusTranscoder, FileFailure, FileOutcome};
pub use emit::{BracketedEmitter, Emitter, TabularEmitter, TabularMode};
pub use error::{ConllError, Result};
pub use machine::{Event, EventSink, SpanMachine, SpanState, Step};
pub use reader::{SentenceReader, read_document};
pub use tags::{BioTag, Label};
pub use transcode::{OutputFormat, TranscodeOptions, TranscodeSummary, Transcoded, Transcoder};
pub use trim::{SectionTrimmer, TrimConfig, TrimReport};
pub use types::{Document, Sentence, Token};
