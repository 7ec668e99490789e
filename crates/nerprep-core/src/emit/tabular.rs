//! # Tab-Separated Token Format
//!
//! One `token\tlabel` record per line, sentences separated by a blank line.
//! Entity tokens carry the bare class (`GOODS`, not `B-GOODS`); everything
//! else is labelled `O`. This is the column format read by Stanford-style
//! CRF trainers with `map = word=0,answer=1`.

use serde::{Deserialize, Serialize};

use crate::emit::Emitter;
use crate::machine::{Event, EventSink};

/// Label written for tokens outside any entity.
pub const OUTSIDE_LABEL: &str = "O";

/// Literal sentence terminator injected at the end of the retention window.
pub const TERMINATOR: &str = ".";

/// Which sentences reach the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TabularMode {
    /// Every sentence.
    #[default]
    All,
    /// Only sentences containing at least one real entity token.
    EntitiesOnly,
}

/// Renders machine events as tab-separated token records.
#[derive(Debug, Default)]
pub struct TabularEmitter {
    mode: TabularMode,
    out: String,
    sentence: String,
    has_entity: bool,
    done: bool,
}

impl TabularEmitter {
    pub fn new(mode: TabularMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    fn push_record(&mut self, text: &str, label: &str) {
        self.sentence.push_str(text);
        self.sentence.push('\t');
        self.sentence.push_str(label);
        self.sentence.push('\n');
    }

    fn flush_sentence(&mut self) {
        let keep = match self.mode {
            TabularMode::All => true,
            TabularMode::EntitiesOnly => self.has_entity,
        };
        if keep && !self.sentence.is_empty() {
            if !self.out.is_empty() {
                self.out.push('\n');
            }
            self.out.push_str(&self.sentence);
        }
        self.sentence.clear();
        self.has_entity = false;
    }
}

impl EventSink for TabularEmitter {
    fn event(&mut self, event: Event<'_>) {
        if self.done {
            return;
        }
        match event {
            Event::SectionStart { boundary } => {
                self.out.clear();
                self.sentence.clear();
                self.has_entity = false;
                self.push_record(boundary, OUTSIDE_LABEL);
            }
            Event::Word { text, label } => {
                if label.is_some() {
                    self.has_entity = true;
                }
                self.push_record(text, label.unwrap_or(OUTSIDE_LABEL));
            }
            Event::SpanOpen { .. } | Event::SpanClose => {}
            Event::SentenceEnd => self.flush_sentence(),
            Event::SectionEnd { terminator } => {
                self.push_record(terminator, OUTSIDE_LABEL);
                if terminator != TERMINATOR {
                    self.push_record(TERMINATOR, OUTSIDE_LABEL);
                }
                self.flush_sentence();
                self.done = true;
            }
        }
    }
}

impl Emitter for TabularEmitter {
    fn is_done(&self) -> bool {
        self.done
    }

    fn finish(mut self) -> String {
        if !self.done {
            self.flush_sentence();
        }
        self.out
    }
}
