//! # Span Tagging State Machine
//!
//! Consumes a token/tag stream and turns it into an abstract event stream
//! that the format emitters render. The machine tracks whether an entity
//! span is open and whether the retention window has been entered.
//!
//! ## Transitions
//!
//! | tag                 | action                                                        |
//! |---------------------|---------------------------------------------------------------|
//! | `O`                 | close open span, emit `Word` without label                    |
//! | `B-START`           | close open span, start retaining, emit `SectionStart`         |
//! | `B-END`             | close open span, stop retaining, emit `SectionEnd`, halt      |
//! | `B-X`               | close open span, emit `SpanOpen(X)` and `Word(X)`, enter `X`  |
//! | `I-X` (X open)      | emit `Word(X)`, stay                                          |
//! | `I-X` (Y open)      | close `Y`, emit `SpanOpen(X)` and `Word(X)`, enter `X`        |
//! | `I-X` (no span)     | treated as `B-X`                                              |
//! | `I-START`, `I-END`  | treated as `O`                                                |
//! | anything else       | logged, token dropped, state unchanged                       |
//!
//! Spans never cross sentences: [`SpanMachine::end_sentence`] closes any
//! open span before emitting `SentenceEnd`. Once halted the machine ignores
//! all further input for the document.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::tags::{BioTag, Label};
use crate::types::{Sentence, Token};

/// An event produced by the machine, borrowing from the input token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// The retention window opens; earlier output is discarded.
    SectionStart { boundary: &'a str },
    /// An entity span opens.
    SpanOpen { label: &'a str },
    /// A plain token, labelled with its span's class when inside one.
    Word {
        text: &'a str,
        label: Option<&'a str>,
    },
    /// The open entity span closes.
    SpanClose,
    /// The retention window closes; `terminator` ends the last sentence.
    SectionEnd { terminator: &'a str },
    /// The current sentence is complete.
    SentenceEnd,
}

/// Receiver of machine events.
pub trait EventSink {
    fn event(&mut self, event: Event<'_>);
}

/// Owned copy of an [`Event`], for inspecting an event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedEvent {
    SectionStart(String),
    SpanOpen(String),
    Word(String, Option<String>),
    SpanClose,
    SectionEnd(String),
    SentenceEnd,
}

impl From<Event<'_>> for OwnedEvent {
    fn from(event: Event<'_>) -> Self {
        match event {
            Event::SectionStart { boundary } => OwnedEvent::SectionStart(boundary.to_string()),
            Event::SpanOpen { label } => OwnedEvent::SpanOpen(label.to_string()),
            Event::Word { text, label } => {
                OwnedEvent::Word(text.to_string(), label.map(str::to_string))
            }
            Event::SpanClose => OwnedEvent::SpanClose,
            Event::SectionEnd { terminator } => OwnedEvent::SectionEnd(terminator.to_string()),
            Event::SentenceEnd => OwnedEvent::SentenceEnd,
        }
    }
}

impl EventSink for Vec<OwnedEvent> {
    fn event(&mut self, event: Event<'_>) {
        self.push(event.into());
    }
}

/// Span state of the machine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpanState {
    #[default]
    Outside,
    InsideSpan(String),
}

/// Whether the caller should keep feeding tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Halt,
}

/// Counters collected while a document is processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineStats {
    /// Tokens fed to the machine (before halting).
    pub tokens: usize,
    /// Entity spans opened.
    pub spans: usize,
    /// Tokens dropped because their tag was unrecognised.
    pub unknown_tags: usize,
    /// `I-` tags seen with no span open.
    pub orphan_inside: usize,
    /// Whether a `B-START` was seen.
    pub saw_start: bool,
    /// Whether a `B-END` was seen.
    pub saw_end: bool,
}

/// The transcoding state machine for a single document.
#[derive(Debug, Default)]
pub struct SpanMachine {
    state: SpanState,
    retaining: bool,
    halted: bool,
    stats: MachineStats,
}

impl SpanMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SpanState {
        &self.state
    }

    /// True between `B-START` and `B-END`.
    pub fn is_retaining(&self) -> bool {
        self.retaining
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn stats(&self) -> &MachineStats {
        &self.stats
    }

    /// Feed one export token, parsing its raw tag.
    ///
    /// Tokens with an unrecognised tag are dropped without changing state.
    pub fn feed(&mut self, token: &Token, sink: &mut impl EventSink) -> Step {
        if self.halted {
            return Step::Halt;
        }
        match token.bio_tag() {
            Ok(tag) => self.step(&token.text, &tag, sink),
            Err(e) => {
                warn!(line = token.line, error = %e, "dropping token");
                self.stats.tokens += 1;
                self.stats.unknown_tags += 1;
                Step::Continue
            }
        }
    }

    /// Apply one transition.
    pub fn step(&mut self, text: &str, tag: &BioTag, sink: &mut impl EventSink) -> Step {
        if self.halted {
            return Step::Halt;
        }
        self.stats.tokens += 1;

        match tag {
            BioTag::Outside | BioTag::Inside(Label::Start | Label::End) => {
                self.close_span(sink);
                sink.event(Event::Word { text, label: None });
            }
            BioTag::Begin(Label::Start) => {
                self.close_span(sink);
                self.retaining = true;
                self.stats.saw_start = true;
                debug!(boundary = text, "entering retention window");
                sink.event(Event::SectionStart { boundary: text });
            }
            BioTag::Begin(Label::End) => {
                self.close_span(sink);
                self.retaining = false;
                self.halted = true;
                self.stats.saw_end = true;
                debug!("leaving retention window");
                sink.event(Event::SectionEnd { terminator: text });
                return Step::Halt;
            }
            BioTag::Begin(Label::Entity(class)) => {
                self.close_span(sink);
                self.open_span(class, text, sink);
            }
            BioTag::Inside(Label::Entity(class)) => match &self.state {
                SpanState::InsideSpan(open) if open == class => {
                    sink.event(Event::Word {
                        text,
                        label: Some(class),
                    });
                }
                SpanState::InsideSpan(open) => {
                    debug!(
                        open = %open,
                        class = %class,
                        "I- tag for another class, switching span"
                    );
                    self.close_span(sink);
                    self.open_span(class, text, sink);
                }
                SpanState::Outside => {
                    debug!(class = %class, "I- tag without open span, opening one");
                    self.stats.orphan_inside += 1;
                    self.open_span(class, text, sink);
                }
            },
        }
        Step::Continue
    }

    /// Close any open span and mark the end of a sentence.
    pub fn end_sentence(&mut self, sink: &mut impl EventSink) {
        if self.halted {
            return;
        }
        self.close_span(sink);
        sink.event(Event::SentenceEnd);
    }

    /// Feed every token of a sentence, then end it.
    pub fn feed_sentence(&mut self, sentence: &Sentence, sink: &mut impl EventSink) -> Step {
        for token in &sentence.tokens {
            if self.feed(token, sink) == Step::Halt {
                return Step::Halt;
            }
        }
        self.end_sentence(sink);
        Step::Continue
    }

    fn open_span(&mut self, class: &str, text: &str, sink: &mut impl EventSink) {
        sink.event(Event::SpanOpen { label: class });
        sink.event(Event::Word {
            text,
            label: Some(class),
        });
        self.stats.spans += 1;
        self.state = SpanState::InsideSpan(class.to_string());
    }

    fn close_span(&mut self, sink: &mut impl EventSink) {
        if let SpanState::InsideSpan(_) = self.state {
            sink.event(Event::SpanClose);
            self.state = SpanState::Outside;
        }
    }
}
