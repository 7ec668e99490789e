//! # Bracketed Inline Format
//!
//! One line per sentence, tokens joined by single spaces, entity spans
//! wrapped in `<START:LABEL>` ... `<END>` markers. This is the name-finder
//! training format consumed by OpenNLP-style backends.

use crate::emit::Emitter;
use crate::machine::{Event, EventSink};

/// Marker closing an entity span.
pub const END_MARKER: &str = "<END>";

const START_PREFIX: &str = "<START:";

/// Renders machine events as bracketed sentence lines.
#[derive(Debug, Default)]
pub struct BracketedEmitter {
    out: String,
    line: String,
    done: bool,
}

impl BracketedEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_piece(&mut self, piece: &str) {
        self.line.push_str(piece);
        self.line.push(' ');
    }

    fn flush_line(&mut self) {
        let trimmed = self.line.trim_end();
        if !trimmed.is_empty() {
            self.out.push_str(trimmed);
            self.out.push('\n');
        }
        self.line.clear();
    }
}

impl EventSink for BracketedEmitter {
    fn event(&mut self, event: Event<'_>) {
        if self.done {
            return;
        }
        match event {
            Event::SectionStart { .. } => {
                self.out.clear();
                self.line.clear();
            }
            Event::SpanOpen { label } => {
                self.line.push_str(START_PREFIX);
                self.line.push_str(label);
                self.line.push_str("> ");
            }
            Event::Word { text, .. } => self.push_piece(text),
            Event::SpanClose => self.push_piece(END_MARKER),
            Event::SentenceEnd => self.flush_line(),
            Event::SectionEnd { terminator } => {
                self.push_piece(terminator);
                self.flush_line();
                self.done = true;
            }
        }
    }
}

impl Emitter for BracketedEmitter {
    fn is_done(&self) -> bool {
        self.done
    }

    fn finish(mut self) -> String {
        if !self.done {
            self.flush_line();
        }
        self.out
    }
}

/// Read a bracketed line back into `(token, label)` pairs.
///
/// Tokens outside any span get `None`. Markers themselves are not returned.
pub fn decode_line(line: &str) -> Vec<(String, Option<String>)> {
    let mut pairs = Vec::new();
    let mut open: Option<String> = None;

    for piece in line.split_whitespace() {
        if piece == END_MARKER {
            open = None;
        } else if let Some(label) = piece
            .strip_prefix(START_PREFIX)
            .and_then(|rest| rest.strip_suffix('>'))
        {
            open = Some(label.to_string());
        } else {
            pairs.push((piece.to_string(), open.clone()));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::SpanMachine;
    use crate::types::Sentence;

    fn render(sentences: &[&[(&str, &str)]]) -> String {
        let mut machine = SpanMachine::new();
        let mut emitter = BracketedEmitter::new();
        for pairs in sentences {
            let sentence = Sentence::from_pairs(pairs.iter().copied());
            machine.feed_sentence(&sentence, &mut emitter);
        }
        emitter.finish()
    }

    #[test]
    fn test_single_span() {
        let out = render(&[&[("t0", "O"), ("t1", "B-GOODS"), ("t2", "I-GOODS"), ("t3", "O")]]);
        assert_eq!(out, "t0 <START:GOODS> t1 t2 <END> t3\n");
    }

    #[test]
    fn test_span_at_sentence_end_is_closed_on_same_line() {
        let out = render(&[&[("buy", "O"), ("gold", "B-ASSET")], &[("next", "O")]]);
        assert_eq!(out, "buy <START:ASSET> gold <END>\nnext\n");
    }

    #[test]
    fn test_start_discards_front_matter() {
        let out = render(&[
            &[("Table", "O"), ("of", "O"), ("contents", "O")],
            &[("Item", "B-START"), ("1", "O"), ("Business", "O")],
            &[("We", "O"), ("sell", "O"), ("coal", "B-GOODS"), (".", "O")],
        ]);
        assert_eq!(out, "1 Business\nWe sell <START:GOODS> coal <END> .\n");
    }

    #[test]
    fn test_end_terminates_document() {
        let out = render(&[
            &[("Item", "B-START"), ("Ships", "B-ASSET"), (".", "B-END"), ("Item", "O")],
            &[("Risk", "O"), ("factors", "O")],
        ]);
        assert_eq!(out, "<START:ASSET> Ships <END> .\n");
    }

    #[test]
    fn test_skips_sentences_without_text() {
        let out = render(&[&[("a", "O")], &[("Item", "B-START")], &[("b", "O")]]);
        assert_eq!(out, "b\n");
    }

    #[test]
    fn test_decode_recovers_labels() {
        let pairs = decode_line("t0 <START:GOODS> t1 t2 <END> t3");
        assert_eq!(
            pairs,
            vec![
                ("t0".to_string(), None),
                ("t1".to_string(), Some("GOODS".to_string())),
                ("t2".to_string(), Some("GOODS".to_string())),
                ("t3".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_round_trip_preserves_token_labels() {
        let cases: &[&[(&str, &str)]] = &[
            &[("a", "B-GOODS"), ("b", "B-ASSET"), ("c", "I-ASSET")],
            &[("x", "O"), ("y", "I-SERVICE"), ("z", "O"), ("w", "B-SERVICE")],
            &[("only", "O")],
            &[("a", "B-GOODS"), ("b", "I-ASSET"), ("c", "I-ASSET"), ("d", "O")],
        ];
        for pairs in cases {
            let out = render(&[*pairs]);
            let decoded = decode_line(out.trim_end());
            let expected: Vec<(String, Option<String>)> = pairs
                .iter()
                .map(|(text, tag)| {
                    let label = tag.split_once('-').map(|(_, class)| class.to_string());
                    (text.to_string(), label)
                })
                .collect();
            assert_eq!(decoded, expected, "round trip of {pairs:?}");
        }
    }

    #[test]
    fn test_inside_tag_of_another_class_starts_new_span() {
        let out = render(&[&[("a", "B-GOODS"), ("b", "I-ASSET")]]);
        assert_eq!(out, "<START:GOODS> a <END> <START:ASSET> b <END>\n");
    }
}
