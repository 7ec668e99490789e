//! Corpus data types: tokens, sentences and documents.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tags::BioTag;

/// A token read from an export line, with its raw tag column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The token text content
    pub text: String,
    /// The tag column exactly as exported (`O`, `B-GOODS`, ...)
    pub tag: String,
    /// 1-based line number in the source file
    pub line: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, tag: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            tag: tag.into(),
            line,
        }
    }

    /// Parse the raw tag column.
    pub fn bio_tag(&self) -> Result<BioTag> {
        self.tag.parse()
    }
}

/// An ordered run of tokens delimited by blank lines in the export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Build a sentence from `(text, tag)` pairs, numbering lines from 1.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let tokens = pairs
            .into_iter()
            .enumerate()
            .map(|(i, (text, tag))| Token::new(text, tag, i + 1))
            .collect();
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether any token carries a real entity tag.
    pub fn has_entity(&self) -> bool {
        self.tokens
            .iter()
            .any(|t| t.bio_tag().is_ok_and(|tag| tag.is_entity()))
    }
}

/// A whole annotated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// File name the document was read from
    pub name: String,
    /// Source domain, taken from the containing directory
    pub domain: Option<String>,
    pub sentences: Vec<Sentence>,
}

impl Document {
    pub fn new(name: impl Into<String>, sentences: Vec<Sentence>) -> Self {
        Self {
            name: name.into(),
            domain: None,
            sentences,
        }
    }

    /// Set the source domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(Sentence::len).sum()
    }
}
