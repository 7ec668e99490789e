//! # CoNLL Line Parser
//!
//! Splits a WebAnno export into sentences. Every non-blank line holds a
//! token and its tag separated by a single delimiter; blank lines end the
//! current sentence. Sentences are produced lazily, one pass over the input.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use crate::error::{ConllError, Result};
use crate::types::{Document, Sentence, Token};

/// Field delimiter of WebAnno CoNLL exports.
pub const DEFAULT_DELIMITER: char = ' ';

/// Lazy sentence iterator over a buffered reader.
pub struct SentenceReader<R> {
    lines: Lines<R>,
    delimiter: char,
    line_no: usize,
    current: Vec<Token>,
    done: bool,
}

impl<R: BufRead> SentenceReader<R> {
    /// Read space-delimited `TOKEN TAG` lines.
    pub fn new(reader: R) -> Self {
        Self::with_delimiter(reader, DEFAULT_DELIMITER)
    }

    /// Read lines split on `delimiter` instead (e.g. `'\t'` for `.tsv` files).
    pub fn with_delimiter(reader: R, delimiter: char) -> Self {
        Self {
            lines: reader.lines(),
            delimiter,
            line_no: 0,
            current: Vec::new(),
            done: false,
        }
    }

    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line_no
    }

    fn parse_line(&self, line: &str) -> Result<Token> {
        let malformed = || ConllError::Parse {
            line: self.line_no,
            content: line.to_string(),
        };
        let (text, tag) = line.split_once(self.delimiter).ok_or_else(malformed)?;
        let tag = tag.trim_end();
        if text.is_empty() || tag.is_empty() {
            return Err(malformed());
        }
        Ok(Token::new(text, tag, self.line_no))
    }

    fn flush(&mut self) -> Option<Sentence> {
        if self.current.is_empty() {
            None
        } else {
            Some(Sentence::new(std::mem::take(&mut self.current)))
        }
    }
}

impl SentenceReader<BufReader<File>> {
    /// Open a file for sentence-wise reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConllError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for SentenceReader<R> {
    type Item = Result<Sentence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(line) = self.lines.next() else {
                self.done = true;
                return self.flush().map(Ok);
            };
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(ConllError::Stream(e)));
                }
            };

            if line.trim().is_empty() {
                if let Some(sentence) = self.flush() {
                    return Some(Ok(sentence));
                }
                continue;
            }

            // WebAnno writes `#` header lines ahead of the token block
            if line.starts_with('#') {
                continue;
            }

            match self.parse_line(&line) {
                Ok(token) => self.current.push(token),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Read a whole document eagerly.
pub fn read_document(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ConllError::BadFileName(path.to_path_buf()))?
        .to_string();
    let sentences = SentenceReader::open(path)?
        .collect::<Result<Vec<_>>>()
        .map_err(|e| e.at(path))?;
    Ok(Document::new(name, sentences))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn read_all(input: &str) -> Result<Vec<Sentence>> {
        SentenceReader::new(Cursor::new(input)).collect()
    }

    #[test]
    fn test_splits_on_blank_lines() {
        let sentences = read_all("a O\nb B-GOODS\n\nc O\n\n").unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].tokens[1].text, "b");
        assert_eq!(sentences[0].tokens[1].tag, "B-GOODS");
        assert_eq!(sentences[1].tokens[0].line, 4);
    }

    #[test]
    fn test_flushes_final_sentence_without_blank_line() {
        let sentences = read_all("a O\nb O").unwrap();
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].len(), 2);
    }

    #[test]
    fn test_collapses_repeated_blank_lines() {
        let sentences = read_all("\n\na O\n\n\n\nb O\n").unwrap();
        assert_eq!(sentences.len(), 2);
    }

    #[test]
    fn test_splits_on_first_delimiter_only() {
        let sentences = read_all("a O extra\n").unwrap();
        assert_eq!(sentences[0].tokens[0].tag, "O extra");
    }

    #[test]
    fn test_strips_carriage_returns() {
        let sentences = read_all("a B-ASSET\r\n\r\nb O\r\n").unwrap();
        assert_eq!(sentences[0].tokens[0].tag, "B-ASSET");
        assert_eq!(sentences.len(), 2);
    }

    #[test]
    fn test_skips_header_comments() {
        let sentences = read_all("#FORMAT=WebAnno TSV\na O\n").unwrap();
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].tokens[0].line, 2);
    }

    #[test]
    fn test_missing_tag_is_parse_error() {
        let err = read_all("a O\nlonely\n").unwrap_err();
        match err {
            ConllError::Parse { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "lonely");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_stops_iteration() {
        let mut reader = SentenceReader::new(Cursor::new("x\n\na O\n"));
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_tab_delimiter() {
        let mut reader = SentenceReader::with_delimiter(Cursor::new("Steel\tGOODS\n"), '\t');
        let sentence = reader.next().unwrap().unwrap();
        assert_eq!(sentence.tokens[0].tag, "GOODS");
        assert_eq!(reader.lines_read(), 1);
    }

    #[test]
    fn test_read_document_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme.conll");
        std::fs::write(&path, "a O\n\nb O\n").unwrap();
        let doc = read_document(&path).unwrap();
        assert_eq!(doc.name, "acme.conll");
        assert_eq!(doc.sentences.len(), 2);
    }

    #[test]
    fn test_read_document_missing_file() {
        let err = read_document("/definitely/not/here.conll").unwrap_err();
        assert!(matches!(err, ConllError::Io { .. }));
    }
}
