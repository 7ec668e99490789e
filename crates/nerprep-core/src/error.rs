use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading and transcoding CoNLL exports.
#[derive(Debug, Error)]
pub enum ConllError {
    /// A non-blank line did not contain both a token and a tag.
    #[error("malformed token/tag line {line}: {content:?}")]
    Parse {
        /// 1-based line number in the source file.
        line: usize,
        /// The offending line.
        content: String,
    },

    /// A tag did not match `O`, `B-<LABEL>` or `I-<LABEL>`.
    #[error("unrecognised tag: {0:?}")]
    UnknownTag(String),

    /// Reading or writing a file failed.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O failure on an anonymous stream (no path attached yet).
    #[error("stream i/o error: {0}")]
    Stream(#[from] std::io::Error),

    /// A section marker could not be compiled into a matcher.
    #[error("invalid section marker: {0}")]
    Marker(#[from] regex::Error),

    /// A file name could not be used as an output name.
    #[error("cannot derive an output name from {}", .0.display())]
    BadFileName(PathBuf),
}

impl ConllError {
    /// Attach a path to a bare stream error.
    pub fn at(self, path: impl Into<PathBuf>) -> Self {
        match self {
            ConllError::Stream(source) => ConllError::Io {
                path: path.into(),
                source,
            },
            other => other,
        }
    }
}

/// Result type alias for transcoding operations.
pub type Result<T> = std::result::Result<T, ConllError>;
