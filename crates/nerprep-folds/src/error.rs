use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or reading fold layouts.
#[derive(Debug, Error)]
pub enum FoldError {
    /// Every fold reached capacity before all files were placed.
    #[error("every fold is full; {} file(s) could not be placed", .unplaced.len())]
    Capacity {
        /// Files left without a fold, in processing order.
        unplaced: Vec<PathBuf>,
    },

    /// Fold count or capacity is unusable.
    #[error("invalid fold configuration: {0}")]
    InvalidConfig(String),

    /// A fold index has no directory in the layout.
    #[error("fold {0} does not exist")]
    MissingFold(usize),

    /// Reading or writing the fold layout failed.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FoldError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| FoldError::Io { path, source }
    }
}

/// Result type alias for fold operations.
pub type Result<T> = std::result::Result<T, FoldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = FoldError::Capacity {
            unplaced: vec![PathBuf::from("a.tsv"), PathBuf::from("b.tsv")],
        };
        assert_eq!(
            err.to_string(),
            "every fold is full; 2 file(s) could not be placed"
        );
        assert_eq!(FoldError::MissingFold(3).to_string(), "fold 3 does not exist");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FoldError>();
    }
}
