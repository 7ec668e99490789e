//! Cross-validation plans over a fold layout.
//!
//! Each fold in turn is held out for evaluation while the rest become the
//! training set. Training inputs are handed to the recognizer trainers
//! either as one concatenated file or as a comma-separated list of paths.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FoldError, Result};
use crate::layout::{FoldLayout, list_files};

/// Files stored in one fold directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub index: usize,
    pub files: Vec<PathBuf>,
}

/// One leave-one-fold-out split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub eval_fold: usize,
    pub train: Vec<PathBuf>,
    pub test: Vec<PathBuf>,
}

impl Split {
    /// Training files joined by commas.
    pub fn train_file_list(&self) -> String {
        self.train
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Concatenate every training file into `out`, each followed by a
    /// blank line. Returns the number of lines written.
    pub fn write_training_file(&self, out: &Path) -> Result<usize> {
        let file = File::create(out).map_err(FoldError::io(out))?;
        let mut writer = BufWriter::new(file);
        let mut written = 0;

        for path in &self.train {
            let reader = BufReader::new(File::open(path).map_err(FoldError::io(path))?);
            for line in reader.lines() {
                let line = line.map_err(FoldError::io(path))?;
                writeln!(writer, "{line}").map_err(FoldError::io(out))?;
                written += 1;
            }
            writeln!(writer).map_err(FoldError::io(out))?;
            written += 1;
        }
        writer.flush().map_err(FoldError::io(out))?;

        info!(
            file = %out.display(),
            inputs = self.train.len(),
            lines = written,
            "wrote training file"
        );
        Ok(written)
    }
}

/// The folds of one layout, ready to be split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossValidation {
    folds: Vec<Fold>,
}

impl CrossValidation {
    pub fn from_folds(folds: Vec<Fold>) -> Self {
        Self { folds }
    }

    /// Read every configured fold directory of `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`FoldError::MissingFold`] if a fold directory is absent.
    pub fn from_layout(layout: &FoldLayout) -> Result<Self> {
        let config = layout.config();
        let folds = config
            .indices()
            .enumerate()
            .map(|(position, index)| {
                let dir = layout.fold_dir(position);
                if !dir.is_dir() {
                    return Err(FoldError::MissingFold(index));
                }
                Ok(Fold {
                    index,
                    files: list_files(&dir)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { folds })
    }

    pub fn folds(&self) -> &[Fold] {
        &self.folds
    }

    /// Hold out the fold with directory index `eval_fold`.
    pub fn split(&self, eval_fold: usize) -> Result<Split> {
        let test = self
            .folds
            .iter()
            .find(|f| f.index == eval_fold)
            .ok_or(FoldError::MissingFold(eval_fold))?
            .files
            .clone();
        let train = self
            .folds
            .iter()
            .filter(|f| f.index != eval_fold)
            .flat_map(|f| f.files.iter().cloned())
            .collect();
        Ok(Split {
            eval_fold,
            train,
            test,
        })
    }

    /// Every leave-one-fold-out split, in fold order.
    pub fn splits(&self) -> impl Iterator<Item = Split> + '_ {
        self.folds.iter().filter_map(|f| self.split(f.index).ok())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::layout::FoldConfig;

    fn folds() -> CrossValidation {
        CrossValidation::from_folds(vec![
            Fold {
                index: 0,
                files: vec![PathBuf::from("a"), PathBuf::from("b")],
            },
            Fold {
                index: 1,
                files: vec![PathBuf::from("c")],
            },
            Fold {
                index: 2,
                files: vec![PathBuf::from("d")],
            },
        ])
    }

    #[test]
    fn test_leave_one_out() {
        let split = folds().split(1).unwrap();
        assert_eq!(split.test, vec![PathBuf::from("c")]);
        assert_eq!(split.train_file_list(), "a,b,d");
    }

    #[test]
    fn test_unknown_eval_fold() {
        assert!(matches!(folds().split(7), Err(FoldError::MissingFold(7))));
    }

    #[test]
    fn test_every_file_tested_once() {
        let cv = folds();
        let tested: Vec<PathBuf> = cv.splits().flat_map(|s| s.test).collect();
        assert_eq!(tested.len(), 4);
        for split in cv.splits() {
            assert_eq!(split.train.len() + split.test.len(), 4);
        }
    }

    #[test]
    fn test_from_layout_and_concatenate() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("folds");
        for (index, name, body) in [(1, "x.train", "one\ntwo\n"), (2, "y.train", "three\n")] {
            let fold = root.join(index.to_string());
            fs::create_dir_all(&fold).unwrap();
            fs::write(fold.join(name), body).unwrap();
        }
        let layout = FoldLayout::new(&root, FoldConfig::new().with_folds(2).with_first_index(1));
        let cv = CrossValidation::from_layout(&layout).unwrap();
        assert_eq!(cv.folds()[1].index, 2);

        let split = cv.split(2).unwrap();
        let out = dir.path().join("train.txt");
        let lines = split.write_training_file(&out).unwrap();
        assert_eq!(lines, 3);
        assert_eq!(fs::read_to_string(&out).unwrap(), "one\ntwo\n\n");
    }

    #[test]
    fn test_from_layout_missing_fold() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("0")).unwrap();
        let layout = FoldLayout::new(dir.path(), FoldConfig::new().with_folds(2));
        let err = CrossValidation::from_layout(&layout).unwrap_err();
        assert!(matches!(err, FoldError::MissingFold(1)));
    }
}
