//! # Fold Layout
//!
//! Materializes a fold assignment on disk. Annotated files are read from
//! `<annotated>/<domain>/<file>` and copied to `<folds-root>/<index>/<file>`,
//! where `<index>` counts up from [`FoldConfig::first_index`].

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{FoldError, Result};
use crate::partition::{DomainGroup, Partitioner};

/// Fold set configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldConfig {
    /// Number of folds
    pub folds: usize,
    /// Maximum files per fold
    pub capacity: usize,
    /// Directory name of the first fold
    pub first_index: usize,
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self {
            folds: 10,
            capacity: 10,
            first_index: 0,
        }
    }
}

impl FoldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_first_index(mut self, first_index: usize) -> Self {
        self.first_index = first_index;
        self
    }

    /// Directory indices of every fold, in order.
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.first_index..self.first_index + self.folds
    }
}

/// A file copied into its fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopiedFile {
    pub domain: String,
    pub source: PathBuf,
    pub target: PathBuf,
    /// Fold directory index
    pub fold: usize,
}

/// A file that was assigned a fold but could not be copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyFailure {
    pub source: PathBuf,
    pub target: PathBuf,
    pub error: String,
}

/// Result of distributing annotated files into folds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldRunReport {
    pub copied: Vec<CopiedFile>,
    pub failed: Vec<CopyFailure>,
    /// Files per fold after the run, keyed by position
    pub fold_sizes: Vec<usize>,
}

impl FoldRunReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// A fold directory tree rooted at one path.
#[derive(Debug, Clone)]
pub struct FoldLayout {
    root: PathBuf,
    config: FoldConfig,
}

impl FoldLayout {
    pub fn new(root: impl Into<PathBuf>, config: FoldConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &FoldConfig {
        &self.config
    }

    /// Directory of the fold at zero-based `position`.
    pub fn fold_dir(&self, position: usize) -> PathBuf {
        self.root
            .join((self.config.first_index + position).to_string())
    }

    /// Count the files already present in each fold directory.
    ///
    /// Missing fold directories count as empty.
    pub fn read_occupancy(&self) -> Result<Vec<usize>> {
        (0..self.config.folds)
            .map(|position| {
                let dir = self.fold_dir(position);
                if !dir.is_dir() {
                    return Ok(0);
                }
                Ok(list_files(&dir)?.len())
            })
            .collect()
    }

    /// Create any fold directory that does not exist yet.
    pub fn ensure_dirs(&self) -> Result<()> {
        for position in 0..self.config.folds {
            let dir = self.fold_dir(position);
            fs::create_dir_all(&dir).map_err(FoldError::io(&dir))?;
        }
        Ok(())
    }

    /// Assign every file in `groups` to a fold and copy it there.
    ///
    /// Assignment happens before any copying; if the folds cannot hold
    /// every file, nothing is copied and [`FoldError::Capacity`] is returned.
    /// Individual copy failures (an existing target included) are logged
    /// and reported while the remaining files continue.
    pub fn distribute(&self, groups: &[DomainGroup]) -> Result<FoldRunReport> {
        let occupancy = self.read_occupancy()?;
        debug!(?occupancy, "existing fold occupancy");
        let assignment =
            Partitioner::with_occupancy(occupancy, self.config.capacity)?.assign(groups)?;

        self.ensure_dirs()?;
        let mut report = FoldRunReport {
            fold_sizes: assignment.fold_sizes().to_vec(),
            ..FoldRunReport::default()
        };

        for placement in assignment.placements {
            let Some(name) = placement.file.file_name() else {
                continue;
            };
            let target = self.fold_dir(placement.fold).join(name);
            match copy_new(&placement.file, &target) {
                Ok(bytes) => {
                    debug!(
                        source = %placement.file.display(),
                        target = %target.display(),
                        bytes,
                        "copied"
                    );
                    report.copied.push(CopiedFile {
                        domain: placement.domain,
                        source: placement.file,
                        target,
                        fold: self.config.first_index + placement.fold,
                    });
                }
                Err(e) => {
                    warn!(
                        source = %placement.file.display(),
                        target = %target.display(),
                        error = %e,
                        "copy failed"
                    );
                    report.fold_sizes[placement.fold] -= 1;
                    report.failed.push(CopyFailure {
                        source: placement.file,
                        target,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            copied = report.copied.len(),
            failed = report.failed.len(),
            folds = self.config.folds,
            "fold distribution complete"
        );
        Ok(report)
    }
}

/// Group the files under `annotated_root` by their domain directory.
///
/// Files directly under the root are ignored. Domains and files are sorted
/// by name; empty domains are dropped.
pub fn scan_domains(annotated_root: &Path) -> Result<Vec<DomainGroup>> {
    let mut domains: Vec<PathBuf> = fs::read_dir(annotated_root)
        .map_err(FoldError::io(annotated_root))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()
        .map_err(FoldError::io(annotated_root))?;
    domains.retain(|p| p.is_dir());
    domains.sort();

    let mut groups = Vec::with_capacity(domains.len());
    for dir in domains {
        let Some(domain) = dir.file_name().and_then(|n| n.to_str()) else {
            warn!(dir = %dir.display(), "skipping non-UTF-8 domain directory");
            continue;
        };
        let files = list_files(&dir)?;
        if files.is_empty() {
            continue;
        }
        debug!(domain, files = files.len(), "found domain");
        groups.push(DomainGroup::new(domain, files));
    }
    Ok(groups)
}

/// Regular files directly inside `dir`, sorted by name.
pub(crate) fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(FoldError::io(dir))? {
        let path = entry.map_err(FoldError::io(dir))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn copy_new(source: &Path, target: &Path) -> io::Result<u64> {
    let mut input = File::open(source)?;
    let mut output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)?;
    io::copy(&mut input, &mut output)
}
