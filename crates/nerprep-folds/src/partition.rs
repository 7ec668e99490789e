//! # Fold Partitioner
//!
//! Distributes domain-grouped files over a fixed number of capacity-bounded
//! folds. Groups are processed smallest first so small domains spread
//! evenly before larger ones start to fill folds. Within a group a cursor
//! walks the folds round-robin, starting again from fold 0 for every group.
//!
//! The search for a fold with room is bounded by the number of folds; a
//! full fold set is reported as [`FoldError::Capacity`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FoldError, Result};

/// Files belonging to one source domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainGroup {
    pub domain: String,
    pub files: Vec<PathBuf>,
}

impl DomainGroup {
    pub fn new(domain: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            domain: domain.into(),
            files,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Where one file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub domain: String,
    pub file: PathBuf,
    /// Zero-based fold position (not the directory name).
    pub fold: usize,
}

/// Occupancy counters and round-robin cursor for one partitioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitioner {
    occupancy: Vec<usize>,
    cursor: usize,
    capacity: usize,
}

impl Partitioner {
    /// Create `folds` empty folds holding at most `capacity` files each.
    pub fn new(folds: usize, capacity: usize) -> Result<Self> {
        Self::with_occupancy(vec![0; folds], capacity)
    }

    /// Resume from folds that already hold files.
    pub fn with_occupancy(occupancy: Vec<usize>, capacity: usize) -> Result<Self> {
        if occupancy.is_empty() {
            return Err(FoldError::InvalidConfig("at least one fold is required".into()));
        }
        if capacity == 0 {
            return Err(FoldError::InvalidConfig("fold capacity must be positive".into()));
        }
        Ok(Self {
            occupancy,
            cursor: 0,
            capacity,
        })
    }

    pub fn fold_count(&self) -> usize {
        self.occupancy.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn occupancy(&self) -> &[usize] {
        &self.occupancy
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Free slots left across all folds.
    pub fn remaining(&self) -> usize {
        self.occupancy
            .iter()
            .map(|&n| self.capacity.saturating_sub(n))
            .sum()
    }

    /// Move the cursor back to fold 0.
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Claim a slot in the first fold with room at or after the cursor.
    ///
    /// Scans at most one full turn. On success the cursor moves one past
    /// the accepting fold; `None` means every fold is full.
    pub fn place(&mut self) -> Option<usize> {
        let folds = self.occupancy.len();
        for offset in 0..folds {
            let fold = (self.cursor + offset) % folds;
            if self.occupancy[fold] < self.capacity {
                self.occupancy[fold] += 1;
                self.cursor = (fold + 1) % folds;
                return Some(fold);
            }
        }
        None
    }

    /// Assign every file of every group to a fold.
    ///
    /// Groups are ordered by ascending size (ties keep their input order).
    /// The whole assignment is computed up front, so a capacity failure
    /// leaves nothing half-distributed.
    pub fn assign(mut self, groups: &[DomainGroup]) -> Result<FoldAssignment> {
        let mut ordered: Vec<&DomainGroup> = groups.iter().collect();
        ordered.sort_by_key(|g| g.len());

        let mut placements = Vec::with_capacity(groups.iter().map(DomainGroup::len).sum());
        for (g, group) in ordered.iter().enumerate() {
            self.reset_cursor();
            debug!(domain = %group.domain, files = group.len(), "assigning domain");

            for (i, file) in group.files.iter().enumerate() {
                let Some(fold) = self.place() else {
                    let unplaced = group.files[i..]
                        .iter()
                        .chain(ordered[g + 1..].iter().flat_map(|rest| rest.files.iter()))
                        .cloned()
                        .collect();
                    return Err(FoldError::Capacity { unplaced });
                };
                placements.push(Placement {
                    domain: group.domain.clone(),
                    file: file.clone(),
                    fold,
                });
            }
        }

        Ok(FoldAssignment {
            placements,
            partitioner: self,
        })
    }
}

/// Outcome of [`Partitioner::assign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldAssignment {
    /// Placements in processing order.
    pub placements: Vec<Placement>,
    /// Final partitioner state.
    pub partitioner: Partitioner,
}

impl FoldAssignment {
    /// Files per fold after the assignment (including pre-existing ones).
    pub fn fold_sizes(&self) -> &[usize] {
        self.partitioner.occupancy()
    }

    /// Placements that landed in fold `fold`.
    pub fn in_fold(&self, fold: usize) -> impl Iterator<Item = &Placement> {
        self.placements.iter().filter(move |p| p.fold == fold)
    }
}
