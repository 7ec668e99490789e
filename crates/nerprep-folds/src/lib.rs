//! # nerprep-folds
//!
//! Domain-stratified cross-validation folds for annotated NER corpora.
//!
//! Files are grouped by the domain directory they live in, spread across a
//! fixed number of capacity-bounded folds with [`Partitioner`], and copied
//! into a `<root>/<fold>/<file>` tree by [`FoldLayout`]. [`CrossValidation`]
//! reads that tree back and builds leave-one-fold-out splits.
//!
//! ```
//! use std::path::PathBuf;
//! use nerprep_folds::{DomainGroup, Partitioner};
//!
//! let files = (0..4).map(|i| PathBuf::from(format!("doc{i}.tsv"))).collect();
//! let assignment = Partitioner::new(2, 10)
//!     .unwrap()
//!     .assign(&[DomainGroup::new("energy", files)])
//!     .unwrap();
//! assert_eq!(assignment.fold_sizes(), &[2, 2]);
//! ```

pub mod error;
pub mod layout;
pub mod partition;
pub mod plan;

pub use error::{FoldError, Result};
pub use layout::{CopiedFile, CopyFailure, FoldConfig, FoldLayout, FoldRunReport, scan_domains};
pub use partition::{DomainGroup, FoldAssignment, Partitioner, Placement};
pub use plan::{CrossValidation, Fold, Split};
