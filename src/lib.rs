//! recordlink - Blocking and comparison for batch record linkage
//!
//! Finds the record pairs of a dataset that likely describe the same
//! real-world entity without comparing every possible pair.
//!
//! # Features
//! - Blocking keys built from field transformations and encoders (NYSIIS, substring)
//! - Classical blocking and two sorted-neighbourhood indexing strategies
//! - Exact and Jaro field comparators with configurable weights
//! - Parallel scoring of candidate pairs
//! - Blocking quality metrics (pairs completeness, pairs quality, reduction ratio)
//!
//! # Example
//!
//! ```rust
//! use recordlink::comparison::{FieldComparator, RecordComparator};
//! use recordlink::dataset::{FieldTable, MemoryDataset};
//! use recordlink::indexing::{Encoder, Index, IndexConfig, IndexRule, IndexStrategy, RunOptions};
//!
//! let fields = FieldTable::new(["surname", "given_name"]).unwrap();
//! let ds = MemoryDataset::from_rows(
//!     "people",
//!     fields.clone(),
//!     &[("1", ["smith", "john"]), ("2", ["smyth", "jon"]), ("3", ["jones", "mary"])],
//! )
//! .unwrap();
//!
//! let comparator = RecordComparator::new(
//!     "people",
//!     &fields,
//!     &fields,
//!     vec![(FieldComparator::jaro("surname_jaro", 0.0).unwrap(), "surname", "surname")],
//! )
//! .unwrap();
//!
//! let definition = vec![IndexRule::field("surname").encoder(Encoder::Nysiis { max_len: 3 })];
//! let mut index = Index::new(
//!     IndexConfig::new(vec![definition], IndexStrategy::Blocking),
//!     &ds,
//!     &ds,
//!     comparator,
//! )
//! .unwrap();
//!
//! index.build().unwrap();
//! index.compact().unwrap();
//! let result = index.run(&RunOptions::default()).unwrap();
//! assert_eq!(result.weight_vectors.len(), 1);
//! ```

pub mod algorithms;
pub mod comparison;
pub mod config;
pub mod dataset;
pub mod error;
pub mod indexing;
pub mod metrics;

pub use comparison::{FieldComparator, RecordComparator, WeightVector, Weights};
pub use config::LinkageConfig;
pub use dataset::{CsvDataset, CsvDatasetConfig, Dataset, FieldTable, MemoryDataset};
pub use error::{LinkageError, Result};
pub use indexing::{CandidatePairs, Index, IndexConfig, IndexRule, IndexStrategy, RunOptions};
pub use metrics::BlockingQuality;

/// Minimum number of candidate pairs for parallel scoring.
///
/// For fewer pairs, sequential processing is faster due to the overhead of
/// thread pool coordination.
pub const PARALLEL_THRESHOLD: usize = 100;
