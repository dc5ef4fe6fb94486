//! Field and record comparison
//!
//! - [`FieldComparator`]: two field values to one weight
//! - [`RecordComparator`]: two records to a weight vector

pub mod field;
pub mod record;

pub use field::{ComparisonMethod, FieldComparator, FieldComparatorConfig, Weights};
pub use record::{BoundComparator, RecordComparator, WeightVector};
