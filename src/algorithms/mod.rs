//! String algorithms used by the linkage pipeline
//!
//! Encoders turn a field value into a blocking key; similarity kernels score
//! two field values against each other. Each is a standalone function so the
//! indexing engine and the comparators can call them directly.

pub mod jaro;
pub mod phonetic;
pub mod substring;

pub use jaro::jaro_similarity;
pub use phonetic::{nysiis, NYSIIS_DEFAULT_MAX_LENGTH};
pub use substring::get_substring;
