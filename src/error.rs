//! Error type shared by every stage of the linkage pipeline.
//!
//! Errors fall into four groups:
//! - configuration errors, raised while turning configuration into runtime objects
//! - data errors, raised while opening or streaming a dataset
//! - internal invariant violations, which indicate a bug rather than bad input
//! - state errors, raised when index phases are called out of order
//!
//! All of them are fatal for the operation that raised them.

use thiserror::Error;

/// Errors that can occur while configuring or running a linkage
#[derive(Error, Debug)]
pub enum LinkageError {
    /// A comparator or index rule names a field the dataset does not have
    #[error("Field '{field}' is not in the field list of dataset {dataset}")]
    UnknownField { dataset: usize, field: String },

    /// Approximate comparator threshold outside [0, 1)
    #[error("Threshold must be in range [0.0, 1.0), got {0}")]
    InvalidThreshold(f64),

    /// Window size the chosen strategy cannot work with
    #[error("Window size {size} is invalid: {reason}")]
    InvalidWindowSize { size: usize, reason: &'static str },

    /// Encoder called with the wrong number of arguments
    #[error("Encoder '{encoder}' called with {given} extra argument(s): {reason}")]
    EncoderArity {
        encoder: String,
        given: usize,
        reason: &'static str,
    },

    /// Encoder name not recognised
    #[error("Unknown encoder: {0}")]
    UnknownEncoder(String),

    /// Encoder argument value not accepted
    #[error("Encoder '{encoder}' argument {value} is invalid")]
    InvalidEncoderArgument { encoder: String, value: i64 },

    /// Index definition without any rules
    #[error("Index definition {0} has no index rules")]
    EmptyIndexDefinition(usize),

    /// Index configured without any definitions
    #[error("At least one index definition is required")]
    NoIndexDefinitions,

    /// Field table ordinals are not 0, 1, 2, ...
    #[error("Column numbers are not consecutive: expected {expected} for field '{field}', got {actual}")]
    NonConsecutiveColumns {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// Field name appears more than once in a field table
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    /// CSV dataset without a header line and without field names
    #[error("Field names must be given if they are not taken from a header line")]
    MissingFieldNames,

    /// Substring requested with start after end
    #[error("Substring start index {start} is larger than end index {end}")]
    InvalidSubstring { start: usize, end: usize },

    /// CSV delimiter must be a single ASCII character
    #[error("Delimiter '{0}' is not an ASCII character")]
    InvalidDelimiter(char),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Dataset opened for reading has no records
    #[error("No records in dataset '{0}'")]
    EmptyDataset(String),

    /// Record identifier seen twice while building an index
    #[error("Duplicate record identifier: {0}")]
    DuplicateRecordId(String),

    /// CSV source could not be parsed
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Source could not be opened or read
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The two directional Jaro scans disagree on the common character count
    #[error("Jaro: different common character counts ({forward} vs {backward}) for '{a}' and '{b}'")]
    JaroCommonMismatch {
        a: String,
        b: String,
        forward: usize,
        backward: usize,
    },

    /// Jaro similarity of two different strings outside (0, 1)
    #[error("Jaro: similarity {value} outside (0, 1) for '{a}' and '{b}'")]
    JaroOutOfRange { a: String, b: String, value: f64 },

    /// Independently computed pair totals disagree
    #[error("Record pair count mismatch in {context}: expected {expected}, got {actual}")]
    PairCountMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Candidate pair refers to a record with no cached comparison record
    #[error("No comparison record cached for record identifier {0}")]
    MissingComparisonRecord(String),

    /// Index phase called out of order
    #[error("Cannot {operation}: index is {actual}, expected {expected}")]
    InvalidState {
        operation: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, LinkageError>;
