//! Blocking and candidate pair generation
//!
//! - Rules: field transformations that make up a blocking key
//! - Strategies: classical blocking and two sorted-neighbourhood variants
//! - Pairs: the deduplicated candidate pair set
//! - Engine: the build / compact / run lifecycle over a dataset

pub mod engine;
pub mod pairs;
pub mod rule;
pub mod strategy;

pub use engine::{Index, IndexConfig, IndexState, RunOptions, RunResult, RunStats};
pub use pairs::CandidatePairs;
pub use rule::{Encoder, EncoderCall, IndexDefinition, IndexRule, MAX_ENCODER_ARGS};
pub use strategy::{blocking_estimate, IndexStrategy, InvertedIndex};
