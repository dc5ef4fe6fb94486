//! Blocking strategies
//!
//! Each strategy consumes one inverted index (blocking key to record
//! identifiers in insertion order) and merges the pairs it selects into a
//! [`CandidatePairs`] set.
//!
//! - Blocking: every pair of records sharing a key
//! - Sorting: sliding window over the sorted distinct keys
//! - SortingArray: sliding window over all records sorted by key

use std::collections::VecDeque;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use super::pairs::CandidatePairs;
use crate::error::{LinkageError, Result};

/// Blocking key to record identifiers, in insertion order
pub type InvertedIndex = AHashMap<String, Vec<String>>;

/// How candidate pairs are selected from an inverted index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexStrategy {
    /// Classical blocking
    #[default]
    Blocking,
    /// Sorted neighbourhood over distinct keys
    Sorting { window_size: usize },
    /// Sorted neighbourhood over a flat array of records
    SortingArray { window_size: usize },
}

impl IndexStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            IndexStrategy::Blocking => "blocking",
            IndexStrategy::Sorting { .. } => "sorting",
            IndexStrategy::SortingArray { .. } => "sorting array",
        }
    }

    /// Check the window size the strategy needs
    pub fn validate(&self) -> Result<()> {
        match *self {
            IndexStrategy::Blocking => Ok(()),
            IndexStrategy::Sorting { window_size } if window_size < 1 => {
                Err(LinkageError::InvalidWindowSize {
                    size: window_size,
                    reason: "sorting window must hold at least one key",
                })
            }
            IndexStrategy::SortingArray { window_size } if window_size < 2 => {
                Err(LinkageError::InvalidWindowSize {
                    size: window_size,
                    reason: "sorting array window must be larger than 1",
                })
            }
            _ => Ok(()),
        }
    }

    /// Merge the pairs selected from `index` into `pairs`
    ///
    /// # Errors
    /// [`LinkageError::InvalidWindowSize`] if the window is too small for
    /// the strategy.
    pub fn compact(&self, index: InvertedIndex, pairs: &mut CandidatePairs) -> Result<()> {
        self.validate()?;
        match *self {
            IndexStrategy::Blocking => compact_blocking(index, pairs),
            IndexStrategy::Sorting { window_size } => compact_sorting(index, window_size, pairs),
            IndexStrategy::SortingArray { window_size } => {
                compact_sorting_array(index, window_size, pairs);
            }
        }
        Ok(())
    }
}

/// Pairs the classical blocking strategy would produce before deduplication
pub fn blocking_estimate(index: &InvertedIndex) -> usize {
    index
        .values()
        .map(|ids| ids.len() * ids.len().saturating_sub(1) / 2)
        .sum()
}

fn sorted_keys(index: &InvertedIndex) -> Vec<&String> {
    let mut keys: Vec<&String> = index.keys().collect();
    keys.sort_unstable();
    keys
}

fn compact_blocking(index: InvertedIndex, pairs: &mut CandidatePairs) {
    for ids in index.values() {
        if ids.len() > 1 {
            pairs.add_block(ids);
        }
    }
}

/// Sorted neighbourhood over distinct keys.
///
/// The window spans the records of the last `window_size` keys. Slot
/// `j % window_size` of `slot_counts` remembers how many records key `j`
/// added, so they can be evicted from the front when key
/// `j + window_size` enters.
fn compact_sorting(index: InvertedIndex, window_size: usize, pairs: &mut CandidatePairs) {
    let mut slot_counts = vec![0usize; window_size];
    let mut window: VecDeque<&str> = VecDeque::new();

    for (j, key) in sorted_keys(&index).into_iter().enumerate() {
        let slot = j % window_size;

        let evict = slot_counts[slot].min(window.len());
        window.drain(..evict);

        let mut added = 0;
        for id in &index[key] {
            if !window.contains(&id.as_str()) {
                window.push_back(id.as_str());
                added += 1;
            }
        }
        slot_counts[slot] = added;

        if window.len() > 1 {
            pairs.add_block(&*window.make_contiguous());
        }
    }
}

/// Sorted neighbourhood over all records.
///
/// Returns the number of window positions visited.
fn compact_sorting_array(index: InvertedIndex, window_size: usize, pairs: &mut CandidatePairs) -> usize {
    let ids: Vec<&str> = sorted_keys(&index)
        .into_iter()
        .flat_map(|key| index[key].iter().map(String::as_str))
        .collect();

    match ids.len() {
        0 | 1 => 0,
        // A short array forms one window instead of producing no pairs
        n if n < window_size => {
            pairs.add_block(&ids);
            1
        }
        n => {
            for window in ids.windows(window_size) {
                pairs.add_block(window);
            }
            n - window_size + 1
        }
    }
}
