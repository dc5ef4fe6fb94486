//! Linkage index
//!
//! An [`Index`] reads dataset 1 into one inverted index per definition
//! (`build`), merges them into a deduplicated candidate pair set
//! (`compact`) and scores the candidate pairs with the record comparator
//! (`run`). The phases must be called in that order; `run` may be repeated.

use std::fmt;

use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::pairs::CandidatePairs;
use super::rule::{derive_key, IndexDefinition, ResolvedRule};
use super::strategy::{blocking_estimate, IndexStrategy, InvertedIndex};
use crate::comparison::{RecordComparator, WeightVector};
use crate::dataset::Dataset;
use crate::error::{LinkageError, Result};
use crate::PARALLEL_THRESHOLD;

/// Index configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub description: String,

    /// One blocking key per definition
    pub definitions: Vec<IndexDefinition>,

    /// Joins the sub-keys of a definition (default: empty)
    #[serde(default)]
    pub separator: String,

    /// Leave records with an empty blocking key out of the index
    #[serde(default = "default_skip_missing")]
    pub skip_missing: bool,

    #[serde(default)]
    pub strategy: IndexStrategy,
}

fn default_skip_missing() -> bool {
    true
}

impl IndexConfig {
    pub fn new(definitions: Vec<IndexDefinition>, strategy: IndexStrategy) -> Self {
        Self {
            description: String::new(),
            definitions,
            separator: String::new(),
            skip_missing: true,
            strategy,
        }
    }
}

/// Options for [`Index::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Skip pairs whose record lengths differ by more than this percentage
    pub length_filter_perc: Option<f64>,

    /// Drop weight vectors whose sum is below this value
    pub cut_off_threshold: Option<f64>,
}

/// Pair counts of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub candidate_pairs: usize,
    pub compared: usize,
    pub length_filtered: usize,
    pub below_cut_off: usize,
}

/// Weight vectors of one run
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Comparator descriptions, in weight vector order
    pub field_names: Vec<String>,
    /// Surviving pairs, keyed `(id1, id2)` with `id1 < id2`
    pub weight_vectors: AHashMap<(String, String), WeightVector>,
    pub stats: RunStats,
}

/// Index lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Initialised,
    Built,
    Compacted,
}

impl IndexState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexState::Initialised => "initialised",
            IndexState::Built => "built",
            IndexState::Compacted => "compacted",
        }
    }
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blocking index over a pair of datasets
///
/// Records are read from dataset 1 only; dataset 2 supplies the field names
/// that index rules and comparators are checked against.
pub struct Index<'a> {
    description: String,
    dataset1: &'a dyn Dataset,
    dataset2: &'a dyn Dataset,
    comparator: RecordComparator,
    definitions: Vec<Vec<ResolvedRule>>,
    separator: String,
    skip_missing: bool,
    strategy: IndexStrategy,
    used_columns: AHashSet<usize>,
    state: IndexState,
    indices: Vec<InvertedIndex>,
    comparison_records: AHashMap<String, Vec<String>>,
    pairs: CandidatePairs,
    estimated_pairs: Option<usize>,
    length_cache: RwLock<AHashMap<String, usize>>,
}

impl<'a> Index<'a> {
    /// Validate the configuration and bind it to the datasets.
    ///
    /// # Errors
    /// - [`LinkageError::NoIndexDefinitions`] / [`LinkageError::EmptyIndexDefinition`]
    /// - [`LinkageError::UnknownField`] for a rule field missing from either dataset
    /// - [`LinkageError::InvalidWindowSize`] for a window the strategy cannot use
    pub fn new(
        config: IndexConfig,
        dataset1: &'a dyn Dataset,
        dataset2: &'a dyn Dataset,
        comparator: RecordComparator,
    ) -> Result<Self> {
        if config.definitions.is_empty() {
            return Err(LinkageError::NoIndexDefinitions);
        }
        config.strategy.validate()?;

        let fields1 = dataset1.field_table();
        let fields2 = dataset2.field_table();

        let definitions = config
            .definitions
            .iter()
            .enumerate()
            .map(|(i, rules)| {
                if rules.is_empty() {
                    return Err(LinkageError::EmptyIndexDefinition(i));
                }
                rules
                    .iter()
                    .map(|rule| rule.resolve(fields1, fields2))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let used_columns = comparator.used_columns1().into_iter().collect();

        log::debug!(
            "Index '{}': {} definitions, strategy {}, comparator '{}' with {} fields",
            config.description,
            definitions.len(),
            config.strategy.name(),
            comparator.description(),
            comparator.len()
        );

        Ok(Self {
            description: config.description,
            dataset1,
            dataset2,
            comparator,
            definitions,
            separator: config.separator,
            skip_missing: config.skip_missing,
            strategy: config.strategy,
            used_columns,
            state: IndexState::Initialised,
            indices: Vec::new(),
            comparison_records: AHashMap::new(),
            pairs: CandidatePairs::new(),
            estimated_pairs: None,
            length_cache: RwLock::new(AHashMap::new()),
        })
    }

    fn expect_state(&self, operation: &'static str, expected: IndexState) -> Result<()> {
        if self.state != expected {
            return Err(LinkageError::InvalidState {
                operation,
                expected: expected.as_str(),
                actual: self.state.as_str(),
            });
        }
        Ok(())
    }

    /// Comparison record: used columns lower-cased, all others empty
    fn comparison_record(&self, values: &[String]) -> Vec<String> {
        values
            .iter()
            .enumerate()
            .map(|(col, value)| {
                if self.used_columns.contains(&col) {
                    value.to_lowercase()
                } else {
                    String::new()
                }
            })
            .collect()
    }

    /// Read dataset 1 into one inverted index per definition.
    ///
    /// # Errors
    /// [`LinkageError::DuplicateRecordId`] if an identifier repeats, plus any
    /// error raised while reading the dataset or encoding keys.
    pub fn build(&mut self) -> Result<()> {
        self.expect_state("build", IndexState::Initialised)?;

        let num_fields = self.dataset1.field_table().len();
        let mut indices: Vec<InvertedIndex> = vec![InvertedIndex::new(); self.definitions.len()];
        let mut comparison_records = AHashMap::with_capacity(self.dataset1.record_count());

        for record in self.dataset1.records()? {
            let (rec_id, values) = record?;

            if values.len() < num_fields {
                log::warn!(
                    "Record '{}' in '{}' has {} of {} fields",
                    rec_id,
                    self.dataset1.description(),
                    values.len(),
                    num_fields
                );
            }

            for (rules, index) in self.definitions.iter().zip(indices.iter_mut()) {
                let key = derive_key(rules, &values, &self.separator)?;
                if !key.is_empty() || !self.skip_missing {
                    index.entry(key).or_default().push(rec_id.clone());
                }
            }

            let comparison_record = self.comparison_record(&values);
            if comparison_records
                .insert(rec_id.clone(), comparison_record)
                .is_some()
            {
                return Err(LinkageError::DuplicateRecordId(rec_id));
            }
        }

        for (i, index) in indices.iter().enumerate() {
            log::debug!("Index '{}' definition {}: {} blocks", self.description, i, index.len());
        }

        if self.strategy == IndexStrategy::Blocking {
            let estimate: usize = indices.iter().map(blocking_estimate).sum();
            log::info!(
                "Index '{}': estimated {} record pairs before deduplication",
                self.description,
                estimate
            );
            self.estimated_pairs = Some(estimate);
        }

        log::info!(
            "Index '{}': built from {} records of '{}'",
            self.description,
            comparison_records.len(),
            self.dataset1.description()
        );

        self.indices = indices;
        self.comparison_records = comparison_records;
        self.state = IndexState::Built;
        Ok(())
    }

    /// Merge the inverted indices into the candidate pair set.
    ///
    /// Each definition's inverted index is released as soon as its pairs
    /// are merged.
    pub fn compact(&mut self) -> Result<()> {
        self.expect_state("compact", IndexState::Built)?;

        let indices = std::mem::take(&mut self.indices);
        let mut pairs = CandidatePairs::new();

        for (i, index) in indices.into_iter().enumerate() {
            let before = pairs.len();
            self.strategy.compact(index, &mut pairs)?;
            log::debug!(
                "Index '{}' definition {}: {} new record pairs",
                self.description,
                i,
                pairs.len() - before
            );
        }

        let counted = pairs.count();
        if counted != pairs.len() {
            return Err(LinkageError::PairCountMismatch {
                context: "compact",
                expected: pairs.len(),
                actual: counted,
            });
        }

        log::info!(
            "Index '{}': {} record pairs after {} compaction",
            self.description,
            pairs.len(),
            self.strategy.name()
        );

        self.pairs = pairs;
        self.state = IndexState::Compacted;
        Ok(())
    }

    /// Compare every candidate pair.
    ///
    /// Pairs are scored in parallel once there are at least
    /// [`PARALLEL_THRESHOLD`] of them.
    pub fn run(&self, options: &RunOptions) -> Result<RunResult> {
        self.expect_state("run", IndexState::Compacted)?;

        let scorer = PairScorer {
            records: &self.comparison_records,
            comparator: &self.comparator,
            length_cache: &self.length_cache,
            length_filter: options.length_filter_perc.map(|perc| perc / 100.0),
            cut_off: options.cut_off_threshold,
        };

        let pairs: Vec<(&str, &str)> = self.pairs.iter().collect();
        let outcomes: Vec<PairOutcome> = if pairs.len() >= PARALLEL_THRESHOLD {
            pairs
                .par_iter()
                .map(|&(id1, id2)| scorer.score(id1, id2))
                .collect::<Result<Vec<_>>>()?
        } else {
            pairs
                .iter()
                .map(|&(id1, id2)| scorer.score(id1, id2))
                .collect::<Result<Vec<_>>>()?
        };

        let mut stats = RunStats {
            candidate_pairs: pairs.len(),
            ..RunStats::default()
        };
        let mut weight_vectors = AHashMap::with_capacity(outcomes.len());

        for ((id1, id2), outcome) in pairs.into_iter().zip(outcomes) {
            match outcome {
                PairOutcome::LengthFiltered => stats.length_filtered += 1,
                PairOutcome::BelowCutOff => {
                    stats.compared += 1;
                    stats.below_cut_off += 1;
                }
                PairOutcome::Kept(weights) => {
                    stats.compared += 1;
                    weight_vectors.insert((id1.to_string(), id2.to_string()), weights);
                }
            }
        }

        if stats.compared + stats.length_filtered != stats.candidate_pairs {
            return Err(LinkageError::PairCountMismatch {
                context: "run",
                expected: stats.candidate_pairs,
                actual: stats.compared + stats.length_filtered,
            });
        }

        log::info!(
            "Index '{}': compared {} of {} record pairs ({} length filtered, {} below cut-off), {} weight vectors",
            self.description,
            stats.compared,
            stats.candidate_pairs,
            stats.length_filtered,
            stats.below_cut_off,
            weight_vectors.len()
        );

        Ok(RunResult {
            field_names: self.comparator.field_names(),
            weight_vectors,
            stats,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn strategy(&self) -> IndexStrategy {
        self.strategy
    }

    pub fn dataset1(&self) -> &'a dyn Dataset {
        self.dataset1
    }

    pub fn dataset2(&self) -> &'a dyn Dataset {
        self.dataset2
    }

    pub fn comparator(&self) -> &RecordComparator {
        &self.comparator
    }

    /// Deduplicated candidate pairs; empty until `compact`
    pub fn candidate_pairs(&self) -> &CandidatePairs {
        &self.pairs
    }

    /// Number of deduplicated candidate pairs
    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Pre-deduplication pair count of classical blocking, set by `build`
    pub fn estimated_pairs(&self) -> Option<usize> {
        self.estimated_pairs
    }

    /// Comparison records by identifier, as cached by `build`
    pub fn comparison_records(&self) -> &AHashMap<String, Vec<String>> {
        &self.comparison_records
    }
}

impl fmt::Debug for Index<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("description", &self.description)
            .field("dataset1", &self.dataset1.description())
            .field("dataset2", &self.dataset2.description())
            .field("strategy", &self.strategy)
            .field("state", &self.state)
            .field("records", &self.comparison_records.len())
            .field("pairs", &self.pairs.len())
            .finish()
    }
}

enum PairOutcome {
    LengthFiltered,
    BelowCutOff,
    Kept(WeightVector),
}

/// Read-only view of an index shared by the scoring workers
struct PairScorer<'s> {
    records: &'s AHashMap<String, Vec<String>>,
    comparator: &'s RecordComparator,
    length_cache: &'s RwLock<AHashMap<String, usize>>,
    length_filter: Option<f64>,
    cut_off: Option<f64>,
}

impl PairScorer<'_> {
    fn record(&self, id: &str) -> Result<&[String]> {
        self.records
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| LinkageError::MissingComparisonRecord(id.to_string()))
    }

    /// Concatenated length of a comparison record, cached across runs
    fn length(&self, id: &str, record: &[String]) -> usize {
        if let Some(&len) = self.length_cache.read().get(id) {
            return len;
        }
        let len = record.iter().map(|value| value.chars().count()).sum();
        self.length_cache.write().insert(id.to_string(), len);
        len
    }

    fn score(&self, id1: &str, id2: &str) -> Result<PairOutcome> {
        let rec1 = self.record(id1)?;
        let rec2 = self.record(id2)?;

        if let Some(max_diff) = self.length_filter {
            let len1 = self.length(id1, rec1);
            let len2 = self.length(id2, rec2);
            let longest = len1.max(len2);
            let diff = if longest == 0 {
                0.0
            } else {
                len1.abs_diff(len2) as f64 / longest as f64
            };
            if diff > max_diff {
                return Ok(PairOutcome::LengthFiltered);
            }
        }

        let weights = self.comparator.compare(rec1, rec2)?;
        match self.cut_off {
            Some(cut_off) if weights.iter().sum::<f64>() < cut_off => Ok(PairOutcome::BelowCutOff),
            _ => Ok(PairOutcome::Kept(weights)),
        }
    }
}
