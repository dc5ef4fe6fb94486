//! Evaluation metrics for assessing blocking quality.
//!
//! Provides pairs completeness, pairs quality and reduction ratio for a
//! candidate pair set, plus precision, recall and F-score over arbitrary
//! pair sets.

use std::collections::HashSet;
use std::hash::{BuildHasher, Hash};

use ahash::AHashMap;

use crate::error::{LinkageError, Result};
use crate::indexing::CandidatePairs;

/// Quality of a candidate pair set against known entities.
///
/// A candidate pair is a true match when both records map to the same
/// entity key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockingQuality {
    /// Candidate pairs that are true matches
    pub matches: usize,
    /// Candidate pairs that are not
    pub non_matches: usize,
    /// True matches in the whole dataset: sum of C(k, 2) over entity sizes
    pub total_matches: usize,
    /// Number of records in the dataset
    pub num_records: usize,
}

impl BlockingQuality {
    /// Classify every candidate pair.
    ///
    /// # Arguments
    /// * `pairs` - Candidate pairs produced by an index
    /// * `records` - Comparison records by identifier
    /// * `entity_key` - Extracts the entity a record belongs to
    /// * `num_records` - Dataset size used for the reduction ratio
    ///
    /// # Errors
    /// [`LinkageError::MissingComparisonRecord`] if a pair names an unknown
    /// record, [`LinkageError::PairCountMismatch`] if the classified pairs
    /// do not add up to the candidate pair count.
    pub fn evaluate<F>(
        pairs: &CandidatePairs,
        records: &AHashMap<String, Vec<String>>,
        entity_key: F,
        num_records: usize,
    ) -> Result<Self>
    where
        F: Fn(&[String]) -> String,
    {
        let lookup = |id: &str| {
            records
                .get(id)
                .ok_or_else(|| LinkageError::MissingComparisonRecord(id.to_string()))
        };

        let mut matches = 0;
        let mut non_matches = 0;
        for (id1, id2) in pairs.iter() {
            if entity_key(lookup(id1)?) == entity_key(lookup(id2)?) {
                matches += 1;
            } else {
                non_matches += 1;
            }
        }

        if matches + non_matches != pairs.len() {
            return Err(LinkageError::PairCountMismatch {
                context: "blocking quality",
                expected: pairs.len(),
                actual: matches + non_matches,
            });
        }

        let mut entity_sizes: AHashMap<String, usize> = AHashMap::new();
        for record in records.values() {
            *entity_sizes.entry(entity_key(record)).or_default() += 1;
        }
        let total_matches = entity_sizes.values().map(|&k| k * k.saturating_sub(1) / 2).sum();

        Ok(Self {
            matches,
            non_matches,
            total_matches,
            num_records,
        })
    }

    /// Number of candidate pairs
    pub fn num_pairs(&self) -> usize {
        self.matches + self.non_matches
    }

    /// Pairs completeness: share of all true matches kept as candidates.
    ///
    /// `None` when the dataset holds no true matches.
    pub fn pairs_completeness(&self) -> Option<f64> {
        if self.total_matches == 0 {
            None
        } else {
            Some(self.matches as f64 / self.total_matches as f64)
        }
    }

    /// Pairs quality: share of candidate pairs that are true matches
    pub fn pairs_quality(&self) -> f64 {
        let pairs = self.num_pairs();
        if pairs == 0 {
            0.0
        } else {
            self.matches as f64 / pairs as f64
        }
    }

    /// Reduction ratio: share of all record pairs pruned by blocking
    pub fn reduction_ratio(&self) -> f64 {
        let total = self.num_records * self.num_records.saturating_sub(1) / 2;
        if total == 0 {
            0.0
        } else {
            1.0 - self.num_pairs() as f64 / total as f64
        }
    }
}

/// Compute precision: TP / (TP + FP)
///
/// # Arguments
/// * `true_matches` - Set of actual match pairs (ground truth)
/// * `predicted_matches` - Set of predicted match pairs
///
/// # Returns
/// Precision score between 0.0 and 1.0
pub fn precision<T, S>(true_matches: &HashSet<T, S>, predicted_matches: &HashSet<T, S>) -> f64
where
    T: Eq + Hash,
    S: BuildHasher,
{
    if predicted_matches.is_empty() {
        return if true_matches.is_empty() { 1.0 } else { 0.0 };
    }
    let tp = predicted_matches.intersection(true_matches).count();
    tp as f64 / predicted_matches.len() as f64
}

/// Compute recall: TP / (TP + FN)
///
/// A recall of 1.0 means no false negatives (all true matches found).
pub fn recall<T, S>(true_matches: &HashSet<T, S>, predicted_matches: &HashSet<T, S>) -> f64
where
    T: Eq + Hash,
    S: BuildHasher,
{
    if true_matches.is_empty() {
        return if predicted_matches.is_empty() {
            1.0
        } else {
            0.0
        };
    }
    let tp = predicted_matches.intersection(true_matches).count();
    tp as f64 / true_matches.len() as f64
}

/// Compute F-beta score: weighted harmonic mean of precision and recall.
///
/// F1 score (beta=1.0) gives equal weight to precision and recall.
/// F2 (beta=2.0) weighs recall higher than precision.
pub fn f_score<T, S>(
    true_matches: &HashSet<T, S>,
    predicted_matches: &HashSet<T, S>,
    beta: f64,
) -> f64
where
    T: Eq + Hash,
    S: BuildHasher,
{
    let p = precision(true_matches, predicted_matches);
    let r = recall(true_matches, predicted_matches);
    if p + r == 0.0 {
        return 0.0;
    }
    let beta_sq = beta * beta;
    (1.0 + beta_sq) * p * r / (beta_sq * p + r)
}

/// Normalize a pair so the smaller element comes first.
///
/// Makes `(a, b)` and `(b, a)` the same set member.
pub fn normalize_pair<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn census_records() -> AHashMap<String, Vec<String>> {
        // (record id, entity id)
        [("1", "e1"), ("2", "e1"), ("3", "e1"), ("4", "e2"), ("5", "e2"), ("6", "e3")]
            .into_iter()
            .map(|(id, entity)| (id.to_string(), vec![String::new(), entity.to_string()]))
            .collect()
    }

    #[test]
    fn test_blocking_quality() {
        let mut pairs = CandidatePairs::new();
        pairs.add_block(&["1", "2"]);
        pairs.add_block(&["4", "5", "6"]);

        let quality =
            BlockingQuality::evaluate(&pairs, &census_records(), |rec| rec[1].clone(), 6).unwrap();
        // true matches: 1-2 and 4-5; non-matches: 4-6, 5-6
        assert_eq!(quality.matches, 2);
        assert_eq!(quality.non_matches, 2);
        // C(3,2) + C(2,2) + C(1,2)
        assert_eq!(quality.total_matches, 4);
        assert!(approx_eq(quality.pairs_completeness().unwrap(), 0.5));
        assert!(approx_eq(quality.pairs_quality(), 0.5));
        assert!(approx_eq(quality.reduction_ratio(), 1.0 - 4.0 / 15.0));
    }

    #[test]
    fn test_blocking_quality_without_true_matches() {
        let records: AHashMap<String, Vec<String>> = [("1", "a"), ("2", "b")]
            .into_iter()
            .map(|(id, entity)| (id.to_string(), vec![entity.to_string()]))
            .collect();
        let pairs = CandidatePairs::new();
        let quality = BlockingQuality::evaluate(&pairs, &records, |rec| rec[0].clone(), 2).unwrap();
        assert_eq!(quality.pairs_completeness(), None);
        assert_eq!(quality.pairs_quality(), 0.0);
        assert_eq!(quality.reduction_ratio(), 1.0);
    }

    #[test]
    fn test_blocking_quality_unknown_record() {
        let mut pairs = CandidatePairs::new();
        pairs.add_block(&["1", "99"]);
        let result = BlockingQuality::evaluate(&pairs, &census_records(), |rec| rec[1].clone(), 6);
        assert!(matches!(result, Err(LinkageError::MissingComparisonRecord(id)) if id == "99"));
    }

    #[test]
    fn test_precision_partial() {
        let true_matches: HashSet<_> = [(0, 1)].into_iter().collect();
        let predicted: HashSet<_> = [(0, 1), (2, 3)].into_iter().collect();
        assert_eq!(precision(&true_matches, &predicted), 0.5);
    }

    #[test]
    fn test_precision_empty() {
        let true_matches: HashSet<(usize, usize)> = HashSet::new();
        let predicted: HashSet<(usize, usize)> = HashSet::new();
        assert_eq!(precision(&true_matches, &predicted), 1.0);
    }

    #[test]
    fn test_recall_partial() {
        let true_matches: HashSet<_> = [("a", "b"), ("b", "c")].into_iter().collect();
        let predicted: HashSet<_> = [("a", "b")].into_iter().collect();
        assert_eq!(recall(&true_matches, &predicted), 0.5);
    }

    #[test]
    fn test_f_score() {
        let true_matches: HashSet<_> = [(0, 1)].into_iter().collect();
        let predicted: HashSet<_> = [(0, 1)].into_iter().collect();
        assert_eq!(f_score(&true_matches, &predicted, 1.0), 1.0);

        let predicted: HashSet<_> = [(2, 3)].into_iter().collect();
        assert_eq!(f_score(&true_matches, &predicted, 1.0), 0.0);
    }

    #[test]
    fn test_normalize_pair() {
        assert_eq!(normalize_pair(1, 2), (1, 2));
        assert_eq!(normalize_pair(2, 1), (1, 2));
        assert_eq!(normalize_pair("b", "a"), ("a", "b"));
    }
}
