//! Field comparators
//!
//! A field comparator turns two raw field values into a numeric weight. Every
//! comparator owns its missing-value set and its missing/agree/disagree
//! weights; nothing is shared between instances.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::algorithms::jaro::jaro_similarity;
use crate::error::{LinkageError, Result};

/// Weights returned by a field comparator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Returned when either value is missing (default: 0.0)
    pub missing_weight: f64,
    /// Returned when the values agree (default: 1.0)
    pub agree_weight: f64,
    /// Returned when the values disagree (default: 0.0)
    pub disagree_weight: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            missing_weight: 0.0,
            agree_weight: 1.0,
            disagree_weight: 0.0,
        }
    }
}

/// How two field values are compared
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMethod {
    /// Exact string equality
    ExactString,

    /// Jaro approximate string similarity
    ///
    /// Similarities below `threshold` count as disagreement; similarities at
    /// or above it are scaled linearly between the disagree and agree
    /// weights.
    Jaro {
        /// Similarity threshold in [0, 1)
        #[serde(default)]
        threshold: f64,
    },
}

impl ComparisonMethod {
    fn validate(&self) -> Result<()> {
        if let ComparisonMethod::Jaro { threshold } = *self {
            if !threshold.is_finite() || !(0.0..1.0).contains(&threshold) {
                return Err(LinkageError::InvalidThreshold(threshold));
            }
        }
        Ok(())
    }
}

/// Serialisable description of a field comparator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparatorConfig {
    /// Name reported for this comparator's column of the weight vector
    pub description: String,

    /// Comparison method
    pub method: ComparisonMethod,

    /// Values treated as missing (default: the empty string)
    #[serde(default = "default_missing_values")]
    pub missing_values: Vec<String>,

    /// Comparator weights
    #[serde(default)]
    pub weights: Weights,
}

fn default_missing_values() -> Vec<String> {
    vec![String::new()]
}

/// A validated field comparator
///
/// # Example
///
/// ```rust
/// use recordlink::comparison::FieldComparator;
///
/// let cmp = FieldComparator::jaro("surname_jaro", 0.0).unwrap();
/// assert_eq!(cmp.compare("smith", "smith").unwrap(), 1.0);
/// assert_eq!(cmp.compare("", "smith").unwrap(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct FieldComparator {
    description: String,
    method: ComparisonMethod,
    missing_values: AHashSet<String>,
    weights: Weights,
}

impl FieldComparator {
    /// Create a comparator with default weights and missing values
    pub fn new(description: impl Into<String>, method: ComparisonMethod) -> Result<Self> {
        method.validate()?;
        Ok(Self {
            description: description.into(),
            method,
            missing_values: default_missing_values().into_iter().collect(),
            weights: Weights::default(),
        })
    }

    /// Exact string comparator
    pub fn exact_string(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            method: ComparisonMethod::ExactString,
            missing_values: default_missing_values().into_iter().collect(),
            weights: Weights::default(),
        }
    }

    /// Jaro comparator; fails unless `0 <= threshold < 1`
    pub fn jaro(description: impl Into<String>, threshold: f64) -> Result<Self> {
        Self::new(description, ComparisonMethod::Jaro { threshold })
    }

    /// Build from a configuration, validating it
    pub fn from_config(config: FieldComparatorConfig) -> Result<Self> {
        Ok(Self::new(config.description, config.method)?
            .with_weights(config.weights)
            .with_missing_values(config.missing_values))
    }

    #[must_use]
    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    /// Replace the set of values treated as missing
    #[must_use]
    pub fn with_missing_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn method(&self) -> ComparisonMethod {
        self.method
    }

    pub fn weights(&self) -> Weights {
        self.weights
    }

    #[inline]
    fn is_missing(&self, value: &str) -> bool {
        self.missing_values.contains(value)
    }

    /// Compare two field values and return their weight.
    ///
    /// # Errors
    /// Only the Jaro method can fail, and only on an internal invariant
    /// violation.
    pub fn compare(&self, val1: &str, val2: &str) -> Result<f64> {
        if self.is_missing(val1) || self.is_missing(val2) {
            return Ok(self.weights.missing_weight);
        }

        match self.method {
            ComparisonMethod::ExactString => Ok(if val1 == val2 {
                self.weights.agree_weight
            } else {
                self.weights.disagree_weight
            }),
            ComparisonMethod::Jaro { threshold } => {
                if val1 == val2 {
                    return Ok(self.weights.agree_weight);
                }
                let similarity = jaro_similarity(val1, val2)?;
                if similarity == 0.0 {
                    return Ok(self.weights.disagree_weight);
                }
                Ok(self.partial_agreement(similarity, threshold))
            }
        }
    }

    /// Scale an approximate similarity into a weight.
    ///
    /// Reaches `agree_weight` at similarity 1.0 and drops linearly by
    /// `agree + |disagree|` over the range `[threshold, 1]`.
    fn partial_agreement(&self, similarity: f64, threshold: f64) -> f64 {
        if similarity < threshold {
            return self.weights.disagree_weight;
        }
        let agree = self.weights.agree_weight;
        agree - (1.0 - similarity) / (1.0 - threshold) * (agree + self.weights.disagree_weight.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.001
    }

    #[test]
    fn test_exact_string() {
        let cmp = FieldComparator::exact_string("entity_id_exact");
        for value in ["a", "smith", "2600", "o'neil"] {
            assert_eq!(cmp.compare(value, value).unwrap(), 1.0);
        }
        assert_eq!(cmp.compare("smith", "smyth").unwrap(), 0.0);
    }

    #[test]
    fn test_missing_values() {
        let cmp = FieldComparator::exact_string("x")
            .with_missing_values(["", "n/a"])
            .with_weights(Weights {
                missing_weight: 0.5,
                agree_weight: 2.0,
                disagree_weight: -1.0,
            });
        assert_eq!(cmp.compare("", "smith").unwrap(), 0.5);
        assert_eq!(cmp.compare("smith", "n/a").unwrap(), 0.5);
        assert_eq!(cmp.compare("n/a", "n/a").unwrap(), 0.5);
        assert_eq!(cmp.compare("smith", "jones").unwrap(), -1.0);
        assert_eq!(cmp.compare("smith", "smith").unwrap(), 2.0);
    }

    #[test]
    fn test_jaro_identical_and_disjoint() {
        let cmp = FieldComparator::jaro("surname_jaro", 0.0)
            .unwrap()
            .with_weights(Weights {
                missing_weight: 0.0,
                agree_weight: 3.0,
                disagree_weight: -2.0,
            });
        assert_eq!(cmp.compare("smith", "smith").unwrap(), 3.0);
        assert_eq!(cmp.compare("abc", "xyz").unwrap(), -2.0);
    }

    #[test]
    fn test_jaro_partial_agreement() {
        let cmp = FieldComparator::jaro("surname_jaro", 0.0).unwrap();
        // jaro("smith", "smyth") = 0.8667
        assert!(approx_eq(cmp.compare("smith", "smyth").unwrap(), 0.8667));

        let cmp = FieldComparator::jaro("surname_jaro", 0.5)
            .unwrap()
            .with_weights(Weights {
                missing_weight: 0.0,
                agree_weight: 1.0,
                disagree_weight: -1.0,
            });
        // 1 - (1 - 0.8667) / 0.5 * 2
        assert!(approx_eq(cmp.compare("smith", "smyth").unwrap(), 0.4667));
    }

    #[test]
    fn test_jaro_below_threshold() {
        let cmp = FieldComparator::jaro("surname_jaro", 0.9).unwrap();
        assert_eq!(cmp.compare("smith", "smyth").unwrap(), 0.0);
        assert!(cmp.compare("john", "jon").unwrap() > 0.0);
    }

    #[test]
    fn test_jaro_symmetric_weights() {
        let cmp = FieldComparator::jaro("name", 0.2).unwrap();
        for (a, b) in [("sydney", "sidney"), ("canberra", "camberra"), ("peter", "petra")] {
            assert_eq!(cmp.compare(a, b).unwrap(), cmp.compare(b, a).unwrap());
        }
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(matches!(
            FieldComparator::jaro("x", 1.0),
            Err(LinkageError::InvalidThreshold(_))
        ));
        assert!(FieldComparator::jaro("x", 1.5).is_err());
        assert!(FieldComparator::jaro("x", -0.1).is_err());
        assert!(FieldComparator::jaro("x", f64::NAN).is_err());
        assert!(FieldComparator::jaro("x", 0.99).is_ok());
    }

    #[test]
    fn test_from_config() {
        let config: FieldComparatorConfig = serde_json::from_str(
            r#"{
                "description": "suburb_jaro",
                "method": {"jaro": {"threshold": 0.3}},
                "weights": {"agree_weight": 5.0}
            }"#,
        )
        .unwrap();
        let cmp = FieldComparator::from_config(config).unwrap();
        assert_eq!(cmp.description(), "suburb_jaro");
        assert_eq!(cmp.method(), ComparisonMethod::Jaro { threshold: 0.3 });
        assert_eq!(cmp.weights().agree_weight, 5.0);
        assert_eq!(cmp.weights().disagree_weight, 0.0);
        assert_eq!(cmp.compare("", "x").unwrap(), 0.0);

        let config: FieldComparatorConfig =
            serde_json::from_str(r#"{"description": "id", "method": "exact_string"}"#).unwrap();
        let cmp = FieldComparator::from_config(config).unwrap();
        assert_eq!(cmp.compare("a", "a").unwrap(), 1.0);
    }
}
