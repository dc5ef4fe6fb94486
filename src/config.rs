//! Linkage configuration
//!
//! A whole linkage run described in JSON: the field comparators with the
//! columns they read, the index definitions and strategy, and the run
//! options.
//!
//! ```json
//! {
//!   "description": "census deduplication",
//!   "comparators": [
//!     {"field1": "surname", "field2": "surname",
//!      "description": "surname_jaro", "method": {"jaro": {"threshold": 0.0}}}
//!   ],
//!   "index": {
//!     "definitions": [[{"field1": "surname", "field2": "surname",
//!                       "encoder": {"name": "nysiis", "args": [3]}}]],
//!     "strategy": {"type": "blocking"}
//!   },
//!   "run": {"cut_off_threshold": 0.5}
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::comparison::{FieldComparator, FieldComparatorConfig, RecordComparator};
use crate::dataset::{Dataset, FieldTable};
use crate::error::{LinkageError, Result};
use crate::indexing::{Index, IndexConfig, RunOptions};

/// A field comparator and the field it reads in each dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparatorEntry {
    pub field1: String,
    pub field2: String,
    #[serde(flatten)]
    pub comparator: FieldComparatorConfig,
}

/// Configuration of a complete linkage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkageConfig {
    #[serde(default)]
    pub description: String,
    pub comparators: Vec<ComparatorEntry>,
    pub index: IndexConfig,
    #[serde(default)]
    pub run: RunOptions,
}

impl LinkageConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check everything that can be checked without the datasets
    pub fn validate(&self) -> Result<()> {
        for entry in &self.comparators {
            FieldComparator::from_config(entry.comparator.clone())?;
        }
        if self.index.definitions.is_empty() {
            return Err(LinkageError::NoIndexDefinitions);
        }
        if let Some(i) = self.index.definitions.iter().position(Vec::is_empty) {
            return Err(LinkageError::EmptyIndexDefinition(i));
        }
        self.index.strategy.validate()
    }

    /// Build the record comparator against the datasets' field tables
    pub fn record_comparator(&self, fields1: &FieldTable, fields2: &FieldTable) -> Result<RecordComparator> {
        let entries = self
            .comparators
            .iter()
            .map(|entry| {
                Ok((
                    FieldComparator::from_config(entry.comparator.clone())?,
                    entry.field1.as_str(),
                    entry.field2.as_str(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        RecordComparator::new(self.description.clone(), fields1, fields2, entries)
    }

    /// Build an index over the datasets
    pub fn build_index<'a>(&self, dataset1: &'a dyn Dataset, dataset2: &'a dyn Dataset) -> Result<Index<'a>> {
        let comparator = self.record_comparator(dataset1.field_table(), dataset2.field_table())?;
        Index::new(self.index.clone(), dataset1, dataset2, comparator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::ComparisonMethod;
    use crate::indexing::{Encoder, IndexStrategy};
    use std::io::Write;

    const CONFIG: &str = r#"{
        "description": "census",
        "comparators": [
            {"field1": "entity_id", "field2": "entity_id",
             "description": "entity_id_exact", "method": "exact_string"},
            {"field1": "surname", "field2": "surname",
             "description": "surname_jaro", "method": {"jaro": {"threshold": 0.2}},
             "weights": {"disagree_weight": -1.0}}
        ],
        "index": {
            "definitions": [
                [{"field1": "surname", "field2": "surname",
                  "encoder": {"name": "nysiis", "args": [3]}},
                 {"field1": "zipcode", "field2": "zipcode", "truncate": 2}]
            ],
            "separator": "-",
            "strategy": {"type": "sorting", "window_size": 3}
        },
        "run": {"length_filter_perc": 50.0}
    }"#;

    #[test]
    fn test_parse() {
        let config = LinkageConfig::from_json_str(CONFIG).unwrap();
        assert_eq!(config.comparators.len(), 2);
        assert_eq!(
            config.comparators[1].comparator.method,
            ComparisonMethod::Jaro { threshold: 0.2 }
        );
        assert_eq!(config.comparators[1].comparator.weights.disagree_weight, -1.0);
        assert_eq!(config.comparators[1].comparator.weights.agree_weight, 1.0);
        assert_eq!(config.index.strategy, IndexStrategy::Sorting { window_size: 3 });
        assert!(config.index.skip_missing);
        assert_eq!(
            config.index.definitions[0][0].encoder,
            Some(Encoder::Nysiis { max_len: 3 })
        );
        assert_eq!(config.index.definitions[0][1].truncate, Some(2));
        assert_eq!(config.run.length_filter_perc, Some(50.0));
        assert_eq!(config.run.cut_off_threshold, None);
    }

    #[test]
    fn test_record_comparator() {
        let config = LinkageConfig::from_json_str(CONFIG).unwrap();
        let fields = FieldTable::new(["entity_id", "surname", "zipcode"]).unwrap();
        let cmp = config.record_comparator(&fields, &fields).unwrap();
        assert_eq!(cmp.field_names(), vec!["entity_id_exact", "surname_jaro"]);
        assert_eq!(cmp.used_columns1(), vec![0, 1]);
    }

    #[test]
    fn test_invalid_configs() {
        let bad_threshold = CONFIG.replace("0.2", "1.0");
        assert!(matches!(
            LinkageConfig::from_json_str(&bad_threshold),
            Err(LinkageError::InvalidThreshold(_))
        ));

        let bad_window = CONFIG.replace(r#""sorting", "window_size": 3"#, r#""sorting_array", "window_size": 1"#);
        assert!(matches!(
            LinkageConfig::from_json_str(&bad_window),
            Err(LinkageError::InvalidWindowSize { .. })
        ));

        let bad_encoder = CONFIG.replace(r#""args": [3]"#, r#""args": [1, 2, 3, 4]"#);
        assert!(matches!(
            LinkageConfig::from_json_str(&bad_encoder),
            Err(LinkageError::Config(_))
        ));

        assert!(matches!(
            LinkageConfig::from_json_str("{"),
            Err(LinkageError::Config(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let config = LinkageConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.description, "census");

        assert!(matches!(
            LinkageConfig::from_json_file("/nonexistent/linkage.json"),
            Err(LinkageError::Io(_))
        ));
    }
}
