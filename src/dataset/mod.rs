//! Record sources
//!
//! A dataset is an ordered set of named fields plus a restartable stream of
//! records. The indexing engine only ever talks to the [`Dataset`] trait;
//! [`CsvDataset`] and [`MemoryDataset`] are the two sources shipped here.

pub mod csv_file;
pub mod memory;

pub use csv_file::{CsvDataset, CsvDatasetConfig};
pub use memory::MemoryDataset;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{LinkageError, Result};

/// One record as produced by a dataset: identifier and field values
pub type RawRecord = (String, Vec<String>);

/// Iterator over the records of a dataset
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<RawRecord>> + 'a>;

/// Ordered field names with O(1) name to column lookup
///
/// Column ordinals are always `0..len`, in field order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FieldTable {
    names: Vec<String>,
    columns: AHashMap<String, usize>,
}

impl PartialEq for FieldTable {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Eq for FieldTable {}

impl FieldTable {
    /// Build a field table from names in column order
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut columns = AHashMap::with_capacity(names.len());
        for (col, name) in names.iter().enumerate() {
            if columns.insert(name.clone(), col).is_some() {
                return Err(LinkageError::DuplicateField(name.clone()));
            }
        }
        Ok(Self { names, columns })
    }

    /// Build a field table from explicit (name, column) pairs
    ///
    /// Columns must be consecutive and start at 0.
    pub fn from_columns<S: AsRef<str>>(fields: &[(S, usize)]) -> Result<Self> {
        for (expected, (name, actual)) in fields.iter().enumerate() {
            if expected != *actual {
                return Err(LinkageError::NonConsecutiveColumns {
                    field: name.as_ref().to_string(),
                    expected,
                    actual: *actual,
                });
            }
        }
        Self::new(fields.iter().map(|(name, _)| name.as_ref()))
    }

    /// Column of a field, if present
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Column of a field, or an error naming the dataset (1 or 2)
    pub fn resolve(&self, name: &str, dataset: usize) -> Result<usize> {
        self.column(name).ok_or_else(|| LinkageError::UnknownField {
            dataset,
            field: name.to_string(),
        })
    }

    /// Field names in column order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl TryFrom<Vec<String>> for FieldTable {
    type Error = LinkageError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::new(names)
    }
}

impl From<FieldTable> for Vec<String> {
    fn from(table: FieldTable) -> Self {
        table.names
    }
}

/// A source of records with a fixed set of named fields
pub trait Dataset {
    /// Human readable description used in logs and errors
    fn description(&self) -> &str;

    /// Field names and their columns
    fn field_table(&self) -> &FieldTable;

    /// Total number of records
    fn record_count(&self) -> usize;

    /// Stream all records from the start
    ///
    /// Every call starts over at the first record.
    fn records(&self) -> Result<RecordIter<'_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_table_lookup() {
        let table = FieldTable::new(["rec_id", "surname", "given_name"]).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column("surname"), Some(1));
        assert_eq!(table.column("suburb"), None);
        assert_eq!(table.names()[2], "given_name");
    }

    #[test]
    fn test_field_table_resolve_names_dataset() {
        let table = FieldTable::new(["surname"]).unwrap();
        assert_eq!(table.resolve("surname", 1).unwrap(), 0);
        assert!(matches!(
            table.resolve("zipcode", 2),
            Err(LinkageError::UnknownField { dataset: 2, .. })
        ));
    }

    #[test]
    fn test_field_table_from_columns() {
        let table = FieldTable::from_columns(&[("relation", 0), ("entity_id", 1)]).unwrap();
        assert_eq!(table.column("entity_id"), Some(1));

        let result = FieldTable::from_columns(&[("relation", 0), ("entity_id", 2)]);
        assert!(matches!(
            result,
            Err(LinkageError::NonConsecutiveColumns { expected: 1, actual: 2, .. })
        ));
    }

    #[test]
    fn test_field_table_duplicate() {
        let result = FieldTable::new(["name", "name"]);
        assert!(matches!(result, Err(LinkageError::DuplicateField(_))));
    }

    #[test]
    fn test_field_table_serde() {
        let table: FieldTable = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(table.column("b"), Some(1));
        assert_eq!(serde_json::to_string(&table).unwrap(), r#"["a","b"]"#);
    }
}
