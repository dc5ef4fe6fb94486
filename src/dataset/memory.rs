//! In-memory dataset

use super::{Dataset, FieldTable, RawRecord, RecordIter};
use crate::error::{LinkageError, Result};

/// Dataset backed by a vector of records
///
/// # Example
///
/// ```rust
/// use recordlink::dataset::{Dataset, FieldTable, MemoryDataset};
///
/// let fields = FieldTable::new(["surname", "given_name"]).unwrap();
/// let ds = MemoryDataset::new(
///     "people",
///     fields,
///     vec![("1".to_string(), vec!["smith".to_string(), "john".to_string()])],
/// )
/// .unwrap();
/// assert_eq!(ds.record_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    description: String,
    fields: FieldTable,
    records: Vec<RawRecord>,
}

impl MemoryDataset {
    /// Create a dataset from records; an empty record list is an error.
    pub fn new(
        description: impl Into<String>,
        fields: FieldTable,
        records: Vec<RawRecord>,
    ) -> Result<Self> {
        let description = description.into();
        if records.is_empty() {
            return Err(LinkageError::EmptyDataset(description));
        }
        Ok(Self {
            description,
            fields,
            records,
        })
    }

    /// Create a dataset from borrowed rows of a fixed width
    pub fn from_rows<const N: usize>(
        description: impl Into<String>,
        fields: FieldTable,
        rows: &[(&str, [&str; N])],
    ) -> Result<Self> {
        let records = rows
            .iter()
            .map(|(id, values)| {
                (
                    id.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect();
        Self::new(description, fields, records)
    }
}

impl Dataset for MemoryDataset {
    fn description(&self) -> &str {
        &self.description
    }

    fn field_table(&self) -> &FieldTable {
        &self.fields
    }

    fn record_count(&self) -> usize {
        self.records.len()
    }

    fn records(&self) -> Result<RecordIter<'_>> {
        Ok(Box::new(self.records.iter().cloned().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_dataset_restartable() {
        let fields = FieldTable::new(["surname"]).unwrap();
        let ds = MemoryDataset::from_rows("test", fields, &[("1", ["smith"]), ("2", ["jones"])])
            .unwrap();

        let first: Vec<_> = ds.records().unwrap().map(|r| r.unwrap().0).collect();
        let second: Vec<_> = ds.records().unwrap().map(|r| r.unwrap().0).collect();
        assert_eq!(first, vec!["1", "2"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_memory_dataset_empty() {
        let fields = FieldTable::new(["surname"]).unwrap();
        let result = MemoryDataset::new("empty", fields, Vec::new());
        assert!(matches!(result, Err(LinkageError::EmptyDataset(_))));
    }
}
