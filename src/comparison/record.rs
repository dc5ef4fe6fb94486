//! Record comparator
//!
//! Applies an ordered list of field comparators to a pair of records and
//! collects their weights into a weight vector.

use crate::dataset::FieldTable;
use crate::error::Result;

use super::field::FieldComparator;

/// Per-pair scores, one per field comparator, in comparator order
pub type WeightVector = Vec<f64>;

/// A field comparator bound to a column in each dataset
#[derive(Debug, Clone)]
pub struct BoundComparator {
    pub comparator: FieldComparator,
    pub column1: usize,
    pub column2: usize,
}

/// Compares two records field by field
#[derive(Debug, Clone)]
pub struct RecordComparator {
    description: String,
    comparators: Vec<BoundComparator>,
}

impl RecordComparator {
    /// Bind field comparators to dataset columns.
    ///
    /// Each entry is `(comparator, field name in dataset 1, field name in
    /// dataset 2)`.
    ///
    /// # Errors
    /// [`crate::LinkageError::UnknownField`] if a field name is missing from
    /// either field table.
    pub fn new<S1, S2>(
        description: impl Into<String>,
        fields1: &FieldTable,
        fields2: &FieldTable,
        entries: Vec<(FieldComparator, S1, S2)>,
    ) -> Result<Self>
    where
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        let comparators = entries
            .into_iter()
            .map(|(comparator, name1, name2)| {
                Ok(BoundComparator {
                    column1: fields1.resolve(name1.as_ref(), 1)?,
                    column2: fields2.resolve(name2.as_ref(), 2)?,
                    comparator,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            description: description.into(),
            comparators,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn comparators(&self) -> &[BoundComparator] {
        &self.comparators
    }

    pub fn len(&self) -> usize {
        self.comparators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comparators.is_empty()
    }

    /// Comparator descriptions in weight-vector order
    pub fn field_names(&self) -> Vec<String> {
        self.comparators
            .iter()
            .map(|c| c.comparator.description().to_string())
            .collect()
    }

    /// Sorted, distinct columns of dataset 1 read by any comparator
    pub fn used_columns1(&self) -> Vec<usize> {
        Self::sorted_distinct(self.comparators.iter().map(|c| c.column1))
    }

    /// Sorted, distinct columns of dataset 2 read by any comparator
    pub fn used_columns2(&self) -> Vec<usize> {
        Self::sorted_distinct(self.comparators.iter().map(|c| c.column2))
    }

    fn sorted_distinct(columns: impl Iterator<Item = usize>) -> Vec<usize> {
        let mut columns: Vec<usize> = columns.collect();
        columns.sort_unstable();
        columns.dedup();
        columns
    }

    /// Compute the weight vector of two records.
    ///
    /// A column past the end of a record reads as an empty value.
    pub fn compare<S: AsRef<str>>(&self, rec1: &[S], rec2: &[S]) -> Result<WeightVector> {
        self.comparators
            .iter()
            .map(|bound| {
                let val1 = rec1.get(bound.column1).map_or("", AsRef::as_ref);
                let val2 = rec2.get(bound.column2).map_or("", AsRef::as_ref);
                bound.comparator.compare(val1, val2)
            })
            .collect()
    }
}
