//! CSV-backed dataset
//!
//! The file is parsed once on open to count records and re-opened for every
//! call to [`Dataset::records`], so iteration always starts at the first
//! record.

use std::fs::File;
use std::path::PathBuf;

use csv::{Reader, ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};

use super::{Dataset, FieldTable, RawRecord, RecordIter};
use crate::error::{LinkageError, Result};

/// Options for opening a CSV dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvDatasetConfig {
    /// Description used in logs and errors
    pub description: String,

    /// Path of the CSV file
    pub path: PathBuf,

    /// Field delimiter (default: `,`)
    pub delimiter: char,

    /// Take field names from the first line of the file
    pub header_line: bool,

    /// Field names in column order; required without a header line
    pub field_names: Option<Vec<String>>,

    /// Name of the identifier field, or the prefix for synthesised identifiers
    /// (`<rec_ident>-<n>`) when no field has this name
    pub rec_ident: String,

    /// Strip surrounding whitespace from field values (and header names)
    pub strip_fields: bool,

    /// Values treated as missing and replaced with an empty string
    pub missing_values: Vec<String>,
}

impl Default for CsvDatasetConfig {
    fn default() -> Self {
        Self {
            description: String::new(),
            path: PathBuf::new(),
            delimiter: ',',
            header_line: false,
            field_names: None,
            rec_ident: "rec".to_string(),
            strip_fields: true,
            missing_values: Vec::new(),
        }
    }
}

/// A dataset read from a delimited text file
#[derive(Debug, Clone)]
pub struct CsvDataset {
    config: CsvDatasetConfig,
    delimiter: u8,
    fields: FieldTable,
    rec_ident_col: Option<usize>,
    missing_values: Vec<String>,
    record_count: usize,
}

impl CsvDataset {
    /// Open a CSV file for reading.
    ///
    /// Reads the header (if configured) and counts the records.
    ///
    /// # Errors
    /// - [`LinkageError::MissingFieldNames`] without a header line or field names
    /// - [`LinkageError::InvalidDelimiter`] for a non-ASCII delimiter
    /// - [`LinkageError::EmptyDataset`] if the file holds no records
    /// - [`LinkageError::Csv`] if the file cannot be opened or parsed
    pub fn open(config: CsvDatasetConfig) -> Result<Self> {
        if !config.delimiter.is_ascii() {
            return Err(LinkageError::InvalidDelimiter(config.delimiter));
        }
        let delimiter = config.delimiter as u8;

        let mut reader = open_reader(&config, delimiter)?;

        let fields = if config.header_line {
            let header = reader.headers()?;
            FieldTable::new(header.iter().map(|name| {
                if config.strip_fields {
                    name.trim().to_string()
                } else {
                    name.to_string()
                }
            }))?
        } else {
            match &config.field_names {
                Some(names) => FieldTable::new(names.iter().cloned())?,
                None => return Err(LinkageError::MissingFieldNames),
            }
        };

        let mut record_count = 0usize;
        for record in reader.records() {
            record?;
            record_count += 1;
        }

        if record_count == 0 {
            return Err(LinkageError::EmptyDataset(config.description.clone()));
        }

        let missing_values: Vec<String> = config
            .missing_values
            .iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        let rec_ident_col = fields.column(&config.rec_ident);

        log::info!(
            "Opened CSV dataset '{}' ({}): {} records, {} fields",
            config.description,
            config.path.display(),
            record_count,
            fields.len()
        );

        Ok(Self {
            config,
            delimiter,
            fields,
            rec_ident_col,
            missing_values,
            record_count,
        })
    }

    /// Configuration the dataset was opened with
    pub fn config(&self) -> &CsvDatasetConfig {
        &self.config
    }

    fn convert(&self, seq: usize, record: StringRecord) -> RawRecord {
        let values: Vec<String> = record
            .iter()
            .map(|value| {
                let value = if self.config.strip_fields {
                    value.trim()
                } else {
                    value
                };
                if self.missing_values.iter().any(|m| m == value) {
                    String::new()
                } else {
                    value.to_string()
                }
            })
            .collect();

        let ident = match self.rec_ident_col {
            Some(col) => values.get(col).cloned().unwrap_or_default(),
            None => format!("{}-{}", self.config.rec_ident, seq),
        };

        (ident, values)
    }
}

fn open_reader(config: &CsvDatasetConfig, delimiter: u8) -> Result<Reader<File>> {
    Ok(ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(config.header_line)
        .flexible(true)
        .from_path(&config.path)?)
}

impl Dataset for CsvDataset {
    fn description(&self) -> &str {
        &self.config.description
    }

    fn field_table(&self) -> &FieldTable {
        &self.fields
    }

    fn record_count(&self) -> usize {
        self.record_count
    }

    fn records(&self) -> Result<RecordIter<'_>> {
        let reader = open_reader(&self.config, self.delimiter)?;
        Ok(Box::new(
            reader
                .into_records()
                .enumerate()
                .map(move |(seq, record)| -> Result<RawRecord> {
                    Ok(self.convert(seq, record?))
                }),
        ))
    }
}
