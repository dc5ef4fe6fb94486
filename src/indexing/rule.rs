//! Index rules and blocking key derivation
//!
//! An [`IndexRule`] turns one field of a record into a sub-key; an
//! [`IndexDefinition`] joins the sub-keys of its rules into one blocking key.

use serde::{Deserialize, Serialize};

use crate::algorithms::phonetic::{nysiis, NYSIIS_DEFAULT_MAX_LENGTH};
use crate::algorithms::substring::get_substring;
use crate::dataset::FieldTable;
use crate::error::{LinkageError, Result};

/// Most extra arguments an encoder call may carry
pub const MAX_ENCODER_ARGS: usize = 3;

/// Key encoder applied to a field value
///
/// Deserialises from a call description such as
/// `{"name": "nysiis", "args": [3]}` or
/// `{"name": "substring", "args": [0, 4]}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncoderCall", into = "EncoderCall")]
pub enum Encoder {
    /// NYSIIS phonetic code, truncated to `max_len` (0 keeps the full code)
    Nysiis { max_len: usize },
    /// Character substring `[start, end)`
    Substring { start: usize, end: usize },
}

/// An encoder name with its extra arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderCall {
    pub name: String,
    #[serde(default)]
    pub args: Vec<i64>,
}

impl Encoder {
    /// Resolve an encoder call by name.
    ///
    /// `nysiis` takes an optional maximum length, `substring` takes a start
    /// and an end index.
    pub fn from_call(name: &str, args: &[i64]) -> Result<Self> {
        if args.len() > MAX_ENCODER_ARGS {
            return Err(LinkageError::EncoderArity {
                encoder: name.to_string(),
                given: args.len(),
                reason: "at most 3 extra arguments are supported",
            });
        }

        let arg = |value: i64| -> Result<usize> {
            usize::try_from(value).map_err(|_| LinkageError::InvalidEncoderArgument {
                encoder: name.to_string(),
                value,
            })
        };

        match name {
            "nysiis" => match *args {
                [] => Ok(Encoder::Nysiis {
                    max_len: NYSIIS_DEFAULT_MAX_LENGTH,
                }),
                [max_len] => Ok(Encoder::Nysiis {
                    max_len: arg(max_len)?,
                }),
                _ => Err(LinkageError::EncoderArity {
                    encoder: name.to_string(),
                    given: args.len(),
                    reason: "expected an optional maximum length",
                }),
            },
            "substring" | "get_substring" => match *args {
                [start, end] => {
                    let (start, end) = (arg(start)?, arg(end)?);
                    if start > end {
                        return Err(LinkageError::InvalidSubstring { start, end });
                    }
                    Ok(Encoder::Substring { start, end })
                }
                _ => Err(LinkageError::EncoderArity {
                    encoder: name.to_string(),
                    given: args.len(),
                    reason: "expected a start and an end index",
                }),
            },
            _ => Err(LinkageError::UnknownEncoder(name.to_string())),
        }
    }

    /// Encode a (lower-cased) field value
    pub fn encode(&self, value: &str) -> Result<String> {
        match *self {
            Encoder::Nysiis { max_len } => Ok(nysiis(value, max_len)),
            Encoder::Substring { start, end } => get_substring(value, start, end),
        }
    }
}

impl TryFrom<EncoderCall> for Encoder {
    type Error = LinkageError;

    fn try_from(call: EncoderCall) -> Result<Self> {
        Encoder::from_call(&call.name, &call.args)
    }
}

impl From<Encoder> for EncoderCall {
    fn from(encoder: Encoder) -> Self {
        match encoder {
            Encoder::Nysiis { max_len } => EncoderCall {
                name: "nysiis".to_string(),
                args: vec![max_len as i64],
            },
            Encoder::Substring { start, end } => EncoderCall {
                name: "substring".to_string(),
                args: vec![start as i64, end as i64],
            },
        }
    }
}

/// How one field contributes to a blocking key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRule {
    /// Field name in dataset 1
    pub field1: String,
    /// Field name in dataset 2
    pub field2: String,
    /// Sort the words of a multi-word value
    #[serde(default)]
    pub sort_words: bool,
    /// Reverse the value
    #[serde(default)]
    pub reverse: bool,
    /// Keep only the first characters; ignored when an encoder is set
    #[serde(default)]
    pub truncate: Option<usize>,
    #[serde(default)]
    pub encoder: Option<Encoder>,
}

impl IndexRule {
    pub fn new(field1: impl Into<String>, field2: impl Into<String>) -> Self {
        Self {
            field1: field1.into(),
            field2: field2.into(),
            sort_words: false,
            reverse: false,
            truncate: None,
            encoder: None,
        }
    }

    /// Rule on a field with the same name in both datasets
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name)
    }

    #[must_use]
    pub fn sort_words(mut self) -> Self {
        self.sort_words = true;
        self
    }

    #[must_use]
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    #[must_use]
    pub fn truncate(mut self, len: usize) -> Self {
        self.truncate = Some(len);
        self
    }

    #[must_use]
    pub fn encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Bind the rule to its dataset 1 column, checking the field exists in
    /// both field tables
    pub(crate) fn resolve(&self, fields1: &FieldTable, fields2: &FieldTable) -> Result<ResolvedRule> {
        let column = fields1.resolve(&self.field1, 1)?;
        fields2.resolve(&self.field2, 2)?;
        Ok(ResolvedRule {
            column,
            sort_words: self.sort_words,
            reverse: self.reverse,
            truncate: self.truncate,
            encoder: self.encoder,
        })
    }
}

/// Ordered rules whose sub-keys form one blocking key
pub type IndexDefinition = Vec<IndexRule>;

/// An index rule bound to the column it reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedRule {
    pub column: usize,
    pub sort_words: bool,
    pub reverse: bool,
    pub truncate: Option<usize>,
    pub encoder: Option<Encoder>,
}

impl ResolvedRule {
    /// Sub-key for one field value, `None` when the value is empty
    fn sub_key(&self, record: &[String]) -> Result<Option<String>> {
        let value = match record.get(self.column) {
            Some(value) if !value.is_empty() => value.to_lowercase(),
            _ => return Ok(None),
        };

        let value = if self.sort_words && value.contains(' ') {
            let mut words: Vec<&str> = value.split_whitespace().collect();
            words.sort_unstable();
            words.join(" ")
        } else {
            value
        };

        let value = if self.reverse {
            value.chars().rev().collect()
        } else {
            value
        };

        match (&self.encoder, self.truncate) {
            (Some(encoder), _) => encoder.encode(&value).map(Some),
            (None, Some(len)) => Ok(Some(value.chars().take(len).collect())),
            (None, None) => Ok(Some(value)),
        }
    }
}

/// Blocking key of a record under one definition
pub(crate) fn derive_key(rules: &[ResolvedRule], record: &[String], separator: &str) -> Result<String> {
    let mut parts = Vec::with_capacity(rules.len());
    for rule in rules {
        if let Some(part) = rule.sub_key(record)? {
            parts.push(part);
        }
    }
    Ok(parts.join(separator))
}
