use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub mod column;
pub mod dashboard;
pub mod dataset;
pub mod engine;
pub mod investor;
pub mod query_cache;
pub mod results;
pub mod snapshot;
pub mod startup;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Schema/parse error: {0}")]
    Parse(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },
}

impl ProcessorError {
    pub fn startup_not_found(name: &str) -> Self {
        ProcessorError::NotFound {
            kind: EntityKind::Startup,
            name: name.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProcessorError::NotFound { .. })
    }
}

/// What a [`ProcessorError::NotFound`] was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Startup,
    Investor,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Startup => f.write_str("startup"),
            EntityKind::Investor => f.write_str("investor"),
        }
    }
}

/// Outcome of a CSV load: how many rows were seen, kept, and what went wrong
#[derive(Debug, Default, Clone, Serialize)]
pub struct ParseSummary {
    pub rows_processed: usize,
    pub rows_loaded: usize,
    pub errors: Vec<ParseError>,
}

impl ParseSummary {
    /// Rows dropped from the dataset (date errors keep their row)
    pub fn rows_skipped(&self) -> usize {
        self.rows_processed - self.rows_loaded
    }

    pub fn count(&self, kind: ParseErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    /// 1-based line number in the source file, header included
    pub row: usize,
    pub column: String,
    pub value: String,
    pub kind: ParseErrorKind,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// Date did not parse; the row is kept with a null date.
    InvalidDate,
    /// Amount missing, non-numeric or negative; the row is dropped.
    InvalidAmount,
    /// Empty startup name; the row is dropped.
    MissingStartup,
    /// The CSV reader could not decode the record; the row is dropped.
    Malformed,
}

/// Value helper for predicates (owned for simplicity)
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Amount column
    Float(f64),
    /// Text column
    Str(String),
}

/// Filter predicate
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    Equals(Value),
    /// Inclusive on both ends
    Between(Value, Value),
}

/// Aggregate operations over a numeric slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    /// Sum of all numeric values
    Sum,
    /// Average of numeric values
    Avg,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
}
