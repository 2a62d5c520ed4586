use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::processor::ProcessorError;

/// Columns of the funding table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    Startup,
    Vertical,
    Subvertical,
    City,
    Investors,
    Round,
    Amount,
    Founders,
    Stage,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Date,
        Field::Startup,
        Field::Vertical,
        Field::Subvertical,
        Field::City,
        Field::Investors,
        Field::Round,
        Field::Amount,
        Field::Founders,
        Field::Stage,
    ];

    /// Header name as it appears in the CSV (compared case-insensitively)
    pub fn header(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Startup => "startup",
            Field::Vertical => "vertical",
            Field::Subvertical => "subvertical",
            Field::City => "city",
            Field::Investors => "investors",
            Field::Round => "round",
            Field::Amount => "amount",
            Field::Founders => "founders",
            Field::Stage => "stage",
        }
    }

    pub fn from_header(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.header() == name)
    }

    pub fn column_type(self) -> ColumnType {
        match self {
            Field::Date => ColumnType::Date,
            Field::Amount => ColumnType::Float64,
            _ => ColumnType::Text,
        }
    }

    pub fn is_required(self) -> bool {
        matches!(self, Field::Startup | Field::Amount)
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Float64,
    Date,
}

/// Which columns the source file actually carried.
///
/// Computed once at load so "column may be absent" checks never touch the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnSet(u16);

impl ColumnSet {
    pub fn insert(&mut self, field: Field) {
        self.0 |= field.bit();
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn missing_required(&self) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|f| f.is_required() && !self.contains(*f))
    }
}

impl FromIterator<Field> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        let mut set = ColumnSet::default();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

/// Typed column storage; one vector per field, indexed by row
#[derive(Debug, Clone)]
pub enum Column {
    Text(Vec<Option<String>>),
    Float64(Vec<f64>),
    Date(Vec<Option<NaiveDate>>),
}

impl Column {
    pub fn with_capacity(column_type: ColumnType, capacity: usize) -> Self {
        match column_type {
            ColumnType::Text => Column::Text(Vec::with_capacity(capacity)),
            ColumnType::Float64 => Column::Float64(Vec::with_capacity(capacity)),
            ColumnType::Date => Column::Date(Vec::with_capacity(capacity)),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Text(_) => ColumnType::Text,
            Column::Float64(_) => ColumnType::Float64,
            Column::Date(_) => ColumnType::Date,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Result<&[Option<String>], ProcessorError> {
        match self {
            Column::Text(v) => Ok(v),
            _ => Err(ProcessorError::Parse("expected a text column".into())),
        }
    }

    pub fn as_f64(&self) -> Result<&[f64], ProcessorError> {
        match self {
            Column::Float64(v) => Ok(v),
            _ => Err(ProcessorError::Parse("expected a numeric column".into())),
        }
    }

    pub fn as_date(&self) -> Result<&[Option<NaiveDate>], ProcessorError> {
        match self {
            Column::Date(v) => Ok(v),
            _ => Err(ProcessorError::Parse("expected a date column".into())),
        }
    }

    /// Appends the values of `other` (a batch of the same type) in order
    pub fn extend_from(&mut self, other: Column) -> Result<(), ProcessorError> {
        match (self, other) {
            (Column::Text(dst), Column::Text(src)) => dst.extend(src),
            (Column::Float64(dst), Column::Float64(src)) => dst.extend(src),
            (Column::Date(dst), Column::Date(src)) => dst.extend(src),
            _ => return Err(ProcessorError::Parse("column batch type mismatch".into())),
        }
        Ok(())
    }

    /// Number of distinct non-null values
    pub fn distinct_count(&self) -> usize {
        match self {
            Column::Text(v) => v
                .iter()
                .flatten()
                .map(String::as_str)
                .collect::<HashSet<_>>()
                .len(),
            Column::Float64(v) => v.iter().map(|x| x.to_bits()).collect::<HashSet<_>>().len(),
            Column::Date(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_set_tracks_presence() {
        let set: ColumnSet = [Field::Startup, Field::Amount, Field::City]
            .into_iter()
            .collect();
        assert!(set.contains(Field::City));
        assert!(!set.contains(Field::Founders));
        assert_eq!(set.missing_required(), None);

        let partial: ColumnSet = [Field::Startup].into_iter().collect();
        assert_eq!(partial.missing_required(), Some(Field::Amount));
    }

    #[test]
    fn test_distinct_count_skips_nulls() {
        let col = Column::Text(vec![
            Some("Fintech".to_string()),
            None,
            Some("Fintech".to_string()),
            Some("Edtech".to_string()),
        ]);
        assert_eq!(col.distinct_count(), 2);
    }

    #[test]
    fn test_extend_rejects_mismatched_batch() {
        let mut col = Column::with_capacity(ColumnType::Float64, 4);
        col.extend_from(Column::Float64(vec![1.0, 2.0])).unwrap();
        assert_eq!(col.len(), 2);
        assert!(col.extend_from(Column::Text(vec![None])).is_err());
    }
}
