use std::{collections::HashMap, fs::File, io, path::Path};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use memmap2::Mmap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::LoadConfig,
    helpers::simd_helpers::filter_f64_between,
    processor::{
        FilterPredicate, ParseError, ParseErrorKind, ParseSummary, ProcessorError, Value,
        column::{Column, ColumnSet, Field},
    },
};

/// Rows parsed per rayon task, at minimum
const MIN_BATCH_ROWS: usize = 1024;

/// One funding row, materialised from the columnar [`Dataset`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingRecord {
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub startup: String,
    pub vertical: Option<String>,
    pub subvertical: Option<String>,
    pub city: Option<String>,
    pub investors: Option<String>,
    pub round: Option<String>,
    pub amount: f64,
    pub founders: Option<String>,
    pub stage: Option<String>,
}

/// Immutable columnar funding table.
///
/// Every [`Field`] has a column, even when the source file lacked it; those
/// columns hold nulls and [`Dataset::has_column`] reports them as absent.
///
/// # Examples
///
/// ```rust
/// # use startup_funding::{Dataset, config::LoadConfig};
/// let csv = "date,startup,amount\n2020-01-05,Acme,10\n";
/// let (dataset, summary) = Dataset::from_csv_str(csv, &LoadConfig::default()).unwrap();
/// assert_eq!(dataset.row_count(), 1);
/// assert!(summary.errors.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>, // indexed by `Field as usize`
    present: ColumnSet,
    year: Vec<Option<i32>>,
    month: Vec<Option<u32>>,
    row_count: usize,
}

/// Column positions of the known fields within the CSV header
#[derive(Debug)]
struct HeaderLayout {
    positions: HashMap<Field, usize>,
}

impl HeaderLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self, ProcessorError> {
        let mut positions = HashMap::new();
        for (idx, name) in headers.iter().enumerate() {
            if let Some(field) = Field::from_header(&normalize_header_name(name)) {
                positions.entry(field).or_insert(idx);
            }
        }

        let layout = HeaderLayout { positions };
        if let Some(field) = layout.present().missing_required() {
            return Err(ProcessorError::MissingColumn(field.header().to_string()));
        }
        Ok(layout)
    }

    fn present(&self) -> ColumnSet {
        self.positions.keys().copied().collect()
    }

    /// Trimmed cell for `field`; empty and absent cells are `None`
    fn get<'r>(&self, record: &'r StringRecord, field: Field) -> Option<&'r str> {
        let idx = *self.positions.get(&field)?;
        record.get(idx).filter(|s| !s.is_empty())
    }
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').trim().to_ascii_lowercase()
}

/// Date formats to try, each with and without a time part
#[derive(Debug)]
struct DateParser {
    date_formats: Vec<String>,
    datetime_formats: Vec<String>,
}

impl DateParser {
    fn new(config: &LoadConfig) -> Self {
        DateParser {
            date_formats: config.date_formats.clone(),
            datetime_formats: config
                .date_formats
                .iter()
                .map(|f| format!("{f} %H:%M:%S"))
                .collect(),
        }
    }

    fn parse(&self, value: &str) -> Option<NaiveDate> {
        self.date_formats
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
            .or_else(|| {
                self.datetime_formats
                    .iter()
                    .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
                    .map(|dt| dt.date())
            })
    }
}

/// Columns parsed from one slice of records
#[derive(Debug)]
struct BatchResult {
    columns: Vec<Column>,
    year: Vec<Option<i32>>,
    month: Vec<Option<u32>>,
    row_count: usize,
    errors: Vec<ParseError>,
}

fn empty_columns(capacity: usize) -> Vec<Column> {
    Field::ALL
        .iter()
        .map(|f| Column::with_capacity(f.column_type(), capacity))
        .collect()
}

impl Dataset {
    /// Loads a CSV file through a memory map
    ///
    /// Rows with an unusable `startup` or `amount` are skipped; an
    /// unparseable `date` only nulls the date. Both are reported in the
    /// returned [`ParseSummary`].
    ///
    /// # Errors
    /// Returns a [`ProcessorError`] if:
    /// - File cannot be opened or mapped
    /// - The header lacks `startup` or `amount`
    pub fn load_csv(
        path: &Path,
        config: &LoadConfig,
    ) -> Result<(Self, ParseSummary), ProcessorError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        debug!(path = %path.display(), bytes = mmap.len(), "mapped funding csv");
        Self::from_reader(&mmap[..], config)
    }

    pub fn from_csv_str(
        csv: &str,
        config: &LoadConfig,
    ) -> Result<(Self, ParseSummary), ProcessorError> {
        Self::from_reader(csv.as_bytes(), config)
    }

    pub fn from_reader<R: io::Read>(
        reader: R,
        config: &LoadConfig,
    ) -> Result<(Self, ParseSummary), ProcessorError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let layout = HeaderLayout::from_headers(reader.headers()?)?;
        let dates = DateParser::new(config);

        let mut records = Vec::new();
        let mut errors = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            match result {
                Ok(record) => {
                    let line = record.position().map_or(idx + 2, |p| p.line() as usize);
                    records.push((line, record));
                }
                Err(e) => errors.push(ParseError {
                    row: e.position().map_or(idx + 2, |p| p.line() as usize),
                    column: String::new(),
                    value: String::new(),
                    kind: ParseErrorKind::Malformed,
                    error: Some(e.to_string()),
                }),
            }
        }
        let rows_processed = records.len() + errors.len();

        // Parse batches in parallel; collect keeps them in file order
        let batch_rows = (records.len() / rayon::current_num_threads()).max(MIN_BATCH_ROWS);
        let batches: Vec<BatchResult> = records
            .par_chunks(batch_rows)
            .map(|chunk| Self::parse_batch(chunk, &layout, &dates))
            .collect();

        let mut columns = empty_columns(records.len());
        let mut year = Vec::with_capacity(records.len());
        let mut month = Vec::with_capacity(records.len());
        let mut row_count = 0;

        for batch in batches {
            row_count += batch.row_count;
            errors.extend(batch.errors);
            year.extend(batch.year);
            month.extend(batch.month);
            for (dst, src) in columns.iter_mut().zip(batch.columns) {
                dst.extend_from(src)?;
            }
        }
        errors.sort_by_key(|e| e.row);

        let summary = ParseSummary {
            rows_processed,
            rows_loaded: row_count,
            errors,
        };

        info!(
            rows = row_count,
            processed = rows_processed,
            errors = summary.errors.len(),
            "loaded funding dataset"
        );
        if !summary.errors.is_empty() {
            warn!(
                skipped = summary.rows_skipped(),
                invalid_dates = summary.count(ParseErrorKind::InvalidDate),
                invalid_amounts = summary.count(ParseErrorKind::InvalidAmount),
                missing_startups = summary.count(ParseErrorKind::MissingStartup),
                malformed = summary.count(ParseErrorKind::Malformed),
                "some funding rows were degraded or rejected"
            );
        }

        let dataset = Dataset {
            columns,
            present: layout.present(),
            year,
            month,
            row_count,
        };
        Ok((dataset, summary))
    }

    fn parse_batch(
        chunk: &[(usize, StringRecord)],
        layout: &HeaderLayout,
        dates: &DateParser,
    ) -> BatchResult {
        let mut columns = empty_columns(chunk.len());
        let mut year = Vec::with_capacity(chunk.len());
        let mut month = Vec::with_capacity(chunk.len());
        let mut errors = Vec::new();
        let mut row_count = 0;

        for (line, record) in chunk {
            let reject = |field: Field, kind: ParseErrorKind, error: Option<String>| ParseError {
                row: *line,
                column: field.header().to_string(),
                value: layout.get(record, field).unwrap_or_default().to_string(),
                kind,
                error,
            };

            if layout.get(record, Field::Startup).is_none() {
                errors.push(reject(Field::Startup, ParseErrorKind::MissingStartup, None));
                continue;
            }

            let amount = match layout.get(record, Field::Amount) {
                None => Err("empty amount".to_string()),
                Some(raw) => match fast_float::parse::<f64, _>(raw) {
                    Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
                    Ok(v) => Err(format!("amount must be a non-negative number, got {v}")),
                    Err(e) => Err(e.to_string()),
                },
            };
            let amount = match amount {
                Ok(v) => v,
                Err(e) => {
                    errors.push(reject(Field::Amount, ParseErrorKind::InvalidAmount, Some(e)));
                    continue;
                }
            };

            let date = layout.get(record, Field::Date).and_then(|raw| {
                let parsed = dates.parse(raw);
                if parsed.is_none() {
                    errors.push(reject(Field::Date, ParseErrorKind::InvalidDate, None));
                }
                parsed
            });

            for (field, column) in Field::ALL.iter().zip(columns.iter_mut()) {
                match column {
                    Column::Text(values) => {
                        values.push(layout.get(record, *field).map(str::to_string))
                    }
                    Column::Float64(values) => values.push(amount),
                    Column::Date(values) => values.push(date),
                }
            }
            year.push(date.map(|d| d.year()));
            month.push(date.map(|d| d.month()));
            row_count += 1;
        }

        BatchResult {
            columns,
            year,
            month,
            row_count,
            errors,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn has_column(&self, field: Field) -> bool {
        self.present.contains(field)
    }

    pub fn get_col(&self, field: Field) -> &Column {
        &self.columns[field as usize]
    }

    /// Text column values; empty for non-text fields
    pub fn text(&self, field: Field) -> &[Option<String>] {
        self.get_col(field).as_text().unwrap_or_default()
    }

    pub fn amounts(&self) -> &[f64] {
        self.get_col(Field::Amount).as_f64().unwrap_or_default()
    }

    pub fn dates(&self) -> &[Option<NaiveDate>] {
        self.get_col(Field::Date).as_date().unwrap_or_default()
    }

    pub fn years(&self) -> &[Option<i32>] {
        &self.year
    }

    /// `(year, month)` bucket of a row, `None` when its date is null
    pub fn year_month(&self, row: usize) -> Option<(i32, u32)> {
        Some((self.year.get(row).copied()??, self.month.get(row).copied()??))
    }

    pub fn startup(&self, row: usize) -> &str {
        self.text_value(Field::Startup, row).unwrap_or_default()
    }

    pub fn text_value(&self, field: Field, row: usize) -> Option<&str> {
        self.text(field).get(row)?.as_deref()
    }

    /// Materialises one row
    pub fn record(&self, row: usize) -> Option<FundingRecord> {
        if row >= self.row_count {
            return None;
        }
        let text = |field| self.text_value(field, row).map(str::to_string);
        Some(FundingRecord {
            date: self.dates()[row],
            year: self.year[row],
            month: self.month[row],
            startup: self.startup(row).to_string(),
            vertical: text(Field::Vertical),
            subvertical: text(Field::Subvertical),
            city: text(Field::City),
            investors: text(Field::Investors),
            round: text(Field::Round),
            amount: self.amounts()[row],
            founders: text(Field::Founders),
            stage: text(Field::Stage),
        })
    }

    pub fn records(&self, rows: &[usize]) -> Vec<FundingRecord> {
        rows.iter().filter_map(|&row| self.record(row)).collect()
    }

    /// Row indices matching `predicate` on `field`, ascending
    pub fn filter(
        &self,
        field: Field,
        predicate: &FilterPredicate,
    ) -> Result<Vec<usize>, ProcessorError> {
        match (self.get_col(field), predicate) {
            (
                Column::Float64(values),
                FilterPredicate::Between(Value::Float(low), Value::Float(high)),
            ) => Ok(filter_f64_between(values, *low, *high)),

            (Column::Text(values), FilterPredicate::Equals(Value::Str(target))) => Ok(values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.as_deref() == Some(target.as_str()))
                .map(|(i, _)| i)
                .collect()),

            (col, _) => Err(ProcessorError::Parse(format!(
                "predicate not supported on {:?} column '{}'",
                col.column_type(),
                field
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dataset_from_str(csv: &str) -> (Dataset, ParseSummary) {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "{}", csv).unwrap();
        Dataset::load_csv(tmp.path(), &LoadConfig::default()).unwrap()
    }

    const SAMPLE: &str = "\
date,startup,vertical,subvertical,city,investors,round,amount
2020-01-09,Byju's,Edtech,Online Learning,Bengaluru,\"Tiger Global, Sequoia\",Series F,150
2020-01-13,Shuttl,Transport,Bus Aggregator,Gurgaon,Sequoia,Series C,8.5
not-a-date,Mamaearth,E-commerce,Baby Care,Gurgaon,Sequoia,Series B,18
2020-02-02,Zomato,,Food Delivery,Gurgaon,Ant Financial,Series J,1100
";

    #[test]
    fn test_row_count() {
        let (dataset, summary) = make_dataset_from_str(SAMPLE);
        assert_eq!(dataset.row_count(), 4);
        assert_eq!(summary.rows_processed, 4);
        assert_eq!(summary.rows_loaded, 4);
    }

    #[test]
    fn test_bad_date_keeps_row() {
        let (dataset, summary) = make_dataset_from_str(SAMPLE);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].kind, ParseErrorKind::InvalidDate);
        assert_eq!(summary.errors[0].row, 4);
        assert_eq!(summary.errors[0].value, "not-a-date");

        let record = dataset.record(2).unwrap();
        assert_eq!(record.startup, "Mamaearth");
        assert_eq!(record.date, None);
        assert_eq!(record.year, None);
        assert_eq!(record.month, None);
        assert_eq!(dataset.year_month(2), None);
        assert_eq!(dataset.year_month(0), Some((2020, 1)));
    }

    #[test]
    fn test_quoted_investors_and_empty_cells() {
        let (dataset, _) = make_dataset_from_str(SAMPLE);
        let first = dataset.record(0).unwrap();
        assert_eq!(first.investors.as_deref(), Some("Tiger Global, Sequoia"));
        assert_eq!(first.amount, 150.0);
        let zomato = dataset.record(3).unwrap();
        assert_eq!(zomato.vertical, None);
        assert_eq!(zomato.founders, None);
    }

    #[test]
    fn test_optional_columns_reported_absent() {
        let (dataset, _) = make_dataset_from_str(SAMPLE);
        assert!(dataset.has_column(Field::City));
        assert!(!dataset.has_column(Field::Founders));
        assert!(!dataset.has_column(Field::Stage));
        assert_eq!(dataset.text(Field::Founders).len(), dataset.row_count());
    }

    #[test]
    fn test_invalid_amounts_are_skipped() {
        let csv = "startup,amount\nA,10\nB,abc\nC,-4\n,7\nD,\nE,2.5\n";
        let (dataset, summary) = Dataset::from_csv_str(csv, &LoadConfig::default()).unwrap();
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.amounts(), &[10.0, 2.5]);
        assert_eq!(summary.rows_processed, 6);
        assert_eq!(summary.rows_skipped(), 4);
        assert_eq!(summary.count(ParseErrorKind::InvalidAmount), 3);
        assert_eq!(summary.count(ParseErrorKind::MissingStartup), 1);
    }

    #[test]
    fn test_missing_required_column() {
        let err = Dataset::from_csv_str("startup,city\nA,Pune\n", &LoadConfig::default())
            .unwrap_err();
        assert!(matches!(err, ProcessorError::MissingColumn(ref c) if c == "amount"));
    }

    #[test]
    fn test_header_normalization() {
        let csv = "\u{feff}Date , STARTUP,Amount\n2019-05-01,Ola,3\n";
        let (dataset, _) = Dataset::from_csv_str(csv, &LoadConfig::default()).unwrap();
        assert!(dataset.has_column(Field::Date));
        assert_eq!(dataset.startup(0), "Ola");
    }

    #[test]
    fn test_alternate_date_formats() {
        let csv = "date,startup,amount\n2018/02/03,B,1\n2018-03-04 10:00:00,C,1\n";
        let (dataset, summary) = Dataset::from_csv_str(csv, &LoadConfig::default()).unwrap();
        assert!(summary.errors.is_empty());
        assert_eq!(dataset.year_month(0), Some((2018, 2)));
        assert_eq!(dataset.year_month(1), Some((2018, 3)));
    }

    #[test]
    fn test_ambiguous_dates_read_month_first() {
        let csv = "date,startup,amount\n05/01/2018,A,1\n31/12/2019,B,1\n07-04-2016,C,1\n13/13/2019,D,1\n";
        let (dataset, summary) = Dataset::from_csv_str(csv, &LoadConfig::default()).unwrap();
        assert_eq!(dataset.year_month(0), Some((2018, 5)));
        assert_eq!(dataset.year_month(1), Some((2019, 12)));
        assert_eq!(dataset.year_month(2), Some((2016, 7)));
        assert_eq!(dataset.year_month(3), None);
        assert_eq!(summary.count(ParseErrorKind::InvalidDate), 1);
    }

    #[test]
    fn test_filter() {
        let (dataset, _) = make_dataset_from_str(SAMPLE);
        let gurgaon = dataset
            .filter(Field::City, &FilterPredicate::Equals(Value::Str("Gurgaon".into())))
            .unwrap();
        assert_eq!(gurgaon, vec![1, 2, 3]);

        let mid = dataset
            .filter(
                Field::Amount,
                &FilterPredicate::Between(Value::Float(8.5), Value::Float(150.0)),
            )
            .unwrap();
        assert_eq!(mid, vec![0, 1, 2]);

        let err = dataset.filter(Field::Date, &FilterPredicate::Equals(Value::Float(1.0)));
        assert!(err.is_err());
        let err = dataset.filter(Field::Amount, &FilterPredicate::Equals(Value::Float(150.0)));
        assert!(err.is_err());
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let (dataset, summary) =
            Dataset::from_csv_str("date,startup,amount\n", &LoadConfig::default()).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(summary.rows_processed, 0);
        assert_eq!(dataset.record(0), None);
    }
}
