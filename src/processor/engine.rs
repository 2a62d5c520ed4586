use std::{collections::BTreeMap, path::Path};

use tracing::debug;

use crate::{
    config::{Config, DashboardConfig},
    helpers::{
        grouping::{OrderedGroups, split_investors, top_n, value_counts},
        simd_helpers::aggregate_f64,
    },
    processor::{
        AggregateOp, ParseSummary, ProcessorError,
        column::Field,
        dataset::Dataset,
        query_cache::{Cacheable, QueryCache, QueryKey},
        results::{
            Heatmap, MonthlyPoint, OverallSummary, RankedEntry, SeriesMode, UniqueCount,
            UniqueCounts,
        },
    },
};

/// Investor names split out of each row's packed `investors` cell.
///
/// Built once; `spans[row]` is the range of `names` belonging to `row`.
#[derive(Debug, Default)]
pub(crate) struct InvestorIndex {
    names: Vec<String>,
    spans: Vec<(usize, usize)>,
}

impl InvestorIndex {
    fn build(dataset: &Dataset) -> Self {
        let mut names = Vec::new();
        let mut spans = Vec::with_capacity(dataset.row_count());
        for cell in dataset.text(Field::Investors) {
            let start = names.len();
            if let Some(cell) = cell {
                names.extend(split_investors(cell).map(str::to_string));
            }
            spans.push((start, names.len()));
        }
        InvestorIndex { names, spans }
    }

    pub(crate) fn names_for(&self, row: usize) -> &[String] {
        match self.spans.get(row) {
            Some(&(start, end)) => &self.names[start..end],
            None => &[],
        }
    }

    fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.spans
            .iter()
            .enumerate()
            .flat_map(move |(row, &(start, end))| {
                self.names[start..end].iter().map(move |n| (row, n.as_str()))
            })
    }
}

/// Query engine over one immutable funding snapshot
///
/// # Examples
///
/// ```rust
/// # use startup_funding::{FundingEngine, config::Config};
/// let csv = "date,startup,amount\n2020-01-05,A,10\n2020-02-01,A,5\n";
/// let (engine, _) = FundingEngine::from_csv_str(csv, &Config::default()).unwrap();
/// let summary = engine.overall_summary();
/// assert_eq!(summary.total_amount, 15.0);
/// assert_eq!(summary.startup_count, 1);
/// ```
#[derive(Debug)]
pub struct FundingEngine {
    dataset: Dataset,
    investors: InvestorIndex,
    cache: Option<QueryCache>,
    settings: DashboardConfig,
}

impl FundingEngine {
    pub fn new(dataset: Dataset, config: &Config) -> Self {
        let investors = InvestorIndex::build(&dataset);
        debug!(
            rows = dataset.row_count(),
            investor_entries = investors.names.len(),
            "built investor index"
        );
        FundingEngine {
            dataset,
            investors,
            cache: QueryCache::with_capacity(config.cache.capacity),
            settings: config.dashboard.clone(),
        }
    }

    pub fn load_csv(path: &Path, config: &Config) -> Result<(Self, ParseSummary), ProcessorError> {
        let (dataset, summary) = Dataset::load_csv(path, &config.load)?;
        Ok((Self::new(dataset, config), summary))
    }

    pub fn from_csv_str(csv: &str, config: &Config) -> Result<(Self, ParseSummary), ProcessorError> {
        let (dataset, summary) = Dataset::from_csv_str(csv, &config.load)?;
        Ok((Self::new(dataset, config), summary))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn settings(&self) -> &DashboardConfig {
        &self.settings
    }

    pub(crate) fn investor_index(&self) -> &InvestorIndex {
        &self.investors
    }

    /// Every `(row, investor)` pair of the expanded investor view
    pub fn expanded_investors(&self) -> impl Iterator<Item = (usize, &str)> {
        self.investors.iter()
    }

    fn memoize<T: Cacheable>(
        &self,
        key: QueryKey,
        compute: impl FnOnce() -> T,
    ) -> T {
        match &self.cache {
            Some(cache) => cache.get_or_insert_with(key, compute),
            None => compute(),
        }
    }

    /// Per-startup funding totals, first-appearance order
    fn startup_totals(&self) -> Vec<(&str, f64)> {
        let amounts = self.dataset.amounts();
        (0..self.dataset.row_count())
            .map(|row| (self.dataset.startup(row), amounts[row]))
            .collect::<OrderedGroups<_, _>>()
            .into_entries()
    }

    pub fn overall_summary(&self) -> OverallSummary {
        self.memoize(QueryKey::OverallSummary, || {
            let totals: Vec<f64> = self.startup_totals().into_iter().map(|(_, t)| t).collect();
            OverallSummary {
                total_amount: aggregate_f64(self.dataset.amounts(), AggregateOp::Sum)
                    .unwrap_or_default(),
                max_single_startup_total: aggregate_f64(&totals, AggregateOp::Max)
                    .unwrap_or_default(),
                average_startup_total: aggregate_f64(&totals, AggregateOp::Avg)
                    .unwrap_or_default(),
                startup_count: totals.len(),
            }
        })
    }

    pub fn unique_counts(&self) -> UniqueCounts {
        self.memoize(QueryKey::UniqueCounts, || {
            let count = |field: Field| {
                if self.dataset.has_column(field) {
                    UniqueCount::Count(self.dataset.get_col(field).distinct_count())
                } else {
                    UniqueCount::NotAvailable
                }
            };
            UniqueCounts {
                vertical: count(Field::Vertical),
                subvertical: count(Field::Subvertical),
                city: count(Field::City),
                round: count(Field::Round),
                investors: count(Field::Investors),
                date: count(Field::Date),
            }
        })
    }

    /// Dated rows bucketed by `(year, month)`, chronological
    pub fn monthly_series(&self, mode: SeriesMode) -> Vec<MonthlyPoint> {
        self.memoize(QueryKey::MonthlySeries(mode), || {
            debug!(?mode, "computing monthly series");
            let amounts = self.dataset.amounts();
            let mut buckets: BTreeMap<(i32, u32), f64> = BTreeMap::new();
            for row in 0..self.dataset.row_count() {
                if let Some(key) = self.dataset.year_month(row) {
                    *buckets.entry(key).or_default() += match mode {
                        SeriesMode::Total => amounts[row],
                        SeriesMode::Count => 1.0,
                    };
                }
            }
            buckets
                .into_iter()
                .map(|((year, month), value)| MonthlyPoint { year, month, value })
                .collect()
        })
    }

    /// Startups by summed amount, descending; ties keep dataset order
    pub fn top_startups(&self, n: usize) -> Vec<RankedEntry<f64>> {
        self.memoize(QueryKey::TopStartups(n), || {
            top_n(self.startup_totals(), n)
                .into_iter()
                .map(RankedEntry::from)
                .collect()
        })
    }

    /// Investors by number of funding rows they appear in, descending
    pub fn top_investors(&self, n: usize) -> Vec<RankedEntry<usize>> {
        self.memoize(QueryKey::TopInvestors(n), || {
            let counts = value_counts(self.investors.iter().map(|(_, name)| name));
            top_n(counts, n).into_iter().map(RankedEntry::from).collect()
        })
    }

    pub fn funding_heatmap(&self) -> Heatmap {
        self.memoize(QueryKey::FundingHeatmap, || {
            let amounts = self.dataset.amounts();
            let mut cells: BTreeMap<(i32, u32), f64> = BTreeMap::new();
            for row in 0..self.dataset.row_count() {
                if let Some(key) = self.dataset.year_month(row) {
                    *cells.entry(key).or_default() += amounts[row];
                }
            }
            Heatmap::new(cells)
        })
    }

    /// Distinct startup names, first-appearance order
    pub fn startup_names(&self) -> Vec<&str> {
        self.startup_totals().into_iter().map(|(name, _)| name).collect()
    }

    /// Distinct investor names, first-appearance order
    pub fn investor_names(&self) -> Vec<&str> {
        value_counts(self.investors.iter().map(|(_, name)| name))
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    /// Smallest and largest single amount, `None` on an empty dataset
    pub fn amount_range(&self) -> Option<(f64, f64)> {
        let amounts = self.dataset.amounts();
        Some((
            aggregate_f64(amounts, AggregateOp::Min)?,
            aggregate_f64(amounts, AggregateOp::Max)?,
        ))
    }
}
