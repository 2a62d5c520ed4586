//! Plain result types returned by the engine.
//!
//! These carry no references into the dataset and serialize straight to
//! JSON for whatever renders them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Serialize, Serializer, ser::SerializeStruct};

/// Headline figures for the overall market page
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OverallSummary {
    pub total_amount: f64,
    /// Largest per-startup funding total
    pub max_single_startup_total: f64,
    /// Mean of the per-startup funding totals
    pub average_startup_total: f64,
    pub startup_count: usize,
}

/// Distinct-value count of an optional column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueCount {
    Count(usize),
    /// The column was not in the source file
    NotAvailable,
}

impl UniqueCount {
    pub fn count(self) -> Option<usize> {
        match self {
            UniqueCount::Count(n) => Some(n),
            UniqueCount::NotAvailable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UniqueCounts {
    pub vertical: UniqueCount,
    pub subvertical: UniqueCount,
    pub city: UniqueCount,
    pub round: UniqueCount,
    pub investors: UniqueCount,
    pub date: UniqueCount,
}

/// How a month bucket is measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMode {
    /// Summed amount
    #[default]
    Total,
    /// Number of funding rows
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    pub value: f64,
}

impl MonthlyPoint {
    /// Axis label, e.g. `"1-2020"`
    pub fn label(&self) -> String {
        format!("{}-{}", self.month, self.year)
    }
}

/// A name with the value it was ranked by
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry<V> {
    pub name: String,
    pub value: V,
}

impl<V> From<(&str, V)> for RankedEntry<V> {
    fn from((name, value): (&str, V)) -> Self {
        RankedEntry {
            name: name.to_string(),
            value,
        }
    }
}

/// `year x month` grid of summed funding.
///
/// Only buckets with at least one dated row have a cell, so "nothing
/// recorded" (absent) stays distinct from "recorded zero" (`Some(0.0)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heatmap {
    cells: BTreeMap<(i32, u32), f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    pub year: i32,
    /// Aligned with [`Heatmap::months`]
    pub cells: Vec<Option<f64>>,
}

impl Heatmap {
    pub(crate) fn new(cells: BTreeMap<(i32, u32), f64>) -> Self {
        Heatmap { cells }
    }

    pub fn get(&self, year: i32, month: u32) -> Option<f64> {
        self.cells.get(&(year, month)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of populated cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Years with at least one cell, ascending
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.cells.keys().map(|&(y, _)| y).collect();
        years.dedup();
        years
    }

    /// Months with at least one cell in any year, ascending
    pub fn months(&self) -> Vec<u32> {
        let mut months: Vec<u32> = self.cells.keys().map(|&(_, m)| m).collect();
        months.sort_unstable();
        months.dedup();
        months
    }

    pub fn rows(&self) -> Vec<HeatmapRow> {
        let months = self.months();
        self.years()
            .into_iter()
            .map(|year| HeatmapRow {
                year,
                cells: months.iter().map(|&m| self.get(year, m)).collect(),
            })
            .collect()
    }
}

impl Serialize for Heatmap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Heatmap", 2)?;
        state.serialize_field("months", &self.months())?;
        state.serialize_field("rows", &self.rows())?;
        state.end()
    }
}

/// First recorded row of a startup plus its distinct round count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartupProfile {
    pub name: String,
    pub founders: Option<String>,
    pub vertical: Option<String>,
    pub subvertical: Option<String>,
    pub city: Option<String>,
    pub stage: Option<String>,
    pub investors: Option<String>,
    pub date: Option<NaiveDate>,
    pub round_count: UniqueCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearlyPoint {
    pub year: i32,
    pub amount: f64,
}

/// Columns shown for an investor's recent investments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentRow {
    pub date: Option<NaiveDate>,
    pub startup: String,
    pub vertical: Option<String>,
    pub amount: f64,
}
