//! # startup_funding
//!
//! Aggregation engine behind a startup-funding analytics dashboard. A CSV of
//! funding rounds is loaded once into an immutable columnar table; every
//! chart and metric on the dashboard is then a pure query over it:
//!
//! - Memory-mapped CSV loading with batches parsed in parallel (Rayon)
//! - Typed columns with load-time detection of optional columns
//! - Overall market: totals, distinct counts, month-by-month series,
//!   top startups / investors, year x month heatmap
//! - Startup page: profile, investment trend, similar companies
//! - Investor page: recent and top investments, sector / round / city
//!   breakdowns, yearly trend, co-investors
//! - Optional LRU cache for whole-table queries
//!
//! # Example
//!
//! ```rust,no_run
//! use startup_funding::{FundingEngine, SeriesMode, config::Config};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let (engine, summary) = FundingEngine::load_csv(Path::new("startup_cleaned.csv"), &config)?;
//!     println!("loaded {} rows, {} problems", summary.rows_loaded, summary.errors.len());
//!
//!     let overall = engine.overall_summary();
//!     println!("Total investment: {:.0} Cr", overall.total_amount);
//!
//!     for point in engine.monthly_series(SeriesMode::Total) {
//!         println!("{} => {}", point.label(), point.value);
//!     }
//!
//!     let profile = engine.investor_profile("Sequoia Capital");
//!     for sector in profile.sector_breakdown() {
//!         println!("{}: {}", sector.name, sector.value);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
mod helpers;
pub mod processor;

pub use processor::{
    ParseError, ParseErrorKind, ParseSummary, ProcessorError,
    column::Field,
    dashboard::{DashboardView, Selection},
    dataset::{Dataset, FundingRecord},
    engine::FundingEngine,
    investor::InvestorProfile,
    results::{
        Heatmap, InvestmentRow, MonthlyPoint, OverallSummary, RankedEntry, SeriesMode,
        StartupProfile, TrendPoint, UniqueCount, UniqueCounts, YearlyPoint,
    },
    snapshot::EngineHandle,
    startup::SimilarityCriterion,
};
