use std::collections::BTreeMap;

use memchr::memmem;
use tracing::debug;

use crate::{
    helpers::grouping::{top_n, value_counts},
    processor::{
        EntityKind, ProcessorError,
        column::Field,
        dataset::FundingRecord,
        engine::FundingEngine,
        results::{InvestmentRow, RankedEntry, YearlyPoint},
    },
};

/// Rows whose `investors` cell contains a given text, plus the queries the
/// investor page runs over them.
///
/// Matching is raw, case-sensitive substring containment on the packed cell,
/// so `"Accel"` also matches `"Accel Partners"`. An empty profile is how an
/// unknown investor shows up; every sub-query on it returns an empty result.
#[derive(Debug, Clone)]
pub struct InvestorProfile<'a> {
    engine: &'a FundingEngine,
    investor: String,
    rows: Vec<usize>,
}

impl FundingEngine {
    pub fn investor_profile(&self, investor: &str) -> InvestorProfile<'_> {
        let finder = memmem::Finder::new(investor.as_bytes());
        let rows: Vec<usize> = self
            .dataset()
            .text(Field::Investors)
            .iter()
            .enumerate()
            .filter(|(_, cell)| {
                cell.as_deref()
                    .is_some_and(|c| finder.find(c.as_bytes()).is_some())
            })
            .map(|(row, _)| row)
            .collect();
        debug!(investor, matches = rows.len(), "investor profile");

        InvestorProfile {
            engine: self,
            investor: investor.to_string(),
            rows,
        }
    }
}

impl InvestorProfile<'_> {
    pub fn investor(&self) -> &str {
        &self.investor
    }

    /// Matching row indices, dataset order
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The profile itself, or `NotFound` when nothing matched
    pub fn ensure_found(self) -> Result<Self, ProcessorError> {
        if self.is_empty() {
            return Err(ProcessorError::NotFound {
                kind: EntityKind::Investor,
                name: self.investor,
            });
        }
        Ok(self)
    }

    /// First `limit` matching records in dataset order.
    ///
    /// Not sorted by date: the "recent" list has always been file order.
    pub fn recent_investments(&self, limit: usize) -> Vec<FundingRecord> {
        let rows: Vec<usize> = self.rows.iter().copied().take(limit).collect();
        self.engine.dataset().records(&rows)
    }

    /// [`Self::recent_investments`] projected to the columns the page shows
    pub fn recent_rows(&self, limit: usize) -> Vec<InvestmentRow> {
        self.recent_investments(limit)
            .into_iter()
            .map(|r| InvestmentRow {
                date: r.date,
                startup: r.startup,
                vertical: r.vertical,
                amount: r.amount,
            })
            .collect()
    }

    /// Largest `limit` matching records by amount; ties keep dataset order
    pub fn top_investments(&self, limit: usize) -> Vec<FundingRecord> {
        let amounts = self.engine.dataset().amounts();
        let ranked = top_n(
            self.rows.iter().map(|&row| (row, amounts[row])).collect(),
            limit,
        );
        let rows: Vec<usize> = ranked.into_iter().map(|(row, _)| row).collect();
        self.engine.dataset().records(&rows)
    }

    fn breakdown(&self, field: Field) -> Vec<RankedEntry<usize>> {
        let dataset = self.engine.dataset();
        let counts = value_counts(
            self.rows
                .iter()
                .filter_map(|&row| dataset.text_value(field, row)),
        );
        top_n(counts, usize::MAX)
            .into_iter()
            .map(RankedEntry::from)
            .collect()
    }

    /// Matching rows per vertical, most frequent first
    pub fn sector_breakdown(&self) -> Vec<RankedEntry<usize>> {
        self.breakdown(Field::Vertical)
    }

    pub fn round_breakdown(&self) -> Vec<RankedEntry<usize>> {
        self.breakdown(Field::Round)
    }

    pub fn city_breakdown(&self) -> Vec<RankedEntry<usize>> {
        self.breakdown(Field::City)
    }

    /// Amount per year, ascending; undated rows are left out
    pub fn yearly_trend(&self) -> Vec<YearlyPoint> {
        let dataset = self.engine.dataset();
        let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
        for &row in &self.rows {
            if let Some(year) = dataset.years()[row] {
                *by_year.entry(year).or_default() += dataset.amounts()[row];
            }
        }
        by_year
            .into_iter()
            .map(|(year, amount)| YearlyPoint { year, amount })
            .collect()
    }

    /// Most frequent co-listed investor names across the matching rows.
    ///
    /// The queried investor is not excluded and usually ranks first.
    pub fn similar_investors(&self, limit: usize) -> Vec<RankedEntry<usize>> {
        let index = self.engine.investor_index();
        let counts = value_counts(
            self.rows
                .iter()
                .flat_map(|&row| index.names_for(row))
                .map(String::as_str),
        );
        top_n(counts, limit)
            .into_iter()
            .map(RankedEntry::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    const SAMPLE: &str = "\
date,startup,vertical,city,investors,round,amount
2020-03-01,Alpha,Fintech,Mumbai,\"Acme Ventures, Blume\",Seed,5
2018-01-10,Beta,Edtech,Pune,Acme Ventures,Series A,40
2019-07-07,Gamma,Fintech,Mumbai,Kalaari,Series B,90
xx,Delta,Fintech,Delhi,\"Blume, Acme Ventures\",Seed,40
2021-11-11,Eps,Health,Mumbai,Acme Capital,Series A,12
";

    fn engine() -> FundingEngine {
        FundingEngine::from_csv_str(SAMPLE, &Config::default()).unwrap().0
    }

    #[test]
    fn test_substring_matching_over_matches() {
        let engine = engine();
        assert_eq!(engine.investor_profile("Acme Ventures").rows(), &[0, 1, 3]);
        assert_eq!(engine.investor_profile("Acme").rows(), &[0, 1, 3, 4]);
        assert!(engine.investor_profile("acme").is_empty());
    }

    #[test]
    fn test_recent_keeps_file_order() {
        let engine = engine();
        let profile = engine.investor_profile("Acme Ventures");
        let startups: Vec<String> = profile
            .recent_investments(5)
            .into_iter()
            .map(|r| r.startup)
            .collect();
        assert_eq!(startups, vec!["Alpha", "Beta", "Delta"]);
        assert_eq!(profile.recent_rows(2).len(), 2);
        assert_eq!(profile.recent_rows(2)[1].startup, "Beta");
    }

    #[test]
    fn test_top_investments_stable() {
        let engine = engine();
        let top = engine.investor_profile("Acme Ventures").top_investments(2);
        let startups: Vec<&str> = top.iter().map(|r| r.startup.as_str()).collect();
        assert_eq!(startups, vec!["Beta", "Delta"]);
    }

    #[test]
    fn test_breakdowns() {
        let engine = engine();
        let profile = engine.investor_profile("Acme");
        assert_eq!(
            profile.sector_breakdown(),
            vec![
                RankedEntry::from(("Fintech", 2)),
                RankedEntry::from(("Edtech", 1)),
                RankedEntry::from(("Health", 1)),
            ]
        );
        assert_eq!(
            profile.round_breakdown(),
            vec![
                RankedEntry::from(("Seed", 2)),
                RankedEntry::from(("Series A", 2)),
            ]
        );
        assert_eq!(profile.city_breakdown()[0], RankedEntry::from(("Mumbai", 2)));
    }

    #[test]
    fn test_yearly_trend_skips_undated() {
        let engine = engine();
        let trend = engine.investor_profile("Acme Ventures").yearly_trend();
        assert_eq!(
            trend,
            vec![
                YearlyPoint {
                    year: 2018,
                    amount: 40.0,
                },
                YearlyPoint {
                    year: 2020,
                    amount: 5.0,
                },
            ]
        );
    }

    #[test]
    fn test_similar_investors_include_self() {
        let engine = engine();
        let similar = engine.investor_profile("Blume").similar_investors(5);
        assert_eq!(
            similar,
            vec![
                RankedEntry::from(("Acme Ventures", 2)),
                RankedEntry::from(("Blume", 2)),
            ]
        );
    }

    #[test]
    fn test_unknown_investor_is_empty_not_error() {
        let engine = engine();
        let profile = engine.investor_profile("Nobody");
        assert!(profile.is_empty());
        assert!(profile.recent_investments(5).is_empty());
        assert!(profile.top_investments(5).is_empty());
        assert!(profile.sector_breakdown().is_empty());
        assert!(profile.yearly_trend().is_empty());
        assert!(profile.similar_investors(5).is_empty());
        assert!(profile.ensure_found().unwrap_err().is_not_found());
    }
}
