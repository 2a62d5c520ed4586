//! One call per dashboard page.
//!
//! The controlling layer owns the user's current choice and passes it in as
//! a [`Selection`]; the engine keeps no notion of "current view".

use serde::Serialize;
use tracing::debug;

use crate::processor::{
    ProcessorError,
    dataset::FundingRecord,
    engine::FundingEngine,
    results::{
        Heatmap, InvestmentRow, MonthlyPoint, OverallSummary, RankedEntry, SeriesMode,
        StartupProfile, TrendPoint, UniqueCounts, YearlyPoint,
    },
    startup::SimilarityCriterion,
};

/// The page the user is looking at and its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Overall { series_mode: SeriesMode },
    Startup { name: String, criterion: SimilarityCriterion },
    Investor { name: String },
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Overall {
            series_mode: SeriesMode::Total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallView {
    pub summary: OverallSummary,
    pub unique_counts: UniqueCounts,
    pub series_mode: SeriesMode,
    pub monthly_series: Vec<MonthlyPoint>,
    pub top_startups: Vec<RankedEntry<f64>>,
    pub top_investors: Vec<RankedEntry<usize>>,
    pub heatmap: Heatmap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartupView {
    pub profile: StartupProfile,
    pub investment_trend: Vec<TrendPoint>,
    pub criterion: SimilarityCriterion,
    pub similar_companies: Vec<FundingRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestorView {
    pub investor: String,
    pub recent_investments: Vec<InvestmentRow>,
    pub top_investments: Vec<FundingRecord>,
    pub sectors: Vec<RankedEntry<usize>>,
    pub rounds: Vec<RankedEntry<usize>>,
    pub cities: Vec<RankedEntry<usize>>,
    pub yearly_trend: Vec<YearlyPoint>,
    pub similar_investors: Vec<RankedEntry<usize>>,
}

/// Everything one page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DashboardView {
    Overall(OverallView),
    Startup(StartupView),
    Investor(InvestorView),
}

impl FundingEngine {
    /// Runs every query the selected page needs.
    ///
    /// # Errors
    /// [`ProcessorError::NotFound`] when the selected startup or investor has
    /// no rows.
    pub fn view(&self, selection: &Selection) -> Result<DashboardView, ProcessorError> {
        debug!(?selection, "assembling dashboard view");
        let settings = self.settings();

        let view = match selection {
            Selection::Overall { series_mode } => DashboardView::Overall(OverallView {
                summary: self.overall_summary(),
                unique_counts: self.unique_counts(),
                series_mode: *series_mode,
                monthly_series: self.monthly_series(*series_mode),
                top_startups: self.top_startups(settings.top_n),
                top_investors: self.top_investors(settings.top_n),
                heatmap: self.funding_heatmap(),
            }),

            Selection::Startup { name, criterion } => DashboardView::Startup(StartupView {
                profile: self.startup_profile(name)?,
                investment_trend: self.investment_trend(name)?,
                criterion: *criterion,
                similar_companies: self.similar_companies(name, *criterion)?,
            }),

            Selection::Investor { name } => {
                let profile = self.investor_profile(name).ensure_found()?;
                let limit = settings.investor_limit;
                DashboardView::Investor(InvestorView {
                    investor: profile.investor().to_string(),
                    recent_investments: profile.recent_rows(limit),
                    top_investments: profile.top_investments(limit),
                    sectors: profile.sector_breakdown(),
                    rounds: profile.round_breakdown(),
                    cities: profile.city_breakdown(),
                    yearly_trend: profile.yearly_trend(),
                    similar_investors: profile.similar_investors(limit),
                })
            }
        };
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    const SAMPLE: &str = "\
date,startup,vertical,city,investors,round,amount
2020-01-01,A,Fintech,Pune,\"X, Y\",Seed,10
2020-02-01,B,Edtech,Pune,Y,Seed,20
2020-02-15,A,Fintech,Pune,Z,Series A,5
";

    fn engine(config: &Config) -> FundingEngine {
        FundingEngine::from_csv_str(SAMPLE, config).unwrap().0
    }

    #[test]
    fn test_overall_view_uses_configured_top_n() {
        let mut config = Config::default();
        config.dashboard.top_n = 1;
        let view = engine(&config).view(&Selection::default()).unwrap();
        match view {
            DashboardView::Overall(overall) => {
                assert_eq!(overall.summary.total_amount, 35.0);
                assert_eq!(overall.top_startups.len(), 1);
                assert_eq!(overall.top_startups[0].name, "B");
                assert_eq!(overall.top_investors[0].name, "Y");
                assert_eq!(overall.monthly_series.len(), 2);
            }
            other => panic!("Expected overall view, got {:?}", other),
        }
    }

    #[test]
    fn test_startup_view() {
        let selection = Selection::Startup {
            name: "A".to_string(),
            criterion: SimilarityCriterion::Vertical,
        };
        match engine(&Config::default()).view(&selection).unwrap() {
            DashboardView::Startup(view) => {
                assert_eq!(view.investment_trend.len(), 2);
                assert_eq!(view.similar_companies.len(), 2);
            }
            other => panic!("Expected startup view, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_entities_are_not_found() {
        let engine = engine(&Config::default());
        let startup = Selection::Startup {
            name: "Nope".to_string(),
            criterion: SimilarityCriterion::City,
        };
        let investor = Selection::Investor {
            name: "Nope".to_string(),
        };
        assert!(engine.view(&startup).unwrap_err().is_not_found());
        assert!(engine.view(&investor).unwrap_err().is_not_found());
    }

    #[test]
    fn test_investor_view_serializes_with_tag() {
        let engine = engine(&Config::default());
        let view = engine
            .view(&Selection::Investor {
                name: "Y".to_string(),
            })
            .unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["view"], "investor");
        assert_eq!(json["recent_investments"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["similar_investors"][0]["name"], "Y");
    }
}
