use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::processor::{
    FilterPredicate, ProcessorError, Value,
    column::Field,
    dataset::FundingRecord,
    engine::FundingEngine,
    results::{StartupProfile, TrendPoint, UniqueCount},
};

/// What "similar" means when looking for companies like a given startup
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum SimilarityCriterion {
    /// Same vertical as the startup's first record
    Vertical,
    /// Same subvertical as the startup's first record
    Subvertical,
    /// Same city as the startup's first record
    City,
    /// Any record whose amount lies in `[low, high]`
    Amount { low: f64, high: f64 },
}

impl SimilarityCriterion {
    fn field(self) -> Field {
        match self {
            SimilarityCriterion::Vertical => Field::Vertical,
            SimilarityCriterion::Subvertical => Field::Subvertical,
            SimilarityCriterion::City => Field::City,
            SimilarityCriterion::Amount { .. } => Field::Amount,
        }
    }
}

impl FundingEngine {
    /// Rows whose startup equals `name` exactly; `NotFound` when there are none
    fn startup_rows(&self, name: &str) -> Result<Vec<usize>, ProcessorError> {
        let rows = self
            .dataset()
            .filter(Field::Startup, &FilterPredicate::Equals(Value::Str(name.to_string())))?;
        if rows.is_empty() {
            debug!(startup = name, "startup not in dataset");
            return Err(ProcessorError::startup_not_found(name));
        }
        Ok(rows)
    }

    /// Descriptive fields from the startup's first record
    pub fn startup_profile(&self, name: &str) -> Result<StartupProfile, ProcessorError> {
        let rows = self.startup_rows(name)?;
        let dataset = self.dataset();
        let first = rows[0];
        let text = |field| dataset.text_value(field, first).map(str::to_string);

        let round_count = if dataset.has_column(Field::Round) {
            let rounds: HashSet<&str> = rows
                .iter()
                .filter_map(|&row| dataset.text_value(Field::Round, row))
                .collect();
            UniqueCount::Count(rounds.len())
        } else {
            UniqueCount::NotAvailable
        };

        Ok(StartupProfile {
            name: name.to_string(),
            founders: text(Field::Founders),
            vertical: text(Field::Vertical),
            subvertical: text(Field::Subvertical),
            city: text(Field::City),
            stage: text(Field::Stage),
            investors: text(Field::Investors),
            date: dataset.dates()[first],
            round_count,
        })
    }

    /// Amount raised per date, ascending; undated rows are left out
    pub fn investment_trend(&self, name: &str) -> Result<Vec<TrendPoint>, ProcessorError> {
        let rows = self.startup_rows(name)?;
        let dataset = self.dataset();
        let mut by_date = BTreeMap::new();
        for row in rows {
            if let Some(date) = dataset.dates()[row] {
                *by_date.entry(date).or_insert(0.0) += dataset.amounts()[row];
            }
        }
        Ok(by_date
            .into_iter()
            .map(|(date, amount)| TrendPoint { date, amount })
            .collect())
    }

    /// Records sharing the startup's value for `criterion`, in dataset order.
    ///
    /// Empty when the startup has no value for the chosen column.
    pub fn similar_companies(
        &self,
        name: &str,
        criterion: SimilarityCriterion,
    ) -> Result<Vec<FundingRecord>, ProcessorError> {
        let rows = self.startup_rows(name)?;
        let dataset = self.dataset();

        let predicate = match criterion {
            SimilarityCriterion::Amount { low, high } => {
                FilterPredicate::Between(Value::Float(low), Value::Float(high))
            }
            _ => match dataset.text_value(criterion.field(), rows[0]) {
                Some(value) => FilterPredicate::Equals(Value::Str(value.to_string())),
                None => return Ok(Vec::new()),
            },
        };

        let matches = dataset.filter(criterion.field(), &predicate)?;
        debug!(startup = name, ?criterion, matches = matches.len(), "similar companies");
        Ok(dataset.records(&matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
date,startup,vertical,subvertical,city,investors,round,amount,founders,stage
2019-03-01,Swiggy,Food,Delivery,Bengaluru,Naspers,Series G,100,Sriharsha Majety,Late
2018-12-20,Zomato,Food,,Gurgaon,Info Edge,Series H,80,Deepinder Goyal,Late
2019-03-01,Swiggy,Food,Delivery,Bengaluru,\"Naspers, Tencent\",Series H,60,Sriharsha Majety,Late
2018-06-15,Swiggy,Food,Delivery,Bengaluru,DST,Series G,40,Sriharsha Majety,Late
,Swiggy,Food,Delivery,Bengaluru,DST,,5,Sriharsha Majety,Late
2017-01-01,Ola,Transport,Cabs,Bengaluru,SoftBank,Series F,300,Bhavish Aggarwal,Late
";

    fn engine() -> FundingEngine {
        FundingEngine::from_csv_str(SAMPLE, &Config::default()).unwrap().0
    }

    #[test]
    fn test_profile_uses_first_record() {
        let profile = engine().startup_profile("Swiggy").unwrap();
        assert_eq!(profile.founders.as_deref(), Some("Sriharsha Majety"));
        assert_eq!(profile.city.as_deref(), Some("Bengaluru"));
        assert_eq!(profile.investors.as_deref(), Some("Naspers"));
        assert_eq!(profile.date, NaiveDate::from_ymd_opt(2019, 3, 1));
        assert_eq!(profile.round_count, UniqueCount::Count(2));
    }

    #[test]
    fn test_profile_not_found_is_exact_match() {
        let engine = engine();
        assert!(engine.startup_profile("DoesNotExist").unwrap_err().is_not_found());
        assert!(engine.startup_profile("swiggy").unwrap_err().is_not_found());
    }

    #[test]
    fn test_profile_without_round_column() {
        let (engine, _) =
            FundingEngine::from_csv_str("startup,amount\nA,1\n", &Config::default()).unwrap();
        let profile = engine.startup_profile("A").unwrap();
        assert_eq!(profile.round_count, UniqueCount::NotAvailable);
        assert_eq!(profile.founders, None);
    }

    #[test]
    fn test_investment_trend_groups_by_date() {
        let trend = engine().investment_trend("Swiggy").unwrap();
        assert_eq!(
            trend,
            vec![
                TrendPoint {
                    date: NaiveDate::from_ymd_opt(2018, 6, 15).unwrap(),
                    amount: 40.0,
                },
                TrendPoint {
                    date: NaiveDate::from_ymd_opt(2019, 3, 1).unwrap(),
                    amount: 160.0,
                },
            ]
        );
        assert!(engine().investment_trend("Nobody").is_err());
    }

    #[test]
    fn test_similar_by_city() {
        let similar = engine()
            .similar_companies("Zomato", SimilarityCriterion::City)
            .unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].startup, "Zomato");

        let similar = engine()
            .similar_companies("Ola", SimilarityCriterion::City)
            .unwrap();
        assert_eq!(similar.len(), 5);
    }

    #[test]
    fn test_similar_null_value_is_empty() {
        let similar = engine()
            .similar_companies("Zomato", SimilarityCriterion::Subvertical)
            .unwrap();
        assert!(similar.is_empty());
    }

    #[test]
    fn test_similar_by_amount_inclusive() {
        let similar = engine()
            .similar_companies("Ola", SimilarityCriterion::Amount { low: 40.0, high: 80.0 })
            .unwrap();
        let amounts: Vec<f64> = similar.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![80.0, 60.0, 40.0]);
    }
}
