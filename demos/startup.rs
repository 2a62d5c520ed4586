use crate::utils::sample_csv_path;
use startup_funding::{FundingEngine, SimilarityCriterion, config::Config};
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = sample_csv_path();
    let (engine, _) = FundingEngine::load_csv(path.as_path(), &Config::default())?;

    let name = std::env::args().nth(1).unwrap_or_else(|| "Flipkart".to_string());

    let profile = engine.startup_profile(&name)?;
    println!("{}", profile.name);
    println!("  founders:  {}", profile.founders.as_deref().unwrap_or("-"));
    println!("  vertical:  {}", profile.vertical.as_deref().unwrap_or("-"));
    println!("  city:      {}", profile.city.as_deref().unwrap_or("-"));
    println!("  rounds:    {:?}", profile.round_count.count());

    println!("\nInvestment trend:");
    for point in engine.investment_trend(&name)? {
        println!("  {} => {:.2}", point.date, point.amount);
    }

    for criterion in [SimilarityCriterion::Vertical, SimilarityCriterion::City] {
        let similar = engine.similar_companies(&name, criterion)?;
        println!("\nSimilar by {:?}: {} rounds", criterion, similar.len());
        for record in similar.iter().take(5) {
            println!("  {} ({:.2})", record.startup, record.amount);
        }
    }

    Ok(())
}
