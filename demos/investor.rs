use crate::utils::sample_csv_path;
use startup_funding::{FundingEngine, config::Config};
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = sample_csv_path();
    let (engine, _) = FundingEngine::load_csv(path.as_path(), &Config::default())?;

    let name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "SoftBank".to_string());
    let profile = engine.investor_profile(&name).ensure_found()?;
    println!("{} appears in {} rounds", profile.investor(), profile.len());

    println!("\nRecent investments:");
    for row in profile.recent_rows(5) {
        let date = row.date.map_or_else(|| "-".to_string(), |d| d.to_string());
        println!(
            "  {date} {} [{}] {:.2}",
            row.startup,
            row.vertical.as_deref().unwrap_or("-"),
            row.amount
        );
    }

    println!("\nBiggest investments:");
    for record in profile.top_investments(5) {
        println!("  {} => {:.2}", record.startup, record.amount);
    }

    println!("\nSectors:");
    for entry in profile.sector_breakdown() {
        println!("  {} => {}", entry.name, entry.value);
    }

    println!("\nYear on year:");
    for point in profile.yearly_trend() {
        println!("  {} => {:.2}", point.year, point.amount);
    }

    println!("\nCo-investors:");
    for entry in profile.similar_investors(5) {
        println!("  {} => {}", entry.name, entry.value);
    }

    Ok(())
}
