use crate::utils::sample_csv_path;
use startup_funding::{FundingEngine, SeriesMode, UniqueCount, config::Config};
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = sample_csv_path();

    let (engine, summary) = FundingEngine::load_csv(path.as_path(), &Config::default())?;
    println!(
        "Loaded {} of {} rows ({} problems)",
        summary.rows_loaded,
        summary.rows_processed,
        summary.errors.len()
    );

    let overall = engine.overall_summary();
    println!("Total investment:      {:.2} Cr", overall.total_amount);
    println!("Max startup total:     {:.2} Cr", overall.max_single_startup_total);
    println!("Avg startup total:     {:.2} Cr", overall.average_startup_total);
    println!("Funded startups:       {}", overall.startup_count);

    let counts = engine.unique_counts();
    for (label, count) in [
        ("verticals", counts.vertical),
        ("cities", counts.city),
        ("rounds", counts.round),
    ] {
        match count {
            UniqueCount::Count(n) => println!("Distinct {label}: {n}"),
            UniqueCount::NotAvailable => println!("Distinct {label}: n/a"),
        }
    }

    println!("\nMonth-by-month investment:");
    for point in engine.monthly_series(SeriesMode::Total) {
        println!("  {:>8} => {:.2}", point.label(), point.value);
    }

    println!("\nTop startups:");
    for entry in engine.top_startups(5) {
        println!("  {} => {:.2}", entry.name, entry.value);
    }

    println!("\nTop investors:");
    for entry in engine.top_investors(5) {
        println!("  {} => {} deals", entry.name, entry.value);
    }

    let heatmap = engine.funding_heatmap();
    println!("\nHeatmap ({} non-empty cells):", heatmap.len());
    for row in heatmap.rows() {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|c| c.map_or_else(|| "-".to_string(), |v| format!("{v:.0}")))
            .collect();
        println!("  {} | {}", row.year, cells.join(" "));
    }

    Ok(())
}
