use std::path::Path;

use startup_funding::{FundingEngine, SeriesMode, config::Config};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() {
    let _profiler = dhat::Profiler::new_heap();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/startup_funding_1m.csv".to_string());
    let (engine, _) = FundingEngine::load_csv(Path::new(&path), &Config::default()).unwrap();

    // One pass over every whole-table query
    let _summary = engine.overall_summary();
    let _series = engine.monthly_series(SeriesMode::Total);
    let _top = engine.top_investors(10);
    let _heatmap = engine.funding_heatmap();

    println!("Memory benchmark finished. See dhat-heap.json for details");
}
