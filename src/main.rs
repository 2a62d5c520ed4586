//! funding-dashboard - prints one dashboard page as JSON.
//!
//! Stands in for the UI's selection controller: the chosen page and its
//! parameters come from the command line, the engine's answer goes to stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use jemallocator::Jemalloc;
use startup_funding::{
    FundingEngine, Selection, SeriesMode, SimilarityCriterion,
    config::{Config, DEFAULT_CONFIG_FILE},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Startup funding dashboard queries
///
/// Examples:
///   funding-dashboard --csv startup_cleaned.csv overall --series count
///   funding-dashboard --csv startup_cleaned.csv startup "Byju's" --similar city
///   funding-dashboard --csv startup_cleaned.csv startup Ola --similar amount --low 0 --high 100
///   funding-dashboard --csv startup_cleaned.csv investor "Sequoia Capital"
///   funding-dashboard --init-config
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Funding CSV to load
    #[arg(long, value_name = "FILE", env = "FUNDING_CSV", required_unless_present = "init_config")]
    csv: Option<PathBuf>,

    /// Configuration file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Print the load summary (row counts and rejected rows) to stderr
    #[arg(long)]
    report_errors: bool,

    /// Compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,

    #[command(subcommand)]
    view: Option<ViewCommand>,
}

#[derive(Subcommand, Debug)]
enum ViewCommand {
    /// Overall market analysis
    Overall {
        #[arg(long, value_enum, default_value_t = SeriesArg::Total)]
        series: SeriesArg,
    },
    /// One startup
    Startup {
        name: String,
        #[arg(long, value_enum, default_value_t = CriterionArg::Vertical)]
        similar: CriterionArg,
        /// Lower amount bound for `--similar amount` (default 0)
        #[arg(long)]
        low: Option<f64>,
        /// Upper amount bound for `--similar amount` (default: largest amount)
        #[arg(long)]
        high: Option<f64>,
    },
    /// One investor (substring match on the investors column)
    Investor { name: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SeriesArg {
    Total,
    Count,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CriterionArg {
    Vertical,
    Subvertical,
    City,
    Amount,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.init_config {
        return handle_init_config(&args.config);
    }

    init_logging(args.verbose);
    info!("funding-dashboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let config = Config::load_or_default(&args.config)
        .with_context(|| format!("Failed to read config {}", args.config.display()))?;
    let csv = args.csv.as_deref().context("--csv is required")?;

    let (engine, summary) = FundingEngine::load_csv(csv, &config)
        .with_context(|| format!("Failed to load {}", csv.display()))?;

    if args.report_errors {
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !summary.errors.is_empty() {
        warn!(
            "{} row problems while loading; rerun with --report-errors for details",
            summary.errors.len()
        );
    }

    let selection = build_selection(args.view, &engine)?;
    let view = engine.view(&selection)?;

    let out = if args.compact {
        serde_json::to_string(&view)?
    } else {
        serde_json::to_string_pretty(&view)?
    };
    println!("{out}");
    Ok(())
}

fn build_selection(view: Option<ViewCommand>, engine: &FundingEngine) -> Result<Selection> {
    let selection = match view {
        None => Selection::default(),
        Some(ViewCommand::Overall { series }) => Selection::Overall {
            series_mode: match series {
                SeriesArg::Total => SeriesMode::Total,
                SeriesArg::Count => SeriesMode::Count,
            },
        },
        Some(ViewCommand::Startup {
            name,
            similar,
            low,
            high,
        }) => {
            let criterion = match similar {
                CriterionArg::Vertical => SimilarityCriterion::Vertical,
                CriterionArg::Subvertical => SimilarityCriterion::Subvertical,
                CriterionArg::City => SimilarityCriterion::City,
                CriterionArg::Amount => {
                    let max = engine.amount_range().map_or(0.0, |(_, max)| max);
                    let low = low.unwrap_or(0.0);
                    let high = high.unwrap_or(max);
                    if low > high {
                        bail!("--low ({low}) must not exceed --high ({high})");
                    }
                    SimilarityCriterion::Amount { low, high }
                }
            };
            Selection::Startup { name, criterion }
        }
        Some(ViewCommand::Investor { name }) => Selection::Investor { name },
    };
    Ok(selection)
}

/// Write a default config file, refusing to overwrite an existing one.
fn handle_init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists. Remove it first or edit it manually.", path.display());
    }
    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {} with default settings.", path.display());
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
