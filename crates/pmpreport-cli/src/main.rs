//! pmpreport CLI - Epic rollups and PMP milestone reporting
//!
//! Command-line interface over exported work-item snapshots.

mod config;
mod output;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use pmpreport_core::{FiscalYear, LinkConfig, PeriodSelection, QuarterSelection, Snapshot};
use pmpreport_engine::{enrich_epics, MilestoneReport, PassId, PassStore, ProjectFilter};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use output::Format;

#[derive(Parser)]
#[command(name = "pmpreport")]
#[command(author, version, about = "Epic rollups and PMP milestone classification", long_about = None)]
struct Cli {
    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file
    #[arg(short, long, env = "PMPREPORT_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll Feature dates up into Epics and report variances
    Epics {
        /// Snapshot file (JSON)
        #[arg(value_name = "SNAPSHOT")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Classify PMP milestones for a fiscal period
    Milestones {
        /// Snapshot file (JSON)
        #[arg(value_name = "SNAPSHOT")]
        file: PathBuf,

        /// Fiscal year (e.g. FY2026, FY26, 2025-26)
        #[arg(long = "fy")]
        fiscal_year: Option<String>,

        /// Quarter (Q1-Q4 or all)
        #[arg(short, long)]
        quarter: Option<String>,

        /// Only milestones whose project contains this text
        #[arg(short, long)]
        project: Option<String>,

        /// Date used for default fiscal year and quarter (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Show the date range of a fiscal period
    Period {
        /// Fiscal year (e.g. FY2026, FY26, 2025-26)
        #[arg(long = "fy")]
        fiscal_year: Option<String>,

        /// Quarter (Q1-Q4 or all)
        #[arg(short, long)]
        quarter: Option<String>,

        /// Date used for default fiscal year and quarter (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let snapshot: Snapshot =
        serde_json::from_str(&text).with_context(|| format!("failed to decode snapshot {}", path.display()))?;
    tracing::info!(
        features = snapshot.features.len(),
        epics = snapshot.epics.len(),
        milestones = snapshot.milestones.len(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

/// Run one refresh pass over a snapshot file and return its published result
fn run_pass<T>(file: &Path, compute: impl FnOnce(Snapshot) -> T) -> Result<T> {
    let mut store = PassStore::new();
    let input = load_snapshot(file).map_err(|err| format!("{err:#}"));
    store.run(PassId::FIRST, input, compute)?;
    let published = store.into_latest().context("pass produced no result")?;
    Ok(published.value)
}

/// Resolve the selection: flags, then config, then the period containing `today`
fn resolve_selection(
    fiscal_year: Option<&str>,
    quarter: Option<&str>,
    today: Option<NaiveDate>,
    config: &Config,
) -> Result<PeriodSelection> {
    let fiscal_year = match fiscal_year {
        Some(label) => Some(label.parse::<FiscalYear>().context("invalid --fy value")?),
        None => config.selection.fiscal_year,
    };
    let quarter = match quarter {
        Some(label) => Some(label.parse::<QuarterSelection>().context("invalid --quarter value")?),
        None => config.selection.quarter,
    };
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    Ok(PeriodSelection::with_defaults(fiscal_year, quarter, today))
}

fn links_or_default(config: &Config) -> LinkConfig {
    config.links.clone().unwrap_or_else(|| {
        tracing::warn!("no [links] configuration, work-item links will be incomplete");
        LinkConfig::new("", "")
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        println!("pmpreport - Epic rollups and PMP milestone reporting");
        println!("Run with --help for usage information");
        return Ok(());
    };

    let config = Config::load(cli.config.as_deref())?;

    match command {
        Commands::Epics { file, format } => {
            let links = links_or_default(&config);
            let table = run_pass(&file, |snapshot| enrich_epics(&snapshot.features, &snapshot.epics, &links))?;
            match format {
                Format::Text => print!("{}", output::render_epics_text(&table)),
                Format::Json => println!("{}", output::to_json(&table)?),
            }
        }
        Commands::Milestones {
            file,
            fiscal_year,
            quarter,
            project,
            today,
            format,
        } => {
            let selection = resolve_selection(fiscal_year.as_deref(), quarter.as_deref(), today, &config)?;
            let filter = ProjectFilter::new(project.as_deref().or(config.selection.project.as_deref()));

            let report = run_pass(&file, |snapshot| {
                MilestoneReport::build(&snapshot.milestones, selection, &filter, config.links.as_ref())
            })?;
            match format {
                Format::Text => print!("{}", output::render_milestones_text(&report)),
                Format::Json => println!("{}", output::to_json(&report)?),
            }
        }
        Commands::Period {
            fiscal_year,
            quarter,
            today,
            format,
        } => {
            let selection = resolve_selection(fiscal_year.as_deref(), quarter.as_deref(), today, &config)?;
            print!("{}", output::render_period(&selection, &selection.period(), format)?);
        }
    }

    Ok(())
}
