//! CLI entry point for the wildfire air-quality dashboard.
//!
//! This is the "UI shell" collaborator over the library core: it wires the
//! analyst's selections (pollutants, city group, season) to the aggregation
//! and rendering pipeline and writes the resulting artifacts out.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use wildfire_aq::{
    analysis::season::{SeasonKey, aggregate_for_season},
    analysis::trend::{compute_trend, select_cities},
    cache::SeasonMapCache,
    dataset::{Dataset, Pollutant},
    groups::GroupCatalog,
    output::{append_rows, print_json},
    render::trend_chart::render_trend,
};

#[derive(Parser)]
#[command(name = "wildfire_aq")]
#[command(about = "Canada air-quality dashboard over a monthly aggregate CSV", long_about = None)]
struct Cli {
    /// Path to the monthly aggregate CSV
    #[arg(long, default_value = "air_quality_monthly_data.csv", global = true)]
    data: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the monthly trend chart for a pollutant and group selection
    Trend {
        /// Pollutants to include (pm2.5, o₃)
        #[arg(short, long, num_args = 1.., default_values = ["pm2.5", "o₃"])]
        pollutants: Vec<String>,

        /// Active city group
        #[arg(short, long, default_value = "Pollutant Opposition Zones")]
        group: String,

        /// PNG file to write the chart to
        #[arg(short, long, default_value = "trend.png")]
        output: String,
    },
    /// Render the pre-generated geographic heatmap for a wildfire season
    Map {
        /// Season label, e.g. "2021 (May-Sep)" or just "2021"
        #[arg(value_name = "SEASON")]
        season: String,

        /// PNG file to write the map to
        #[arg(short, long, default_value = "season_map.png")]
        output: String,
    },
    /// Print or export the seasonal aggregate table
    Table {
        /// Season label, e.g. "2021 (May-Sep)" or just "2021"
        #[arg(value_name = "SEASON")]
        season: String,

        /// CSV file to append rows to (prints JSON when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List the city-group catalog
    ListGroups,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/wildfire_aq.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("wildfire_aq.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    // Startup precondition: a malformed or missing dataset is fatal.
    let data = Dataset::from_csv_path(&cli.data)?;
    let catalog = GroupCatalog::builtin();

    match cli.command {
        Commands::Trend {
            pollutants,
            group,
            output,
        } => {
            let pollutants = parse_pollutants(&pollutants)?;
            let Some(group) = catalog.group(&group) else {
                bail!(
                    "unknown group {group:?}; available: {}",
                    catalog.names().join(", ")
                );
            };

            let selection = select_cities(&data, group);
            if let Some(warning) = selection.warning() {
                warn!("{warning}");
            } else {
                info!("All selected cities have sufficient data (>=10 months).");
            }

            let bundle = compute_trend(&data, &pollutants, &selection.selected, group);
            let png = render_trend(&bundle, group)?;
            std::fs::write(&output, png)
                .with_context(|| format!("failed to write chart to {output}"))?;

            info!(group = group.name, "{}", group.insight);
            print_json(&group.insight_rows(&selection.selected))?;
            info!(
                cities = selection.selected.len(),
                excluded = selection.excluded.len(),
                output,
                "Trend chart written"
            );
        }
        Commands::Map { season, output } => {
            let season = SeasonKey::parse(&season)?;
            if !season.is_offered() {
                bail!(
                    "season {season} is not offered; choose a year from 2018 to 2024"
                );
            }

            let mut cache = SeasonMapCache::empty();
            let Some(png) = cache.get_or_render(&data, season)? else {
                bail!("no data for season {season}");
            };
            std::fs::write(&output, png)
                .with_context(|| format!("failed to write map to {output}"))?;

            info!(season = %season, output, "Season map written");
        }
        Commands::Table { season, output } => {
            let season = SeasonKey::parse(&season)?;
            let rows = aggregate_for_season(&data, season);

            match output {
                Some(path) => {
                    append_rows(&path, &rows)?;
                    info!(season = %season, rows = rows.len(), path, "Aggregate table written");
                }
                None => print_json(&rows)?,
            }
        }
        Commands::ListGroups => {
            for group in catalog.groups() {
                info!(
                    group = group.name,
                    cities = group.cities.len(),
                    axis_mode = ?group.presentation.axis_mode,
                    "Group"
                );
                info!("{}", group.insight);
            }
        }
    }

    Ok(())
}

/// Parses pollutant selections in the source spelling (`pm2.5`, `o₃`).
fn parse_pollutants(names: &[String]) -> Result<Vec<Pollutant>> {
    if names.is_empty() {
        bail!("select at least one pollutant");
    }
    let mut pollutants = Vec::new();
    for name in names {
        let Some(p) = Pollutant::parse(name) else {
            bail!("unknown pollutant {name:?}; expected pm2.5 or o₃");
        };
        if !pollutants.contains(&p) {
            pollutants.push(p);
        }
    }
    Ok(pollutants)
}
