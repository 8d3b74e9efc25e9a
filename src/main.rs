//! CLI entry point for the race wind rater.
//!
//! Provides subcommands for profiling a course against wind, summarizing
//! finish-time trends across years, and laying out the year-by-year chart.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use race_wind_rater::{
    config::LayoutConfig,
    dataset::Dataset,
    fetch::load_source,
    layout::RenderOptions,
    output::{SummaryRecord, append_record, print_json, print_pretty, write_json},
    parser::parse_route,
    publish::{chart_key, write_json_to_s3},
    route::DirectionalProfile,
    selection::DashboardState,
    stats,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "race_wind_rater")]
#[command(about = "Wind analytics and chart layout for a point-to-point race", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the directional profile of a route and its wind legend
    Profile {
        /// Route file (JSON or CSV) or URL
        #[arg(value_name = "ROUTE")]
        route: String,

        /// Print the profile and legend as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Year-over-year trends, outliers and wind correlation
    Summary {
        /// Dashboard dataset file or URL
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// First year to include (defaults to the earliest year)
        #[arg(long)]
        start: Option<i32>,

        /// Last year to include (defaults to the latest year)
        #[arg(long)]
        end: Option<i32>,

        /// Number of outlier years to report (defaults to the layout config)
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// CSV file to append the summary row to
        #[arg(short, long, default_value = "summary.csv")]
        output: String,
    },
    /// Lay out the chart and write its geometry as JSON
    Render {
        /// Dashboard dataset file or URL
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Route file or URL for directional wind overlays
        #[arg(long)]
        route: Option<String>,

        #[arg(long)]
        start: Option<i32>,

        #[arg(long)]
        end: Option<i32>,

        /// Rider whose results are highlighted
        #[arg(long)]
        rider: Option<String>,

        /// Omit the wind overlay bands and annotations
        #[arg(long, default_value_t = false)]
        no_overlay: bool,

        /// JSON file overriding chart dimensions and margins
        #[arg(long)]
        layout_config: Option<String>,

        /// File to write the chart geometry to
        #[arg(long, default_value = "chart.json")]
        out: String,

        /// Optional: S3 bucket to upload the chart geometry to
        #[arg(long)]
        s3_bucket: Option<String>,

        /// Optional: gzip the written and uploaded JSON
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/race_wind_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("race_wind_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Profile { route, json } => profile(&route, json).await?,
        Commands::Summary {
            dataset,
            start,
            end,
            top_n,
            output,
        } => summary(&dataset, start, end, top_n, &output).await?,
        Commands::Render {
            dataset,
            route,
            start,
            end,
            rider,
            no_overlay,
            layout_config,
            out,
            s3_bucket,
            gzip,
        } => {
            let config = match layout_config {
                Some(path) => LayoutConfig::load(&path)?,
                None => LayoutConfig::default(),
            };
            let state = DashboardState::new(load_dataset(&dataset).await?, config)?;

            if let Some(route) = route {
                let points = parse_route(&load_source(&route).await?)?;
                state.load_route(&points);
            }
            if let Some(name) = rider {
                state.select_rider(&name);
            }

            let (start, end) = year_range(state.dataset(), start, end)?;
            let options = RenderOptions {
                show_wind_overlay: !no_overlay,
            };
            let chart = state.render(start, end, options);
            if chart.is_empty() {
                warn!(start, end, "No years in range, chart has no boxes");
            }

            write_json(&out, &chart, gzip)?;

            if let Some(bucket) = s3_bucket {
                let config = aws_config::load_from_env().await;
                let client = aws_sdk_s3::Client::new(&config);
                write_json_to_s3(&client, &bucket, &chart_key(start, end, gzip), &chart, gzip).await?;
            }
        }
    }

    Ok(())
}

async fn load_dataset(source: &str) -> Result<Dataset> {
    let bytes = load_source(source).await?;
    Dataset::from_slice(&bytes)
}

/// Fills missing bounds from the dataset and rejects inverted ranges.
fn year_range(dataset: &Dataset, start: Option<i32>, end: Option<i32>) -> Result<(i32, i32)> {
    let Some((first, last)) = dataset.year_bounds() else {
        bail!("Dataset has no yearly statistics");
    };
    let start = start.unwrap_or(first);
    let end = end.unwrap_or(last);
    if start > end {
        bail!("Start year {start} is after end year {end}");
    }
    Ok((start, end))
}

#[tracing::instrument(skip(json), fields(route = %source))]
async fn profile(source: &str, json: bool) -> Result<()> {
    let points = parse_route(&load_source(source).await?)?;
    let Some(profile) = DirectionalProfile::build(&points) else {
        bail!("Route needs at least two points, got {}", points.len());
    };

    info!(
        points = points.len(),
        total_distance_m = profile.total_distance_meters,
        primary_sector = %profile.primary_sector,
        "Directional profile built"
    );

    let legend = profile.wind_legend();
    if json {
        print_json(&serde_json::json!({ "profile": profile, "legend": legend }))?;
        return Ok(());
    }

    for entry in &legend {
        info!(
            wind_from = %entry.sector,
            travel_pct = entry.travel_percentage,
            score = entry.impact.score,
            impact = entry.impact.category.label(),
            "Sector"
        );
    }
    Ok(())
}

#[tracing::instrument(skip_all, fields(dataset = %source, ?start, ?end, ?top_n))]
async fn summary(
    source: &str,
    start: Option<i32>,
    end: Option<i32>,
    top_n: Option<usize>,
    output: &str,
) -> Result<()> {
    let state = DashboardState::new(load_dataset(source).await?, LayoutConfig::default())?;
    let (start, end) = year_range(state.dataset(), start, end)?;

    let yoy = state.year_over_year(start, end);
    match &yoy {
        Some(yoy) => info!(
            prior_year = yoy.prior_year,
            current_year = yoy.current_year,
            last_change_pct = yoy.last_change,
            avg_change_pct = yoy.avg_change,
            volatility_pct = yoy.volatility,
            "Year-over-year"
        ),
        None => warn!(start, end, "Fewer than two years in range, no year-over-year metrics"),
    }

    let top_n = top_n.unwrap_or(state.config().outlier_count);
    for outlier in state.outliers(start, end, top_n) {
        info!(
            year = outlier.year,
            median = %outlier.median_formatted,
            pct_diff = outlier.pct_diff,
            wind_speed = outlier.wind_speed,
            wind = %outlier.wind_label,
            "Outlier"
        );
    }

    let correlation = state.wind_correlation();
    info!(wind_correlation = ?correlation, "Summit wind vs median time");

    if let Some(summary) = state.summary() {
        print_pretty(&summary);
        info!(
            years = %summary.year_range,
            overall_median = %summary.overall_median_formatted,
            fastest_year = summary.fastest_year_by_median,
            total_finishers = summary.total_finishers,
            "Overall"
        );
    }
    for wind in stats::wind_comparison(&state.dataset().weather.by_year) {
        info!(
            year = wind.year,
            start_avg = ?wind.start_avg,
            summit_avg = ?wind.summit_avg,
            summit_delta = ?wind.summit_delta,
            "Wind at start vs summit"
        );
    }
    info!(
        returning_riders = state.dataset().returning_riders().len(),
        "Riders with multiple years"
    );

    append_record(output, &SummaryRecord::new(start, end, yoy.as_ref(), correlation))?;
    Ok(())
}
