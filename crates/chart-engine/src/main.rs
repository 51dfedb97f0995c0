//! CLI entry point for the chart recommendation engine.

use anyhow::{Context, Result, anyhow};
use chart_engine::{
    Chart, ChartEvent, ChartGenerator, ChartLimits, ChartType, Cube, DataPoint, Dataset,
    GeneratorConfig, TopojsonConfig, TopojsonRegistry,
};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// CLI-compatible chart type enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliChartType {
    Barchart,
    Choropleth,
    Donut,
    Lineplot,
    Stackedarea,
    Treemap,
}

impl From<CliChartType> for ChartType {
    fn from(cli: CliChartType) -> Self {
        match cli {
            CliChartType::Barchart => ChartType::Barchart,
            CliChartType::Choropleth => ChartType::Choropleth,
            CliChartType::Donut => ChartType::Donut,
            CliChartType::Lineplot => ChartType::Lineplot,
            CliChartType::Stackedarea => ChartType::Stackedarea,
            CliChartType::Treemap => ChartType::Treemap,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Recommend charts for OLAP query results",
    long_about = "Reads query results together with their cube schema and lists every chart \
                  the data supports.\n\n\
                  INPUT FORMAT:\n  \
                  {\"schema\": <cube>, \"locale\": \"en\", \"data\": [<rows>]}\n  \
                  or an array of such objects.\n\n\
                  EXAMPLES:\n  \
                  # All chart types with default limits\n  \
                  chart-engine -i results.json\n\n  \
                  # Only bars and lines, tighter limits\n  \
                  chart-engine -i results.json --types barchart,lineplot --limits limits.json\n\n  \
                  # Enable maps for the State level\n  \
                  chart-engine -i results.json --topojson State=/maps/states.json --json"
)]
struct Args {
    /// Path to the JSON input file
    #[arg(short, long)]
    input: String,

    /// JSON file with chart limits (e.g. {"BARCHART_MAX_BARS": 12})
    ///
    /// Missing keys keep their defaults
    #[arg(long)]
    limits: Option<String>,

    /// Chart types to generate (default: all)
    #[arg(long, value_enum, value_delimiter = ',')]
    types: Vec<CliChartType>,

    /// Maximum rows analysed per dataset for ranges and members
    #[arg(long)]
    datacap: Option<usize>,

    /// Map geometry for a geographic level, as LEVEL=PATH (repeatable)
    #[arg(long, value_parser = parse_topojson)]
    topojson: Vec<(String, String)>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of a table
    ///
    /// Disables all logs; only outputs the chart descriptors.
    #[arg(long)]
    json: bool,
}

/// One dataset as stored in the input file.
#[derive(Debug, Deserialize)]
struct DatasetInput {
    schema: Cube,
    #[serde(default = "default_locale")]
    locale: String,
    data: Vec<DataPoint>,
}

fn default_locale() -> String {
    "en".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputFile {
    Many(Vec<DatasetInput>),
    One(DatasetInput),
}

fn parse_topojson(arg: &str) -> std::result::Result<(String, String), String> {
    let (level, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected LEVEL=PATH, got '{arg}'"))?;
    if level.trim().is_empty() || path.trim().is_empty() {
        return Err(format!("expected LEVEL=PATH, got '{arg}'"));
    }
    Ok((level.trim().to_string(), path.trim().to_string()))
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading datasets from: {}", args.input);
    let datasets = load_datasets(&args.input)?;
    info!("Loaded {} dataset(s)", datasets.len());

    let config = build_config(&args)?;
    let rejected = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&rejected);

    let mut builder = ChartGenerator::builder()
        .config(config)
        .on_event(move |event| {
            if matches!(event, ChartEvent::CandidateRejected { .. }) {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });
    if !args.topojson.is_empty() {
        let registry: TopojsonRegistry = args
            .topojson
            .iter()
            .map(|(level, path)| (level.clone(), TopojsonConfig::new(path.as_str())))
            .collect();
        debug!("Registered topojson for {} level(s)", registry.len());
        builder = builder.topojson(registry);
    }

    let charts = builder.build()?.generate(&datasets)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&charts)?);
        return Ok(());
    }

    print_chart_table(&charts, rejected.load(Ordering::Relaxed));
    Ok(())
}

/// Read the input file and classify every dataset against its schema.
fn load_datasets(path: &str) -> Result<Vec<Dataset>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Could not read {path}"))?;
    let input: InputFile =
        serde_json::from_str(&content).with_context(|| format!("Invalid input JSON in {path}"))?;

    let inputs = match input {
        InputFile::Many(inputs) => inputs,
        InputFile::One(input) => vec![input],
    };

    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            Dataset::from_schema(&input.schema, input.data, input.locale)
                .with_context(|| {
                    format!("Dataset {index} does not match cube '{}'", input.schema.name)
                })
        })
        .collect()
}

fn build_config(args: &Args) -> Result<GeneratorConfig> {
    let mut builder = GeneratorConfig::builder();

    if let Some(ref path) = args.limits {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read limits file {path}"))?;
        let limits: ChartLimits = serde_json::from_str(&content)
            .with_context(|| format!("Invalid limits JSON in {path}"))?;
        builder = builder.limits(limits);
    }

    if !args.types.is_empty() {
        builder = builder.chart_types(args.types.iter().map(|&t| ChartType::from(t)));
    }

    if let Some(datacap) = args.datacap {
        builder = builder.datacap(datacap);
    }

    Ok(builder.build()?)
}

/// Print a human-readable table of the generated charts.
fn print_chart_table(charts: &[Chart], rejected: usize) {
    println!();
    println!("{}", "=".repeat(80));
    println!("CHARTS ({})", charts.len());
    println!("{}", "=".repeat(80));

    if charts.is_empty() {
        println!("  No chart could be made from this data");
    } else {
        println!(
            "{:<12} {:<9} {:<16} {:<28} {:<12}",
            "Type", "Key", "Measure", "Series", "Timeline"
        );
        println!("{}", "-".repeat(80));
        for chart in charts {
            let series = chart
                .series()
                .iter()
                .map(|s| s.level.as_str())
                .collect::<Vec<_>>()
                .join(" / ");
            let timeline = chart.timeline().map_or("-", |t| t.level.as_str());
            println!(
                "{:<12} {:<9} {:<16} {:<28} {:<12}",
                chart.chart_type().as_str(),
                chart.key(),
                truncate_str(&chart.values().measure.name, 15),
                truncate_str(if series.is_empty() { "-" } else { &series }, 27),
                truncate_str(timeline, 11),
            );
        }
    }

    println!();
    println!("{rejected} candidate(s) rejected; run with --log-level debug for reasons");
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
