use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fast_anomaly_engine::anomaly_core::{
    Axis, DiscordConfig, DiscordMaskMode, MissingPolicy, OutlierConfig, OutlierTail, ScoreAggregation,
};
use fast_anomaly_engine::arrow_handler::{build_anomaly_result, build_discord_result, parse_arrow_ipc};
use fast_anomaly_engine::utils::ScalingMethod;
use fast_anomaly_engine::{AnomalyEngine, Dataset, Detection, DetectorConfig};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fast-anomaly-engine")]
#[command(author = "Hummer Team")]
#[command(version = "0.1.0")]
#[command(about = "Discord discovery and outlier detection over tabular data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find discords in one series column
    Discord {
        #[command(flatten)]
        input: InputArgs,

        /// Series column (optional when the input has a single column)
        #[arg(short, long)]
        column: Option<String>,

        #[arg(long)]
        min_length: Option<usize>,

        #[arg(long)]
        max_length: Option<usize>,

        #[arg(long)]
        max_iterations: Option<usize>,

        #[arg(long)]
        exclusion_fraction: Option<f64>,

        #[arg(long, value_parser = parse_enum::<DiscordMaskMode>)]
        mask_mode: Option<DiscordMaskMode>,
    },

    /// Flag outlying observations of a numeric table
    Outliers {
        #[command(flatten)]
        input: InputArgs,

        /// Columns to use, comma separated (default: all)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Whether rows or columns are the observations
        #[arg(long, value_parser = parse_enum::<Axis>, default_value = "rows")]
        axis: Axis,

        /// Column scaling before scoring: none, minmax, standard
        #[arg(long, default_value = "none")]
        scale: ScalingMethod,

        #[arg(short, long)]
        k: Option<usize>,

        #[arg(long)]
        alpha: Option<f64>,

        #[arg(long)]
        p: Option<f64>,

        #[arg(long)]
        size_threshold: Option<usize>,

        #[arg(long, value_parser = parse_enum::<OutlierTail>)]
        tail: Option<OutlierTail>,

        #[arg(long, value_parser = parse_enum::<ScoreAggregation>)]
        aggregation: Option<ScoreAggregation>,

        #[arg(long, value_parser = parse_enum::<MissingPolicy>)]
        missing: Option<MissingPolicy>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Path to the input file
    #[arg(short, long)]
    file: PathBuf,

    /// Input format (default: from the file extension)
    #[arg(long, value_enum)]
    format: Option<InputFormat>,

    /// JSON file with engine parameters; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Result format on stdout, or in --out for arrow
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Destination for arrow output
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    Csv,
    Json,
    Arrow,
}

#[derive(Clone, Copy, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Arrow,
}

/// Parse a kebab- or snake-case variant name through the type's serde form
fn parse_enum<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let name = raw.trim().to_ascii_lowercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(name)).map_err(|e| e.to_string())
}

struct Loaded {
    dataset: Dataset,
    order_ids: Option<Vec<i64>>,
}

fn load(input: &InputArgs) -> anyhow::Result<Loaded> {
    let format = match input.format {
        Some(f) => f,
        None => match input.file.extension().and_then(|e| e.to_str()) {
            Some("json") => InputFormat::Json,
            Some("arrow") | Some("arrows") | Some("ipc") => InputFormat::Arrow,
            _ => InputFormat::Csv,
        },
    };
    let name = input
        .file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("input")
        .to_string();

    let loaded = match format {
        InputFormat::Csv => {
            let content = fs::read_to_string(&input.file)?;
            Loaded {
                dataset: Dataset::from_csv(name, &content)?,
                order_ids: None,
            }
        }
        InputFormat::Json => {
            let content = fs::read_to_string(&input.file)?;
            Loaded {
                dataset: Dataset::from_json(name, &content)?,
                order_ids: None,
            }
        }
        InputFormat::Arrow => {
            let bytes = fs::read(&input.file)?;
            let parsed = parse_arrow_ipc(&bytes)?;
            Loaded {
                dataset: Dataset::from_observations(name, parsed.columns, &parsed.observations)?,
                order_ids: parsed.order_ids,
            }
        }
    };

    info!(
        file = %input.file.display(),
        rows = loaded.dataset.len(),
        columns = loaded.dataset.columns.len(),
        "loaded input"
    );
    Ok(loaded)
}

fn read_config<T: DeserializeOwned + Default>(path: Option<&Path>) -> anyhow::Result<T> {
    match path {
        Some(p) => {
            let content = fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            Ok(serde_json::from_str(&content).with_context(|| format!("parsing {}", p.display()))?)
        }
        None => Ok(T::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (input, engine, config, dataset, order_ids) = match cli.command {
        Commands::Discord {
            input,
            column,
            min_length,
            max_length,
            max_iterations,
            exclusion_fraction,
            mask_mode,
        } => {
            let mut cfg: DiscordConfig = read_config(input.config.as_deref())?;
            if let Some(v) = min_length {
                cfg.min_length = v;
            }
            if let Some(v) = max_length {
                cfg.max_length = v;
            }
            if let Some(v) = max_iterations {
                cfg.max_iterations = v;
            }
            if let Some(v) = exclusion_fraction {
                cfg.exclusion_fraction = v;
            }
            if let Some(v) = mask_mode {
                cfg.mask_mode = v;
            }

            let loaded = load(&input)?;
            let mut engine = AnomalyEngine::new();
            if let Some(c) = column {
                engine = engine.with_column(c);
            }
            (input, engine, DetectorConfig::Discord(cfg), loaded.dataset, loaded.order_ids)
        }

        Commands::Outliers {
            input,
            columns,
            axis,
            scale,
            k,
            alpha,
            p,
            size_threshold,
            tail,
            aggregation,
            missing,
        } => {
            let mut cfg: OutlierConfig = read_config(input.config.as_deref())?;
            if let Some(v) = k {
                cfg.k = v;
            }
            if let Some(v) = alpha {
                cfg.alpha = v;
            }
            if let Some(v) = p {
                cfg.p = v;
            }
            if let Some(v) = size_threshold {
                cfg.size_threshold = v;
            }
            if let Some(v) = tail {
                cfg.outlier_tail = v;
            }
            if let Some(v) = aggregation {
                cfg.aggregation = v;
            }
            if let Some(v) = missing {
                cfg.missing = v;
            }

            let loaded = load(&input)?;
            let dataset = if columns.is_empty() {
                loaded.dataset
            } else {
                loaded.dataset.select(&columns)?
            };
            // ids label rows, which are no longer the observations once transposed
            let order_ids = match axis {
                Axis::Rows => loaded.order_ids,
                Axis::Columns => None,
            };
            let engine = AnomalyEngine::new().with_axis(axis).with_scaling(scale);
            (input, engine, DetectorConfig::Outlier(cfg), dataset, order_ids)
        }
    };

    let detection = engine.run(&dataset, &config)?;
    write_output(&input, &detection, order_ids.as_deref())
}

fn write_output(input: &InputArgs, detection: &Detection, order_ids: Option<&[i64]>) -> anyhow::Result<()> {
    match input.output {
        OutputFormat::Text => {
            let mask = detection.mask();
            println!("{} of {} flagged", mask.count(), mask.len());
            println!("indices: {:?}", mask.indices());
            if let Detection::Discord(report) = detection {
                for d in &report.discords {
                    println!("length {:>4}  start {:>6}  distance {:.4}", d.length, d.start, d.distance);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(detection)?);
        }
        OutputFormat::Arrow => {
            let out = input
                .out
                .as_deref()
                .context("--out is required for arrow output")?;
            let bytes = match detection {
                Detection::Discord(report) => build_anomaly_result(order_ids, &report.mask, None)?,
                Detection::Outlier(report) => {
                    build_anomaly_result(order_ids, &report.mask, Some(report.scores.as_slice()))?
                }
            };
            fs::write(out, bytes)?;
            if let Detection::Discord(report) = detection {
                let discords_path = out.with_extension("discords.arrow");
                fs::write(&discords_path, build_discord_result(&report.discords)?)?;
            }
            info!(path = %out.display(), "wrote result");
        }
    }
    Ok(())
}
