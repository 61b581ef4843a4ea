//! Evaluate a stacked heatmap network on one UnityEyes sample.

use clap::Parser;
use eyemark::io::EvalConfig;
use std::path::PathBuf;

#[cfg(feature = "tracing")]
use tracing_log::LogTracer;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "eyemark-eval")]
#[command(about = "Decode landmark heatmaps for one UnityEyes sample and plot them")]
#[command(version)]
struct Cli {
    /// JSON config; command-line flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of `<n>.jpg` + `<n>.json` pairs.
    #[arg(long)]
    dataset: Option<String>,

    /// Sample position in the sorted dataset.
    #[arg(long)]
    index: Option<usize>,

    /// Checkpoint file; random weights are used when it does not exist.
    #[arg(long)]
    checkpoint: Option<String>,

    /// Figure output path.
    #[arg(long)]
    output: Option<String>,

    /// Write a JSON report here.
    #[arg(long)]
    report: Option<String>,

    /// Seed for random initialization.
    #[arg(long)]
    seed: Option<u64>,

    /// Emit JSON log lines (requires the `tracing` feature).
    #[arg(long)]
    log_json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply(&self, cfg: &mut EvalConfig) {
        if let Some(dir) = &self.dataset {
            cfg.dataset_dir = dir.clone();
        }
        if let Some(index) = self.index {
            cfg.sample_index = index;
        }
        if let Some(path) = &self.checkpoint {
            cfg.checkpoint_path = path.clone();
        }
        if let Some(path) = &self.output {
            cfg.output_path = Some(path.clone());
        }
        if let Some(path) = &self.report {
            cfg.report_path = Some(path.clone());
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
    }
}

fn level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// `RUST_LOG`, when set, refines the `-v` level.
#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_level(level(cli.verbose))
        .parse_default_env()
        .format_timestamp_millis()
        .try_init()?;
    if cli.log_json {
        log::warn!("--log-json has no effect without the `tracing` feature");
    }
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let level = level(cli.verbose);
    LogTracer::init_with_filter(level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    // `set_global_default` leaves the `LogTracer` above in place.
    if cli.log_json {
        tracing::subscriber::set_global_default(builder.json().flatten_event(true).finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut cfg = match &cli.config {
        Some(path) => EvalConfig::load_json(path)?,
        None => EvalConfig::default(),
    };
    cli.apply(&mut cfg);

    let report = eyemark::eval::run(&cfg)?;
    match report.mean_error_px {
        Some(err) => println!(
            "decoded {} landmarks ({}), mean error {:.2} px, figure {}",
            report.channels,
            report.model_source,
            err,
            cfg.output_path().display()
        ),
        None => println!(
            "decoded {} landmarks ({}), figure {}",
            report.channels,
            report.model_source,
            cfg.output_path().display()
        ),
    }
    Ok(())
}
