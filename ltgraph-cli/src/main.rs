#![forbid(unsafe_code)]

//! ltgraph command line tool.
//!
//! Compares loadtest result files: validates them against each other, evaluates the maximum
//! sustained throughput and overload point of every run, and renders a per-profile report.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::style;
use ltgraph_core::config::validate_fail_threshold;
use ltgraph_core::{analyze, AnalysisConfig, LossMode, LtError, UtilizationPolicy, YAxisScaling};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

mod html_report;
mod loader;
mod logging;
mod renderer;

use renderer::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Loadtest result files (JSON)
    #[arg(value_name = "LOADTEST.json", required = true)]
    inputs: Vec<PathBuf>,

    /// File into which write the output, `-` for stdout [default: index.html for html, stdout otherwise]
    #[arg(short, long)]
    output: Option<String>,

    /// Fraction of loss (0.0001..=1.0) at which the test is considered failed [default: 0.001]
    #[arg(short, long, value_parser = parse_fail_threshold)]
    fail_threshold: Option<f64>,

    /// Y axis scaler (DIVISOR:PREFIX), divisor is an integer > 0 [default: 1000000:M]
    #[arg(short, long, value_parser = parse_yscaler)]
    yscaler: Option<YAxisScaling>,

    /// HTML assets (js, css) prefix
    #[arg(short, long, default_value = "")]
    asset_prefix: String,

    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,

    /// How the peak line rate of a run is derived
    #[arg(long, value_enum)]
    utilization: Option<UtilizationArg>,

    /// Loss representation used in the error graph
    #[arg(long, value_enum)]
    error_loss: Option<ErrorLossArg>,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UtilizationArg {
    /// Highest utilization seen during the run
    RunningMax,
    /// Utilization at the last datapoint
    LastObserved,
}

impl From<UtilizationArg> for UtilizationPolicy {
    fn from(arg: UtilizationArg) -> Self {
        match arg {
            UtilizationArg::RunningMax => UtilizationPolicy::RunningMax,
            UtilizationArg::LastObserved => UtilizationPolicy::LastObserved,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ErrorLossArg {
    /// Fraction of sent packets lost
    Fraction,
    /// Lost packets per second, scaled like throughput
    Volume,
}

impl From<ErrorLossArg> for LossMode {
    fn from(arg: ErrorLossArg) -> Self {
        match arg {
            ErrorLossArg::Fraction => LossMode::Fraction,
            ErrorLossArg::Volume => LossMode::Volume,
        }
    }
}

fn parse_fail_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    validate_fail_threshold(value).map_err(|e| e.to_string())
}

fn parse_yscaler(s: &str) -> Result<YAxisScaling, String> {
    s.parse().map_err(|e: LtError| e.to_string())
}

impl Cli {
    /// Configuration file (if any) with command line overrides applied.
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut cfg = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        if let Some(ft) = self.fail_threshold {
            cfg.fail_threshold = ft;
        }
        if let Some(ys) = &self.yscaler {
            cfg.yscaler = ys.clone();
        }
        if let Some(policy) = self.utilization {
            cfg.utilization_policy = policy.into();
        }
        if let Some(mode) = self.error_loss {
            cfg.error_loss = mode.into();
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() -> ExitCode {
    // usage errors exit 1 like every other failure; help and version exit 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(LtError::InvalidRuns { problems }) = err.downcast_ref::<LtError>() {
                for problem in problems {
                    eprintln!("{} {}", style("E:").red(), problem);
                }
                eprintln!("{} error while reading loadtest files, abort", style("F:").red().bold());
            } else {
                eprintln!("{} {:#}", style("F:").red().bold(), err);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    logging::init_logging(cli.verbose, cli.quiet);
    let config = cli.analysis_config()?;

    let inputs = loader::load_runs(&cli.inputs);
    let analysis = analyze(inputs, &config)?;
    let rendered = renderer::render(&analysis, cli.format, &cli.asset_prefix)?;

    let output = cli
        .output
        .as_deref()
        .unwrap_or_else(|| cli.format.default_output());
    if output.is_empty() || output == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()?;
    } else {
        std::fs::write(output, rendered).with_context(|| format!("writing {output}"))?;
        info!(output, profiles = analysis.profiles.len(), "report written");
    }
    Ok(())
}
