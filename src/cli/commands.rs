//! CLI command definitions for experience-metrics.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::info;

use crate::evaluator::{summarize_batch, write_manifest, BatchConfig, Evaluator, EvaluatorConfig};
use crate::manifest::{MetricStatus, MetricsManifest};
use crate::pipeline::run_pipeline;
use crate::runner::{ExperienceRunner, RunnerConfig, DEFAULT_OUTPUT_DIR};

/// Default run log read by the evaluator.
const DEFAULT_ARTIFACT_PATH: &str = "/tmp/resim/inputs/logs/run.log";

/// Default manifest written by the evaluator.
const DEFAULT_MANIFEST_PATH: &str = "/tmp/resim/outputs/job_metrics.json";

/// Runs simulation experiences and turns their run logs into pass/fail metrics.
#[derive(Parser)]
#[command(name = "experience-metrics")]
#[command(about = "Run experiences and evaluate their run logs into metrics manifests")]
#[command(version)]
#[command(
    long_about = "experience-metrics runs an experience, records a run log, and evaluates it into a job_metrics.json manifest.\n\nThe job status is PASSED unless some metric FAILED. A FAILED job still exits 0; only missing inputs, malformed run logs and write errors exit non-zero.\n\nExample usage:\n  experience-metrics pipeline --experience ./experiences/square-flight --output /tmp/resim/outputs"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run an experience and write its run log.
    Run(RunArgs),

    /// Evaluate a run log into a metrics manifest.
    #[command(alias = "eval")]
    Evaluate(EvaluateArgs),

    /// Run an experience and evaluate it in one process.
    Pipeline(PipelineArgs),

    /// Summarize several job manifests into one batch manifest.
    Batch(BatchArgs),
}

/// Arguments for `experience-metrics run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Experience directory holding the input assets.
    #[arg(short = 'e', long)]
    pub experience: PathBuf,

    /// Output directory for the run log and copied assets.
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Experience name (defaults to the directory name).
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Wall-clock budget in seconds; the run is marked incomplete past it.
    #[arg(long)]
    pub time_budget_secs: Option<u64>,

    /// Output JSON summary.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `experience-metrics evaluate`.
#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Run log to evaluate.
    #[arg(short = 'a', long, default_value = DEFAULT_ARTIFACT_PATH)]
    pub artifact: PathBuf,

    /// Manifest path to write.
    #[arg(short = 'o', long, default_value = DEFAULT_MANIFEST_PATH)]
    pub output: PathBuf,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    /// Output JSON summary.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `experience-metrics pipeline`.
#[derive(Parser, Debug)]
pub struct PipelineArgs {
    /// Experience directory holding the input assets.
    #[arg(short = 'e', long)]
    pub experience: PathBuf,

    /// Output directory for the run log, assets and manifest.
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Experience name (defaults to the directory name).
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Wall-clock budget in seconds; the run is marked incomplete past it.
    #[arg(long)]
    pub time_budget_secs: Option<u64>,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    /// Output JSON summary.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Evaluator configuration flags shared by `evaluate` and `pipeline`.
#[derive(clap::Args, Debug)]
pub struct ThresholdArgs {
    /// YAML or JSON evaluator configuration file.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Maximum WARNING events before `warning_count` fails.
    #[arg(long)]
    pub warning_threshold: Option<u64>,

    /// Maximum observed duration in seconds before `duration` fails.
    #[arg(long)]
    pub duration_threshold: Option<f64>,

    /// Emit `artifact_integrity` and fail on skipped run log lines.
    #[arg(long)]
    pub fail_on_parse_warnings: bool,
}

/// Arguments for `experience-metrics batch`.
#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// Job manifests to summarize.
    #[arg(required = true)]
    pub manifests: Vec<PathBuf>,

    /// Batch manifest path to write.
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Minimum share of passed jobs, in percent.
    #[arg(long, default_value = "70")]
    pub min_success_rate: f64,

    /// Output JSON summary.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Parse CLI arguments and return the Cli struct.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse CLI arguments and run the command.
///
/// For control over logging initialization, use `parse_cli()` and `run_with_cli()`.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli())
}

/// Run the CLI with the parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_run_command(args),
        Commands::Evaluate(args) => run_evaluate_command(args),
        Commands::Pipeline(args) => run_pipeline_command(args),
        Commands::Batch(args) => run_batch_command(args),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

fn run_run_command(args: RunArgs) -> anyhow::Result<()> {
    let config = runner_config(&args.experience, &args.output, args.name, args.time_budget_secs);
    let outcome = ExperienceRunner::new(config)
        .run()
        .with_context(|| format!("Failed to run experience {}", args.experience.display()))?;

    if args.json {
        #[derive(Serialize)]
        struct RunOutput<'a> {
            run_id: &'a str,
            experience: &'a str,
            completed: bool,
            assets_copied: usize,
            events: usize,
            artifact: &'a Path,
        }

        let output = RunOutput {
            run_id: &outcome.run_id,
            experience: &outcome.experience.name,
            completed: outcome.record.completed,
            assets_copied: outcome.assets_copied,
            events: outcome.record.events.len(),
            artifact: &outcome.artifact_path,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let mark = if outcome.record.completed { "✓" } else { "✗" };
        println!("{} Run {} of '{}'", mark, outcome.run_id, outcome.experience.name);
        println!("  Assets copied: {}", outcome.assets_copied);
        println!("  Events:        {}", outcome.record.events.len());
        println!("  Run log:       {}", outcome.artifact_path.display());
    }
    Ok(())
}

fn run_evaluate_command(args: EvaluateArgs) -> anyhow::Result<()> {
    let evaluator = Evaluator::new(evaluator_config(&args.thresholds)?);
    let evaluation = evaluator
        .run(&args.artifact, &args.output)
        .with_context(|| format!("Failed to evaluate run log {}", args.artifact.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print_manifest(&evaluation.manifest, &args.output);
        if evaluation.parse_warning_count > 0 {
            println!("  Skipped lines: {}", evaluation.parse_warning_count);
        }
    }
    Ok(())
}

fn run_pipeline_command(args: PipelineArgs) -> anyhow::Result<()> {
    let evaluator = Evaluator::new(evaluator_config(&args.thresholds)?);
    let config = runner_config(&args.experience, &args.output, args.name, args.time_budget_secs);

    let outcome = run_pipeline(&config, &evaluator, None)
        .with_context(|| format!("Pipeline failed for {}", args.experience.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("Run {} of '{}'", outcome.run.run_id, outcome.run.experience.name);
        println!("  Run log: {}", outcome.run.artifact_path.display());
        print_manifest(&outcome.manifest, &outcome.manifest_path);
    }
    Ok(())
}

fn run_batch_command(args: BatchArgs) -> anyhow::Result<()> {
    let config = BatchConfig::default().with_min_success_rate(args.min_success_rate);
    let summary = summarize_batch(&args.manifests, &config)
        .context("Failed to summarize batch")?;
    write_manifest(&summary, &args.output)
        .with_context(|| format!("Failed to write batch manifest {}", args.output.display()))?;

    info!(
        "Summarized {} manifests into {}",
        args.manifests.len(),
        args.output.display()
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_manifest(&summary, &args.output);
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn runner_config(
    experience: &Path,
    output: &Path,
    name: Option<String>,
    time_budget_secs: Option<u64>,
) -> RunnerConfig {
    let mut config = RunnerConfig::new(experience).with_output_dir(output);
    if let Some(name) = name {
        config = config.with_name(name);
    }
    if let Some(secs) = time_budget_secs {
        config = config.with_time_budget(Duration::from_secs(secs));
    }
    config
}

/// Layers CLI flags over the file and environment configuration.
fn evaluator_config(args: &ThresholdArgs) -> anyhow::Result<EvaluatorConfig> {
    let mut config = EvaluatorConfig::load(args.config.as_deref())
        .context("Failed to load evaluator configuration")?;

    if let Some(threshold) = args.warning_threshold {
        config = config.with_warning_threshold(threshold);
    }
    if let Some(secs) = args.duration_threshold {
        config = config.with_duration_threshold(secs);
    }
    if args.fail_on_parse_warnings {
        config = config.with_fail_on_parse_warnings(true);
    }

    config
        .validate()
        .context("Invalid evaluator configuration")?;
    Ok(config)
}

fn print_manifest(manifest: &MetricsManifest, path: &Path) {
    println!("\n=== Job {} ===", manifest.job_status());
    for metric in manifest.metrics() {
        let mark = match metric.status {
            MetricStatus::Passed => "✓",
            MetricStatus::Failed => "✗",
            MetricStatus::NoValue => "-",
        };
        let value = match (metric.value, metric.unit.as_deref()) {
            (Some(v), Some(unit)) => format!("{} {}", v, unit),
            (Some(v), None) => v.to_string(),
            (None, _) => "n/a".to_string(),
        };
        println!("  {} {:<20} {:<10} {}", mark, metric.name, value, metric.status);
    }
    println!("  Manifest: {}", path.display());
}
