//! slmvpa CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use sl_core::{Condition, Modality};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slmvpa")]
#[command(about = "slmvpa - leave-one-subject-out searchlight decoding")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the searchlight sweep, skipping maps that already exist
    Run {
        /// Analysis config (YAML, or JSON by extension)
        #[arg(short, long)]
        config: PathBuf,

        /// Threads (0 = all CPUs). Overrides the config value.
        #[arg(long)]
        threads: Option<usize>,

        /// Output file for the run summary (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List every leaf with its output file and done/pending status
    Plan {
        /// Analysis config (YAML, or JSON by extension)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the trial selection and fold codes of one leaf
    Split {
        /// Analysis config (YAML, or JSON by extension)
        #[arg(short, long)]
        config: PathBuf,

        /// Held-out participant
        #[arg(long)]
        subject: String,

        /// Target modality token (e.g. V)
        #[arg(long)]
        modality: String,

        /// Validate on the other modalities instead of the target one
        #[arg(long)]
        crossmodal: bool,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // JSON results own stdout.
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { config, threads, output } => cmd_run(&config, threads, output.as_ref()),
        Commands::Plan { config, output } => cmd_plan(&config, output.as_ref()),
        Commands::Split { config, subject, modality, crossmodal, output } => {
            cmd_split(&config, &subject, &modality, crossmodal, output.as_ref())
        }
    }
}

fn cmd_run(config: &PathBuf, threads: Option<usize>, output: Option<&PathBuf>) -> Result<()> {
    let mut cfg = load_config(config)?;
    if let Some(t) = threads {
        cfg.threads = t;
    }
    let summary = sl_mvpa::run_sweep(cfg)?;
    write_json(output, serde_json::to_value(summary)?)
}

fn cmd_plan(config: &PathBuf, output: Option<&PathBuf>) -> Result<()> {
    let cfg = load_config(config)?;
    let leaves = sl_mvpa::plan_sweep(cfg)?;
    let done = leaves.iter().filter(|l| l.status == sl_mvpa::LeafStatus::Done).count();
    tracing::info!(leaves = leaves.len(), done, pending = leaves.len() - done, "plan");

    let output_json = serde_json::json!({
        "total": leaves.len(),
        "done": done,
        "pending": leaves.len() - done,
        "leaves": leaves,
    });
    write_json(output, output_json)
}

fn cmd_split(
    config: &PathBuf,
    subject: &str,
    modality: &str,
    crossmodal: bool,
    output: Option<&PathBuf>,
) -> Result<()> {
    let cfg = load_config(config)?;
    let condition = if crossmodal { Condition::Crossmodal } else { Condition::Unimodal };
    let report = sl_mvpa::preview_split(&cfg, subject, &Modality::new(modality), condition)?;
    write_json(output, serde_json::to_value(report)?)
}

fn load_config(path: &PathBuf) -> Result<sl_mvpa::AnalysisConfig> {
    tracing::debug!(path = %path.display(), "loading config");
    Ok(sl_mvpa::read_config(path)?)
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
