use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pipeliner_core::paths::resolve_base_dir;
use pipeliner_core::{Paths, PipelineConfig, PipelineKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Join and aggregate tabular model files by identifier", long_about = None)]
struct Cli {
    /// Log line format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Json, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join the id register with reference info and per-id means of the model samples
    Run(PipelineArgs),
    /// Average input/sample.csv per id and write output/id_value.csv
    Aggregate(PipelineArgs),
    /// Print the resolved input and output file layout
    Paths(PipelineArgs),
}

#[derive(Args, Debug, Default)]
struct PipelineArgs {
    /// Base working directory (falls back to $PIPELINER_BASE_DIR, then the current directory)
    #[arg(long)]
    base_dir: Option<PathBuf>,
    /// Use the parent of the executable's directory as the base directory
    #[arg(long)]
    relative_to_exe: bool,
    /// Config file (defaults to <base-dir>/pipeliner.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    dotenvy::dotenv().ok();

    match cli.command {
        Command::Run(args) => handle_pipeline(PipelineKind::Join, args),
        Command::Aggregate(args) => handle_pipeline(PipelineKind::Aggregate, args),
        Command::Paths(args) => handle_paths(args),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn resolve(args: &PipelineArgs) -> Result<(Paths, PipelineConfig)> {
    let base_dir = resolve_base_dir(args.base_dir.clone(), args.relative_to_exe)
        .context("failed to determine the base directory")?;
    info!(base_dir = %base_dir.display(), "resolved base directory");

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path),
        None => PipelineConfig::load_or_default(&base_dir),
    }
    .context("failed to load pipeline configuration")?;

    Ok((Paths::new(base_dir), config))
}

fn handle_pipeline(kind: PipelineKind, args: PipelineArgs) -> Result<()> {
    let (paths, config) = resolve(&args)?;

    let summary = kind
        .run(&paths, &config)
        .with_context(|| format!("{kind} pipeline failed"))?;

    println!("{}", summary.to_json_pretty()?);
    Ok(())
}

fn handle_paths(args: PipelineArgs) -> Result<()> {
    let (paths, _) = resolve(&args)?;

    println!("base dir:        {}", paths.base_dir().display());
    println!("id register:     {}", paths.id().display());
    println!("info:            {}", paths.info().display());
    println!("sample:          {}", paths.sample().display());
    println!("sample files:    {}", paths.samples_pattern().display());
    for path in paths.samples()? {
        println!("  {}", path.display());
    }
    println!("id relation:     {}", paths.id_id_relation().display());
    println!("aggregate input: {}", paths.aggregate_sample().display());
    println!("join output:     {}", paths.id_info_value().display());
    println!("aggregate output: {}", paths.id_value().display());
    Ok(())
}
