mod cmd;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// stagehand - keep per-environment compose overrides in sync with one compose source
#[derive(Parser)]
#[command(name = "stagehand")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose (debug) logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Project directory
  #[arg(short = 'C', long, global = true, env = "STAGEHAND_DIR", default_value = ".")]
  dir: PathBuf,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Create stagehand.yaml and one override file per environment
  Init {
    /// Compose file to use as a source (repeatable, default: auto-detect)
    #[arg(short = 'f', long = "file")]
    files: Vec<PathBuf>,

    /// Environment to create in addition to dev (repeatable)
    #[arg(short = 'e', long = "env")]
    envs: Vec<String>,
  },

  /// Bring environment overrides in line with the compose sources
  Reconcile {
    /// Environment to reconcile (repeatable, default: all)
    #[arg(short = 'e', long = "env")]
    envs: Vec<String>,

    /// Show the changes without writing them
    #[arg(long)]
    dry_run: bool,
  },

  /// Reconcile continuously while sources and overrides change
  Dev {
    /// Environment to keep in sync (repeatable, default: dev)
    #[arg(short = 'e', long = "env")]
    envs: Vec<String>,

    /// How often to check watched files
    #[arg(long, default_value = "500ms", value_parser = humantime::parse_duration)]
    poll_interval: Duration,
  },

  /// Look for plain text secrets in sources and overrides
  DetectSecrets,

  /// List declared environments
  Envs,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Init { files, envs } => cmd::cmd_init(&cli.dir, files, envs, cli.output),
    Commands::Reconcile { envs, dry_run } => cmd::cmd_reconcile(&cli.dir, envs, dry_run, cli.output),
    Commands::Dev { envs, poll_interval } => cmd::cmd_dev(&cli.dir, envs, poll_interval),
    Commands::DetectSecrets => cmd::cmd_detect_secrets(&cli.dir, cli.output),
    Commands::Envs => cmd::cmd_envs(&cli.dir, cli.output),
  }
}
