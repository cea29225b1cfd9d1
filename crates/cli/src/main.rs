mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// Resolve a package list into an OpenWrt .config
#[derive(Parser)]
#[command(name = "kselect")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(flatten)]
  global: GlobalArgs,

  #[command(subcommand)]
  command: Option<Commands>,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Build tree root (overrides the settings file and OPENWRT_SRC)
  #[arg(long, global = true, value_name = "DIR")]
  pub src: Option<PathBuf>,

  /// Settings file (default: ./kselect.toml if present)
  #[arg(long, global = true, value_name = "FILE")]
  pub settings: Option<PathBuf>,

  /// Package list (default: ./packages)
  #[arg(short, long, global = true, value_name = "FILE")]
  pub packages: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve the package list, write .config and run the finalize command (default)
  Apply {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Resolve the package list and print the result without writing anything
  Plan {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show the paths and settings a run would use
  Info {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.global.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let settings = cmd::load_settings(&cli.global)?;

  match cli.command.unwrap_or(Commands::Apply {
    output: OutputFormat::default(),
  }) {
    Commands::Apply { output } => cmd::cmd_apply(&settings, output),
    Commands::Plan { output } => cmd::cmd_plan(&settings, output),
    Commands::Info { output } => cmd::cmd_info(&settings, output),
  }
}
