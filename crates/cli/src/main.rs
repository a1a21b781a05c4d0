mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{PropertyArgs, RunArgs, cmd_args, cmd_inspect, cmd_run};
use crate::output::OutputFormat;

/// testpojo - run the POJO test engine in a forked JVM
#[derive(Parser)]
#[command(name = "testpojo")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the launcher jar and run the test engine
  Run(RunArgs),

  /// Show the JVM arguments an argument line renders to
  Args {
    /// Argument line, e.g. "-javaagent:@{jacocoAgent} -Xmx1g"
    #[arg(allow_hyphen_values = true)]
    arg_line: String,

    #[command(flatten)]
    properties: PropertyArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show the Main-Class and Class-Path of a launcher jar
  Inspect {
    /// Path to the jar
    jar: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();

  // Initialize logging; RUST_LOG wins over --verbose
  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();

  match cli.command {
    Commands::Run(args) => cmd_run(&args),
    Commands::Args {
      arg_line,
      properties,
      output,
    } => cmd_args(&arg_line, &properties, output).map(|_| ExitCode::SUCCESS),
    Commands::Inspect { jar, output } => cmd_inspect(&jar, output).map(|_| ExitCode::SUCCESS),
  }
}
