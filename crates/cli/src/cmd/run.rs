//! Implementation of the `testpojo run` command.
//!
//! Builds the launch request from a descriptor and/or flags, runs the engine
//! and prints a summary. POJO failures only fail the command when
//! `--fail-on-errors` is given.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use testpojo_lib::dependencies::read_list;
use testpojo_lib::launch::{LaunchRequest, LaunchSummary, launch};
use testpojo_lib::report::Report;

use super::PropertyArgs;
use crate::output::{
  OutputFormat, format_duration, print_error, print_info, print_json, print_stat, print_success, print_warning,
};

#[derive(Debug, Args)]
pub struct RunArgs {
  /// JSON launch descriptor; flags below override or extend it
  #[arg(long, value_name = "FILE")]
  pub descriptor: Option<PathBuf>,

  /// Build directory receiving testPojo.jar and testPojo.dependencies
  #[arg(long, value_name = "DIR", required_unless_present = "descriptor")]
  pub build_dir: Option<PathBuf>,

  /// Compiled classes handed to the engine
  #[arg(long, value_name = "DIR", required_unless_present = "descriptor")]
  pub output_dir: Option<PathBuf>,

  /// Runtime scoped dependency (repeatable)
  #[arg(long = "runtime-dep", value_name = "COORDINATE")]
  pub runtime_deps: Vec<String>,

  /// Compile scoped dependency (repeatable)
  #[arg(long = "compile-dep", value_name = "COORDINATE")]
  pub compile_deps: Vec<String>,

  /// File with one runtime dependency per line
  #[arg(long, value_name = "FILE")]
  pub dependencies_from: Option<PathBuf>,

  /// Engine class path entry or separated list (repeatable)
  #[arg(long = "class-path", value_name = "ENTRY")]
  pub class_path: Vec<String>,

  /// Engine entry point
  #[arg(long, value_name = "CLASS")]
  pub main_class: Option<String>,

  /// Java launcher to use
  #[arg(long, value_name = "PATH")]
  pub java: Option<PathBuf>,

  /// Exit non-zero when POJOs fail or the engine ends abnormally
  #[arg(long)]
  pub fail_on_errors: bool,

  #[command(flatten)]
  pub properties: PropertyArgs,

  /// Output format
  #[arg(long, value_enum, default_value_t)]
  pub output: OutputFormat,
}

impl RunArgs {
  fn to_request(&self) -> Result<LaunchRequest> {
    let mut request = match &self.descriptor {
      Some(path) => LaunchRequest::from_file(path)?,
      None => LaunchRequest::default(),
    };

    if let Some(dir) = &self.build_dir {
      request.build_directory = dir.clone();
    }
    if let Some(dir) = &self.output_dir {
      request.output_directory = dir.clone();
    }

    request.dependencies.runtime.extend(self.runtime_deps.iter().cloned());
    if let Some(path) = &self.dependencies_from {
      let listed = read_list(path).with_context(|| format!("Failed to read dependency list: {}", path.display()))?;
      request.dependencies.runtime.extend(listed);
    }
    request.dependencies.compile.extend(self.compile_deps.iter().cloned());
    request.class_path.extend(self.class_path.iter().cloned());

    request.properties = request.properties.merged(&self.properties.load()?);

    if self.main_class.is_some() {
      request.main_class = self.main_class.clone();
    }
    if self.java.is_some() {
      request.java = self.java.clone();
    }

    Ok(request)
  }
}

/// Execute the run command.
///
/// Returns a failure exit code only for `--fail-on-errors` runs whose engine
/// did not pass; fatal launch errors are returned as errors.
pub fn cmd_run(args: &RunArgs) -> Result<ExitCode> {
  let start = Instant::now();
  let request = args.to_request()?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let summary = rt.block_on(launch(&request)).context("Test engine launch failed")?;

  if args.output.is_json() {
    print_json(&summary)?;
  } else {
    print_summary(&summary);
    print_stat("Duration", &format_duration(start.elapsed()));
  }

  let failed = summary.report().is_some_and(|report| !report.is_success());
  if args.fail_on_errors && failed {
    return Ok(ExitCode::FAILURE);
  }
  Ok(ExitCode::SUCCESS)
}

fn print_summary(summary: &LaunchSummary) {
  match summary {
    LaunchSummary::Skipped { build_directory } => {
      print_info(&format!("No classes in {}, skipping", build_directory.display()));
    }
    LaunchSummary::Completed(result) => {
      match &result.report {
        Report::Passed => print_success(&result.report.to_string()),
        Report::PojoErrors { .. } => print_warning(&result.report.to_string()),
        Report::Abnormal { .. } => print_error(&result.report.to_string()),
      }
      print_stat("Artifact", &result.artifact.display().to_string());
      print_stat("Dependencies", &result.dependency_file.display().to_string());
      print_stat("Command", &result.command_line.join(" "));
    }
  }
}
