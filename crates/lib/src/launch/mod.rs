//! Test engine launch pipeline.
//!
//! Runs one launch end to end:
//!
//! 1. Skip when the build directory does not exist
//! 2. Render the `argLine` into JVM arguments
//! 3. Resolve the engine class path
//! 4. Write `testPojo.jar`
//! 5. Write `testPojo.dependencies`
//! 6. Run the engine and wait for it
//! 7. Interpret its exit status
//!
//! Every step runs in order on the calling task. Only the child's output
//! readers run concurrently, inside [`ChildInvocation::run`].

pub mod types;

use std::ffi::OsString;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::argline;
use crate::artifact::ExecutableArtifact;
use crate::classpath::{self, ClassPathSet};
use crate::consts::{ARG_LINE_PROPERTY, ARTIFACT_FILENAME, DEPENDENCY_FILENAME};
use crate::report::Report;
use crate::supervisor::{ChildInvocation, LogSink, TracingSink, resolve_java};

pub use types::{LaunchError, LaunchRequest, LaunchResult, LaunchSummary};

/// Runs launch requests, forwarding engine output to a sink.
#[derive(Clone)]
pub struct Launcher {
  sink: Arc<dyn LogSink>,
}

impl Default for Launcher {
  fn default() -> Self {
    Self::new()
  }
}

impl Launcher {
  /// A launcher that forwards engine output to `tracing`.
  pub fn new() -> Self {
    Self::with_sink(Arc::new(TracingSink))
  }

  pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
    Self { sink }
  }

  /// Run the engine for `request`.
  ///
  /// Returns `Skipped` without touching the filesystem when the build
  /// directory is missing. A positive engine exit is reported, not returned
  /// as an error.
  pub async fn launch(&self, request: &LaunchRequest) -> Result<LaunchSummary, LaunchError> {
    if !request.build_directory.is_dir() {
      info!(build_directory = %request.build_directory.display(), "No classes, skipping");
      return Ok(LaunchSummary::Skipped {
        build_directory: request.build_directory.clone(),
      });
    }

    let build_directory =
      std::path::absolute(&request.build_directory).map_err(|source| LaunchError::BuildDirectory {
        path: request.build_directory.clone(),
        source,
      })?;

    let arg_line = request.properties.get(ARG_LINE_PROPERTY);
    if arg_line.is_none() {
      info!("No argLine specifying javaagent - jacoco coverage may not be effective");
    }
    let jvm_args = argline::render_optional(arg_line, &request.properties);
    debug!(jvm_args = ?jvm_args, "rendered argument line");

    let class_path = engine_class_path(request)?;

    let artifact = ExecutableArtifact::new(
      build_directory.join(ARTIFACT_FILENAME),
      request.main_class(),
      class_path,
    );
    artifact.build()?;

    let dependency_path = build_directory.join(DEPENDENCY_FILENAME);
    let dependency_file =
      request
        .dependencies
        .write_to(&dependency_path)
        .map_err(|source| LaunchError::DependencyFile {
          path: dependency_path.clone(),
          source,
        })?;

    let invocation = ChildInvocation {
      program: resolve_java(request.java.as_deref()),
      jvm_args,
      artifact: artifact.path.clone(),
      program_args: vec![
        OsString::from(request.output_directory.as_os_str()),
        OsString::from(dependency_file.as_os_str()),
      ],
    };

    let outcome = invocation.run(self.sink.clone()).await?;
    let report = Report::from_outcome(outcome);
    report.log();

    Ok(LaunchSummary::Completed(LaunchResult {
      artifact: artifact.path,
      dependency_file,
      command_line: invocation.command_line(),
      outcome,
      report,
    }))
  }
}

/// Run `request` with a default launcher.
pub async fn launch(request: &LaunchRequest) -> Result<LaunchSummary, LaunchError> {
  Launcher::new().launch(request).await
}

fn engine_class_path(request: &LaunchRequest) -> Result<ClassPathSet, LaunchError> {
  let class_path = if request.class_path.is_empty() {
    classpath::from_env()?
  } else {
    classpath::collect(&request.class_path)?
  };

  if class_path.is_empty() {
    warn!("engine class path is empty, the test engine will not be found");
  }
  Ok(class_path)
}
