//! Types for launching the test engine.
//!
//! This module defines the launch request handed over by the host build, the
//! summary of a run, and the error type every fatal failure is wrapped in.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::classpath::PathResolutionError;
use crate::consts::DEFAULT_MAIN_CLASS;
use crate::dependencies::DependencyLists;
use crate::properties::PropertyTable;
use crate::report::Report;
use crate::supervisor::{ProcessOutcome, SuperviseError};

/// Errors that abort a launch.
///
/// A non-zero engine exit is not an error; see [`Report`].
#[derive(Debug, Error)]
pub enum LaunchError {
  /// The launch descriptor could not be read.
  #[error("failed to read launch descriptor {path}: {source}")]
  ReadDescriptor {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The launch descriptor is not valid JSON for a request.
  #[error("invalid launch descriptor {path}: {source}")]
  ParseDescriptor {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  /// The build directory could not be made absolute.
  #[error("failed to resolve build directory {path}: {source}")]
  BuildDirectory {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// An engine class path entry is unusable.
  #[error("class path error: {0}")]
  ClassPath(#[from] PathResolutionError),

  /// The executable jar could not be written.
  #[error("artifact error: {0}")]
  Artifact(#[from] ArtifactError),

  /// The dependency file could not be written.
  #[error("failed to write dependency file {path}: {source}")]
  DependencyFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The engine could not be started or awaited.
  #[error("process error: {0}")]
  Process(#[from] SuperviseError),
}

/// Everything the host build supplies for one launch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
  /// Build directory; the jar and dependency file are written here.
  pub build_directory: PathBuf,

  /// Compiled classes handed to the engine.
  pub output_directory: PathBuf,

  /// Runtime and compile scoped dependencies.
  #[serde(flatten)]
  pub dependencies: DependencyLists,

  /// Build properties, including the optional `argLine`.
  #[serde(default)]
  pub properties: PropertyTable,

  /// Raw engine class path locations. Falls back to
  /// `TESTPOJO_ENGINE_CLASSPATH` when empty.
  #[serde(default)]
  pub class_path: Vec<String>,

  /// Engine entry point.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub main_class: Option<String>,

  /// Java launcher override.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub java: Option<PathBuf>,
}

impl LaunchRequest {
  pub fn new(build_directory: impl Into<PathBuf>, output_directory: impl Into<PathBuf>) -> Self {
    Self {
      build_directory: build_directory.into(),
      output_directory: output_directory.into(),
      ..Default::default()
    }
  }

  /// Load a request from a JSON launch descriptor.
  pub fn from_file(path: &Path) -> Result<Self, LaunchError> {
    let content = std::fs::read_to_string(path).map_err(|source| LaunchError::ReadDescriptor {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| LaunchError::ParseDescriptor {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn main_class(&self) -> &str {
    self.main_class.as_deref().unwrap_or(DEFAULT_MAIN_CLASS)
  }
}

/// Paths and results of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchResult {
  pub artifact: PathBuf,
  pub dependency_file: PathBuf,
  pub command_line: Vec<String>,
  pub outcome: ProcessOutcome,
  pub report: Report,
}

/// What a launch did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LaunchSummary {
  /// The build directory does not exist; nothing was done.
  Skipped { build_directory: PathBuf },

  /// The engine ran.
  Completed(LaunchResult),
}

impl LaunchSummary {
  pub fn report(&self) -> Option<&Report> {
    match self {
      LaunchSummary::Skipped { .. } => None,
      LaunchSummary::Completed(result) => Some(&result.report),
    }
  }
}
