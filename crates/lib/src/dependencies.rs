//! Dependency hand-off file.
//!
//! The engine needs the project's resolved dependencies to load the classes
//! it tests. The lists can be long, so they are passed by file reference: one
//! coordinate per line, runtime scope first, then compile scope.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";

#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Resolved dependency coordinates in hand-off order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyLists {
  #[serde(default)]
  pub runtime: Vec<String>,

  #[serde(default)]
  pub compile: Vec<String>,
}

impl DependencyLists {
  pub fn new(runtime: Vec<String>, compile: Vec<String>) -> Self {
    Self { runtime, compile }
  }

  /// All coordinates in the order they are written.
  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.runtime.iter().chain(self.compile.iter()).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.runtime.len() + self.compile.len()
  }

  pub fn is_empty(&self) -> bool {
    self.runtime.is_empty() && self.compile.is_empty()
  }

  /// Write the lists to `path` and return its absolute path.
  ///
  /// Any existing file is truncated.
  pub fn write_to(&self, path: &Path) -> io::Result<PathBuf> {
    let mut writer = BufWriter::new(File::create(path)?);
    for coordinate in self.iter() {
      writer.write_all(coordinate.as_bytes())?;
      writer.write_all(LINE_ENDING.as_bytes())?;
    }
    // Surface write errors that drop would swallow
    writer.flush()?;
    drop(writer);

    let absolute = std::path::absolute(path)?;
    info!(
      path = %absolute.display(),
      runtime = self.runtime.len(),
      compile = self.compile.len(),
      "wrote dependency file"
    );
    Ok(absolute)
  }
}

/// Read a newline-delimited coordinate list, skipping blank lines.
pub fn read_list(path: &Path) -> io::Result<Vec<String>> {
  let content = std::fs::read_to_string(path)?;
  Ok(
    content
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(String::from)
      .collect(),
  )
}
