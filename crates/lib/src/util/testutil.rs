//! Test utilities for testpojo-lib.
//!
//! Unit tests never start a real JVM. A shell script plays the engine: it is
//! run as `/bin/sh <script> -jar <artifact> <output dir> <dependency file>`,
//! so it sees the same positional arguments the engine would.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::supervisor::{ChildStream, LogSink};

/// Write `script` to `dir` and return the program and leading args that run it.
///
/// The script is interpreted by `/bin/sh` instead of being executed directly,
/// which avoids `ETXTBSY` when another test thread forks while it is written.
#[cfg(unix)]
pub fn fake_java(dir: &Path, script: &str) -> (PathBuf, Vec<String>) {
  let path = dir.join("fake-java.sh");
  std::fs::write(&path, script).unwrap();
  (PathBuf::from("/bin/sh"), vec![path.to_string_lossy().into_owned()])
}

/// Records every forwarded line.
#[derive(Debug, Default)]
pub struct CollectingSink {
  lines: Mutex<Vec<(ChildStream, String)>>,
}

impl CollectingSink {
  pub fn lines(&self, stream: ChildStream) -> Vec<String> {
    self
      .lines
      .lock()
      .unwrap()
      .iter()
      .filter(|(s, _)| *s == stream)
      .map(|(_, line)| line.clone())
      .collect()
  }
}

impl LogSink for CollectingSink {
  fn line(&self, stream: ChildStream, line: &str) {
    self.lines.lock().unwrap().push((stream, line.to_string()));
  }
}
