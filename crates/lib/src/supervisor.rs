//! Child process supervision.
//!
//! Runs the test engine in its own JVM:
//!
//! ```text
//! <java> <jvm args...> -jar <artifact> <program args...>
//! ```
//!
//! Stdout and stderr are drained by two tasks while the supervisor waits, so
//! a chatty child can never block on a full pipe. Each line goes to a
//! [`LogSink`] as soon as it is read.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::consts::{JAVA_ENV, JAVA_HOME_ENV};

/// Errors that prevent the child from producing an exit status.
#[derive(Debug, Error)]
pub enum SuperviseError {
  #[error("failed to start {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  #[error("failed waiting for {program}: {source}")]
  Wait {
    program: String,
    #[source]
    source: io::Error,
  },
}

/// Which child stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildStream {
  Stdout,
  Stderr,
}

impl std::fmt::Display for ChildStream {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ChildStream::Stdout => write!(f, "stdout"),
      ChildStream::Stderr => write!(f, "stderr"),
    }
  }
}

/// Receives child output as it is produced.
pub trait LogSink: Send + Sync {
  fn line(&self, stream: ChildStream, line: &str);
}

/// Forwards child output to `tracing`; stderr lines are warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
  fn line(&self, stream: ChildStream, line: &str) {
    match stream {
      ChildStream::Stdout => info!(stream = %stream, "{line}"),
      ChildStream::Stderr => warn!(stream = %stream, "{line}"),
    }
  }
}

/// How the child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessOutcome {
  /// The child exited on its own with a status code.
  Exited { code: i32 },

  /// The child was killed without an exit code.
  Terminated { signal: Option<i32> },
}

impl ProcessOutcome {
  pub fn from_status(status: ExitStatus) -> Self {
    match status.code() {
      Some(code) => ProcessOutcome::Exited { code },
      None => ProcessOutcome::Terminated {
        signal: terminating_signal(status),
      },
    }
  }
}

#[cfg(unix)]
fn terminating_signal(status: ExitStatus) -> Option<i32> {
  use std::os::unix::process::ExitStatusExt;
  status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: ExitStatus) -> Option<i32> {
  None
}

/// A fully assembled engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildInvocation {
  /// The Java launcher.
  pub program: PathBuf,

  /// Arguments before `-jar`, e.g. a coverage agent.
  pub jvm_args: Vec<String>,

  /// The executable jar.
  pub artifact: PathBuf,

  /// Positional arguments after the jar.
  pub program_args: Vec<OsString>,
}

impl ChildInvocation {
  /// Arguments passed to the program, in order.
  pub fn args(&self) -> Vec<OsString> {
    let mut args: Vec<OsString> = self.jvm_args.iter().map(OsString::from).collect();
    args.push(OsString::from("-jar"));
    args.push(self.artifact.clone().into_os_string());
    args.extend(self.program_args.iter().cloned());
    args
  }

  /// Program and arguments as display strings.
  pub fn command_line(&self) -> Vec<String> {
    std::iter::once(self.program.as_os_str().to_owned())
      .chain(self.args())
      .map(|arg| arg.to_string_lossy().into_owned())
      .collect()
  }

  /// Start the child, stream its output into `sink` and wait for it to exit.
  ///
  /// Blocks until the child terminates; there is no timeout.
  pub async fn run(&self, sink: Arc<dyn LogSink>) -> Result<ProcessOutcome, SuperviseError> {
    let program = self.program.display().to_string();
    info!(command = ?self.command_line(), "starting test engine");

    let mut child = Command::new(&self.program)
      .args(self.args())
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|source| SuperviseError::Spawn {
        program: program.clone(),
        source,
      })?;

    debug!(pid = ?child.id(), "test engine started");

    let readers: Vec<JoinHandle<io::Result<usize>>> = [
      child
        .stdout
        .take()
        .map(|out| tokio::spawn(forward(out, ChildStream::Stdout, sink.clone()))),
      child
        .stderr
        .take()
        .map(|err| tokio::spawn(forward(err, ChildStream::Stderr, sink.clone()))),
    ]
    .into_iter()
    .flatten()
    .collect();

    let status = child.wait().await.map_err(|source| SuperviseError::Wait {
      program: program.clone(),
      source,
    })?;

    // Both pipes close when the child exits; drain what is left
    for reader in readers {
      match reader.await {
        Ok(Ok(lines)) => debug!(lines, "child output drained"),
        Ok(Err(e)) => warn!(error = %e, "failed reading child output"),
        Err(e) => warn!(error = %e, "child output reader panicked"),
      }
    }

    let outcome = ProcessOutcome::from_status(status);
    info!(outcome = ?outcome, "test engine finished");
    Ok(outcome)
  }
}

/// Copy lines from `reader` to `sink` until end of stream.
///
/// Invalid UTF-8 is replaced rather than treated as an error.
async fn forward<R>(reader: R, stream: ChildStream, sink: Arc<dyn LogSink>) -> io::Result<usize>
where
  R: AsyncRead + Unpin,
{
  let mut reader = BufReader::new(reader);
  let mut buf = Vec::new();
  let mut lines = 0;

  loop {
    buf.clear();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
      return Ok(lines);
    }
    let text = String::from_utf8_lossy(&buf);
    sink.line(stream, text.trim_end_matches(['\n', '\r']));
    lines += 1;
  }
}

/// Pick the Java launcher.
///
/// Order: `explicit`, then `TESTPOJO_JAVA`, then `$JAVA_HOME/bin/java`, then
/// `java` from `PATH`.
pub fn resolve_java(explicit: Option<&Path>) -> PathBuf {
  if let Some(path) = explicit {
    return path.to_path_buf();
  }

  if let Some(java) = std::env::var_os(JAVA_ENV).filter(|v| !v.is_empty()) {
    return PathBuf::from(java);
  }

  if let Some(home) = std::env::var_os(JAVA_HOME_ENV).filter(|v| !v.is_empty()) {
    let java = PathBuf::from(home).join("bin").join(java_executable());
    if java.is_file() {
      return java;
    }
    debug!(path = %java.display(), "JAVA_HOME set but no java executable found");
  }

  PathBuf::from(java_executable())
}

#[cfg(windows)]
fn java_executable() -> &'static str {
  "java.exe"
}

#[cfg(not(windows))]
fn java_executable() -> &'static str {
  "java"
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  #[cfg(unix)]
  use crate::util::testutil::{CollectingSink, fake_java};

  fn invocation(program: &str, jvm_args: &[&str]) -> ChildInvocation {
    ChildInvocation {
      program: PathBuf::from(program),
      jvm_args: jvm_args.iter().map(|s| s.to_string()).collect(),
      artifact: PathBuf::from("/build/testPojo.jar"),
      program_args: vec![OsString::from("/build/classes"), OsString::from("/build/testPojo.dependencies")],
    }
  }

  #[test]
  fn args_place_jvm_args_before_jar() {
    let inv = invocation("java", &["-javaagent:/a/jacoco.jar", "-Xmx1g"]);

    assert_eq!(
      inv.command_line(),
      vec![
        "java",
        "-javaagent:/a/jacoco.jar",
        "-Xmx1g",
        "-jar",
        "/build/testPojo.jar",
        "/build/classes",
        "/build/testPojo.dependencies",
      ]
    );
  }

  #[test]
  fn args_without_jvm_args_start_with_jar() {
    let inv = invocation("java", &[]);
    assert_eq!(inv.args()[0], OsString::from("-jar"));
    assert_eq!(inv.args().len(), 4);
  }

  #[tokio::test]
  async fn spawn_failure_is_error() {
    let inv = invocation("/definitely/not/a/java", &[]);
    let result = inv.run(Arc::new(TracingSink)).await;

    assert!(matches!(result, Err(SuperviseError::Spawn { .. })));
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn reports_exit_code_and_streams_output() {
    let temp = TempDir::new().unwrap();
    let (program, jvm_args) = fake_java(
      temp.path(),
      r#"
        echo "args: $*"
        echo "engine warning" >&2
        exit 3
      "#,
    );
    let mut inv = invocation(program.to_str().unwrap(), &[]);
    inv.jvm_args = jvm_args;
    let sink = Arc::new(CollectingSink::default());

    let outcome = inv.run(sink.clone()).await.unwrap();

    assert_eq!(outcome, ProcessOutcome::Exited { code: 3 });
    assert_eq!(
      sink.lines(ChildStream::Stdout),
      vec!["args: -jar /build/testPojo.jar /build/classes /build/testPojo.dependencies"]
    );
    assert_eq!(sink.lines(ChildStream::Stderr), vec!["engine warning"]);
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn drains_large_output() {
    let temp = TempDir::new().unwrap();
    // Well past a 64 KiB pipe buffer on both streams
    let (program, jvm_args) = fake_java(
      temp.path(),
      r#"
        i=0
        while [ $i -lt 5000 ]; do
          echo "stdout line $i with some padding to fill the pipe"
          echo "stderr line $i with some padding to fill the pipe" >&2
          i=$((i + 1))
        done
        exit 0
      "#,
    );
    let mut inv = invocation(program.to_str().unwrap(), &[]);
    inv.jvm_args = jvm_args;
    let sink = Arc::new(CollectingSink::default());

    let outcome = inv.run(sink.clone()).await.unwrap();

    assert_eq!(outcome, ProcessOutcome::Exited { code: 0 });
    assert_eq!(sink.lines(ChildStream::Stdout).len(), 5000);
    assert_eq!(sink.lines(ChildStream::Stderr).len(), 5000);
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn killed_child_is_terminated() {
    let temp = TempDir::new().unwrap();
    let (program, jvm_args) = fake_java(temp.path(), "kill -9 $$");
    let mut inv = invocation(program.to_str().unwrap(), &[]);
    inv.jvm_args = jvm_args;

    let outcome = inv.run(Arc::new(TracingSink)).await.unwrap();

    assert_eq!(outcome, ProcessOutcome::Terminated { signal: Some(9) });
  }

  #[test]
  #[serial]
  fn resolve_java_prefers_explicit() {
    temp_env::with_var(JAVA_ENV, Some("/env/java"), || {
      assert_eq!(resolve_java(Some(Path::new("/explicit/java"))), PathBuf::from("/explicit/java"));
    });
  }

  #[test]
  #[serial]
  fn resolve_java_uses_override_env() {
    temp_env::with_vars([(JAVA_ENV, Some("/env/java")), (JAVA_HOME_ENV, None)], || {
      assert_eq!(resolve_java(None), PathBuf::from("/env/java"));
    });
  }

  #[test]
  #[serial]
  fn resolve_java_uses_java_home() {
    let temp = TempDir::new().unwrap();
    let bin = temp.path().join("bin");
    std::fs::create_dir(&bin).unwrap();
    std::fs::write(bin.join(java_executable()), b"").unwrap();

    temp_env::with_vars(
      [(JAVA_ENV, None), (JAVA_HOME_ENV, Some(temp.path().to_str().unwrap()))],
      || {
        assert_eq!(resolve_java(None), bin.join(java_executable()));
      },
    );
  }

  #[test]
  #[serial]
  fn resolve_java_falls_back_to_path() {
    let temp = TempDir::new().unwrap();

    temp_env::with_vars(
      [(JAVA_ENV, None), (JAVA_HOME_ENV, Some(temp.path().to_str().unwrap()))],
      || {
        assert_eq!(resolve_java(None), PathBuf::from(java_executable()));
      },
    );
  }

  #[test]
  fn outcome_serializes_with_kind_tag() {
    let json = serde_json::to_string(&ProcessOutcome::Exited { code: 2 }).unwrap();
    assert_eq!(json, r#"{"kind":"exited","code":2}"#);
  }
}
