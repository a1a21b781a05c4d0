//! CLI smoke tests for testpojo.
//!
//! These tests verify the commands run end to end and return the expected
//! exit codes. A `/bin/sh` script stands in for the JVM.

use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the testpojo binary with no inherited engine settings.
fn testpojo_cmd() -> Command {
  let mut cmd = cargo_bin_cmd!("testpojo");
  cmd
    .env_remove("TESTPOJO_ENGINE_CLASSPATH")
    .env_remove("TESTPOJO_JAVA")
    .env_remove("RUST_LOG");
  cmd
}

/// Create a project layout with a build directory and compiled classes.
fn temp_project() -> TempDir {
  let temp = TempDir::new().unwrap();
  std::fs::create_dir_all(temp.path().join("target/classes")).unwrap();
  temp
}

/// Write an engine stand-in that exits with `code`.
fn engine_script(dir: &Path, code: i32) -> String {
  let path = dir.join("engine.sh");
  std::fs::write(&path, format!("echo \"engine got $*\"\nexit {code}\n")).unwrap();
  path.to_string_lossy().into_owned()
}

fn run_cmd(project: &Path, script: &str) -> Command {
  let mut cmd = testpojo_cmd();
  cmd
    .arg("run")
    .arg("--build-dir")
    .arg(project.join("target"))
    .arg("--output-dir")
    .arg(project.join("target/classes"))
    .arg("--class-path")
    .arg(project.join("engine.jar"))
    .arg("--runtime-dep")
    .arg("/repo/a.jar")
    .arg("--java")
    .arg("/bin/sh")
    .arg(format!("-DargLine={script}"));
  cmd
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  testpojo_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  testpojo_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("testpojo"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["run", "args", "inspect"] {
    testpojo_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// Args Command
// =============================================================================

#[test]
fn args_renders_placeholders() {
  testpojo_cmd()
    .args(["args", "-D", "agent=/lib/jacoco.jar", "--", "-javaagent:@{agent}  -Xmx1g @{missing}"])
    .assert()
    .success()
    .stdout("-javaagent:/lib/jacoco.jar\n-Xmx1g\n@{missing}\n");
}

#[test]
fn args_json_output() {
  testpojo_cmd()
    .args(["args", "--output", "json", "--", "-ea -server"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"-ea\"").and(predicate::str::contains("\"-server\"")));
}

#[test]
fn args_reads_properties_file() {
  let temp = TempDir::new().unwrap();
  let props = temp.path().join("build.properties");
  std::fs::write(&props, "heap = 2g\n").unwrap();

  testpojo_cmd()
    .arg("args")
    .arg("--properties")
    .arg(&props)
    .arg("--")
    .arg("-Xmx@{heap}")
    .assert()
    .success()
    .stdout("-Xmx2g\n");
}

#[test]
fn args_rejects_malformed_define() {
  testpojo_cmd()
    .args(["args", "-D", "novalue", "--", "-ea"])
    .assert()
    .failure();
}

// =============================================================================
// Run Command
// =============================================================================

#[test]
fn run_skips_missing_build_dir() {
  let temp = TempDir::new().unwrap();
  let build = temp.path().join("target");

  testpojo_cmd()
    .arg("run")
    .arg("--build-dir")
    .arg(&build)
    .arg("--output-dir")
    .arg(build.join("classes"))
    .assert()
    .success()
    .stdout(predicate::str::contains("skipping"));

  assert!(!build.exists());
}

#[test]
fn run_requires_build_dir_without_descriptor() {
  testpojo_cmd()
    .args(["run", "--output-dir", "classes"])
    .assert()
    .failure();
}

#[test]
fn run_missing_descriptor_fails() {
  let temp = TempDir::new().unwrap();

  testpojo_cmd()
    .arg("run")
    .arg("--descriptor")
    .arg(temp.path().join("nope.json"))
    .assert()
    .failure();
}

#[cfg(unix)]
#[test]
fn run_passing_engine() {
  let project = temp_project();
  let script = engine_script(project.path(), 0);

  run_cmd(project.path(), &script)
    .assert()
    .success()
    .stdout(predicate::str::contains("all pojos passed"));

  let target = project.path().join("target");
  assert!(target.join("testPojo.jar").is_file());
  let deps = std::fs::read_to_string(target.join("testPojo.dependencies")).unwrap();
  assert_eq!(deps.lines().collect::<Vec<_>>(), vec!["/repo/a.jar"]);
}

#[cfg(unix)]
#[test]
fn run_pojo_errors_are_not_fatal_by_default() {
  let project = temp_project();
  let script = engine_script(project.path(), 2);

  run_cmd(project.path(), &script)
    .assert()
    .success()
    .stderr(predicate::str::contains("2 pojos had errors"));
}

#[cfg(unix)]
#[test]
fn run_fail_on_errors_sets_exit_code() {
  let project = temp_project();
  let script = engine_script(project.path(), 2);

  run_cmd(project.path(), &script)
    .arg("--fail-on-errors")
    .assert()
    .failure()
    .stderr(predicate::str::contains("2 pojos had errors"));
}

#[cfg(unix)]
#[test]
fn run_json_output() {
  let project = temp_project();
  let script = engine_script(project.path(), 1);

  let output = run_cmd(project.path(), &script)
    .args(["--output", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["result"], "completed");
  assert_eq!(json["report"]["status"], "pojo_errors");
  assert_eq!(json["report"]["count"], 1);
  assert_eq!(json["outcome"]["kind"], "exited");
}

#[cfg(unix)]
#[test]
fn run_from_descriptor() {
  let project = temp_project();
  let script = engine_script(project.path(), 0);
  let descriptor = project.path().join("launch.json");
  let request = serde_json::json!({
    "build_directory": project.path().join("target"),
    "output_directory": project.path().join("target/classes"),
    "runtime": ["/repo/b.jar"],
    "properties": { "argLine": script },
    "class_path": [project.path().join("engine.jar")],
    "java": "/bin/sh",
  });
  std::fs::write(&descriptor, request.to_string()).unwrap();

  testpojo_cmd()
    .arg("run")
    .arg("--descriptor")
    .arg(&descriptor)
    .assert()
    .success()
    .stdout(predicate::str::contains("all pojos passed"));
}

// =============================================================================
// Inspect Command
// =============================================================================

#[cfg(unix)]
#[test]
fn inspect_shows_manifest_of_built_jar() {
  let project = temp_project();
  let script = engine_script(project.path(), 0);
  run_cmd(project.path(), &script).assert().success();

  testpojo_cmd()
    .arg("inspect")
    .arg(project.path().join("target/testPojo.jar"))
    .assert()
    .success()
    .stdout(predicate::str::contains("org.honton.chas.testpojo.Main").and(predicate::str::contains("engine.jar")));
}

#[test]
fn inspect_missing_jar_fails() {
  let temp = TempDir::new().unwrap();

  testpojo_cmd()
    .arg("inspect")
    .arg(temp.path().join("missing.jar"))
    .assert()
    .failure();
}
