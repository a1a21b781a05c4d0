//! Implementation of the `testpojo inspect` command.
//!
//! Prints the entry point and class path recorded in a launcher jar.

use std::path::Path;

use anyhow::{Context, Result};

use testpojo_lib::artifact::read_manifest;

use crate::output::{self, OutputFormat, print_json, print_stat};

pub fn cmd_inspect(jar: &Path, output: OutputFormat) -> Result<()> {
  let manifest = read_manifest(jar).with_context(|| format!("Failed to read manifest: {}", jar.display()))?;

  if output.is_json() {
    let json = serde_json::json!({
      "path": jar.display().to_string(),
      "main_class": manifest.main_class,
      "class_path": manifest.class_path,
    });
    print_json(&json)?;
  } else {
    print_stat("Main-Class", manifest.main_class.as_deref().unwrap_or("(none)"));
    print_stat("Class-Path", &format!("{} entries", manifest.class_path.len()));
    for entry in &manifest.class_path {
      println!("    {} {}", output::symbols::INFO, entry);
    }
  }

  Ok(())
}
