//! Implementation of the `testpojo args` command.
//!
//! Renders an argument line against the given properties, one JVM argument
//! per line, so a build can check what the engine will receive.

use anyhow::Result;

use testpojo_lib::argline;

use super::PropertyArgs;
use crate::output::{OutputFormat, print_json};

pub fn cmd_args(arg_line: &str, properties: &PropertyArgs, output: OutputFormat) -> Result<()> {
  let table = properties.load()?;
  let args = argline::render(arg_line, &table);

  if output.is_json() {
    print_json(&args)?;
  } else {
    for arg in &args {
      println!("{}", arg);
    }
  }

  Ok(())
}
