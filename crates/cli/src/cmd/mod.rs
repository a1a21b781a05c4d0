mod args;
mod inspect;
mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use testpojo_lib::properties::PropertyTable;

pub use args::cmd_args;
pub use inspect::cmd_inspect;
pub use run::{RunArgs, cmd_run};

/// Build property inputs shared by commands that render the argument line.
#[derive(Debug, Default, Args)]
pub struct PropertyArgs {
  /// Define a build property
  #[arg(short = 'D', value_name = "KEY=VALUE")]
  pub define: Vec<String>,

  /// Load build properties from a .properties file
  #[arg(long, value_name = "FILE")]
  pub properties: Option<PathBuf>,
}

impl PropertyArgs {
  /// File properties first, then `-D` definitions on top.
  pub fn load(&self) -> Result<PropertyTable> {
    let base = match &self.properties {
      Some(path) => PropertyTable::from_file(path)?,
      None => PropertyTable::new(),
    };
    let defines = PropertyTable::from_pairs(&self.define).context("Invalid -D property")?;
    Ok(base.merged(&defines))
  }
}
