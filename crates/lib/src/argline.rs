//! Argument line templating.
//!
//! Turns the configured `argLine` into the JVM arguments placed before
//! `-jar`. Each space-separated segment is expanded against the property
//! table; segments that expand to nothing are dropped, which lets a build
//! disable an optional flag by setting its property to an empty string.

use tracing::debug;

use crate::placeholder::{Resolver, substitute};

/// Expand and tokenize an argument line.
///
/// Splits on single spaces only, so tabs and other whitespace stay inside a
/// token. Unresolved placeholders are kept verbatim.
pub fn render<R: Resolver + ?Sized>(arg_line: &str, resolver: &R) -> Vec<String> {
  arg_line
    .split(' ')
    .filter_map(|segment| {
      let expanded = substitute(segment, resolver);
      if !expanded.unresolved.is_empty() {
        debug!(segment = %segment, unresolved = ?expanded.unresolved, "argument references undefined properties");
      }
      if expanded.text.is_empty() { None } else { Some(expanded.text) }
    })
    .collect()
}

/// Render an optional argument line; an absent line yields no arguments.
pub fn render_optional<R: Resolver + ?Sized>(arg_line: Option<&str>, resolver: &R) -> Vec<String> {
  arg_line.map(|line| render(line, resolver)).unwrap_or_default()
}
