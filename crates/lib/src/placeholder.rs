//! Placeholder parsing and substitution for argument lines.
//!
//! Argument lines may reference build properties that are only known when the
//! launcher runs, typically the coverage agent path a previous build step
//! exported. This module parses those references and substitutes values.
//!
//! # Placeholder Format
//!
//! - `@{name}` - the value of property `name`
//!
//! The name is one or more characters up to the first `}`. It may itself
//! contain `@{`, so `@{a@{b}` references the property `a@{b`.
//!
//! # Unresolved References
//!
//! A placeholder whose name has no value is kept verbatim, delimiters
//! included. `@{}` and an unterminated `@{` are plain literal text.
//!
//! # Example
//!
//! ```
//! use testpojo_lib::placeholder::{parse, Segment};
//!
//! let segments = parse("-javaagent:@{agent}=dest");
//! assert_eq!(segments, vec![
//!     Segment::Literal("-javaagent:".to_string()),
//!     Segment::Placeholder("agent".to_string()),
//!     Segment::Literal("=dest".to_string()),
//! ]);
//! ```

/// Opening delimiter of a placeholder.
const OPEN: &str = "@{";

/// Closing delimiter of a placeholder.
const CLOSE: char = '}';

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no placeholders)
  Literal(String),

  /// A property reference, holding the property name
  Placeholder(String),
}

/// Looks up placeholder values during substitution.
pub trait Resolver {
  /// Resolve a property by name, `None` when it is not defined.
  fn resolve(&self, name: &str) -> Option<&str>;
}

/// Outcome of substituting a single string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
  /// The expanded text.
  pub text: String,

  /// Number of placeholders that were replaced by a value.
  pub replaced: usize,

  /// Names that had no value and were kept verbatim.
  pub unresolved: Vec<String>,
}

/// Parse a string into literal and placeholder segments.
///
/// Parsing never fails: anything that is not a well-formed `@{name}` token
/// is literal text. Adjacent literal text is merged into one segment.
pub fn parse(input: &str) -> Vec<Segment> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = input;

  while let Some(start) = rest.find(OPEN) {
    let after_open = &rest[start + OPEN.len()..];

    match after_open.find(CLOSE) {
      Some(0) => {
        // "@{}" has no name
        literal.push_str(&rest[..start + OPEN.len() + 1]);
        rest = &after_open[1..];
      }
      Some(end) => {
        literal.push_str(&rest[..start]);
        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Placeholder(after_open[..end].to_string()));
        rest = &after_open[end + 1..];
      }
      None => {
        // Unterminated, so no further token can close either
        break;
      }
    }
  }

  literal.push_str(rest);
  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  segments
}

/// Substitute all resolvable placeholders in `input`.
///
/// When nothing is replaced the returned text equals `input` exactly.
pub fn substitute<R: Resolver + ?Sized>(input: &str, resolver: &R) -> Substitution {
  let mut text = String::with_capacity(input.len());
  let mut replaced = 0;
  let mut unresolved = Vec::new();

  for segment in parse(input) {
    match segment {
      Segment::Literal(s) => text.push_str(&s),
      Segment::Placeholder(name) => match resolver.resolve(&name) {
        Some(value) => {
          text.push_str(value);
          replaced += 1;
        }
        None => {
          text.push_str(OPEN);
          text.push_str(&name);
          text.push(CLOSE);
          unresolved.push(name);
        }
      },
    }
  }

  if replaced == 0 {
    text = input.to_string();
  }

  Substitution {
    text,
    replaced,
    unresolved,
  }
}
