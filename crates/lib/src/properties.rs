//! Build property table.
//!
//! Properties come from the host build: a Java-style `.properties` file and
//! `key=value` pairs given on the command line. Later sources win.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::placeholder::Resolver;

#[derive(Debug, Error)]
pub enum PropertiesError {
  #[error("failed to read properties file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid property definition '{0}', expected key=value")]
  InvalidPair(String),
}

/// Immutable mapping from property name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyTable(BTreeMap<String, String>);

impl PropertyTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.0.get(name).map(String::as_str)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// Returns a new table with `other`'s entries layered over this one.
  pub fn merged(&self, other: &PropertyTable) -> PropertyTable {
    let mut map = self.0.clone();
    map.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
    PropertyTable(map)
  }

  /// Load a `.properties` file.
  pub fn from_file(path: &Path) -> Result<Self, PropertiesError> {
    let content = fs::read_to_string(path).map_err(|source| PropertiesError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(Self::parse(&content))
  }

  /// Parse `.properties` text.
  ///
  /// Supports `key=value` and `key: value` lines, `#` and `!` comments and
  /// blank lines. Whitespace around the key and before the value is trimmed.
  /// A line with no separator defines the key with an empty value.
  pub fn parse(content: &str) -> Self {
    let mut map = BTreeMap::new();

    for line in content.lines() {
      let line = line.trim_start();
      if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        continue;
      }

      let (key, value) = match line.find(['=', ':']) {
        Some(idx) => (&line[..idx], &line[idx + 1..]),
        None => (line, ""),
      };

      let key = key.trim();
      if key.is_empty() {
        continue;
      }
      map.insert(key.to_string(), value.trim_start().to_string());
    }

    PropertyTable(map)
  }

  /// Build a table from `key=value` pairs.
  ///
  /// Only the first `=` separates key from value, so values may contain `=`.
  pub fn from_pairs<I, S>(pairs: I) -> Result<Self, PropertiesError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut map = BTreeMap::new();
    for pair in pairs {
      let pair = pair.as_ref();
      let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| PropertiesError::InvalidPair(pair.to_string()))?;
      if key.is_empty() {
        return Err(PropertiesError::InvalidPair(pair.to_string()));
      }
      map.insert(key.to_string(), value.to_string());
    }
    Ok(PropertyTable(map))
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyTable {
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    PropertyTable(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

impl Resolver for PropertyTable {
  fn resolve(&self, name: &str) -> Option<&str> {
    self.get(name)
  }
}
