//! Engine class path resolution.
//!
//! The test engine is launched from a jar whose manifest lists every class
//! path location as an absolute `file:` URL. This module turns the raw
//! locations handed to the launcher (paths, `file:` URIs or separated class
//! path strings) into a deduplicated set of absolute paths.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::consts::ENGINE_CLASSPATH_ENV;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathResolutionError {
  #[error("class path entry is not a local file location: {0}")]
  NotLocal(String),

  #[error("class path entry is not a valid file URI: {0}")]
  InvalidUri(String),

  #[error("failed to resolve class path entry {entry}: {message}")]
  Absolute { entry: String, message: String },

  #[error("empty class path entry")]
  Empty,
}

/// Deduplicated set of absolute class path locations.
///
/// Iteration is sorted so the generated manifest is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassPathSet(BTreeSet<PathBuf>);

impl ClassPathSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a resolved entry, returning `false` if it was already present.
  pub fn insert(&mut self, entry: PathBuf) -> bool {
    self.0.insert(entry)
  }

  pub fn contains(&self, entry: &Path) -> bool {
    self.0.contains(entry)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Path> {
    self.0.iter().map(PathBuf::as_path)
  }

  /// Resolve and add one raw location.
  pub fn add_location(&mut self, raw: &str) -> Result<(), PathResolutionError> {
    let path = resolve_location(raw)?;
    if !self.insert(path.clone()) {
      debug!(entry = %path.display(), "duplicate class path entry");
    }
    Ok(())
  }

  /// Resolve and add every location of a platform-separated class path.
  pub fn add_class_path(&mut self, class_path: &OsStr) -> Result<(), PathResolutionError> {
    for entry in std::env::split_paths(class_path) {
      if entry.as_os_str().is_empty() {
        continue;
      }
      let raw = entry.to_str().ok_or_else(|| PathResolutionError::Absolute {
        entry: entry.display().to_string(),
        message: "path is not valid UTF-8".to_string(),
      })?;
      self.add_location(raw)?;
    }
    Ok(())
  }
}

impl<'a> IntoIterator for &'a ClassPathSet {
  type Item = &'a PathBuf;
  type IntoIter = std::collections::btree_set::Iter<'a, PathBuf>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

/// Collect a class path set from raw locations.
///
/// Each raw value may itself be a separated class path list. Any location
/// that is not a local filesystem path fails the whole collection.
pub fn collect<I, S>(locations: I) -> Result<ClassPathSet, PathResolutionError>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut set = ClassPathSet::new();
  for location in locations {
    let location = location.as_ref();
    if looks_like_uri(location) {
      set.add_location(location)?;
    } else {
      set.add_class_path(OsStr::new(location))?;
    }
  }
  debug!(entries = set.len(), "collected class path");
  Ok(set)
}

/// Collect the class path from `TESTPOJO_ENGINE_CLASSPATH`.
///
/// Returns an empty set when the variable is unset.
pub fn from_env() -> Result<ClassPathSet, PathResolutionError> {
  match std::env::var_os(ENGINE_CLASSPATH_ENV) {
    Some(value) => {
      let mut set = ClassPathSet::new();
      set.add_class_path(&value)?;
      Ok(set)
    }
    None => Ok(ClassPathSet::new()),
  }
}

/// Resolve a single location into an absolute path.
pub fn resolve_location(raw: &str) -> Result<PathBuf, PathResolutionError> {
  if raw.is_empty() {
    return Err(PathResolutionError::Empty);
  }

  let path = if looks_like_uri(raw) {
    let url = Url::parse(raw).map_err(|_| PathResolutionError::InvalidUri(raw.to_string()))?;
    if url.scheme() != "file" {
      return Err(PathResolutionError::NotLocal(raw.to_string()));
    }
    url
      .to_file_path()
      .map_err(|_| PathResolutionError::NotLocal(raw.to_string()))?
  } else {
    PathBuf::from(raw)
  };

  let absolute = std::path::absolute(&path).map_err(|e| PathResolutionError::Absolute {
    entry: raw.to_string(),
    message: e.to_string(),
  })?;

  Ok(dunce::simplified(&absolute).to_path_buf())
}

/// Returns true when `raw` starts with a URI scheme such as `file:`.
///
/// Single letter schemes are treated as Windows drive letters.
fn looks_like_uri(raw: &str) -> bool {
  match raw.split_once(':') {
    Some((scheme, _)) => {
      scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
          .chars()
          .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    }
    None => false,
  }
}
