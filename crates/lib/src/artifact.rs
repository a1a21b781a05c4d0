//! Executable jar construction.
//!
//! The engine is started with `java -jar testPojo.jar` instead of a
//! `-classpath` argument. The jar holds nothing but a manifest whose
//! `Class-Path` lists every engine location as an absolute `file:` URL, which
//! keeps the command line short no matter how large the class path grows.
//!
//! # Archive Layout
//!
//! ```text
//! testPojo.jar
//! └── META-INF/
//!     └── MANIFEST.MF     # Main-Class + Class-Path
//! ```

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use url::Url;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::classpath::ClassPathSet;

const MANIFEST_DIR: &str = "META-INF/";
const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Maximum manifest line length in bytes, excluding the line break.
const MAX_LINE_LEN: usize = 72;

#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("failed to create {path}: {source}")]
  Create {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write jar {path}: {source}")]
  Zip {
    path: PathBuf,
    #[source]
    source: ZipError,
  },

  #[error("failed to move jar into place at {path}: {source}")]
  Rename {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("class path entry cannot be expressed as a file URL: {0}")]
  InvalidEntry(PathBuf),

  #[error("failed to read jar {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: ZipError,
  },

  #[error("malformed manifest: {0}")]
  Malformed(String),
}

/// Everything needed to write the launcher jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableArtifact {
  /// Where the jar is written.
  pub path: PathBuf,

  /// Fully qualified class started by `java -jar`.
  pub main_class: String,

  /// Locations listed in the manifest's `Class-Path`.
  pub class_path: ClassPathSet,
}

/// Main attributes read back from a jar manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInfo {
  pub main_class: Option<String>,
  pub class_path: Vec<String>,
}

impl ExecutableArtifact {
  pub fn new(path: impl Into<PathBuf>, main_class: impl Into<String>, class_path: ClassPathSet) -> Self {
    Self {
      path: path.into(),
      main_class: main_class.into(),
      class_path,
    }
  }

  /// Render the manifest text.
  pub fn manifest(&self) -> Result<String, ArtifactError> {
    let urls = self
      .class_path
      .iter()
      .map(entry_url)
      .collect::<Result<Vec<_>, _>>()?;

    let mut manifest = String::new();
    manifest.push_str(&header("Manifest-Version", "1.0"));
    manifest.push_str(&header(
      "Created-By",
      &format!("{} {}", crate::consts::APP_NAME, env!("CARGO_PKG_VERSION")),
    ));
    manifest.push_str(&header("Main-Class", &self.main_class));
    if !urls.is_empty() {
      manifest.push_str(&header("Class-Path", &urls.join(" ")));
    }
    manifest.push_str("\r\n");
    Ok(manifest)
  }

  /// Write the jar, replacing any previous one at the same path.
  ///
  /// The archive is written to a sibling temp file first and renamed into
  /// place, so a failed run never leaves a truncated jar behind.
  pub fn build(&self) -> Result<&Path, ArtifactError> {
    let manifest = self.manifest()?;
    let temp_path = self.path.with_extension("jar.tmp");

    let result = write_jar(&temp_path, &manifest);
    if result.is_err() {
      let _ = fs::remove_file(&temp_path);
    }
    result?;

    if let Err(source) = fs::rename(&temp_path, &self.path) {
      let _ = fs::remove_file(&temp_path);
      return Err(ArtifactError::Rename {
        path: self.path.clone(),
        source,
      });
    }

    info!(
      path = %self.path.display(),
      main_class = %self.main_class,
      entries = self.class_path.len(),
      "wrote executable jar"
    );
    Ok(&self.path)
  }
}

fn write_jar(path: &Path, manifest: &str) -> Result<(), ArtifactError> {
  let zip_err = |source: ZipError| ArtifactError::Zip {
    path: path.to_path_buf(),
    source,
  };

  let file = File::create(path).map_err(|source| ArtifactError::Create {
    path: path.to_path_buf(),
    source,
  })?;

  // Fixed timestamp so identical inputs produce identical bytes
  let options = SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .last_modified_time(DateTime::default());

  let mut zip = ZipWriter::new(file);
  zip.add_directory(MANIFEST_DIR, options).map_err(zip_err)?;
  zip.start_file(MANIFEST_PATH, options).map_err(zip_err)?;
  zip
    .write_all(manifest.as_bytes())
    .map_err(|e| zip_err(ZipError::Io(e)))?;
  zip.finish().map_err(zip_err)?;

  debug!(path = %path.display(), bytes = manifest.len(), "jar manifest written");
  Ok(())
}

/// Express a class path entry as a URL the JVM's jar loader resolves.
///
/// Directories get a trailing slash, otherwise the loader treats them as jars.
fn entry_url(path: &Path) -> Result<String, ArtifactError> {
  let url = if path.is_dir() {
    Url::from_directory_path(path)
  } else {
    Url::from_file_path(path)
  };
  url
    .map(String::from)
    .map_err(|_| ArtifactError::InvalidEntry(path.to_path_buf()))
}

/// Format one manifest header, wrapping at 72 bytes.
///
/// Continuation lines begin with a single space. Splits only on char
/// boundaries so multi-byte paths stay valid UTF-8.
fn header(name: &str, value: &str) -> String {
  let line = format!("{name}: {value}");
  let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_LEN * 3 + 2);
  let mut rest = line.as_str();
  let mut limit = MAX_LINE_LEN;

  loop {
    if rest.len() <= limit {
      out.push_str(rest);
      out.push_str("\r\n");
      return out;
    }

    let mut split = limit;
    while !rest.is_char_boundary(split) {
      split -= 1;
    }
    out.push_str(&rest[..split]);
    out.push_str("\r\n ");
    rest = &rest[split..];
    limit = MAX_LINE_LEN - 1;
  }
}

/// Read the main attributes of a jar's manifest.
pub fn read_manifest(path: &Path) -> Result<ManifestInfo, ArtifactError> {
  let read_err = |source: ZipError| ArtifactError::Read {
    path: path.to_path_buf(),
    source,
  };

  let file = File::open(path).map_err(|e| read_err(ZipError::Io(e)))?;
  let mut archive = ZipArchive::new(file).map_err(read_err)?;
  let mut entry = archive.by_name(MANIFEST_PATH).map_err(read_err)?;

  let mut content = String::new();
  entry
    .read_to_string(&mut content)
    .map_err(|e| read_err(ZipError::Io(e)))?;

  parse_manifest(&content)
}

fn parse_manifest(content: &str) -> Result<ManifestInfo, ArtifactError> {
  // Join continuation lines back onto their header
  let mut headers: Vec<String> = Vec::new();
  for line in content.split("\r\n").flat_map(|l| l.split('\n')) {
    if line.is_empty() {
      // Main section ends at the first blank line
      break;
    }
    match (line.strip_prefix(' '), headers.last_mut()) {
      (Some(cont), Some(last)) => last.push_str(cont),
      (Some(_), None) => return Err(ArtifactError::Malformed("continuation line before any header".to_string())),
      (None, _) => headers.push(line.to_string()),
    }
  }

  let mut info = ManifestInfo {
    main_class: None,
    class_path: Vec::new(),
  };

  for header in headers {
    let (name, value) = header
      .split_once(": ")
      .ok_or_else(|| ArtifactError::Malformed(format!("header without value: '{header}'")))?;
    match name {
      "Main-Class" => info.main_class = Some(value.to_string()),
      "Class-Path" => info.class_path = value.split(' ').filter(|s| !s.is_empty()).map(String::from).collect(),
      _ => {}
    }
  }

  Ok(info)
}
