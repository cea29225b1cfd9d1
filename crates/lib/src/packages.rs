//! Package-list reader.
//!
//! The list holds one package name per line. Blank lines and `#` comments
//! are skipped. Each token is turned into the Kconfig symbol that selects
//! the package.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::CONFIG_PREFIX;

#[derive(Debug, Error)]
pub enum PackageListError {
  #[error("package list not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read package list {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// A line holds more than one token.
  #[error("{origin}:{line}: package name contains whitespace: '{token}'")]
  Whitespace { origin: String, line: usize, token: String },

  #[error("package list {0} contains no package names")]
  Empty(String),
}

/// Canonical symbol name for a package token.
///
/// A `CONFIG_` prefix is removed so `.config` lines can be pasted as-is,
/// then `prefix` is prepended unless the token already carries it.
pub fn canonical_symbol_name(token: &str, prefix: &str) -> String {
  let token = token.strip_prefix(CONFIG_PREFIX).unwrap_or(token);
  if token.starts_with(prefix) {
    token.to_string()
  } else {
    format!("{}{}", prefix, token)
  }
}

/// Parse package-list text. `origin` names the source in errors and logs.
pub fn parse_package_list(content: &str, prefix: &str, origin: &str) -> Result<Vec<String>, PackageListError> {
  let mut symbols = Vec::new();

  for (idx, raw) in content.lines().enumerate() {
    let line = idx + 1;
    let token = raw.trim();
    if token.is_empty() || token.starts_with('#') {
      debug!(line, "skipping blank or comment line");
      continue;
    }
    if token.contains(char::is_whitespace) {
      return Err(PackageListError::Whitespace {
        origin: origin.to_string(),
        line,
        token: token.to_string(),
      });
    }

    let symbol = canonical_symbol_name(token, prefix);
    if symbol != token {
      debug!(line, token = %token, symbol = %symbol, "normalized package name");
    }
    symbols.push(symbol);
  }

  if symbols.is_empty() {
    return Err(PackageListError::Empty(origin.to_string()));
  }
  Ok(symbols)
}

/// Read the package list at `path`.
pub fn read_package_list(path: &Path, prefix: &str) -> Result<Vec<String>, PackageListError> {
  let content = fs::read_to_string(path).map_err(|source| match source.kind() {
    io::ErrorKind::NotFound => PackageListError::NotFound(path.to_path_buf()),
    _ => PackageListError::Read {
      path: path.to_path_buf(),
      source,
    },
  })?;

  let symbols = parse_package_list(&content, prefix, &path.display().to_string())?;
  debug!(path = %path.display(), count = symbols.len(), "package list read");
  Ok(symbols)
}
