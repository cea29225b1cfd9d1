//! Locating the root schema file inside a build tree.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum DiscoveryError {
  #[error("source root is not a directory: {0}")]
  RootMissing(PathBuf),

  #[error("no {name} found under {root}")]
  NotFound { root: PathBuf, name: String },
}

/// Find the root schema file.
///
/// `<root>/<schema>` wins when it exists. Otherwise the tree is searched for
/// a file with the same file name; the shallowest match is used, ties
/// broken by path order. Hidden directories are not searched.
pub fn locate_schema(root: &Path, schema: &str) -> Result<PathBuf, DiscoveryError> {
  if !root.is_dir() {
    return Err(DiscoveryError::RootMissing(root.to_path_buf()));
  }

  let fixed = root.join(schema);
  if fixed.is_file() {
    debug!(path = %fixed.display(), "schema found at fixed path");
    return Ok(fixed);
  }

  let wanted = Path::new(schema).file_name().unwrap_or_else(|| OsStr::new(schema));
  let walker = WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

  let mut best: Option<(usize, PathBuf)> = None;
  for entry in walker {
    let entry = match entry {
      Ok(entry) => entry,
      Err(e) => {
        debug!(error = %e, "skipping unreadable entry");
        continue;
      }
    };
    if !entry.file_type().is_file() || entry.file_name() != wanted {
      continue;
    }
    if best.as_ref().is_none_or(|(depth, _)| entry.depth() < *depth) {
      best = Some((entry.depth(), entry.into_path()));
    }
  }

  match best {
    Some((_, path)) => {
      info!(path = %path.display(), "schema found by search");
      Ok(path)
    }
    None => Err(DiscoveryError::NotFound {
      root: root.to_path_buf(),
      name: schema.to_string(),
    }),
  }
}
