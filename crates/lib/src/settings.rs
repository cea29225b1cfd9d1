//! Run settings.
//!
//! Values come from an optional `kselect.toml`, then command-line flags
//! override them, and the `OPENWRT_SRC` environment variable fills in the
//! source root last.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{
  DEFAULT_CONFIG_FILE, DEFAULT_FINALIZE_COMMAND, DEFAULT_PACKAGES_FILE, DEFAULT_SCHEMA_FILE, DEFAULT_SYMBOL_PREFIX,
  SETTINGS_FILENAME, SOURCE_ROOT_ENV,
};

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("settings file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read settings file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid settings file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("source root not set: pass --src, set source-root in kselect.toml, or export OPENWRT_SRC")]
  MissingSourceRoot,

  #[error("source root is not a directory: {0}")]
  SourceRootNotDir(PathBuf),

  #[error("invalid setting: {0}")]
  Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
  /// Build tree root. Falls back to `OPENWRT_SRC` when unset.
  pub source_root: Option<PathBuf>,
  /// Root schema file, relative to the source root.
  pub schema_file: String,
  /// Persisted configuration, relative to the source root.
  pub config_file: String,
  pub packages_file: PathBuf,
  /// Prepended to package names to form symbol names.
  pub symbol_prefix: String,
  /// Program and arguments run in the source root after writing.
  pub finalize_command: Vec<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      source_root: None,
      schema_file: DEFAULT_SCHEMA_FILE.to_string(),
      config_file: DEFAULT_CONFIG_FILE.to_string(),
      packages_file: PathBuf::from(DEFAULT_PACKAGES_FILE),
      symbol_prefix: DEFAULT_SYMBOL_PREFIX.to_string(),
      finalize_command: DEFAULT_FINALIZE_COMMAND.iter().map(|s| s.to_string()).collect(),
    }
  }
}

impl Settings {
  /// Load a settings file. Relative `source-root` and `packages-file`
  /// paths are taken relative to the file's directory.
  pub fn load(path: &Path) -> Result<Self, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
      io::ErrorKind::NotFound => SettingsError::NotFound(path.to_path_buf()),
      _ => SettingsError::Read {
        path: path.to_path_buf(),
        source,
      },
    })?;

    let mut settings: Settings = toml::from_str(&content).map_err(|source| SettingsError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    if let Some(base) = path.parent() {
      settings.rebase(base);
    }
    debug!(path = %path.display(), "settings loaded");
    Ok(settings)
  }

  /// Load `explicit` if given, else `kselect.toml` in the working directory
  /// if present, else the defaults.
  pub fn discover(explicit: Option<&Path>) -> Result<Self, SettingsError> {
    if let Some(path) = explicit {
      return Self::load(path);
    }
    let local = Path::new(SETTINGS_FILENAME);
    if local.is_file() {
      return Self::load(local);
    }
    debug!("no settings file, using defaults");
    Ok(Self::default())
  }

  fn rebase(&mut self, base: &Path) {
    if let Some(root) = &self.source_root
      && root.is_relative()
    {
      self.source_root = Some(base.join(root));
    }
    if self.packages_file.is_relative() {
      self.packages_file = base.join(&self.packages_file);
    }
  }

  /// Reject settings that cannot describe a run.
  pub fn validate(&self) -> Result<(), SettingsError> {
    if self.schema_file.trim().is_empty() {
      return Err(SettingsError::Invalid("schema-file must not be empty".to_string()));
    }
    if self.config_file.trim().is_empty() {
      return Err(SettingsError::Invalid("config-file must not be empty".to_string()));
    }
    if self.symbol_prefix.chars().any(char::is_whitespace) {
      return Err(SettingsError::Invalid(format!(
        "symbol-prefix contains whitespace: '{}'",
        self.symbol_prefix
      )));
    }
    if self.finalize_command.first().is_none_or(|program| program.trim().is_empty()) {
      return Err(SettingsError::Invalid("finalize-command must name a program".to_string()));
    }
    Ok(())
  }

  /// The configured source root, or `OPENWRT_SRC`, canonicalized.
  pub fn resolve_source_root(&self) -> Result<PathBuf, SettingsError> {
    let root = match &self.source_root {
      Some(root) => root.clone(),
      None => env::var_os(SOURCE_ROOT_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .ok_or(SettingsError::MissingSourceRoot)?,
    };

    let root = dunce::canonicalize(&root).map_err(|_| SettingsError::SourceRootNotDir(root.clone()))?;
    if !root.is_dir() {
      return Err(SettingsError::SourceRootNotDir(root));
    }
    Ok(root)
  }
}
