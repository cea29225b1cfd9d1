//! The end-to-end run: locate inputs, load, resolve, write, finalize.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::discovery::{DiscoveryError, locate_schema};
use crate::finalize::{FinalizeError, run_finalizer};
use crate::kconfig::{Kconfig, KconfigError};
use crate::packages::{PackageListError, read_package_list};
use crate::resolve::{Report, ResolveError, resolve};
use crate::settings::{Settings, SettingsError};

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Settings(#[from] SettingsError),

  #[error(transparent)]
  Discovery(#[from] DiscoveryError),

  #[error(transparent)]
  Kconfig(#[from] KconfigError),

  #[error(transparent)]
  Packages(#[from] PackageListError),

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Finalize(#[from] FinalizeError),
}

/// Every file a run touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paths {
  pub source_root: PathBuf,
  pub schema: PathBuf,
  pub config: PathBuf,
  pub packages: PathBuf,
}

impl Paths {
  /// Validate `settings` and work out the paths they describe. Fails if
  /// the source root or the schema cannot be found.
  pub fn resolve(settings: &Settings) -> Result<Self, PipelineError> {
    settings.validate()?;
    let source_root = settings.resolve_source_root()?;
    let schema = locate_schema(&source_root, &settings.schema_file)?;
    let config = source_root.join(&settings.config_file);
    Ok(Self {
      source_root,
      schema,
      config,
      packages: settings.packages_file.clone(),
    })
  }
}

/// A completed resolution, not yet written anywhere.
#[derive(Debug)]
pub struct Resolution {
  pub paths: Paths,
  pub kconfig: Kconfig,
  pub targets: Vec<String>,
  pub report: Report,
}

/// Load the schema and existing configuration, read the package list and
/// resolve it. Nothing is written.
pub fn resolve_packages(settings: &Settings) -> Result<Resolution, PipelineError> {
  let paths = Paths::resolve(settings)?;
  let mut kconfig = Kconfig::load(&paths.schema, &paths.source_root)?;

  if paths.config.is_file() {
    kconfig.load_config(&paths.config)?;
  } else {
    warn!(path = %paths.config.display(), "no existing configuration, starting clean");
  }

  let targets = read_package_list(&paths.packages, &settings.symbol_prefix)?;
  info!(path = %paths.packages.display(), count = targets.len(), "resolving packages");
  let report = resolve(&mut kconfig, &targets)?;

  Ok(Resolution {
    paths,
    kconfig,
    targets,
    report,
  })
}

#[derive(Debug)]
pub struct ApplyResult {
  pub paths: Paths,
  pub report: Report,
  /// Symbols written to the configuration file.
  pub written: usize,
}

/// Resolve, write the configuration file, then run the finalize command.
///
/// The file is only written once resolution succeeded. A failing finalize
/// command is reported after the file has been written.
pub fn apply(settings: &Settings) -> Result<ApplyResult, PipelineError> {
  let Resolution {
    paths, kconfig, report, ..
  } = resolve_packages(settings)?;

  let written = kconfig.write_config(&paths.config)?;
  run_finalizer(&settings.finalize_command, &paths.source_root)?;

  Ok(ApplyResult { paths, report, written })
}
