mod apply;
mod info;
mod plan;

pub use apply::cmd_apply;
pub use info::cmd_info;
pub use plan::cmd_plan;

use anyhow::{Context, Result};
use tracing::debug;

use kselect_lib::settings::Settings;

use crate::GlobalArgs;

/// Settings from the settings file, with command-line overrides applied.
pub fn load_settings(args: &GlobalArgs) -> Result<Settings> {
  let mut settings = Settings::discover(args.settings.as_deref()).context("Failed to load settings")?;

  if let Some(src) = &args.src {
    settings.source_root = Some(src.clone());
  }
  if let Some(packages) = &args.packages {
    settings.packages_file = packages.clone();
  }

  debug!(?settings, "effective settings");
  Ok(settings)
}
