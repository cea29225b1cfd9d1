use anyhow::{Context, Result};
use serde::Serialize;

use kselect_lib::pipeline::Paths;
use kselect_lib::settings::Settings;

use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_info(settings: &Settings, output: OutputFormat) -> Result<()> {
  let paths = Paths::resolve(settings).context("Failed to resolve paths")?;

  if output.is_json() {
    #[derive(Serialize)]
    struct InfoOutput<'a> {
      version: &'static str,
      #[serde(flatten)]
      paths: &'a Paths,
      symbol_prefix: &'a str,
      finalize_command: &'a [String],
    }

    print_json(&InfoOutput {
      version: env!("CARGO_PKG_VERSION"),
      paths: &paths,
      symbol_prefix: &settings.symbol_prefix,
      finalize_command: &settings.finalize_command,
    })?;
  } else {
    println!("kselect v{}", env!("CARGO_PKG_VERSION"));
    print_stat("Source root", &paths.source_root.display().to_string());
    print_stat("Schema", &paths.schema.display().to_string());
    print_stat("Config", &paths.config.display().to_string());
    print_stat("Packages", &paths.packages.display().to_string());
    print_stat("Symbol prefix", &settings.symbol_prefix);
    print_stat("Finalize", &settings.finalize_command.join(" "));
  }

  Ok(())
}
