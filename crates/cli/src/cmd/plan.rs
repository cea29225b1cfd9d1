//! Implementation of the `kselect plan` command: a dry run of `apply`.

use anyhow::{Context, Result};
use serde::Serialize;

use kselect_lib::pipeline::{Paths, resolve_packages};
use kselect_lib::resolve::Report;
use kselect_lib::settings::Settings;

use crate::output::{OutputFormat, print_info, print_json, print_report, print_stat};

pub fn cmd_plan(settings: &Settings, output: OutputFormat) -> Result<()> {
  let resolution = resolve_packages(settings).context("Plan failed")?;

  if output.is_json() {
    #[derive(Serialize)]
    struct PlanOutput<'a> {
      paths: &'a Paths,
      targets: &'a [String],
      report: &'a Report,
    }

    print_json(&PlanOutput {
      paths: &resolution.paths,
      targets: &resolution.targets,
      report: &resolution.report,
    })?;
  } else {
    println!();
    print_report(&resolution.report);
    print_stat("Kconfig files read", &resolution.kconfig.files().len().to_string());
    println!();
    print_info(&format!(
      "Dry run - {} not written, {} not run",
      resolution.paths.config.display(),
      settings.finalize_command.join(" ")
    ));
  }

  Ok(())
}
