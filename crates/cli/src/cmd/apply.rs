//! Implementation of the `kselect apply` command.
//!
//! Resolves the package list against the build tree's schema, writes the
//! resulting `.config` and runs the finalize command in the source root.

use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;

use kselect_lib::pipeline::{Paths, apply};
use kselect_lib::resolve::Report;
use kselect_lib::settings::Settings;

use crate::output::{
  OutputFormat, format_duration, print_json, print_report, print_stat, print_success, print_warning,
};

pub fn cmd_apply(settings: &Settings, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let result = apply(settings).context("Apply failed")?;

  if output.is_json() {
    #[derive(Serialize)]
    struct ApplyOutput<'a> {
      paths: &'a Paths,
      written: usize,
      report: &'a Report,
    }

    print_json(&ApplyOutput {
      paths: &result.paths,
      written: result.written,
      report: &result.report,
    })?;
  } else {
    println!();
    print_report(&result.report);
    println!();
    if result.report.has_warnings() {
      print_warning("Configuration written with warnings");
    } else {
      print_success("Configuration written");
    }
    print_stat("Config", &result.paths.config.display().to_string());
    print_stat("Symbols written", &result.written.to_string());
    print_stat("Duration", &format_duration(start.elapsed()));
  }

  Ok(())
}
