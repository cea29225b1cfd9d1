//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output: colored status
//! messages, the resolution report, and human-readable durations.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use kselect_lib::resolve::Report;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ADD: &str = "+";
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// Print a resolution report: enabled symbols on stdout, anything that
/// needs attention as warnings on stderr, then totals.
pub fn print_report(report: &Report) {
  for name in &report.enabled {
    println!("  {} {}", symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()), name);
  }
  for name in &report.forced {
    println!(
      "  {} {} {}",
      symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()),
      name,
      "(dependency)".if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }

  for skipped in &report.skipped {
    print_warning(&format!(
      "skipped {}: choice '{}' already selects {}",
      skipped.symbol, skipped.choice, skipped.selection
    ));
  }
  for name in &report.unsatisfied {
    print_warning(&format!("{} could not be enabled", name));
  }
  for name in &report.unassignable {
    print_warning(&format!("dependency {} could not be enabled", name));
  }
  for conflict in &report.conflicts {
    print_warning(&format!("conflict: {}", conflict));
  }

  print_stat("Enabled", &report.enabled.len().to_string());
  print_stat("Dependencies enabled", &report.forced.len().to_string());
  print_stat("Skipped", &report.skipped.len().to_string());
  print_stat("Conflicts", &report.conflicts.len().to_string());
}
