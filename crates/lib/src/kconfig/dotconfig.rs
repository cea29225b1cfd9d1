//! Reading and writing `.config` files.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::KconfigError;
use super::schema::Kconfig;
use super::types::{SymbolType, Tristate};
use crate::consts::{APP_NAME, CONFIG_PREFIX};

/// One assignment parsed from a `.config` line.
#[derive(Debug, PartialEq, Eq)]
enum Assignment<'a> {
  Value { name: &'a str, value: &'a str },
  NotSet { name: &'a str },
}

fn parse_line(line: &str) -> Option<Assignment<'_>> {
  let line = line.trim();
  if let Some(rest) = line.strip_prefix("# ") {
    let name = rest.strip_suffix(" is not set")?.strip_prefix(CONFIG_PREFIX)?;
    return Some(Assignment::NotSet { name });
  }
  let (name, value) = line.strip_prefix(CONFIG_PREFIX)?.split_once('=')?;
  Some(Assignment::Value { name, value })
}

fn unescape(value: &str) -> Option<String> {
  let inner = value.strip_prefix('"')?.strip_suffix('"')?;
  let mut out = String::with_capacity(inner.len());
  let mut chars = inner.chars();
  while let Some(c) = chars.next() {
    if c == '\\' {
      out.push(chars.next()?);
    } else {
      out.push(c);
    }
  }
  Some(out)
}

fn escape(value: &str) -> String {
  value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Kconfig {
  /// Load user values from a `.config` file.
  ///
  /// Returns the number of assignments applied. Names the schema does not
  /// define and malformed values are skipped.
  pub fn load_config(&mut self, path: &Path) -> Result<usize, KconfigError> {
    let content = fs::read_to_string(path).map_err(|source| KconfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let mut applied = 0;
    for (idx, line) in content.lines().enumerate() {
      let Some(assignment) = parse_line(line) else {
        continue;
      };
      let name = match &assignment {
        Assignment::Value { name, .. } | Assignment::NotSet { name } => *name,
      };
      let Some(id) = self.lookup(name) else {
        debug!(line = idx + 1, symbol = %name, "ignoring unknown symbol");
        continue;
      };

      let accepted = match (assignment, self.symbol(id).kind) {
        (Assignment::NotSet { .. }, kind) if kind.is_tristate_like() => self.set_value(id, Tristate::No),
        (Assignment::NotSet { .. }, _) => false,
        (Assignment::Value { value, .. }, kind) if kind.is_tristate_like() => match Tristate::parse(value) {
          Some(value) => self.set_value(id, value),
          None => false,
        },
        (Assignment::Value { value, .. }, SymbolType::String) => match unescape(value) {
          Some(text) => self.set_text_value(id, &text),
          None => false,
        },
        (Assignment::Value { value, .. }, _) => self.set_text_value(id, value),
      };

      if accepted {
        applied += 1;
      } else {
        debug!(line = idx + 1, symbol = %name, "ignoring malformed assignment");
      }
    }

    info!(path = %path.display(), assignments = applied, "configuration loaded");
    Ok(applied)
  }

  /// Render the current values in `.config` format.
  pub fn render_config(&self) -> (String, usize) {
    let mut out = String::new();
    let _ = writeln!(out, "#\n# Automatically generated file; DO NOT EDIT.\n# Written by {}\n#", APP_NAME);

    let mut written = 0;
    for id in self.defined_symbols() {
      let sym = self.symbol(id);
      if sym.kind == SymbolType::Unknown || self.eval(&sym.direct_dep) == Tristate::No {
        continue;
      }

      match sym.kind {
        SymbolType::Bool | SymbolType::Tristate => match self.tristate_value(id) {
          Tristate::No if sym.is_assignable() => {
            let _ = writeln!(out, "# {}{} is not set", CONFIG_PREFIX, sym.name);
          }
          Tristate::No => continue,
          value => {
            let _ = writeln!(out, "{}{}={}", CONFIG_PREFIX, sym.name, value);
          }
        },
        SymbolType::String => match self.string_value(id) {
          Some(text) => {
            let _ = writeln!(out, "{}{}=\"{}\"", CONFIG_PREFIX, sym.name, escape(&text));
          }
          None => continue,
        },
        _ => match self.string_value(id) {
          Some(text) if !text.is_empty() => {
            let _ = writeln!(out, "{}{}={}", CONFIG_PREFIX, sym.name, text);
          }
          _ => continue,
        },
      }
      written += 1;
    }
    (out, written)
  }

  /// Write the current values to `path`.
  ///
  /// The file is written to a sibling temp file and renamed into place.
  /// Returns the number of symbols written.
  pub fn write_config(&self, path: &Path) -> Result<usize, KconfigError> {
    let (content, written) = self.render_config();

    let file_name = path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| ".config".to_string());
    let temp_path = path.with_file_name(format!("{}.tmp", file_name));

    let write_err = |source| KconfigError::Write {
      path: path.to_path_buf(),
      source,
    };
    fs::write(&temp_path, content).map_err(write_err)?;
    if let Err(source) = fs::rename(&temp_path, path) {
      let _ = fs::remove_file(&temp_path);
      return Err(write_err(source));
    }

    info!(path = %path.display(), symbols = written, "configuration written");
    Ok(written)
  }
}
