//! Resolution of requested symbols against a loaded schema.
//!
//! Requests are handled strictly in order; later requests see the state
//! left by earlier ones. For each request:
//!
//! 1. look the symbol up (unknown names are fatal);
//! 2. skip it if its choice group already selects another member;
//! 3. set it to `y` and switch on its disabled dependencies;
//! 4. record conflicts.

mod conflicts;
mod report;
mod walk;

use std::collections::HashSet;

use thiserror::Error;
use tracing::{info, warn};

pub use conflicts::detect_conflicts;
pub use report::{Conflict, Report, SkippedSymbol};
pub use walk::{WalkOutcome, enable_dependencies};

use crate::kconfig::{Kconfig, SymbolId, Tristate};

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("symbol {0} not found in schema")]
  UnknownSymbol(String),

  /// The symbol exists but takes no `y`/`n` value.
  #[error("symbol {name} is a {kind} symbol and cannot be enabled")]
  NotTristate { name: String, kind: String },
}

/// State of one resolution run.
pub struct Resolver<'k> {
  kconfig: &'k mut Kconfig,
  visited: HashSet<SymbolId>,
  report: Report,
}

impl<'k> Resolver<'k> {
  pub fn new(kconfig: &'k mut Kconfig) -> Self {
    Self {
      kconfig,
      visited: HashSet::new(),
      report: Report::default(),
    }
  }

  /// Handle one requested symbol.
  pub fn request(&mut self, name: &str) -> Result<(), ResolveError> {
    let id = self
      .kconfig
      .lookup(name)
      .ok_or_else(|| ResolveError::UnknownSymbol(name.to_string()))?;
    let sym = self.kconfig.symbol(id);
    if !sym.kind.is_tristate_like() {
      return Err(ResolveError::NotTristate {
        name: name.to_string(),
        kind: sym.kind.to_string(),
      });
    }

    if let Some(choice) = sym.choice
      && let Some(selection) = self.kconfig.choice_selection(choice)
      && selection != id
    {
      let choice = self.kconfig.choice(choice).label().to_string();
      let selection = self.kconfig.name(selection).to_string();
      warn!(symbol = %name, choice = %choice, selection = %selection, "choice already selects another member, skipping");
      self.report.skipped.push(SkippedSymbol {
        symbol: name.to_string(),
        choice,
        selection,
      });
      return Ok(());
    }

    self.kconfig.set_value(id, Tristate::Yes);
    let outcome = enable_dependencies(self.kconfig, &mut self.visited, id);
    self
      .report
      .forced
      .extend(outcome.forced.iter().map(|&dep| self.kconfig.name(dep).to_string()));
    self
      .report
      .unassignable
      .extend(outcome.unassignable.iter().map(|&dep| self.kconfig.name(dep).to_string()));

    match self.kconfig.tristate_value(id) {
      Tristate::Yes => {
        info!(symbol = %name, "enabled");
        self.report.enabled.push(name.to_string());
      }
      value => {
        warn!(symbol = %name, value = %value, "requested symbol did not reach y");
        self.report.unsatisfied.push(name.to_string());
      }
    }

    let conflicts = detect_conflicts(self.kconfig, id);
    self.report.conflicts.extend(conflicts);
    Ok(())
  }

  pub fn finish(mut self) -> Report {
    self.report.visited = self.visited.len();
    self.report
  }
}

/// Resolve every target in order.
pub fn resolve(kconfig: &mut Kconfig, targets: &[String]) -> Result<Report, ResolveError> {
  let mut resolver = Resolver::new(kconfig);
  for target in targets {
    resolver.request(target)?;
  }
  let report = resolver.finish();
  info!(
    enabled = report.enabled.len(),
    forced = report.forced.len(),
    skipped = report.skipped.len(),
    conflicts = report.conflicts.len(),
    "resolution finished"
  );
  Ok(report)
}
