//! Dependency-enabling walk.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::kconfig::{Kconfig, SymbolId, Tristate};

/// Symbols touched by one walk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkOutcome {
  /// Dependencies that were `n` and are enabled once the walk is done.
  pub forced: Vec<SymbolId>,
  /// Dependencies that were given a `y` user value but still evaluate to
  /// `n`: no prompt, a prompt hidden by its condition, or a later walk step
  /// switched them off again.
  pub unassignable: Vec<SymbolId>,
}

/// Switch on every disabled bool/tristate symbol that `start` positively
/// depends on, transitively.
///
/// `visited` is shared across the walks of one run. It only bounds
/// expansion: a symbol is marked before its dependencies are examined, so
/// each is expanded at most once and cycles terminate, but a visited
/// dependency that has dropped back to `n` is still set again. The caller
/// has already set `start` itself. Nothing is checked beyond the direct
/// dependencies: side effects show up later in conflict detection.
pub fn enable_dependencies(kconfig: &mut Kconfig, visited: &mut HashSet<SymbolId>, start: SymbolId) -> WalkOutcome {
  let mut touched: Vec<(SymbolId, SymbolId)> = Vec::new();
  let mut pending = vec![start];

  while let Some(id) = pending.pop() {
    if !visited.insert(id) {
      continue;
    }

    for dep in kconfig.dependency_symbols(id) {
      let sym = kconfig.symbol(dep);
      if !sym.kind.is_tristate_like() {
        if !sym.defined {
          debug!(symbol = %kconfig.name(id), dependency = %sym.name, "dependency is not defined");
        }
        continue;
      }
      if dep == start || kconfig.tristate_value(dep) != Tristate::No {
        continue;
      }

      debug!(symbol = %kconfig.name(id), dependency = %kconfig.name(dep), "setting dependency to y");
      kconfig.set_value(dep, Tristate::Yes);
      if !touched.iter().any(|&(_, seen)| seen == dep) {
        touched.push((id, dep));
      }
      pending.push(dep);
    }
  }

  let mut outcome = WalkOutcome::default();
  for (id, dep) in touched {
    if kconfig.tristate_value(dep) != Tristate::No {
      info!(symbol = %kconfig.name(id), dependency = %kconfig.name(dep), "enabled dependency");
      outcome.forced.push(dep);
    } else if !kconfig.symbol(dep).is_assignable() {
      warn!(
        symbol = %kconfig.name(id),
        dependency = %kconfig.name(dep),
        "dependency has no prompt and cannot be enabled directly"
      );
      outcome.unassignable.push(dep);
    } else {
      warn!(symbol = %kconfig.name(id), dependency = %kconfig.name(dep), "dependency stayed n after enabling");
      outcome.unassignable.push(dep);
    }
  }
  outcome
}
