//! Conflict detection for an enabled symbol.

use tracing::warn;

use super::report::Conflict;
use crate::kconfig::{Kconfig, SymbolId, Tristate};

/// Conflicts around `id`, which is expected to be `y`. Each one is logged
/// as a warning. Nothing is changed.
pub fn detect_conflicts(kconfig: &Kconfig, id: SymbolId) -> Vec<Conflict> {
  if kconfig.tristate_value(id) != Tristate::Yes {
    return Vec::new();
  }

  let sym = kconfig.symbol(id);
  let mut conflicts = Vec::new();

  for imply in sym.implies.iter().filter(|imply| imply.negated) {
    if kconfig.tristate_value(imply.target) == Tristate::Yes {
      conflicts.push(Conflict::NegatedImply {
        symbol: sym.name.clone(),
        implied: kconfig.name(imply.target).to_string(),
      });
    }
  }

  for select in &sym.rev_deps {
    if kconfig.tristate_value(select.value) == Tristate::Yes {
      conflicts.push(Conflict::ReverseDependency {
        symbol: sym.name.clone(),
        selector: kconfig.name(select.value).to_string(),
      });
    }
  }

  if let Some(choice) = sym.choice
    && let Some(selection) = kconfig.choice_selection(choice)
    && selection != id
  {
    conflicts.push(Conflict::ChoiceSelection {
      symbol: sym.name.clone(),
      choice: kconfig.choice(choice).label().to_string(),
      selection: kconfig.name(selection).to_string(),
    });
  }

  for conflict in &conflicts {
    warn!(symbol = %sym.name, "conflict: {}", conflict);
  }
  conflicts
}
