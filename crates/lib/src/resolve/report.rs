use std::fmt;

use serde::Serialize;

/// A constraint violation noticed after enabling a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
  /// `symbol` carries `imply !implied`, yet `implied` is enabled.
  NegatedImply { symbol: String, implied: String },
  /// `selector` selects `symbol` and is enabled.
  ReverseDependency { symbol: String, selector: String },
  /// `symbol` belongs to `choice`, whose active selection is another member.
  ChoiceSelection {
    symbol: String,
    choice: String,
    selection: String,
  },
}

impl fmt::Display for Conflict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Conflict::NegatedImply { symbol, implied } => {
        write!(f, "{} implies disabling {}, which is enabled", symbol, implied)
      }
      Conflict::ReverseDependency { symbol, selector } => {
        write!(f, "{} is selected by enabled symbol {}", symbol, selector)
      }
      Conflict::ChoiceSelection {
        symbol,
        choice,
        selection,
      } => write!(f, "{} is in choice {} whose selection is {}", symbol, choice, selection),
    }
  }
}

/// A requested symbol left untouched because its choice group already
/// selects another member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSymbol {
  pub symbol: String,
  pub choice: String,
  pub selection: String,
}

/// Outcome of one resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
  /// Requested symbols set to `y`, in request order.
  pub enabled: Vec<String>,
  /// Requested symbols that were set but did not end up `y`.
  pub unsatisfied: Vec<String>,
  /// Dependencies switched on by the walk.
  pub forced: Vec<String>,
  /// Dependencies the walk wanted on but which take no user value.
  pub unassignable: Vec<String>,
  pub skipped: Vec<SkippedSymbol>,
  pub conflicts: Vec<Conflict>,
  /// Symbols visited by the dependency walk.
  pub visited: usize,
}

impl Report {
  /// Whether anything in the run deserves a warning.
  pub fn has_warnings(&self) -> bool {
    !self.unsatisfied.is_empty()
      || !self.unassignable.is_empty()
      || !self.skipped.is_empty()
      || !self.conflicts.is_empty()
  }
}
