//! Core types of the Kconfig symbol model.
//!
//! Symbols and choices live in arenas owned by [`super::Kconfig`] and are
//! addressed by [`SymbolId`] / [`ChoiceId`]. Relations between symbols
//! (`select`, `imply`, reverse dependencies) are stored as indices, so the
//! graph may contain cycles without any ownership trouble.

use std::fmt;

use serde::Serialize;

use super::expr::Expr;

/// A tri-state value. Ordering follows Kconfig: `n < m < y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tristate {
  #[serde(rename = "n")]
  No,
  #[serde(rename = "m")]
  Module,
  #[serde(rename = "y")]
  Yes,
}

impl Tristate {
  pub fn as_str(self) -> &'static str {
    match self {
      Tristate::No => "n",
      Tristate::Module => "m",
      Tristate::Yes => "y",
    }
  }

  /// Parse the `.config` spelling of a tri-state value.
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "n" => Some(Tristate::No),
      "m" => Some(Tristate::Module),
      "y" => Some(Tristate::Yes),
      _ => None,
    }
  }
}

impl fmt::Display for Tristate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Declared type of a symbol.
///
/// `Unknown` marks a name that is referenced somewhere but never defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolType {
  Unknown,
  Bool,
  Tristate,
  String,
  Int,
  Hex,
}

impl SymbolType {
  /// Whether values of this type are tri-state (`bool` or `tristate`).
  pub fn is_tristate_like(self) -> bool {
    matches!(self, SymbolType::Bool | SymbolType::Tristate)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      SymbolType::Unknown => "unknown",
      SymbolType::Bool => "bool",
      SymbolType::Tristate => "tristate",
      SymbolType::String => "string",
      SymbolType::Int => "int",
      SymbolType::Hex => "hex",
    }
  }
}

impl fmt::Display for SymbolType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Index of a symbol in the schema arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub(crate) usize);

/// Index of a choice group in the schema arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChoiceId(pub(crate) usize);

/// A value guarded by an `if` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditional<T> {
  pub value: T,
  pub cond: Expr,
}

impl<T> Conditional<T> {
  pub fn new(value: T, cond: Expr) -> Self {
    Self { value, cond }
  }
}

/// An `imply` relation. `negated` is set for `imply !SYM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Imply {
  pub target: SymbolId,
  pub negated: bool,
  pub cond: Expr,
}

/// A value assigned by the user or loaded from a `.config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValue {
  Tristate(Tristate),
  Text(String),
}

/// A configuration symbol.
#[derive(Debug, Clone)]
pub struct Symbol {
  pub name: String,
  pub kind: SymbolType,
  /// Prompt text and its visibility condition. Symbols without a prompt
  /// ignore user values.
  pub prompt: Option<Conditional<String>>,
  /// Whether at least one `config` entry defines this symbol.
  pub defined: bool,
  /// OR of the dependencies of every definition, including enclosing
  /// `if`, `menu` and `choice` blocks.
  pub direct_dep: Expr,
  pub defaults: Vec<Conditional<Expr>>,
  pub implies: Vec<Imply>,
  /// Symbols that `select` this one.
  pub rev_deps: Vec<Conditional<SymbolId>>,
  /// Symbols that (positively) `imply` this one.
  pub weak_rev_deps: Vec<Conditional<SymbolId>>,
  pub choice: Option<ChoiceId>,
  pub(crate) user_value: Option<UserValue>,
}

impl Symbol {
  pub(crate) fn undefined(name: &str) -> Self {
    Self {
      name: name.to_string(),
      kind: SymbolType::Unknown,
      prompt: None,
      defined: false,
      direct_dep: Expr::Const(Tristate::No),
      defaults: Vec::new(),
      implies: Vec::new(),
      rev_deps: Vec::new(),
      weak_rev_deps: Vec::new(),
      choice: None,
      user_value: None,
    }
  }

  pub fn user_value(&self) -> Option<&UserValue> {
    self.user_value.as_ref()
  }

  /// Whether user values take effect for this symbol.
  pub fn is_assignable(&self) -> bool {
    self.prompt.is_some()
  }
}

/// A `choice` block: mutually exclusive members.
#[derive(Debug, Clone)]
pub struct Choice {
  pub name: Option<String>,
  pub prompt: Option<String>,
  pub direct_dep: Expr,
  pub members: Vec<SymbolId>,
  pub defaults: Vec<Conditional<SymbolId>>,
  pub(crate) user_selection: Option<SymbolId>,
}

impl Choice {
  pub(crate) fn new(name: Option<String>, direct_dep: Expr) -> Self {
    Self {
      name,
      prompt: None,
      direct_dep,
      members: Vec::new(),
      defaults: Vec::new(),
      user_selection: None,
    }
  }

  /// Name used in log output; anonymous choices fall back to their prompt.
  pub fn label(&self) -> &str {
    self
      .name
      .as_deref()
      .or(self.prompt.as_deref())
      .unwrap_or("<anonymous choice>")
  }
}
