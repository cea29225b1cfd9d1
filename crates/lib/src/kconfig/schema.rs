//! The loaded symbol table and its value semantics.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::expr::{CompareOp, Expr, Operand};
use super::parser::Parser;
use super::types::{Choice, ChoiceId, Symbol, SymbolId, SymbolType, Tristate, UserValue};
use super::KconfigError;

/// A parsed Kconfig tree.
///
/// Symbols are stored in an arena in first-reference order; `order` keeps
/// the definition order used when writing a `.config`. Computed values are
/// cached until the next mutation.
#[derive(Debug)]
pub struct Kconfig {
  srctree: PathBuf,
  pub(crate) symbols: Vec<Symbol>,
  pub(crate) index: HashMap<String, SymbolId>,
  pub(crate) choices: Vec<Choice>,
  pub(crate) order: Vec<SymbolId>,
  pub(crate) files: Vec<PathBuf>,
  cache: RefCell<HashMap<SymbolId, Tristate>>,
}

impl Kconfig {
  pub(crate) fn empty(srctree: &Path) -> Self {
    Self {
      srctree: srctree.to_path_buf(),
      symbols: Vec::new(),
      index: HashMap::new(),
      choices: Vec::new(),
      order: Vec::new(),
      files: Vec::new(),
      cache: RefCell::new(HashMap::new()),
    }
  }

  /// Parse the tree rooted at `schema`. `source` statements resolve
  /// relative to `srctree`.
  pub fn load(schema: &Path, srctree: &Path) -> Result<Self, KconfigError> {
    let mut kconfig = Self::empty(srctree);
    Parser::new(&mut kconfig).parse_file(schema)?;
    info!(
      schema = %schema.display(),
      symbols = kconfig.order.len(),
      choices = kconfig.choices.len(),
      files = kconfig.files.len(),
      "schema loaded"
    );
    Ok(kconfig)
  }

  /// Parse Kconfig text that is not backed by a file.
  ///
  /// `source` statements resolve relative to `srctree`.
  pub fn parse_str(text: &str, srctree: &Path) -> Result<Self, KconfigError> {
    let mut kconfig = Self::empty(srctree);
    Parser::new(&mut kconfig).parse_text(text, Path::new("<memory>"))?;
    Ok(kconfig)
  }

  pub fn srctree(&self) -> &Path {
    &self.srctree
  }

  /// Files read while loading, in parse order.
  pub fn files(&self) -> &[PathBuf] {
    &self.files
  }

  pub(crate) fn intern(&mut self, name: &str) -> SymbolId {
    if let Some(&id) = self.index.get(name) {
      return id;
    }
    let id = SymbolId(self.symbols.len());
    self.symbols.push(Symbol::undefined(name));
    self.index.insert(name.to_string(), id);
    id
  }

  /// Look up a defined symbol by name. Names that are only referenced
  /// from expressions are not returned.
  pub fn lookup(&self, name: &str) -> Option<SymbolId> {
    self.index.get(name).copied().filter(|id| self.symbols[id.0].defined)
  }

  pub fn symbol(&self, id: SymbolId) -> &Symbol {
    &self.symbols[id.0]
  }

  pub fn name(&self, id: SymbolId) -> &str {
    &self.symbols[id.0].name
  }

  pub fn choice(&self, id: ChoiceId) -> &Choice {
    &self.choices[id.0]
  }

  /// Defined symbols in definition order.
  pub fn defined_symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
    self.order.iter().copied()
  }

  pub fn choices(&self) -> impl Iterator<Item = ChoiceId> + '_ {
    (0..self.choices.len()).map(ChoiceId)
  }

  /// Current tri-state value of a symbol. Non-tristate symbols read as `n`.
  pub fn tristate_value(&self, id: SymbolId) -> Tristate {
    if let Some(&value) = self.cache.borrow().get(&id) {
      return value;
    }
    let mut eval = Evaluator::new(self);
    let value = eval.symbol(id);
    self.cache.borrow_mut().extend(eval.computed);
    value
  }

  /// Evaluate an expression against the current values.
  pub fn eval(&self, expr: &Expr) -> Tristate {
    let mut eval = Evaluator::new(self);
    let value = eval.expr(expr);
    self.cache.borrow_mut().extend(eval.computed);
    value
  }

  /// Current value in `.config` spelling: `y`/`m`/`n` for tri-state
  /// symbols, the text for string/int/hex symbols, `None` when unset.
  pub fn string_value(&self, id: SymbolId) -> Option<String> {
    let sym = self.symbol(id);
    match sym.kind {
      SymbolType::Unknown => None,
      SymbolType::Bool | SymbolType::Tristate => Some(self.tristate_value(id).as_str().to_string()),
      SymbolType::String | SymbolType::Int | SymbolType::Hex => {
        let mut eval = Evaluator::new(self);
        let value = eval.text_symbol(id);
        self.cache.borrow_mut().extend(eval.computed);
        value
      }
    }
  }

  /// Active selection of a choice group, if the choice is visible.
  pub fn choice_selection(&self, id: ChoiceId) -> Option<SymbolId> {
    let mut eval = Evaluator::new(self);
    let selection = eval.selection(id);
    self.cache.borrow_mut().extend(eval.computed);
    selection
  }

  /// Symbols whose enablement helps satisfy `id`'s dependencies.
  pub fn dependency_symbols(&self, id: SymbolId) -> Vec<SymbolId> {
    let mut deps = self.symbol(id).direct_dep.positive_symbols();
    deps.retain(|&dep| dep != id);
    deps
  }

  /// Assign a tri-state user value.
  ///
  /// Returns `false` when the symbol is not tri-state. An accepted value
  /// only takes effect if the symbol has a prompt; see
  /// [`Symbol::is_assignable`].
  pub fn set_value(&mut self, id: SymbolId, value: Tristate) -> bool {
    if !self.symbols[id.0].kind.is_tristate_like() {
      debug!(symbol = %self.symbols[id.0].name, "refusing tri-state value for non-tristate symbol");
      return false;
    }
    self.symbols[id.0].user_value = Some(UserValue::Tristate(value));
    if let Some(choice) = self.symbols[id.0].choice {
      let choice = &mut self.choices[choice.0];
      if value == Tristate::Yes {
        choice.user_selection = Some(id);
      } else if choice.user_selection == Some(id) {
        choice.user_selection = None;
      }
    }
    self.invalidate();
    true
  }

  /// Assign a string/int/hex user value. Returns `false` for other types.
  pub fn set_text_value(&mut self, id: SymbolId, value: &str) -> bool {
    if !matches!(
      self.symbols[id.0].kind,
      SymbolType::String | SymbolType::Int | SymbolType::Hex
    ) {
      return false;
    }
    self.symbols[id.0].user_value = Some(UserValue::Text(value.to_string()));
    self.invalidate();
    true
  }

  pub(crate) fn invalidate(&mut self) {
    self.cache.get_mut().clear();
  }
}

/// Value computation for one query.
///
/// `active` holds the symbols currently being evaluated; re-entering one of
/// them reads as `n`, which cuts dependency cycles.
struct Evaluator<'k> {
  kconfig: &'k Kconfig,
  active: HashSet<SymbolId>,
  computed: HashMap<SymbolId, Tristate>,
}

impl<'k> Evaluator<'k> {
  fn new(kconfig: &'k Kconfig) -> Self {
    Self {
      kconfig,
      active: HashSet::new(),
      computed: HashMap::new(),
    }
  }

  fn symbol(&mut self, id: SymbolId) -> Tristate {
    if let Some(&value) = self.kconfig.cache.borrow().get(&id) {
      return value;
    }
    if let Some(&value) = self.computed.get(&id) {
      return value;
    }
    if !self.active.insert(id) {
      return Tristate::No;
    }
    let value = self.compute(id);
    self.active.remove(&id);
    self.computed.insert(id, value);
    value
  }

  fn compute(&mut self, id: SymbolId) -> Tristate {
    let kconfig = self.kconfig;
    let sym = &kconfig.symbols[id.0];
    if !sym.kind.is_tristate_like() {
      return Tristate::No;
    }

    let dep = self.expr(&sym.direct_dep);
    if let Some(choice) = sym.choice {
      if dep == Tristate::No {
        return Tristate::No;
      }
      return if self.selection(choice) == Some(id) {
        Tristate::Yes
      } else {
        Tristate::No
      };
    }

    let visibility = self.visibility(id, dep);
    let user = match sym.user_value {
      Some(UserValue::Tristate(value)) if visibility > Tristate::No => Some(value.min(visibility)),
      _ => None,
    };

    let mut value = match user {
      Some(value) => value,
      None => {
        let mut value = Tristate::No;
        for default in &sym.defaults {
          let cond = self.expr(&default.cond);
          if cond > Tristate::No {
            value = self.expr(&default.value).min(cond).min(dep);
            break;
          }
        }
        for imply in &sym.weak_rev_deps {
          let implied = self.symbol(imply.value).min(self.expr(&imply.cond)).min(dep);
          value = value.max(implied);
        }
        value
      }
    };

    for select in &sym.rev_deps {
      let selected = self.symbol(select.value).min(self.expr(&select.cond));
      value = value.max(selected);
    }

    if sym.kind == SymbolType::Bool && value == Tristate::Module {
      value = Tristate::Yes;
    }
    value
  }

  fn visibility(&mut self, id: SymbolId, dep: Tristate) -> Tristate {
    let kconfig = self.kconfig;
    match &kconfig.symbols[id.0].prompt {
      Some(prompt) => dep.min(self.expr(&prompt.cond)),
      None => Tristate::No,
    }
  }

  fn member_visible(&mut self, id: SymbolId) -> bool {
    let kconfig = self.kconfig;
    let sym = &kconfig.symbols[id.0];
    let dep = self.expr(&sym.direct_dep);
    dep > Tristate::No && (sym.prompt.is_none() || self.visibility(id, dep) > Tristate::No)
  }

  fn selection(&mut self, id: ChoiceId) -> Option<SymbolId> {
    let kconfig = self.kconfig;
    let choice = &kconfig.choices[id.0];
    if self.expr(&choice.direct_dep) == Tristate::No {
      return None;
    }
    if let Some(selected) = choice.user_selection
      && self.member_visible(selected)
    {
      return Some(selected);
    }
    for default in &choice.defaults {
      if self.expr(&default.cond) > Tristate::No && self.member_visible(default.value) {
        return Some(default.value);
      }
    }
    choice.members.iter().copied().find(|&member| self.member_visible(member))
  }

  fn text_symbol(&mut self, id: SymbolId) -> Option<String> {
    let kconfig = self.kconfig;
    let sym = &kconfig.symbols[id.0];
    let dep = self.expr(&sym.direct_dep);
    if sym.kind.is_tristate_like() {
      return Some(self.symbol(id).as_str().to_string());
    }
    if sym.kind == SymbolType::Unknown {
      return None;
    }

    if let Some(UserValue::Text(text)) = &sym.user_value
      && self.visibility(id, dep) > Tristate::No
    {
      return Some(text.clone());
    }
    if dep > Tristate::No {
      for default in &sym.defaults {
        if self.expr(&default.cond) > Tristate::No {
          return Some(self.text_expr(&default.value));
        }
      }
    }
    match sym.kind {
      SymbolType::String if dep > Tristate::No => Some(String::new()),
      _ => None,
    }
  }

  fn text_expr(&mut self, expr: &Expr) -> String {
    match expr {
      Expr::Text(text) => text.clone(),
      Expr::Symbol(id) => self.text_symbol(*id).unwrap_or_default(),
      other => self.expr(other).as_str().to_string(),
    }
  }

  fn operand_text(&mut self, operand: &Operand) -> String {
    match operand {
      Operand::Literal(text) => text.clone(),
      Operand::Symbol(id) => match self.kconfig.symbols[id.0].kind {
        // An undefined name in a comparison reads as its own text.
        SymbolType::Unknown => self.kconfig.symbols[id.0].name.clone(),
        _ => self.text_symbol(*id).unwrap_or_default(),
      },
    }
  }

  fn expr(&mut self, expr: &Expr) -> Tristate {
    match expr {
      Expr::Const(value) => *value,
      Expr::Text(text) => Tristate::parse(text).unwrap_or(Tristate::No),
      Expr::Symbol(id) => self.symbol(*id),
      Expr::Not(inner) => match self.expr(inner) {
        Tristate::No => Tristate::Yes,
        Tristate::Module => Tristate::Module,
        Tristate::Yes => Tristate::No,
      },
      Expr::And(a, b) => self.expr(a).min(self.expr(b)),
      Expr::Or(a, b) => self.expr(a).max(self.expr(b)),
      Expr::Compare { op, lhs, rhs } => {
        let lhs = self.operand_text(lhs);
        let rhs = self.operand_text(rhs);
        if compare(*op, &lhs, &rhs) {
          Tristate::Yes
        } else {
          Tristate::No
        }
      }
    }
  }
}

/// Compare numerically when both sides parse as numbers, textually otherwise.
fn compare(op: CompareOp, lhs: &str, rhs: &str) -> bool {
  let ordering = match (parse_number(lhs), parse_number(rhs)) {
    (Some(a), Some(b)) => a.cmp(&b),
    _ => lhs.cmp(rhs),
  };
  match op {
    CompareOp::Eq => ordering.is_eq(),
    CompareOp::Ne => ordering.is_ne(),
    CompareOp::Lt => ordering.is_lt(),
    CompareOp::Le => ordering.is_le(),
    CompareOp::Gt => ordering.is_gt(),
    CompareOp::Ge => ordering.is_ge(),
  }
}

fn parse_number(text: &str) -> Option<i64> {
  match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
    Some(hex) => i64::from_str_radix(hex, 16).ok(),
    None => text.parse().ok(),
  }
}
