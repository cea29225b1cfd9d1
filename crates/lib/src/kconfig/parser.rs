//! Line-oriented Kconfig reader.
//!
//! Entries (`config`, `choice`, `menu`, ...) open on a keyword line and
//! collect attribute lines until the next entry keyword. Enclosing `if`,
//! `menu` and `choice` blocks contribute their dependencies to every entry
//! they contain.

use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::KconfigError;
use super::expr::{Expr, is_symbol_char, parse_expr};
use super::schema::Kconfig;
use super::types::{Choice, ChoiceId, Conditional, Imply, SymbolId, SymbolType};

/// Position of the line being parsed, for error messages.
#[derive(Clone, Copy)]
struct Loc<'a> {
  file: &'a Path,
  line: usize,
}

impl Loc<'_> {
  fn error(&self, message: impl Into<String>) -> KconfigError {
    KconfigError::Syntax {
      file: self.file.to_path_buf(),
      line: self.line,
      message: message.into(),
    }
  }
}

#[derive(Debug)]
enum Frame {
  If(Expr),
  Menu(Expr),
  Choice { id: ChoiceId, dep: Expr },
}

impl Frame {
  fn dep(&self) -> &Expr {
    match self {
      Frame::If(dep) | Frame::Menu(dep) | Frame::Choice { dep, .. } => dep,
    }
  }

  fn keyword(&self) -> &'static str {
    match self {
      Frame::If(_) => "if",
      Frame::Menu(_) => "menu",
      Frame::Choice { .. } => "choice",
    }
  }
}

/// Attributes of a `config` entry collected before it is merged into the
/// symbol table.
#[derive(Debug)]
struct PendingSymbol {
  id: SymbolId,
  kind: Option<SymbolType>,
  prompt: Option<Conditional<String>>,
  deps: Expr,
  defaults: Vec<Conditional<Expr>>,
  selects: Vec<Conditional<SymbolId>>,
  implies: Vec<Imply>,
}

impl PendingSymbol {
  fn new(id: SymbolId) -> Self {
    Self {
      id,
      kind: None,
      prompt: None,
      deps: Expr::yes(),
      defaults: Vec::new(),
      selects: Vec::new(),
      implies: Vec::new(),
    }
  }
}

#[derive(Debug)]
enum Entry {
  None,
  Config(PendingSymbol),
  Choice(ChoiceId),
  Menu,
  Comment,
}

/// State of a `help` block being skipped.
struct HelpBlock {
  keyword_indent: usize,
  text_indent: Option<usize>,
}

pub(crate) struct Parser<'k> {
  kconfig: &'k mut Kconfig,
  frames: Vec<Frame>,
  current: Entry,
  include_stack: Vec<PathBuf>,
}

impl<'k> Parser<'k> {
  pub(crate) fn new(kconfig: &'k mut Kconfig) -> Self {
    Self {
      kconfig,
      frames: Vec::new(),
      current: Entry::None,
      include_stack: Vec::new(),
    }
  }

  pub(crate) fn parse_file(&mut self, path: &Path) -> Result<(), KconfigError> {
    let canonical = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if self.include_stack.contains(&canonical) {
      return Err(KconfigError::RecursiveSource(path.to_path_buf()));
    }

    let text = fs::read_to_string(path).map_err(|source| KconfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(file = %path.display(), "parsing");

    self.include_stack.push(canonical);
    self.kconfig.files.push(path.to_path_buf());
    let result = self.parse_text(&text, path);
    self.include_stack.pop();
    result
  }

  pub(crate) fn parse_text(&mut self, text: &str, file: &Path) -> Result<(), KconfigError> {
    let depth = self.frames.len();
    let mut lines = text.lines().enumerate();
    let mut help: Option<HelpBlock> = None;
    let mut last_line = 0;

    while let Some((idx, raw)) = lines.next() {
      let loc = Loc { file, line: idx + 1 };
      last_line = loc.line;

      if let Some(block) = &mut help {
        if raw.trim().is_empty() {
          continue;
        }
        let indent = indentation(raw);
        match block.text_indent {
          None if indent > block.keyword_indent => {
            block.text_indent = Some(indent);
            continue;
          }
          Some(text_indent) if indent >= text_indent => continue,
          _ => help = None,
        }
      }

      let mut line = raw.to_string();
      while let Some(stripped) = line.trim_end().strip_suffix('\\') {
        line = stripped.to_string();
        match lines.next() {
          Some((_, next)) => {
            line.push(' ');
            line.push_str(next.trim_start());
          }
          None => break,
        }
      }

      let content = strip_comment(&line).trim();
      if content.is_empty() {
        continue;
      }

      let (keyword, rest) = split_keyword(content);
      if keyword == "help" || keyword == "---help---" {
        help = Some(HelpBlock {
          keyword_indent: indentation(raw),
          text_indent: None,
        });
        continue;
      }

      self.statement(keyword, rest, loc)?;
    }

    self.finish_entry();
    if self.frames.len() > depth {
      let open = self.frames.last().map(Frame::keyword).unwrap_or("block");
      return Err(
        Loc { file, line: last_line }.error(format!("unterminated '{}' block at end of file", open)),
      );
    }
    Ok(())
  }

  fn statement(&mut self, keyword: &str, rest: &str, loc: Loc<'_>) -> Result<(), KconfigError> {
    match keyword {
      "config" | "menuconfig" => {
        self.finish_entry();
        let name = symbol_name(rest, loc)?;
        let id = self.kconfig.intern(name);
        self.current = Entry::Config(PendingSymbol::new(id));
      }
      "choice" => {
        self.finish_entry();
        let name = match rest.trim() {
          "" => None,
          name => Some(symbol_name(name, loc)?.to_string()),
        };
        let id = ChoiceId(self.kconfig.choices.len());
        self.kconfig.choices.push(Choice::new(name, self.frame_dep()));
        self.frames.push(Frame::Choice { id, dep: Expr::yes() });
        self.current = Entry::Choice(id);
      }
      "endchoice" => {
        self.finish_entry();
        self.pop_frame("choice", loc)?;
      }
      "menu" => {
        self.finish_entry();
        self.frames.push(Frame::Menu(Expr::yes()));
        self.current = Entry::Menu;
      }
      "endmenu" => {
        self.finish_entry();
        self.pop_frame("menu", loc)?;
      }
      "if" => {
        self.finish_entry();
        let cond = parse_in(self.kconfig, rest, loc)?;
        self.frames.push(Frame::If(cond));
      }
      "endif" => {
        self.finish_entry();
        self.pop_frame("if", loc)?;
      }
      "comment" => {
        self.finish_entry();
        self.current = Entry::Comment;
      }
      "mainmenu" => {
        self.finish_entry();
      }
      "source" | "rsource" | "osource" | "orsource" => {
        self.finish_entry();
        self.source(keyword, rest, loc)?;
      }
      _ => self.attribute(keyword, rest, loc)?,
    }
    Ok(())
  }

  fn source(&mut self, keyword: &str, rest: &str, loc: Loc<'_>) -> Result<(), KconfigError> {
    let (raw, remainder) = match quoted(rest) {
      Some(parsed) => parsed,
      None => (rest.trim().to_string(), ""),
    };
    if raw.is_empty() || !remainder.trim().is_empty() {
      return Err(loc.error(format!("malformed '{}' statement", keyword)));
    }
    if raw.contains('$') || raw.contains('*') {
      warn!(file = %loc.file.display(), line = loc.line, path = %raw, "skipping macro or glob in source path");
      return Ok(());
    }

    let relative = keyword.starts_with("or") || keyword == "rsource";
    let optional = keyword.starts_with('o');
    let base = if relative {
      self
        .include_stack
        .last()
        .and_then(|file| file.parent())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| self.kconfig.srctree().to_path_buf())
    } else {
      self.kconfig.srctree().to_path_buf()
    };
    let path = base.join(&raw);

    if !path.is_file() {
      if optional {
        debug!(path = %path.display(), "optional source not found");
        return Ok(());
      }
      return Err(KconfigError::SourceNotFound {
        file: loc.file.to_path_buf(),
        line: loc.line,
        path,
      });
    }
    self.parse_file(&path)
  }

  fn attribute(&mut self, keyword: &str, rest: &str, loc: Loc<'_>) -> Result<(), KconfigError> {
    let Parser {
      kconfig,
      frames,
      current,
      ..
    } = self;

    match current {
      Entry::Config(pending) => match keyword {
        "bool" | "boolean" | "tristate" | "string" | "int" | "hex" => {
          pending.kind = Some(type_keyword(keyword));
          if !rest.trim().is_empty() {
            pending.prompt = Some(parse_prompt(kconfig, rest, loc)?);
          }
        }
        "def_bool" | "def_tristate" => {
          pending.kind = Some(if keyword == "def_bool" {
            SymbolType::Bool
          } else {
            SymbolType::Tristate
          });
          let (value, cond) = parse_conditional(kconfig, rest, loc)?;
          pending.defaults.push(Conditional::new(value, cond));
        }
        "prompt" => pending.prompt = Some(parse_prompt(kconfig, rest, loc)?),
        "default" => {
          let (value, cond) = parse_conditional(kconfig, rest, loc)?;
          pending.defaults.push(Conditional::new(value, cond));
        }
        "depends" => {
          let dep = parse_depends(kconfig, rest, loc)?;
          pending.deps = mem::replace(&mut pending.deps, Expr::yes()).and(dep);
        }
        "select" => {
          let (target, negated, cond) = parse_relation(kconfig, rest, loc)?;
          if negated {
            return Err(loc.error("'select' cannot be negated"));
          }
          pending.selects.push(Conditional::new(target, cond));
        }
        "imply" => {
          let (target, negated, cond) = parse_relation(kconfig, rest, loc)?;
          pending.implies.push(Imply { target, negated, cond });
        }
        _ if is_ignored_attribute(keyword) => {}
        other => return Err(loc.error(format!("unknown keyword '{}'", other))),
      },
      Entry::Choice(id) => {
        let choice = &mut kconfig.choices[id.0];
        match keyword {
          "prompt" => choice.prompt = Some(parse_prompt_text(rest, loc)?),
          "bool" | "boolean" | "tristate" => {
            if !rest.trim().is_empty() {
              choice.prompt = Some(parse_prompt_text(rest, loc)?);
            }
          }
          "default" => {
            let (target, negated, cond) = parse_relation(kconfig, rest, loc)?;
            if negated {
              return Err(loc.error("choice default cannot be negated"));
            }
            kconfig.choices[id.0].defaults.push(Conditional::new(target, cond));
          }
          "depends" => {
            let dep = parse_depends(kconfig, rest, loc)?;
            let choice = &mut kconfig.choices[id.0];
            choice.direct_dep = mem::replace(&mut choice.direct_dep, Expr::yes()).and(dep.clone());
            if let Some(Frame::Choice { dep: frame_dep, .. }) = frames.last_mut() {
              *frame_dep = mem::replace(frame_dep, Expr::yes()).and(dep);
            }
          }
          _ if is_ignored_attribute(keyword) => {}
          other => return Err(loc.error(format!("unknown keyword '{}' in choice", other))),
        }
      }
      Entry::Menu => match keyword {
        "depends" => {
          let dep = parse_depends(kconfig, rest, loc)?;
          if let Some(Frame::Menu(frame_dep)) = frames.last_mut() {
            *frame_dep = mem::replace(frame_dep, Expr::yes()).and(dep);
          }
        }
        _ if is_ignored_attribute(keyword) => {}
        other => return Err(loc.error(format!("unknown keyword '{}' in menu", other))),
      },
      Entry::Comment => {}
      Entry::None => return Err(loc.error(format!("'{}' outside of an entry", keyword))),
    }
    Ok(())
  }

  /// AND of the dependencies of every open block.
  fn frame_dep(&self) -> Expr {
    self
      .frames
      .iter()
      .fold(Expr::yes(), |acc, frame| acc.and(frame.dep().clone()))
  }

  /// The choice a new `config` entry belongs to, if it sits directly in one
  /// (possibly inside `if` blocks, but not inside a nested menu).
  fn enclosing_choice(&self) -> Option<ChoiceId> {
    for frame in self.frames.iter().rev() {
      match frame {
        Frame::Choice { id, .. } => return Some(*id),
        Frame::Menu(_) => return None,
        Frame::If(_) => {}
      }
    }
    None
  }

  fn pop_frame(&mut self, expected: &str, loc: Loc<'_>) -> Result<(), KconfigError> {
    match self.frames.last() {
      Some(frame) if frame.keyword() == expected => {
        self.frames.pop();
        Ok(())
      }
      Some(frame) => Err(loc.error(format!(
        "'end{}' does not match open '{}' block",
        expected,
        frame.keyword()
      ))),
      None => Err(loc.error(format!("'end{}' without matching '{}'", expected, expected))),
    }
  }

  /// Merge the pending entry, if any, into the symbol table.
  fn finish_entry(&mut self) {
    let Entry::Config(pending) = mem::replace(&mut self.current, Entry::None) else {
      return;
    };

    let dep = self.frame_dep().and(pending.deps);
    let choice = self.enclosing_choice();
    let id = pending.id;
    let kconfig = &mut *self.kconfig;

    let sym = &mut kconfig.symbols[id.0];
    if sym.defined {
      sym.direct_dep = mem::replace(&mut sym.direct_dep, Expr::yes()).or(dep.clone());
    } else {
      sym.defined = true;
      sym.direct_dep = dep.clone();
      kconfig.order.push(id);
    }

    match (pending.kind, sym.kind) {
      (Some(kind), SymbolType::Unknown) => sym.kind = kind,
      (Some(kind), existing) if kind != existing => {
        warn!(symbol = %sym.name, first = %existing, second = %kind, "conflicting symbol types, keeping the first");
      }
      (None, SymbolType::Unknown) => {
        warn!(symbol = %sym.name, "symbol defined without a type");
      }
      _ => {}
    }

    if sym.prompt.is_none()
      && let Some(prompt) = pending.prompt
    {
      sym.prompt = Some(Conditional::new(prompt.value, prompt.cond.and(dep.clone())));
    }

    for default in pending.defaults {
      sym.defaults.push(Conditional::new(default.value, default.cond.and(dep.clone())));
    }

    sym.implies.extend(pending.implies.iter().cloned());

    if let Some(choice) = choice {
      sym.choice = Some(choice);
      let members = &mut kconfig.choices[choice.0].members;
      if !members.contains(&id) {
        members.push(id);
      }
    }

    for select in pending.selects {
      kconfig.symbols[select.value.0]
        .rev_deps
        .push(Conditional::new(id, select.cond));
    }
    for imply in pending.implies.into_iter().filter(|imply| !imply.negated) {
      kconfig.symbols[imply.target.0]
        .weak_rev_deps
        .push(Conditional::new(id, imply.cond));
    }
  }
}

fn is_ignored_attribute(keyword: &str) -> bool {
  matches!(
    keyword,
    "range" | "option" | "modules" | "optional" | "visible" | "transitional" | "defconfig_list" | "allnoconfig_y" | "env"
  )
}

fn type_keyword(keyword: &str) -> SymbolType {
  match keyword {
    "bool" | "boolean" => SymbolType::Bool,
    "tristate" => SymbolType::Tristate,
    "string" => SymbolType::String,
    "int" => SymbolType::Int,
    _ => SymbolType::Hex,
  }
}

fn symbol_name<'a>(rest: &'a str, loc: Loc<'_>) -> Result<&'a str, KconfigError> {
  let name = rest.trim();
  if name.is_empty() || !name.chars().all(is_symbol_char) {
    return Err(loc.error(format!("invalid symbol name '{}'", name)));
  }
  Ok(name)
}

fn parse_in(kconfig: &mut Kconfig, text: &str, loc: Loc<'_>) -> Result<Expr, KconfigError> {
  parse_expr(text, |name| kconfig.intern(name)).map_err(|e| loc.error(format!("invalid expression '{}': {}", text, e)))
}

/// `on EXPR` after the `depends` keyword.
fn parse_depends(kconfig: &mut Kconfig, rest: &str, loc: Loc<'_>) -> Result<Expr, KconfigError> {
  match split_keyword(rest.trim()) {
    ("on", expr) => parse_in(kconfig, expr, loc),
    _ => Err(loc.error("expected 'depends on'")),
  }
}

/// `VALUE [if COND]`.
fn parse_conditional(kconfig: &mut Kconfig, rest: &str, loc: Loc<'_>) -> Result<(Expr, Expr), KconfigError> {
  let (value, cond) = split_if(rest);
  let value = parse_in(kconfig, value, loc)?;
  let cond = match cond {
    Some(cond) => parse_in(kconfig, cond, loc)?,
    None => Expr::yes(),
  };
  Ok((value, cond))
}

/// `[!]SYMBOL [if COND]` for `select`, `imply` and choice defaults.
fn parse_relation(kconfig: &mut Kconfig, rest: &str, loc: Loc<'_>) -> Result<(SymbolId, bool, Expr), KconfigError> {
  let (target, cond) = split_if(rest);
  let (negated, name) = match target.strip_prefix('!') {
    Some(name) => (true, name.trim()),
    None => (false, target),
  };
  let target = kconfig.intern(symbol_name(name, loc)?);
  let cond = match cond {
    Some(cond) => parse_in(kconfig, cond, loc)?,
    None => Expr::yes(),
  };
  Ok((target, negated, cond))
}

fn parse_prompt(kconfig: &mut Kconfig, rest: &str, loc: Loc<'_>) -> Result<Conditional<String>, KconfigError> {
  let (text, remainder) = quoted(rest).ok_or_else(|| loc.error("expected a quoted prompt"))?;
  let cond = match split_keyword(remainder.trim()) {
    ("", _) => Expr::yes(),
    ("if", cond) => parse_in(kconfig, cond, loc)?,
    (other, _) => return Err(loc.error(format!("unexpected '{}' after prompt", other))),
  };
  Ok(Conditional::new(text, cond))
}

fn parse_prompt_text(rest: &str, loc: Loc<'_>) -> Result<String, KconfigError> {
  quoted(rest)
    .map(|(text, _)| text)
    .ok_or_else(|| loc.error("expected a quoted prompt"))
}

/// Parse a leading quoted string, returning it and the remaining input.
fn quoted(input: &str) -> Option<(String, &str)> {
  let input = input.trim_start();
  let quote = input.chars().next().filter(|c| *c == '"' || *c == '\'')?;
  let mut text = String::new();
  let mut escaped = false;
  for (pos, c) in input.char_indices().skip(1) {
    if escaped {
      text.push(c);
      escaped = false;
    } else if c == '\\' {
      escaped = true;
    } else if c == quote {
      return Some((text, &input[pos + c.len_utf8()..]));
    } else {
      text.push(c);
    }
  }
  None
}

/// Split `VALUE if COND` at the first `if` word outside quotes.
fn split_if(input: &str) -> (&str, Option<&str>) {
  let bytes = input.as_bytes();
  let mut quote: Option<u8> = None;
  for (i, &b) in bytes.iter().enumerate() {
    match quote {
      Some(q) if b == q => quote = None,
      Some(_) => {}
      None if b == b'"' || b == b'\'' => quote = Some(b),
      None => {
        let word_start = i == 0 || bytes[i - 1].is_ascii_whitespace() || bytes[i - 1] == b')';
        let is_if = bytes[i..].starts_with(b"if")
          && bytes.get(i + 2).is_none_or(|c| c.is_ascii_whitespace() || *c == b'(' || *c == b'!');
        if word_start && is_if && i > 0 {
          return (input[..i].trim(), Some(input[i + 2..].trim()));
        }
      }
    }
  }
  (input.trim(), None)
}

fn split_keyword(content: &str) -> (&str, &str) {
  match content.find(char::is_whitespace) {
    Some(pos) => (&content[..pos], content[pos..].trim_start()),
    None => (content, ""),
  }
}

/// Remove a trailing `#` comment that is not inside quotes.
fn strip_comment(line: &str) -> &str {
  let mut quote: Option<char> = None;
  for (pos, c) in line.char_indices() {
    match quote {
      Some(q) if c == q => quote = None,
      Some(_) => {}
      None if c == '"' || c == '\'' => quote = Some(c),
      None if c == '#' => return &line[..pos],
      None => {}
    }
  }
  line
}

/// Column of the first non-blank character, with tabs at 8-column stops.
fn indentation(line: &str) -> usize {
  let mut column = 0;
  for c in line.chars() {
    match c {
      ' ' => column += 1,
      '\t' => column = (column / 8 + 1) * 8,
      _ => break,
    }
  }
  column
}
