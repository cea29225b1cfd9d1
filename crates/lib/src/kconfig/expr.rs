//! Kconfig expressions.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr    := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" unary | primary
//! primary := "(" expr ")" | operand ( cmp operand )?
//! cmp     := "=" | "!=" | "<" | "<=" | ">" | ">="
//! ```
//!
//! Symbol names are interned through a caller-supplied closure, so an
//! expression can reference symbols that are defined later in the tree.

use thiserror::Error;

use super::types::{SymbolId, Tristate};

/// A parsed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
  /// `y`, `m` or `n`.
  Const(Tristate),
  /// A literal that is not a tri-state constant: a quoted string or a number.
  Text(String),
  Symbol(SymbolId),
  Not(Box<Expr>),
  And(Box<Expr>, Box<Expr>),
  Or(Box<Expr>, Box<Expr>),
  Compare { op: CompareOp, lhs: Operand, rhs: Operand },
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
  Symbol(SymbolId),
  Literal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
  Eq,
  Ne,
  Lt,
  Le,
  Gt,
  Ge,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
  #[error("empty expression")]
  Empty,

  #[error("unterminated string literal")]
  UnterminatedString,

  #[error("unexpected character '{0}'")]
  UnexpectedChar(char),

  #[error("unexpected token '{0}'")]
  UnexpectedToken(String),

  #[error("unexpected end of expression")]
  UnexpectedEnd,
}

impl Expr {
  pub fn yes() -> Self {
    Expr::Const(Tristate::Yes)
  }

  /// Logical AND, folding away constant `y` operands.
  pub fn and(self, other: Expr) -> Expr {
    match (self, other) {
      (Expr::Const(Tristate::Yes), e) | (e, Expr::Const(Tristate::Yes)) => e,
      (Expr::Const(Tristate::No), _) | (_, Expr::Const(Tristate::No)) => Expr::Const(Tristate::No),
      (a, b) => Expr::And(Box::new(a), Box::new(b)),
    }
  }

  /// Logical OR, folding away constant `n` operands.
  pub fn or(self, other: Expr) -> Expr {
    match (self, other) {
      (Expr::Const(Tristate::No), e) | (e, Expr::Const(Tristate::No)) => e,
      (Expr::Const(Tristate::Yes), _) | (_, Expr::Const(Tristate::Yes)) => Expr::yes(),
      (a, b) => Expr::Or(Box::new(a), Box::new(b)),
    }
  }

  pub fn is_const_yes(&self) -> bool {
    matches!(self, Expr::Const(Tristate::Yes))
  }

  /// Every symbol referenced anywhere in the expression.
  pub fn symbols(&self) -> Vec<SymbolId> {
    let mut out = Vec::new();
    self.collect(&mut out, None);
    out
  }

  /// Symbols whose enablement helps satisfy the expression.
  ///
  /// A plain reference counts when it sits under an even number of `!`.
  /// Comparisons count when they test a symbol against `y`/`m` (`FOO=y`)
  /// or against `n` with `!=`.
  pub fn positive_symbols(&self) -> Vec<SymbolId> {
    let mut out = Vec::new();
    self.collect(&mut out, Some(true));
    out
  }

  fn collect(&self, out: &mut Vec<SymbolId>, polarity: Option<bool>) {
    match self {
      Expr::Const(_) | Expr::Text(_) => {}
      Expr::Symbol(id) => {
        if polarity != Some(false) && !out.contains(id) {
          out.push(*id);
        }
      }
      Expr::Not(inner) => inner.collect(out, polarity.map(|p| !p)),
      Expr::And(a, b) | Expr::Or(a, b) => {
        a.collect(out, polarity);
        b.collect(out, polarity);
      }
      Expr::Compare { op, lhs, rhs } => {
        let wanted = match polarity {
          None => true,
          Some(positive) => compare_enables(*op, lhs, rhs) == Some(positive),
        };
        if !wanted {
          return;
        }
        for operand in [lhs, rhs] {
          if let Operand::Symbol(id) = operand
            && !out.contains(id)
          {
            out.push(*id);
          }
        }
      }
    }
  }
}

/// Whether a comparison is satisfied by enabling its symbol side.
fn compare_enables(op: CompareOp, lhs: &Operand, rhs: &Operand) -> Option<bool> {
  let literal = match (lhs, rhs) {
    (Operand::Symbol(_), Operand::Literal(l)) | (Operand::Literal(l), Operand::Symbol(_)) => l.as_str(),
    _ => return None,
  };
  match (op, literal) {
    (CompareOp::Eq, "y" | "m") | (CompareOp::Ne, "n") => Some(true),
    (CompareOp::Eq, "n") | (CompareOp::Ne, "y" | "m") => Some(false),
    _ => None,
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
  Word(String),
  Str(String),
  Not,
  And,
  Or,
  Cmp(CompareOp),
  LParen,
  RParen,
}

impl Token {
  fn describe(&self) -> String {
    match self {
      Token::Word(w) => w.clone(),
      Token::Str(s) => format!("\"{}\"", s),
      Token::Not => "!".to_string(),
      Token::And => "&&".to_string(),
      Token::Or => "||".to_string(),
      Token::Cmp(_) => "comparison".to_string(),
      Token::LParen => "(".to_string(),
      Token::RParen => ")".to_string(),
    }
  }
}

/// Characters allowed in symbol names. OpenWrt package symbols carry `-`,
/// `.` and `+` (e.g. `PACKAGE_kmod-usb-core`, `PACKAGE_libstdcpp`).
pub(crate) fn is_symbol_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+' | '/')
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
  let mut tokens = Vec::new();
  let mut chars = input.chars().peekable();

  while let Some(&c) = chars.peek() {
    match c {
      c if c.is_whitespace() => {
        chars.next();
      }
      '"' | '\'' => {
        chars.next();
        let mut text = String::new();
        let mut closed = false;
        while let Some(ch) = chars.next() {
          match ch {
            '\\' => {
              if let Some(escaped) = chars.next() {
                text.push(escaped);
              }
            }
            ch if ch == c => {
              closed = true;
              break;
            }
            ch => text.push(ch),
          }
        }
        if !closed {
          return Err(ExprError::UnterminatedString);
        }
        tokens.push(Token::Str(text));
      }
      '!' => {
        chars.next();
        if chars.peek() == Some(&'=') {
          chars.next();
          tokens.push(Token::Cmp(CompareOp::Ne));
        } else {
          tokens.push(Token::Not);
        }
      }
      '&' => {
        chars.next();
        if chars.next() != Some('&') {
          return Err(ExprError::UnexpectedChar('&'));
        }
        tokens.push(Token::And);
      }
      '|' => {
        chars.next();
        if chars.next() != Some('|') {
          return Err(ExprError::UnexpectedChar('|'));
        }
        tokens.push(Token::Or);
      }
      '=' => {
        chars.next();
        tokens.push(Token::Cmp(CompareOp::Eq));
      }
      '<' | '>' => {
        chars.next();
        let or_equal = chars.peek() == Some(&'=');
        if or_equal {
          chars.next();
        }
        let op = match (c, or_equal) {
          ('<', false) => CompareOp::Lt,
          ('<', true) => CompareOp::Le,
          ('>', false) => CompareOp::Gt,
          _ => CompareOp::Ge,
        };
        tokens.push(Token::Cmp(op));
      }
      '(' => {
        chars.next();
        tokens.push(Token::LParen);
      }
      ')' => {
        chars.next();
        tokens.push(Token::RParen);
      }
      c if is_symbol_char(c) => {
        let mut word = String::new();
        while let Some(&ch) = chars.peek() {
          if !is_symbol_char(ch) {
            break;
          }
          word.push(ch);
          chars.next();
        }
        tokens.push(Token::Word(word));
      }
      other => return Err(ExprError::UnexpectedChar(other)),
    }
  }

  Ok(tokens)
}

/// Whether a bare word is a literal rather than a symbol reference.
fn is_numeric_literal(word: &str) -> bool {
  let digits = word
    .strip_prefix("0x")
    .or_else(|| word.strip_prefix("0X"))
    .map(|hex| !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()));
  match digits {
    Some(is_hex) => is_hex,
    None => {
      let unsigned = word.strip_prefix('-').unwrap_or(word);
      !unsigned.is_empty() && unsigned.chars().all(|c| c.is_ascii_digit())
    }
  }
}

struct ExprParser<'t, F> {
  tokens: &'t [Token],
  pos: usize,
  intern: F,
}

impl<F> ExprParser<'_, F>
where
  F: FnMut(&str) -> SymbolId,
{
  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn advance(&mut self) -> Option<Token> {
    let token = self.tokens.get(self.pos).cloned();
    if token.is_some() {
      self.pos += 1;
    }
    token
  }

  fn parse_or(&mut self) -> Result<Expr, ExprError> {
    let mut expr = self.parse_and()?;
    while self.peek() == Some(&Token::Or) {
      self.advance();
      let rhs = self.parse_and()?;
      expr = Expr::Or(Box::new(expr), Box::new(rhs));
    }
    Ok(expr)
  }

  fn parse_and(&mut self) -> Result<Expr, ExprError> {
    let mut expr = self.parse_unary()?;
    while self.peek() == Some(&Token::And) {
      self.advance();
      let rhs = self.parse_unary()?;
      expr = Expr::And(Box::new(expr), Box::new(rhs));
    }
    Ok(expr)
  }

  fn parse_unary(&mut self) -> Result<Expr, ExprError> {
    if self.peek() == Some(&Token::Not) {
      self.advance();
      let inner = self.parse_unary()?;
      return Ok(Expr::Not(Box::new(inner)));
    }
    self.parse_primary()
  }

  fn parse_primary(&mut self) -> Result<Expr, ExprError> {
    match self.advance() {
      Some(Token::LParen) => {
        let inner = self.parse_or()?;
        match self.advance() {
          Some(Token::RParen) => Ok(inner),
          Some(other) => Err(ExprError::UnexpectedToken(other.describe())),
          None => Err(ExprError::UnexpectedEnd),
        }
      }
      Some(token @ (Token::Word(_) | Token::Str(_))) => {
        let lhs = self.operand(token);
        if let Some(Token::Cmp(op)) = self.peek().cloned() {
          self.advance();
          let rhs = match self.advance() {
            Some(token @ (Token::Word(_) | Token::Str(_))) => self.operand(token),
            Some(other) => return Err(ExprError::UnexpectedToken(other.describe())),
            None => return Err(ExprError::UnexpectedEnd),
          };
          return Ok(Expr::Compare { op, lhs, rhs });
        }
        Ok(match lhs {
          Operand::Symbol(id) => Expr::Symbol(id),
          Operand::Literal(text) => match Tristate::parse(&text) {
            Some(t) => Expr::Const(t),
            None => Expr::Text(text),
          },
        })
      }
      Some(other) => Err(ExprError::UnexpectedToken(other.describe())),
      None => Err(ExprError::UnexpectedEnd),
    }
  }

  fn operand(&mut self, token: Token) -> Operand {
    match token {
      Token::Str(text) => Operand::Literal(text),
      Token::Word(word) if Tristate::parse(&word).is_some() || is_numeric_literal(&word) => Operand::Literal(word),
      Token::Word(word) => Operand::Symbol((self.intern)(&word)),
      _ => unreachable!("operand called with a non-operand token"),
    }
  }
}

/// Parse an expression, interning every referenced symbol name.
pub fn parse_expr<F>(input: &str, intern: F) -> Result<Expr, ExprError>
where
  F: FnMut(&str) -> SymbolId,
{
  let tokens = tokenize(input)?;
  if tokens.is_empty() {
    return Err(ExprError::Empty);
  }

  let mut parser = ExprParser {
    tokens: &tokens,
    pos: 0,
    intern,
  };
  let expr = parser.parse_or()?;

  match parser.advance() {
    None => Ok(expr),
    Some(extra) => Err(ExprError::UnexpectedToken(extra.describe())),
  }
}
