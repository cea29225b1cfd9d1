//! Kconfig schema model.
//!
//! Reads the `Config.in` tree of a build tree into a symbol table, computes
//! symbol values the way the kconfig tools do, and reads/writes `.config`
//! files.

mod dotconfig;
pub mod expr;
mod parser;
pub mod schema;
pub mod types;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use expr::{CompareOp, Expr, ExprError, Operand};
pub use schema::Kconfig;
pub use types::{Choice, ChoiceId, Conditional, Imply, Symbol, SymbolId, SymbolType, Tristate, UserValue};

/// Errors raised while reading or writing Kconfig files.
#[derive(Debug, Error)]
pub enum KconfigError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Malformed Kconfig input.
  #[error("{file}:{line}: {message}")]
  Syntax { file: PathBuf, line: usize, message: String },

  #[error("{file}:{line}: sourced file not found: {path}")]
  SourceNotFound { file: PathBuf, line: usize, path: PathBuf },

  /// A file sources itself, directly or through other files.
  #[error("recursive source of {0}")]
  RecursiveSource(PathBuf),

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}
