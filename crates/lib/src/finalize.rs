//! Running the finalization command (`make oldconfig` by default).

use std::io;
use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum FinalizeError {
  #[error("finalize command is empty")]
  EmptyCommand,

  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// The command ran and exited unsuccessfully. `code` is `None` when it
  /// was killed by a signal.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed { cmd: String, code: Option<i32> },
}

/// Run `command` in `cwd`, inheriting stdin/stdout/stderr.
pub fn run_finalizer(command: &[String], cwd: &Path) -> Result<(), FinalizeError> {
  let (program, args) = command.split_first().ok_or(FinalizeError::EmptyCommand)?;
  let cmd = command.join(" ");
  info!(cmd = %cmd, cwd = %cwd.display(), "running finalize command");

  let status = Command::new(program)
    .args(args)
    .current_dir(cwd)
    .status()
    .map_err(|source| FinalizeError::Spawn {
      program: program.clone(),
      source,
    })?;

  if !status.success() {
    return Err(FinalizeError::CmdFailed { cmd, code: status.code() });
  }

  debug!(cmd = %cmd, "finalize command completed");
  Ok(())
}
