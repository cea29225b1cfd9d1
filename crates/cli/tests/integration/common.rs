//! Shared test helpers for CLI integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture directory.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

fn copy_tree(from: &Path, to: &Path) {
  fs::create_dir_all(to).unwrap();
  for entry in fs::read_dir(from).unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", from.display(), e)) {
    let entry = entry.unwrap();
    let target = to.join(entry.file_name());
    if entry.file_type().unwrap().is_dir() {
      copy_tree(&entry.path(), &target);
    } else {
      fs::copy(entry.path(), &target).unwrap();
    }
  }
}

/// Isolated test environment.
///
/// The temp directory is the working directory of every command; the build
/// tree lives in its `src` subdirectory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Copy a fixture build tree into `src`.
  pub fn from_fixture(name: &str) -> Self {
    let temp = TempDir::new().unwrap();
    copy_tree(&fixture_path(name), &temp.path().join("src"));
    Self { temp }
  }

  /// An environment with an empty `src` directory.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("src")).unwrap();
    Self { temp }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }

  /// Write the package list to `./packages`.
  pub fn write_packages(&self, content: &str) {
    self.write_file("packages", content);
  }

  /// Write `./kselect.toml` with the given finalize command.
  pub fn write_settings(&self, finalize_command: &[&str]) {
    let command: Vec<String> = finalize_command.iter().map(|s| format!("\"{}\"", s)).collect();
    self.write_file("kselect.toml", &format!("finalize-command = [{}]\n", command.join(", ")));
  }

  pub fn src_path(&self) -> PathBuf {
    let p = self.temp.path().join("src");
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn config_path(&self) -> PathBuf {
    self.src_path().join(".config")
  }

  pub fn read_config(&self) -> String {
    fs::read_to_string(self.config_path()).unwrap()
  }

  /// Get a pre-configured Command for the kselect binary.
  ///
  /// Runs in the temp directory with `OPENWRT_SRC` pointing at `src`.
  /// `RUST_LOG` is cleared so log output does not depend on the caller.
  pub fn kselect_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("kselect");
    cmd.current_dir(self.temp.path());
    cmd.env("OPENWRT_SRC", self.src_path());
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
