//! Shared helpers for library tests.

use std::path::{Path, PathBuf};

use kselect_lib::kconfig::Kconfig;
use kselect_lib::settings::Settings;
use tempfile::TempDir;

pub const ROOT_SCHEMA: &str = r#"mainmenu "Test tree"

source "package/Config.in"
"#;

pub const PACKAGE_SCHEMA: &str = r#"menu "Base system"

config PACKAGE_libc
	bool
	default y

config PACKAGE_busybox
	bool "busybox"
	default y
	select PACKAGE_libc

config PACKAGE_libubox
	bool "libubox"

config PACKAGE_ubus
	bool "ubus"
	depends on PACKAGE_libubox

config PACKAGE_uhttpd
	bool "uhttpd"
	depends on PACKAGE_ubus
	help
	  Tiny HTTP server.

endmenu

config PACKAGE_dnsmasq
	bool "dnsmasq"
	default y

config PACKAGE_dnsmasq-full
	bool "dnsmasq-full"
	imply !PACKAGE_dnsmasq

choice
	prompt "ustream SSL backend"
	default PACKAGE_libustream-mbedtls

config PACKAGE_libustream-mbedtls
	bool "mbedtls"

config PACKAGE_libustream-openssl
	bool "openssl"

endchoice

config HAS_FPU
	bool

config PACKAGE_fftw
	bool "fftw"
	depends on HAS_FPU

config TARGET_BOARD
	string "board"
	default "x86"
"#;

/// A throwaway build tree with a small package schema.
pub struct Tree {
  pub temp: TempDir,
}

impl Tree {
  pub fn new() -> Self {
    let tree = Self {
      temp: TempDir::new().unwrap(),
    };
    tree.write("src/Config.in", ROOT_SCHEMA);
    tree.write("src/package/Config.in", PACKAGE_SCHEMA);
    tree
  }

  /// A tree with no schema at all.
  pub fn empty() -> Self {
    let tree = Self {
      temp: TempDir::new().unwrap(),
    };
    std::fs::create_dir_all(tree.temp.path().join("src")).unwrap();
    tree
  }

  pub fn write(&self, relative: &str, content: &str) {
    let path = self.temp.path().join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
  }

  pub fn source_root(&self) -> PathBuf {
    let p = self.temp.path().join("src");
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn config_path(&self) -> PathBuf {
    self.source_root().join(".config")
  }

  pub fn read_config(&self) -> String {
    std::fs::read_to_string(self.config_path()).unwrap()
  }

  pub fn packages_path(&self) -> PathBuf {
    self.temp.path().join("packages")
  }

  /// Settings pointing at this tree, finalizing with `true`.
  pub fn settings(&self) -> Settings {
    Settings {
      source_root: Some(self.source_root()),
      packages_file: self.packages_path(),
      finalize_command: vec!["true".to_string()],
      ..Settings::default()
    }
  }
}

/// Load the package schema from memory.
pub fn schema() -> Kconfig {
  Kconfig::parse_str(PACKAGE_SCHEMA, Path::new(".")).unwrap()
}
