#![cfg(unix)]

use kselect_lib::consts::SOURCE_ROOT_ENV;
use kselect_lib::discovery::DiscoveryError;
use kselect_lib::finalize::FinalizeError;
use kselect_lib::packages::PackageListError;
use kselect_lib::pipeline::{Paths, PipelineError, apply, resolve_packages};
use kselect_lib::resolve::ResolveError;
use kselect_lib::settings::{Settings, SettingsError};
use serial_test::serial;

use super::common::Tree;

#[test]
fn apply_writes_requested_symbol() {
  let tree = Tree::new();
  tree.write("packages", "libubox\n");

  let result = apply(&tree.settings()).unwrap();
  assert_eq!(result.report.enabled, vec!["PACKAGE_libubox"]);
  assert_eq!(result.paths.config, tree.config_path());

  let config = tree.read_config();
  assert!(config.contains("CONFIG_PACKAGE_libubox=y\n"));
  assert!(config.contains("# CONFIG_PACKAGE_ubus is not set\n"));
  assert!(config.contains("CONFIG_PACKAGE_busybox=y\n"));
}

#[test]
fn apply_enables_dependencies() {
  let tree = Tree::new();
  tree.write("packages", "# web\nCONFIG_PACKAGE_uhttpd\n");

  let result = apply(&tree.settings()).unwrap();
  assert_eq!(result.report.forced, vec!["PACKAGE_ubus", "PACKAGE_libubox"]);

  let config = tree.read_config();
  for name in ["PACKAGE_uhttpd", "PACKAGE_ubus", "PACKAGE_libubox"] {
    assert!(config.contains(&format!("CONFIG_{}=y\n", name)), "{} missing", name);
  }
}

#[test]
fn existing_configuration_is_loaded_first() {
  let tree = Tree::new();
  tree.write("src/.config", "CONFIG_PACKAGE_libubox=y\n# CONFIG_PACKAGE_dnsmasq is not set\n");
  tree.write("packages", "ubus\n");

  let result = apply(&tree.settings()).unwrap();
  assert!(result.report.forced.is_empty());

  let config = tree.read_config();
  assert!(config.contains("CONFIG_PACKAGE_ubus=y\n"));
  assert!(config.contains("# CONFIG_PACKAGE_dnsmasq is not set\n"));
}

#[test]
fn finalize_runs_in_source_root() {
  let tree = Tree::new();
  tree.write("packages", "libubox\n");
  let settings = Settings {
    finalize_command: vec!["touch".to_string(), "finalized".to_string()],
    ..tree.settings()
  };

  apply(&settings).unwrap();
  assert!(tree.source_root().join("finalized").exists());
}

#[test]
fn failing_finalize_is_fatal_after_write() {
  let tree = Tree::new();
  tree.write("packages", "libubox\n");
  let settings = Settings {
    finalize_command: vec!["sh".to_string(), "-c".to_string(), "exit 2".to_string()],
    ..tree.settings()
  };

  let err = apply(&settings).unwrap_err();
  assert!(matches!(
    err,
    PipelineError::Finalize(FinalizeError::CmdFailed { code: Some(2), .. })
  ));
  assert!(tree.read_config().contains("CONFIG_PACKAGE_libubox=y\n"));
}

#[test]
fn unknown_package_writes_nothing() {
  let tree = Tree::new();
  tree.write("packages", "libubox\nnot-a-package\n");

  let err = apply(&tree.settings()).unwrap_err();
  assert!(matches!(err, PipelineError::Resolve(ResolveError::UnknownSymbol(_))));
  assert!(!tree.config_path().exists());
}

#[test]
fn missing_package_list_writes_nothing() {
  let tree = Tree::new();

  let err = apply(&tree.settings()).unwrap_err();
  assert!(matches!(err, PipelineError::Packages(PackageListError::NotFound(_))));
  assert!(!tree.config_path().exists());
}

#[test]
fn missing_schema_writes_nothing() {
  let tree = Tree::empty();
  tree.write("packages", "libubox\n");

  let err = apply(&tree.settings()).unwrap_err();
  assert!(matches!(err, PipelineError::Discovery(DiscoveryError::NotFound { .. })));
  assert!(!tree.config_path().exists());
}

#[test]
fn schema_is_found_by_search() {
  let tree = Tree::empty();
  tree.write("src/scripts/config/Config.in", "config PACKAGE_solo\n\tbool \"solo\"\n");
  tree.write("packages", "solo\n");

  let resolution = resolve_packages(&tree.settings()).unwrap();
  assert!(resolution.paths.schema.ends_with("scripts/config/Config.in"));
  assert_eq!(resolution.report.enabled, vec!["PACKAGE_solo"]);
}

#[test]
fn resolve_packages_writes_nothing() {
  let tree = Tree::new();
  tree.write("packages", "uhttpd\n");
  let settings = Settings {
    finalize_command: vec!["touch".to_string(), "finalized".to_string()],
    ..tree.settings()
  };

  let resolution = resolve_packages(&settings).unwrap();
  assert_eq!(resolution.targets, vec!["PACKAGE_uhttpd"]);
  assert_eq!(resolution.report.enabled, vec!["PACKAGE_uhttpd"]);
  assert!(!tree.config_path().exists());
  assert!(!tree.source_root().join("finalized").exists());
}

#[test]
#[serial]
fn source_root_from_environment() {
  let tree = Tree::new();
  tree.write("packages", "libubox\n");
  let settings = Settings {
    source_root: None,
    ..tree.settings()
  };

  temp_env::with_var(SOURCE_ROOT_ENV, Some(tree.source_root()), || {
    let paths = Paths::resolve(&settings).unwrap();
    assert_eq!(paths.source_root, tree.source_root());
    assert_eq!(paths.schema, tree.source_root().join("Config.in"));
    apply(&settings).unwrap();
  });
  assert!(tree.config_path().exists());
}

#[test]
#[serial]
fn missing_source_root_writes_nothing() {
  let tree = Tree::new();
  tree.write("packages", "libubox\n");
  let settings = Settings {
    source_root: None,
    ..tree.settings()
  };

  temp_env::with_var(SOURCE_ROOT_ENV, None::<&str>, || {
    let err = apply(&settings).unwrap_err();
    assert!(matches!(err, PipelineError::Settings(SettingsError::MissingSourceRoot)));
  });
  assert!(!tree.config_path().exists());
}
