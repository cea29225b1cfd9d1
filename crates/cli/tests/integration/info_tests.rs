//! Info command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn info_shows_resolved_paths() {
  let env = TestEnv::from_fixture("basic");

  env
    .kselect_cmd()
    .arg("info")
    .assert()
    .success()
    .stdout(
      predicate::str::contains("Source root")
        .and(predicate::str::contains("PACKAGE_"))
        .and(predicate::str::contains("make oldconfig")),
    );
}

#[test]
fn info_json() {
  let env = TestEnv::from_fixture("basic");

  let output = env
    .kselect_cmd()
    .args(["info", "--output", "json"])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();

  let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
  assert_eq!(json["source_root"], env.src_path().display().to_string());
  assert_eq!(json["schema"], env.src_path().join("Config.in").display().to_string());
  assert_eq!(json["symbol_prefix"], "PACKAGE_");
}

#[test]
fn info_honours_settings_file() {
  let env = TestEnv::from_fixture("basic");
  env.write_file(
    "custom.toml",
    "symbol-prefix = \"FEATURE_\"\nconfig-file = \"configs/router\"\n",
  );

  env
    .kselect_cmd()
    .args(["info", "--settings", "custom.toml"])
    .assert()
    .success()
    .stdout(predicate::str::contains("FEATURE_").and(predicate::str::contains("configs/router")));
}

#[test]
fn info_rejects_unknown_settings_keys() {
  let env = TestEnv::from_fixture("basic");
  env.write_file("kselect.toml", "packages = \"list\"\n");

  env
    .kselect_cmd()
    .arg("info")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load settings"));
}
