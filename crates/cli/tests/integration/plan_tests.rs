//! Plan command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

fn env_with(packages: &str) -> TestEnv {
  let env = TestEnv::from_fixture("basic");
  env.write_packages(packages);
  env.write_settings(&["touch", "finalized"]);
  env
}

#[test]
fn plan_writes_nothing() {
  let env = env_with("uhttpd\n");

  env
    .kselect_cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("PACKAGE_uhttpd").and(predicate::str::contains("Dry run")));

  assert!(!env.config_path().exists());
  assert!(!env.src_path().join("finalized").exists());
}

#[test]
fn plan_reads_existing_config() {
  let env = env_with("ubus\n");
  env.write_file("src/.config", "CONFIG_PACKAGE_libubox=y\n");

  let output = env
    .kselect_cmd()
    .args(["plan", "--output", "json"])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();

  let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
  assert_eq!(json["report"]["forced"], serde_json::json!([]));
  assert_eq!(json["targets"], serde_json::json!(["PACKAGE_ubus"]));
  assert_eq!(env.read_config(), "CONFIG_PACKAGE_libubox=y\n");
}

#[test]
fn plan_json_lists_forced_dependencies() {
  let env = env_with("uhttpd\n");

  let output = env
    .kselect_cmd()
    .args(["plan", "-o", "json"])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();

  let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
  assert_eq!(
    json["report"]["forced"],
    serde_json::json!(["PACKAGE_ubus", "PACKAGE_libubox"])
  );
  assert_eq!(json["report"]["visited"], 3);
}

#[test]
fn plan_reports_invalid_package_line() {
  let env = env_with("luci app\n");

  env
    .kselect_cmd()
    .arg("plan")
    .assert()
    .failure()
    .stderr(predicate::str::contains("contains whitespace"));
}
