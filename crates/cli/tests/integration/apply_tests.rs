//! Apply command integration tests.

#![cfg(unix)]

use predicates::prelude::*;

use super::common::TestEnv;

fn env_with(packages: &str) -> TestEnv {
  let env = TestEnv::from_fixture("basic");
  env.write_packages(packages);
  env.write_settings(&["true"]);
  env
}

#[test]
fn apply_writes_requested_symbol() {
  let env = env_with("libubox\n");

  env
    .kselect_cmd()
    .arg("apply")
    .assert()
    .success()
    .stdout(predicate::str::contains("Configuration written"))
    .stderr(predicate::str::contains("with warnings").not());

  let config = env.read_config();
  assert!(config.contains("CONFIG_PACKAGE_libubox=y\n"));
  assert!(config.contains("# CONFIG_PACKAGE_ubus is not set\n"));
}

#[test]
fn apply_is_the_default_command() {
  let env = env_with("libubox\n");

  env.kselect_cmd().assert().success();
  assert!(env.read_config().contains("CONFIG_PACKAGE_libubox=y\n"));
}

#[test]
fn apply_enables_dependencies() {
  let env = env_with("uhttpd\n");

  env
    .kselect_cmd()
    .arg("apply")
    .assert()
    .success()
    .stdout(predicate::str::contains("PACKAGE_ubus").and(predicate::str::contains("(dependency)")));

  let config = env.read_config();
  for name in ["PACKAGE_uhttpd", "PACKAGE_ubus", "PACKAGE_libubox"] {
    assert!(config.contains(&format!("CONFIG_{}=y\n", name)), "{} missing", name);
  }
}

#[test]
fn apply_runs_finalize_in_source_root() {
  let env = TestEnv::from_fixture("basic");
  env.write_packages("libubox\n");
  env.write_settings(&["touch", "finalized"]);

  env.kselect_cmd().arg("apply").assert().success();
  assert!(env.src_path().join("finalized").exists());
}

#[test]
fn apply_fails_when_finalize_fails() {
  let env = TestEnv::from_fixture("basic");
  env.write_packages("libubox\n");
  env.write_settings(&["false"]);

  env
    .kselect_cmd()
    .arg("apply")
    .assert()
    .failure()
    .stderr(predicate::str::contains("command failed"));

  assert!(env.read_config().contains("CONFIG_PACKAGE_libubox=y\n"));
}

#[test]
fn apply_unknown_package_fails_without_writing() {
  let env = env_with("libubox\nnope\n");

  env
    .kselect_cmd()
    .arg("apply")
    .assert()
    .failure()
    .stderr(predicate::str::contains("PACKAGE_nope"));

  assert!(!env.config_path().exists());
}

#[test]
fn apply_missing_package_list_fails_without_writing() {
  let env = TestEnv::from_fixture("basic");
  env.write_settings(&["true"]);

  env
    .kselect_cmd()
    .arg("apply")
    .assert()
    .failure()
    .stderr(predicate::str::contains("package list not found"));

  assert!(!env.config_path().exists());
}

#[test]
fn apply_missing_schema_fails_without_writing() {
  let env = TestEnv::empty();
  env.write_packages("libubox\n");
  env.write_settings(&["true"]);

  env
    .kselect_cmd()
    .arg("apply")
    .assert()
    .failure()
    .stderr(predicate::str::contains("no Config.in found"));

  assert!(!env.config_path().exists());
}

#[test]
fn apply_without_source_root_fails() {
  let env = env_with("libubox\n");

  env
    .kselect_cmd()
    .env_remove("OPENWRT_SRC")
    .arg("apply")
    .assert()
    .failure()
    .stderr(predicate::str::contains("OPENWRT_SRC"));

  assert!(!env.config_path().exists());
}

#[test]
fn src_flag_overrides_environment() {
  let env = env_with("libubox\n");
  env.write_file("elsewhere/.keep", "");

  env
    .kselect_cmd()
    .env("OPENWRT_SRC", env.temp.path().join("elsewhere"))
    .arg("--src")
    .arg(env.src_path())
    .arg("apply")
    .assert()
    .success();

  assert!(env.config_path().exists());
}

#[test]
fn packages_flag_selects_list() {
  let env = env_with("libubox\n");
  env.write_file("lists/web", "uhttpd\n");

  env
    .kselect_cmd()
    .args(["apply", "--packages", "lists/web"])
    .assert()
    .success();

  assert!(env.read_config().contains("CONFIG_PACKAGE_uhttpd=y\n"));
}

#[test]
fn choice_conflict_is_a_warning() {
  let env = env_with("libustream-openssl\nlibubox\n");

  env
    .kselect_cmd()
    .arg("apply")
    .assert()
    .success()
    .stderr(
      predicate::str::contains("skipped PACKAGE_libustream-openssl")
        .and(predicate::str::contains("Configuration written with warnings")),
    );

  let config = env.read_config();
  assert!(config.contains("CONFIG_PACKAGE_libustream-mbedtls=y\n"));
  assert!(config.contains("CONFIG_PACKAGE_libubox=y\n"));
}

#[test]
fn apply_json_output() {
  let env = env_with("dnsmasq-full\n");

  let output = env
    .kselect_cmd()
    .args(["apply", "--output", "json"])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();

  let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
  assert_eq!(json["report"]["enabled"][0], "PACKAGE_dnsmasq-full");
  assert_eq!(json["report"]["conflicts"][0]["kind"], "negated_imply");
  assert!(json["written"].as_u64().unwrap() > 0);
}
