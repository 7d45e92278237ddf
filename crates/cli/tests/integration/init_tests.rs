//! Init command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn init_writes_one_override_per_environment() {
  let env = TestEnv::from_fixture("wordpress.yaml");

  env
    .stagehand_cmd()
    .args(["init", "--env", "staging", "--env", "prod"])
    .assert()
    .success()
    .stdout(predicate::str::contains("staging"))
    .stdout(predicate::str::contains("prod"));

  for name in ["dev", "staging", "prod"] {
    let doc = env.override_doc(name);
    assert_eq!(doc["version"].as_str(), Some("3.7"), "version in {name}");
    assert_eq!(
      doc["services"]["db"]["labels"]["workload.type"].as_str(),
      Some("StatefulSet"),
      "db workload in {name}"
    );
    assert_eq!(
      doc["services"]["wordpress"]["labels"]["service.type"].as_str(),
      Some("ClusterIP")
    );
    assert!(doc["volumes"]["db_data"].is_mapping());
  }
}

#[test]
fn init_lists_environments_in_manifest() {
  let env = TestEnv::from_fixture("minimal.yaml");

  env.stagehand_cmd().args(["init", "-e", "prod"]).assert().success();

  let manifest: serde_yaml::Value = serde_yaml::from_str(&env.read_file("stagehand.yaml")).unwrap();
  let envs: Vec<_> = manifest["environments"]
    .as_mapping()
    .unwrap()
    .keys()
    .map(|k| k.as_str().unwrap().to_string())
    .collect();
  assert_eq!(envs, vec!["dev", "prod"]);
}

#[test]
fn init_warns_about_plain_text_secrets() {
  let env = TestEnv::from_fixture("wordpress.yaml");

  env
    .stagehand_cmd()
    .arg("init")
    .assert()
    .success()
    .stderr(predicate::str::contains("MYSQL_ROOT_PASSWORD"));
}

#[test]
fn init_accepts_explicit_source() {
  let env = TestEnv::empty();
  env.write_file("stack/app.yaml", &super::common::fixture_content("minimal.yaml"));

  env
    .stagehand_cmd()
    .args(["init", "--file", "stack/app.yaml"])
    .assert()
    .success();

  let manifest = env.read_file("stagehand.yaml");
  assert!(manifest.contains("stack/app.yaml"));
}

#[test]
fn init_rejects_bad_environment_name() {
  let env = TestEnv::from_fixture("minimal.yaml");

  env
    .stagehand_cmd()
    .args(["init", "--env", "no spaces"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid environment name"));
}

#[test]
fn init_reports_json() {
  let env = TestEnv::from_fixture("minimal.yaml");

  let output = env.stagehand_cmd().args(["-o", "json", "init"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["environments"][0]["name"], "dev");
  assert!(json["secrets"].as_array().unwrap().is_empty());
}
