//! Envs command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn envs_lists_declared_environments() {
  let env = TestEnv::initialized("minimal.yaml", &["staging"]);

  env
    .stagehand_cmd()
    .arg("envs")
    .assert()
    .success()
    .stdout(predicate::str::contains("dev"))
    .stdout(predicate::str::contains("docker-compose.env.staging.yaml"));
}

#[test]
fn envs_json_counts_entities() {
  let env = TestEnv::initialized("wordpress.yaml", &[]);

  let output = env.stagehand_cmd().args(["--output", "json", "envs"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json[0]["name"], "dev");
  assert_eq!(json[0]["services"], 2);
  assert_eq!(json[0]["volumes"], 1);
}
