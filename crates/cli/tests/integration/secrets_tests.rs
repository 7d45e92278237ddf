//! Detect-secrets command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn detect_secrets_flags_passwords() {
  let env = TestEnv::initialized("wordpress.yaml", &[]);

  env
    .stagehand_cmd()
    .arg("detect-secrets")
    .assert()
    .success()
    .stderr(predicate::str::contains("MYSQL_ROOT_PASSWORD"));
}

#[test]
fn detect_secrets_clean_project() {
  let env = TestEnv::initialized("minimal.yaml", &[]);

  env
    .stagehand_cmd()
    .arg("detect-secrets")
    .assert()
    .success()
    .stdout(predicate::str::contains("No plain text secrets detected"));
}

#[test]
fn detect_secrets_json_skips_unassigned_values() {
  let env = TestEnv::initialized("wordpress.yaml", &[]);

  let output = env
    .stagehand_cmd()
    .args(["-o", "json", "detect-secrets"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let variables: Vec<_> = json
    .as_array()
    .unwrap()
    .iter()
    .map(|hit| hit["variable"].as_str().unwrap().to_string())
    .collect();
  assert!(variables.contains(&"MYSQL_ROOT_PASSWORD".to_string()));
  assert!(!variables.contains(&"WORDPRESS_DB_PASSWORD".to_string()));
}
