//! Reconcile command integration tests.

use predicates::prelude::*;

use super::common::{TestEnv, fixture_content};

#[test]
fn reconcile_after_init_has_nothing_to_update() {
  let env = TestEnv::initialized("wordpress.yaml", &["prod"]);

  env
    .stagehand_cmd()
    .arg("reconcile")
    .assert()
    .success()
    .stdout(predicate::str::contains("environment dev"))
    .stdout(predicate::str::contains("environment prod"))
    .stdout(predicate::str::contains("nothing to update"));
}

#[test]
fn reconcile_picks_up_new_service() {
  let env = TestEnv::initialized("minimal.yaml", &["prod"]);

  let mut compose = fixture_content("minimal.yaml");
  compose.push_str("  worker:\n    image: busybox\n");
  env.write_file("docker-compose.yaml", &compose);

  env
    .stagehand_cmd()
    .arg("reconcile")
    .assert()
    .success()
    .stdout(predicate::str::contains("service worker added"));

  for name in ["dev", "prod"] {
    let doc = env.override_doc(name);
    assert_eq!(
      doc["services"]["worker"]["labels"]["service.type"].as_str(),
      Some("none"),
      "worker in {name}"
    );
  }
}

#[test]
fn reconcile_keeps_tuned_values() {
  let env = TestEnv::initialized("minimal.yaml", &[]);

  env.set_service_label("dev", "web", "workload.cpu", "0.5");

  env.stagehand_cmd().arg("reconcile").assert().success();

  let doc = env.override_doc("dev");
  assert_eq!(doc["services"]["web"]["labels"]["workload.cpu"].as_str(), Some("0.5"));
}

#[test]
fn reconcile_dry_run_writes_nothing() {
  let env = TestEnv::initialized("minimal.yaml", &[]);
  let before = env.read_file("docker-compose.env.dev.yaml");

  let mut compose = fixture_content("minimal.yaml");
  compose.push_str("  worker:\n    image: busybox\n");
  env.write_file("docker-compose.yaml", &compose);

  env
    .stagehand_cmd()
    .args(["reconcile", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains("service worker added"))
    .stdout(predicate::str::contains("Dry run"));

  assert_eq!(env.read_file("docker-compose.env.dev.yaml"), before);
}

#[test]
fn reconcile_only_selected_environment() {
  let env = TestEnv::initialized("minimal.yaml", &["prod"]);
  let prod_before = env.read_file("docker-compose.env.prod.yaml");

  let mut compose = fixture_content("minimal.yaml");
  compose.push_str("  worker:\n    image: busybox\n");
  env.write_file("docker-compose.yaml", &compose);

  env.stagehand_cmd().args(["reconcile", "-e", "dev"]).assert().success();

  assert!(env.override_doc("dev")["services"]["worker"].is_mapping());
  assert_eq!(env.read_file("docker-compose.env.prod.yaml"), prod_before);
}

#[test]
fn reconcile_unknown_environment_fails() {
  let env = TestEnv::initialized("minimal.yaml", &[]);

  env
    .stagehand_cmd()
    .args(["reconcile", "-e", "qa"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("qa"));
}

#[test]
fn reconcile_invalid_override_fails_that_environment_only() {
  let env = TestEnv::initialized("minimal.yaml", &["prod"]);

  env.set_service_label("prod", "web", "workload.cpu", "lots");
  let broken = env.read_file("docker-compose.env.prod.yaml");

  let mut compose = fixture_content("minimal.yaml");
  compose.push_str("  worker:\n    image: busybox\n");
  env.write_file("docker-compose.yaml", &compose);

  env
    .stagehand_cmd()
    .arg("reconcile")
    .assert()
    .failure()
    .stderr(predicate::str::contains("prod"));

  assert!(env.override_doc("dev")["services"]["worker"].is_mapping());
  assert_eq!(env.read_file("docker-compose.env.prod.yaml"), broken);
}

#[test]
fn reconcile_reports_json() {
  let env = TestEnv::initialized("minimal.yaml", &[]);

  let output = env.stagehand_cmd().args(["-o", "json", "reconcile"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["report"]["environments"][0]["environment"], "dev");
  assert!(json["written"].as_array().unwrap().is_empty());
}
