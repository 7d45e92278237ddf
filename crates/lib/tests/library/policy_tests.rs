//! Derived parameters follow the source, tunable ones belong to the operator.

use stagehand_lib::report::{ChangeKind, Subject};

use super::common::{Project, WORDPRESS};

#[test]
fn tuned_value_survives_reconcile() {
  let project = Project::init(WORDPRESS, &["prod"]);
  project.edit_overrides("prod", |doc| {
    doc.services["wordpress"]
      .labels
      .insert("workload.cpu".to_string(), "0.5".to_string());
  });
  project.set_compose(&WORDPRESS.replace("\"3.7\"", "\"3.8\""));

  project.reconcile(&[]);

  assert_eq!(project.overrides("prod").services["wordpress"].labels["workload.cpu"], "0.5");
  assert_eq!(project.overrides("dev").services["wordpress"].labels["workload.cpu"], "0.1");
}

#[test]
fn tuned_value_survives_unrelated_service_addition() {
  let project = Project::init(WORDPRESS, &["prod"]);
  project.edit_overrides("prod", |doc| {
    doc.services["wordpress"]
      .labels
      .insert("workload.cpu".to_string(), "0.5".to_string());
  });
  project.set_compose(&WORDPRESS.replace(
    "volumes:\n  db_data: {}\n",
    "  cache:\n    image: redis\nvolumes:\n  db_data: {}\n",
  ));

  let (outcome, _, text) = project.reconcile(&[]);

  assert!(text.contains("service cache added"));
  let report = outcome.report.environment("prod").unwrap();
  assert!(
    !report
      .changes
      .iter()
      .any(|c| matches!(&c.subject, Subject::Parameter { key, .. } if key == "workload.cpu"))
  );
  let doc = project.overrides("prod");
  assert_eq!(doc.services["wordpress"].labels["workload.cpu"], "0.5");
  assert_eq!(doc.services["cache"].labels["workload.cpu"], "0.1");
}

#[test]
fn derived_value_is_overwritten() {
  let project = Project::init(WORDPRESS, &["prod"]);
  project.edit_overrides("prod", |doc| {
    doc.services["wordpress"]
      .labels
      .insert("service.type".to_string(), "LoadBalancer".to_string());
  });
  project.set_compose(&WORDPRESS.replace(
    "      - \"8000:80\"\n",
    "      - target: 80\n        published: 8000\n        mode: host\n",
  ));

  let (outcome, _, text) = project.reconcile(&["prod"]);

  let report = outcome.report.environment("prod").unwrap();
  let change = report
    .changes
    .iter()
    .find(|c| matches!(&c.subject, Subject::Parameter { key, .. } if key == "service.type"))
    .unwrap();
  assert_eq!(change.kind, ChangeKind::Updated);
  assert_eq!(change.old.as_deref(), Some("LoadBalancer"));
  assert_eq!(change.new.as_deref(), Some("NodePort"));
  assert!(text.contains("service wordpress: service.type updated from LoadBalancer to NodePort"));
  assert_eq!(project.overrides("prod").services["wordpress"].labels["service.type"], "NodePort");
}

#[test]
fn removed_tunable_is_restored_with_default() {
  let project = Project::init(WORDPRESS, &[]);
  project.edit_overrides("dev", |doc| {
    doc.services["db"].labels.shift_remove("workload.max-memory");
  });

  let (_, _, text) = project.reconcile(&[]);

  assert!(text.contains("service db: workload.max-memory added (500Mi)"));
  assert_eq!(project.overrides("dev").services["db"].labels["workload.max-memory"], "500Mi");
}

#[test]
fn keys_outside_the_catalog_are_left_alone() {
  let project = Project::init(WORDPRESS, &[]);
  project.edit_overrides("dev", |doc| {
    doc.services["db"]
      .labels
      .insert("team.owner".to_string(), "storage".to_string());
  });

  let (outcome, written, _) = project.reconcile(&[]);

  assert!(outcome.report.is_empty());
  assert!(written.is_empty());
  assert_eq!(project.overrides("dev").services["db"].labels["team.owner"], "storage");
}

#[test]
fn explicit_source_value_wins_over_inference() {
  let project = Project::init(WORDPRESS, &[]);
  project.set_compose(&WORDPRESS.replace(
    "    image: wordpress:latest\n",
    "    image: wordpress:latest\n    x-stagehand:\n      workload.replicas: 3\n",
  ));

  project.reconcile(&[]);

  // Replicas are tunable: the stored value stays until the operator drops it.
  assert_eq!(project.overrides("dev").services["wordpress"].labels["workload.replicas"], "1");

  project.edit_overrides("dev", |doc| {
    doc.services["wordpress"].labels.shift_remove("workload.replicas");
  });
  project.reconcile(&[]);
  assert_eq!(project.overrides("dev").services["wordpress"].labels["workload.replicas"], "3");
}

#[test]
fn statefulset_for_persistent_mounts() {
  let project = Project::init(WORDPRESS, &[]);

  let doc = project.overrides("dev");
  assert_eq!(doc.services["db"].labels["workload.type"], "StatefulSet");
  assert_eq!(doc.services["wordpress"].labels["workload.type"], "Deployment");
  assert_eq!(doc.services["db"].labels["service.type"], "none");
}
