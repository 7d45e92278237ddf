//! Entity additions, removals and idempotence across environments.

use stagehand_lib::report::{ChangeKind, NOTHING_TO_UPDATE, Subject};

use super::common::{Project, WORDPRESS};

#[test]
fn fresh_project_is_already_reconciled() {
  let project = Project::init(WORDPRESS, &["staging", "prod"]);

  let (outcome, written, text) = project.reconcile(&[]);

  assert!(outcome.is_success());
  assert!(outcome.report.is_empty());
  assert!(written.is_empty());
  assert_eq!(text.matches(NOTHING_TO_UPDATE).count(), 3);
}

#[test]
fn second_pass_reports_nothing() {
  let project = Project::init(WORDPRESS, &["prod"]);
  project.set_compose(&WORDPRESS.replace(
    "volumes:\n  db_data: {}\n",
    "  cache:\n    image: redis\nvolumes:\n  db_data: {}\n",
  ));

  let (first, written, _) = project.reconcile(&[]);
  assert!(!first.report.is_empty());
  assert_eq!(written.len(), 2);

  let (second, written, _) = project.reconcile(&[]);
  assert!(second.report.is_empty());
  assert!(written.is_empty());
}

#[test]
fn added_service_reaches_every_environment() {
  let project = Project::init(WORDPRESS, &["staging", "prod"]);
  project.set_compose(&WORDPRESS.replace(
    "volumes:\n  db_data: {}\n",
    "  cache:\n    image: redis\nvolumes:\n  db_data: {}\n",
  ));

  let (outcome, _, text) = project.reconcile(&[]);

  for env in ["dev", "staging", "prod"] {
    let report = outcome.report.environment(env).unwrap();
    assert!(report.changes.iter().any(|c| {
      c.kind == ChangeKind::Added && matches!(&c.subject, Subject::Entity { entity } if entity.name == "cache")
    }));
    let doc = project.overrides(env);
    assert_eq!(
      doc.services.keys().collect::<Vec<_>>(),
      vec!["db", "wordpress", "cache"],
      "service order in {env}"
    );
  }
  assert!(text.contains("service cache added"));
}

#[test]
fn removed_service_and_volume_are_deleted() {
  let project = Project::init(WORDPRESS, &["prod"]);
  project.set_compose(
    r#"
version: "3.7"
services:
  wordpress:
    image: wordpress:latest
    ports:
      - "8000:80"
    environment:
      WORDPRESS_DB_HOST: db:3306
      WORDPRESS_DB_USER: wordpress
"#,
  );

  let (outcome, _, text) = project.reconcile(&[]);

  assert!(outcome.is_success());
  assert!(text.contains("service db deleted"));
  assert!(text.contains("volume db_data deleted"));
  let doc = project.overrides("prod");
  assert!(!doc.services.contains_key("db"));
  assert!(doc.volumes.is_empty());
}

#[test]
fn added_volume_gets_defaults() {
  let project = Project::init(WORDPRESS, &[]);
  project.set_compose(&format!("{WORDPRESS}  uploads: {{}}\n"));

  let (_, _, text) = project.reconcile(&[]);

  assert!(text.contains("volume uploads added"));
  let doc = project.overrides("dev");
  assert_eq!(doc.volumes["uploads"].labels["volume.size"], "100Mi");
}

#[test]
fn version_follows_the_source() {
  let project = Project::init(WORDPRESS, &["prod"]);
  project.set_compose(&WORDPRESS.replace("\"3.7\"", "\"3.9\""));

  let (_, _, text) = project.reconcile(&[]);

  assert!(text.contains("version updated from 3.7 to 3.9"));
  assert_eq!(project.overrides("dev").version, "3.9");
  assert_eq!(project.overrides("prod").version, "3.9");
}

#[test]
fn selected_environment_only() {
  let project = Project::init(WORDPRESS, &["prod"]);
  let prod_before = project.raw_override("prod");
  project.set_compose(&WORDPRESS.replace("\"3.7\"", "\"3.9\""));

  let (outcome, written, _) = project.reconcile(&["dev"]);

  assert_eq!(outcome.report.environments.len(), 1);
  let manifest = project.manifest();
  let dev = manifest.environment("dev").unwrap();
  assert_eq!(written, vec![manifest.environment_path(dev)]);
  assert_eq!(project.raw_override("prod"), prod_before);
}

#[test]
fn failing_environment_does_not_block_the_others() {
  let project = Project::init(WORDPRESS, &["staging", "prod"]);
  project.edit_overrides("staging", |doc| {
    doc.services["db"]
      .labels
      .insert("workload.memory".to_string(), "plenty".to_string());
  });
  let staging_before = project.raw_override("staging");
  project.set_compose(&WORDPRESS.replace("\"3.7\"", "\"3.9\""));

  let (outcome, written, text) = project.reconcile(&[]);

  assert!(!outcome.is_success());
  assert_eq!(outcome.failures.len(), 1);
  assert_eq!(outcome.failures[0].environment, "staging");
  assert!(outcome.report.environment("staging").unwrap().failed());
  assert_eq!(written.len(), 2);
  assert_eq!(project.raw_override("staging"), staging_before);
  assert_eq!(project.overrides("prod").version, "3.9");
  assert!(text.contains("failed:"));
}
