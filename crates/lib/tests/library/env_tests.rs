//! Environment variable bindings.

use stagehand_lib::overrides::EnvBinding;

use super::common::{Project, WORDPRESS};

#[test]
fn undeclared_variable_is_removed() {
  let project = Project::init(WORDPRESS, &[]);
  project.set_compose(&WORDPRESS.replace("      MYSQL_USER: wordpress\n", ""));

  let (_, _, text) = project.reconcile(&[]);

  assert!(text.contains("service db: env var MYSQL_USER deleted"));
  assert!(!project.overrides("dev").services["db"].environment.contains_key("MYSQL_USER"));
}

#[test]
fn stored_binding_is_kept() {
  let project = Project::init(WORDPRESS, &["prod"]);
  project.edit_overrides("prod", |doc| {
    doc.services["db"].environment.insert(
      "MYSQL_USER".to_string(),
      EnvBinding::Secret {
        name: "db".to_string(),
        key: "user".to_string(),
      },
    );
  });
  project.set_compose(&WORDPRESS.replace(
    "version: \"3.7\"\n",
    "version: \"3.7\"\nsecrets:\n  db:\n    file: ./db.txt\n",
  ));

  let (outcome, _, _) = project.reconcile(&["prod"]);

  let report = outcome.report.environment("prod").unwrap();
  assert!(report.warnings.is_empty(), "unexpected warnings: {:?}", report.warnings);
  assert_eq!(
    project.overrides("prod").services["db"].environment["MYSQL_USER"],
    EnvBinding::Secret {
      name: "db".to_string(),
      key: "user".to_string(),
    }
  );
}

#[test]
fn dangling_reference_is_a_warning() {
  let project = Project::init(WORDPRESS, &[]);
  project.edit_overrides("dev", |doc| {
    doc.services["db"].environment.insert(
      "MYSQL_USER".to_string(),
      EnvBinding::Config {
        name: "missing".to_string(),
        key: "user".to_string(),
      },
    );
  });

  let (outcome, written, text) = project.reconcile(&[]);

  assert!(outcome.is_success());
  assert!(written.is_empty());
  let report = outcome.report.environment("dev").unwrap();
  assert_eq!(report.warnings.len(), 1);
  assert!(text.contains("missing"));
}

#[test]
fn new_variable_without_value_is_unassigned() {
  let project = Project::init(WORDPRESS, &[]);
  project.set_compose(&WORDPRESS.replace(
    "      MYSQL_USER: wordpress\n",
    "      MYSQL_USER: wordpress\n      MYSQL_PASSWORD:\n",
  ));

  let (_, _, text) = project.reconcile(&[]);

  assert!(text.contains("service db: env var MYSQL_PASSWORD added"));
  assert_eq!(
    project.overrides("dev").services["db"].environment["MYSQL_PASSWORD"],
    EnvBinding::Unassigned
  );
  assert!(project.raw_override("dev").contains("MYSQL_PASSWORD: null"));
}

#[test]
fn env_file_entries_take_precedence() {
  let project = Project::init(WORDPRESS, &[]);
  project.write("db.env", "MYSQL_DATABASE=blog\nMYSQL_HOST_TIMEOUT=30\n");
  project.set_compose(&WORDPRESS.replace(
    "    image: mysql:8\n",
    "    image: mysql:8\n    env_file: db.env\n",
  ));

  let (_, _, text) = project.reconcile(&[]);

  assert!(text.contains("service db: env var MYSQL_HOST_TIMEOUT added"));
  let doc = project.overrides("dev");
  assert_eq!(
    doc.services["db"].environment["MYSQL_HOST_TIMEOUT"],
    EnvBinding::Literal("30".to_string())
  );
  // Existing bindings are never rewritten from the source.
  assert_eq!(
    doc.services["db"].environment["MYSQL_DATABASE"],
    EnvBinding::Literal("wordpress".to_string())
  );
}

#[test]
fn plain_text_secret_is_a_warning() {
  let project = Project::init(WORDPRESS, &["prod"]);
  project.set_compose(&WORDPRESS.replace(
    "      WORDPRESS_DB_USER: wordpress\n",
    "      WORDPRESS_DB_USER: wordpress\n      API_TOKEN: abc\n",
  ));

  let (outcome, _, text) = project.reconcile(&[]);

  for env in ["dev", "prod"] {
    let report = outcome.report.environment(env).unwrap();
    assert_eq!(
      report.warnings,
      vec![format!("environment {env}: service wordpress variable API_TOKEN looks like a token")]
    );
  }
  assert!(text.contains("API_TOKEN looks like a token"));
}

#[test]
fn secret_bound_by_reference_is_not_reported() {
  let project = Project::init(WORDPRESS, &[]);
  project.edit_overrides("dev", |doc| {
    doc.services["wordpress"].environment.insert(
      "API_TOKEN".to_string(),
      EnvBinding::Secret {
        name: "api".to_string(),
        key: "token".to_string(),
      },
    );
  });
  let compose = WORDPRESS
    .replace("version: \"3.7\"\n", "version: \"3.7\"\nsecrets:\n  api:\n    file: ./api.txt\n")
    .replace(
      "      WORDPRESS_DB_USER: wordpress\n",
      "      WORDPRESS_DB_USER: wordpress\n      API_TOKEN: abc\n",
    );
  project.set_compose(&compose);

  let (outcome, _, _) = project.reconcile(&[]);

  // The source literal is still flagged; the environment binding is not.
  let warnings = &outcome.report.environment("dev").unwrap().warnings;
  assert_eq!(warnings, &vec!["source: service wordpress variable API_TOKEN looks like a token".to_string()]);
}
