use std::fs;
use std::path::{Path, PathBuf};

use stagehand_lib::init::{InitOptions, init};
use stagehand_lib::manifest::Manifest;
use stagehand_lib::overrides::OverrideDocument;
use stagehand_lib::reconcile::{ReconcileOptions, ReconcileOutcome, reconcile};
use stagehand_lib::report::MemoryReporter;
use tempfile::TempDir;

pub const WORDPRESS: &str = r#"
version: "3.7"
services:
  db:
    image: mysql:8
    volumes:
      - db_data:/var/lib/mysql
    environment:
      MYSQL_DATABASE: wordpress
      MYSQL_USER: wordpress
  wordpress:
    image: wordpress:latest
    ports:
      - "8000:80"
    environment:
      WORDPRESS_DB_HOST: db:3306
      WORDPRESS_DB_USER: wordpress
volumes:
  db_data: {}
"#;

pub struct Project {
  pub temp: TempDir,
}

impl Project {
  /// Write `compose` as `docker-compose.yaml` and initialize with `envs`.
  pub fn init(compose: &str, envs: &[&str]) -> Self {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("docker-compose.yaml"), compose).unwrap();
    let options = InitOptions {
      working_dir: temp.path().to_path_buf(),
      compose_files: Vec::new(),
      environments: envs.iter().map(|e| e.to_string()).collect(),
    };
    init(&options).unwrap();
    Self { temp }
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn write(&self, relative: &str, content: &str) {
    fs::write(self.root().join(relative), content).unwrap();
  }

  pub fn set_compose(&self, content: &str) {
    self.write("docker-compose.yaml", content);
  }

  pub fn override_path(&self, env: &str) -> PathBuf {
    self.root().join(format!("docker-compose.env.{env}.yaml"))
  }

  pub fn raw_override(&self, env: &str) -> String {
    fs::read_to_string(self.override_path(env)).unwrap()
  }

  pub fn overrides(&self, env: &str) -> OverrideDocument {
    OverrideDocument::load(&self.override_path(env)).unwrap()
  }

  /// Apply `edit` to an environment's document and save it.
  pub fn edit_overrides(&self, env: &str, edit: impl FnOnce(&mut OverrideDocument)) {
    let mut doc = self.overrides(env);
    edit(&mut doc);
    doc.save(&self.override_path(env)).unwrap();
  }

  pub fn manifest(&self) -> Manifest {
    Manifest::load(self.root()).unwrap()
  }

  /// Reconcile the given environments (all when empty) and persist the result.
  pub fn reconcile(&self, envs: &[&str]) -> (ReconcileOutcome, Vec<PathBuf>, String) {
    let options = ReconcileOptions {
      environments: envs.iter().map(|e| e.to_string()).collect(),
    };
    let mut reporter = MemoryReporter::new();
    let outcome = reconcile(self.root(), &options, &mut reporter).unwrap();
    let written = outcome.persist().unwrap();
    (outcome, written, reporter.text())
  }
}
