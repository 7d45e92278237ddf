//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated project directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create a project whose `docker-compose.yaml` is a fixture file.
  pub fn from_fixture(name: &str) -> Self {
    let env = Self::empty();
    env.write_file("docker-compose.yaml", &fixture_content(name));
    env
  }

  /// Create an empty project directory.
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Create a fixture project and run `init` on it with extra environments.
  pub fn initialized(name: &str, envs: &[&str]) -> Self {
    let env = Self::from_fixture(name);
    let mut cmd = env.stagehand_cmd();
    cmd.arg("init");
    for e in envs {
      cmd.arg("--env").arg(e);
    }
    cmd.assert().success();
    env
  }

  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap_or_else(|_| self.temp.path().to_path_buf())
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Read a file relative to the project root.
  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.temp.path().join(relative_path))
      .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative_path, e))
  }

  /// Override document of an environment, parsed as plain YAML.
  pub fn override_doc(&self, env: &str) -> serde_yaml::Value {
    serde_yaml::from_str(&self.read_file(&format!("docker-compose.env.{env}.yaml"))).unwrap()
  }

  /// Set a label on a service in an environment's override document.
  pub fn set_service_label(&self, env: &str, service: &str, key: &str, value: &str) {
    let mut doc = self.override_doc(env);
    doc["services"][service]["labels"][key] = serde_yaml::Value::String(value.to_string());
    self.write_file(
      &format!("docker-compose.env.{env}.yaml"),
      &serde_yaml::to_string(&doc).unwrap(),
    );
  }

  /// Get a Command for the stagehand binary pointed at this project.
  pub fn stagehand_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("stagehand");
    cmd.arg("--dir").arg(self.temp.path());
    cmd.env_remove("STAGEHAND_DIR");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
