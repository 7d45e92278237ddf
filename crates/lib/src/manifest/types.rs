//! Manifest types for stagehand.
//!
//! The manifest is the project registry: which compose files make up the
//! source, which environments exist and where each keeps its override
//! document. It lives at the project root as `stagehand.yaml`:
//!
//! ```yaml
//! compose:
//!   - docker-compose.yaml
//! environments:
//!   dev: docker-compose.env.dev.yaml
//!   prod: docker-compose.env.prod.yaml
//! deploy-loop: skaffold.yaml
//! ```
//!
//! Paths are stored relative to the project root.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::overrides::OverrideDocument;

/// On-disk shape of `stagehand.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ManifestFile {
  #[serde(default)]
  pub compose: Vec<PathBuf>,

  #[serde(default)]
  pub environments: IndexMap<String, PathBuf>,

  /// Downstream build/deploy loop configuration, if one was generated.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deploy_loop: Option<PathBuf>,
}

/// A loaded project: manifest plus every environment's override document.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
  /// Project root; every stored path is relative to it.
  pub root: PathBuf,
  pub sources: Vec<PathBuf>,
  /// Environments in declaration order.
  pub environments: Vec<Environment>,
  pub deploy_loop: Option<PathBuf>,
}

/// One deployment environment and its override document.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
  pub name: String,
  /// Override document path, relative to the project root.
  pub file: PathBuf,
  pub overrides: OverrideDocument,
}

impl Environment {
  pub fn new(name: impl Into<String>, file: impl Into<PathBuf>, overrides: OverrideDocument) -> Self {
    Self {
      name: name.into(),
      file: file.into(),
      overrides,
    }
  }
}

impl Manifest {
  pub fn new(root: impl Into<PathBuf>, sources: Vec<PathBuf>) -> Self {
    Self {
      root: root.into(),
      sources,
      environments: Vec::new(),
      deploy_loop: None,
    }
  }

  /// Absolute paths of the compose sources, in merge order.
  pub fn source_paths(&self) -> Vec<PathBuf> {
    self.sources.iter().map(|p| self.resolve(p)).collect()
  }

  /// Absolute path of an environment's override document.
  pub fn environment_path(&self, env: &Environment) -> PathBuf {
    self.resolve(&env.file)
  }

  pub fn environment(&self, name: &str) -> Option<&Environment> {
    self.environments.iter().find(|e| e.name == name)
  }

  pub fn environment_mut(&mut self, name: &str) -> Option<&mut Environment> {
    self.environments.iter_mut().find(|e| e.name == name)
  }

  /// Environment names in declaration order.
  pub fn environment_names(&self) -> Vec<&str> {
    self.environments.iter().map(|e| e.name.as_str()).collect()
  }

  pub fn to_file(&self) -> ManifestFile {
    ManifestFile {
      compose: self.sources.clone(),
      environments: self
        .environments
        .iter()
        .map(|e| (e.name.clone(), e.file.clone()))
        .collect(),
      deploy_loop: self.deploy_loop.clone(),
    }
  }

  pub(super) fn resolve(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.root.join(path)
    }
  }
}
