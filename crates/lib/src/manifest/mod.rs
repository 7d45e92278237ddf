//! The project manifest: compose sources and declared environments.

mod types;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::MANIFEST_FILENAME;
use crate::error::ParseError;
use crate::overrides::{OverrideDocument, OverrideError};
use crate::util::fs::write_atomic;

pub use types::*;

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("no stagehand.yaml found in {}; run `stagehand init` first", root.display())]
  NotInitialized { root: PathBuf },

  #[error("failed to read manifest {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error(transparent)]
  Parse(#[from] ParseError),

  #[error(transparent)]
  Override(#[from] OverrideError),

  #[error("failed to serialize manifest {}: {source}", path.display())]
  Serialize { path: PathBuf, source: serde_yaml::Error },

  #[error("failed to write manifest {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },

  #[error("unknown environment '{name}' (declared: {})", available.join(", "))]
  UnknownEnvironment { name: String, available: Vec<String> },

  #[error("environment '{name}' is already declared")]
  DuplicateEnvironment { name: String },
}

/// Path of the manifest file for a project root.
pub fn manifest_path(root: &Path) -> PathBuf {
  root.join(MANIFEST_FILENAME)
}

impl Manifest {
  /// True when the project root already has a manifest.
  pub fn exists(root: &Path) -> bool {
    manifest_path(root).is_file()
  }

  /// Load the manifest and every environment's override document.
  ///
  /// A declared environment whose override file is missing starts empty;
  /// the next reconciliation repopulates it.
  pub fn load(root: &Path) -> Result<Self, ManifestError> {
    let path = manifest_path(root);
    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(ManifestError::NotInitialized {
          root: root.to_path_buf(),
        });
      }
      Err(source) => return Err(ManifestError::Read { path, source }),
    };

    let file: ManifestFile = if content.trim().is_empty() {
      ManifestFile::default()
    } else {
      serde_yaml::from_str(&content).map_err(|e| ParseError::new(&path, e))?
    };

    let mut manifest = Manifest::new(root, file.compose);
    manifest.deploy_loop = file.deploy_loop;

    for (name, file) in file.environments {
      let override_path = manifest.resolve(&file);
      if !override_path.exists() {
        warn!(environment = %name, path = %override_path.display(), "override file missing");
      }
      let overrides = OverrideDocument::load_or_default(&override_path)?;
      manifest.environments.push(Environment::new(name, file, overrides));
    }

    debug!(
      root = %root.display(),
      environments = manifest.environments.len(),
      "loaded manifest"
    );
    Ok(manifest)
  }

  /// Resolve requested environment names, in declaration order.
  ///
  /// An empty request selects every environment. Unknown names are an error.
  pub fn select(&self, requested: &[String]) -> Result<Vec<String>, ManifestError> {
    if let Some(unknown) = requested.iter().find(|name| self.environment(name).is_none()) {
      return Err(ManifestError::UnknownEnvironment {
        name: unknown.clone(),
        available: self.environment_names().into_iter().map(String::from).collect(),
      });
    }

    Ok(
      self
        .environments
        .iter()
        .filter(|e| requested.is_empty() || requested.contains(&e.name))
        .map(|e| e.name.clone())
        .collect(),
    )
  }

  /// Declare a new environment.
  pub fn add_environment(&mut self, env: Environment) -> Result<(), ManifestError> {
    if self.environment(&env.name).is_some() {
      return Err(ManifestError::DuplicateEnvironment { name: env.name });
    }
    self.environments.push(env);
    Ok(())
  }

  /// Write `stagehand.yaml`.
  pub fn write_manifest_file(&self) -> Result<PathBuf, ManifestError> {
    let path = manifest_path(&self.root);
    let content = serde_yaml::to_string(&self.to_file()).map_err(|source| ManifestError::Serialize {
      path: path.clone(),
      source,
    })?;
    write_atomic(&path, &content).map_err(|source| ManifestError::Write {
      path: path.clone(),
      source,
    })?;
    debug!(path = %path.display(), "wrote manifest");
    Ok(path)
  }

  /// Write one environment's override document.
  pub fn write_environment(&self, name: &str) -> Result<PathBuf, ManifestError> {
    let env = self.environment(name).ok_or_else(|| ManifestError::UnknownEnvironment {
      name: name.to_string(),
      available: self.environment_names().into_iter().map(String::from).collect(),
    })?;
    let path = self.environment_path(env);
    env.overrides.save(&path)?;
    Ok(path)
  }

  /// Write the manifest and every override document.
  pub fn write(&self) -> Result<(), ManifestError> {
    self.write_manifest_file()?;
    for env in &self.environments {
      self.write_environment(&env.name)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consts::override_file_name;
  use tempfile::TempDir;

  fn sample(root: &Path) -> Manifest {
    let mut manifest = Manifest::new(root, vec![PathBuf::from("docker-compose.yaml")]);
    for name in ["dev", "prod"] {
      manifest
        .add_environment(Environment::new(
          name,
          override_file_name(name),
          OverrideDocument {
            version: "3.7".into(),
            ..Default::default()
          },
        ))
        .unwrap();
    }
    manifest
  }

  #[test]
  fn write_then_load() {
    let dir = TempDir::new().unwrap();
    let manifest = sample(dir.path());
    manifest.write().unwrap();

    assert!(Manifest::exists(dir.path()));
    assert!(dir.path().join("docker-compose.env.prod.yaml").is_file());

    let loaded = Manifest::load(dir.path()).unwrap();
    assert_eq!(loaded, manifest);
    assert_eq!(loaded.environment_names(), vec!["dev", "prod"]);
  }

  #[test]
  fn load_without_manifest() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
      Manifest::load(dir.path()),
      Err(ManifestError::NotInitialized { .. })
    ));
  }

  #[test]
  fn missing_override_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let manifest = sample(dir.path());
    manifest.write_manifest_file().unwrap();

    let loaded = Manifest::load(dir.path()).unwrap();
    assert_eq!(loaded.environment("dev").unwrap().overrides, OverrideDocument::default());
  }

  #[test]
  fn select_keeps_declaration_order() {
    let dir = TempDir::new().unwrap();
    let manifest = sample(dir.path());
    assert_eq!(manifest.select(&[]).unwrap(), vec!["dev", "prod"]);
    assert_eq!(
      manifest.select(&["prod".to_string(), "dev".to_string()]).unwrap(),
      vec!["dev", "prod"]
    );

    let err = manifest.select(&["qa".to_string()]).unwrap_err();
    assert!(err.to_string().contains("qa"));
    assert!(err.to_string().contains("dev, prod"));
  }

  #[test]
  fn duplicate_environment_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut manifest = sample(dir.path());
    let err = manifest
      .add_environment(Environment::new("dev", "other.yaml", OverrideDocument::default()))
      .unwrap_err();
    assert!(matches!(err, ManifestError::DuplicateEnvironment { .. }));
  }

  #[test]
  fn malformed_manifest_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    fs::write(manifest_path(dir.path()), "environments: [").unwrap();
    assert!(matches!(Manifest::load(dir.path()), Err(ManifestError::Parse(_))));
  }
}
