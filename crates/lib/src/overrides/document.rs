//! Per-environment override documents.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

use super::binding::{EnvBinding, env_bindings};
use crate::error::ParseError;
use crate::params::Parameters;
use crate::util::fs::write_atomic;
use crate::util::scalar::{scalar_map, scalar_string};

#[derive(Debug, Error)]
pub enum OverrideError {
  #[error("failed to read override file {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error(transparent)]
  Parse(#[from] ParseError),

  #[error("failed to serialize override file {}: {source}", path.display())]
  Serialize { path: PathBuf, source: serde_yaml::Error },

  #[error("failed to write override file {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },
}

/// The overrides one environment applies on top of the source.
///
/// Keys this tool does not manage are kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideDocument {
  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "String::is_empty")]
  pub version: String,

  #[serde(default, deserialize_with = "nullable", skip_serializing_if = "IndexMap::is_empty")]
  pub services: IndexMap<String, ServiceOverride>,

  #[serde(default, deserialize_with = "nullable", skip_serializing_if = "IndexMap::is_empty")]
  pub volumes: IndexMap<String, VolumeOverride>,

  #[serde(flatten)]
  pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceOverride {
  /// Parameters, stored as labels.
  #[serde(default, deserialize_with = "scalar_map", skip_serializing_if = "IndexMap::is_empty")]
  pub labels: Parameters,

  #[serde(default, deserialize_with = "env_bindings", skip_serializing_if = "IndexMap::is_empty")]
  pub environment: IndexMap<String, EnvBinding>,

  #[serde(flatten)]
  pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeOverride {
  #[serde(default, deserialize_with = "scalar_map", skip_serializing_if = "IndexMap::is_empty")]
  pub labels: Parameters,

  #[serde(flatten)]
  pub extra: IndexMap<String, Value>,
}

/// Entities written as `name:` with no body deserialize as null.
fn nullable<'de, D, T>(deserializer: D) -> Result<IndexMap<String, T>, D::Error>
where
  D: serde::Deserializer<'de>,
  T: Deserialize<'de> + Default,
{
  let raw = Option::<IndexMap<String, Option<T>>>::deserialize(deserializer)?;
  Ok(
    raw
      .unwrap_or_default()
      .into_iter()
      .map(|(name, body)| (name, body.unwrap_or_default()))
      .collect(),
  )
}

impl OverrideDocument {
  /// Parse document text. Empty text is an empty document.
  pub fn parse(path: &Path, content: &str) -> Result<Self, ParseError> {
    if content.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(content).map_err(|e| ParseError::new(path, e))
  }

  /// Load a document from disk.
  pub fn load(path: &Path) -> Result<Self, OverrideError> {
    let content = fs::read_to_string(path).map_err(|source| OverrideError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(Self::parse(path, &content)?)
  }

  /// Load a document, treating a missing file as empty.
  pub fn load_or_default(path: &Path) -> Result<Self, OverrideError> {
    match fs::read_to_string(path) {
      Ok(content) => Ok(Self::parse(path, &content)?),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "override file missing, starting empty");
        Ok(Self::default())
      }
      Err(source) => Err(OverrideError::Read {
        path: path.to_path_buf(),
        source,
      }),
    }
  }

  pub fn to_yaml(&self, path: &Path) -> Result<String, OverrideError> {
    serde_yaml::to_string(self).map_err(|source| OverrideError::Serialize {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Write the document atomically.
  pub fn save(&self, path: &Path) -> Result<(), OverrideError> {
    let content = self.to_yaml(path)?;
    write_atomic(path, &content).map_err(|source| OverrideError::Write {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), "wrote override file");
    Ok(())
  }
}
