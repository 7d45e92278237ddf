//! Source model types.
//!
//! The source model is the structural view of the canonical compose
//! description. It is rebuilt on every invocation and consumed read-only.

use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};

/// A parsed compose project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceModel {
  /// Declared schema version (`version:`), empty when absent.
  pub version: String,
  pub services: IndexMap<String, Service>,
  pub volumes: IndexMap<String, Volume>,
  pub secrets: IndexSet<String>,
  pub configs: IndexSet<String>,
}

impl SourceModel {
  /// Every `env_file` read while loading, without duplicates.
  pub fn env_files(&self) -> Vec<PathBuf> {
    let files: IndexSet<&PathBuf> = self.services.values().flat_map(|s| &s.env_files).collect();
    files.into_iter().cloned().collect()
  }
}

/// A compose service and the facts inference needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Service {
  pub name: String,
  pub image: Option<String>,
  pub ports: Vec<Port>,
  pub mounts: Vec<Mount>,
  /// Environment variables after `env_file` entries have been applied.
  /// `None` marks a variable declared without a value.
  pub environment: IndexMap<String, Option<String>>,
  /// Resolved `env_file` paths, in the order they were applied.
  pub env_files: Vec<PathBuf>,
  pub deploy: Option<Deploy>,
  pub healthcheck: Option<HealthCheck>,
  pub labels: IndexMap<String, String>,
  /// Explicit parameter values from the `x-stagehand` block (exposure excluded).
  pub extension: IndexMap<String, String>,
  pub exposure: Exposure,
}

impl Service {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Default::default()
    }
  }

  /// True when any port is declared. A port without `published` still gets
  /// an ephemeral host port.
  pub fn publishes_ports(&self) -> bool {
    !self.ports.is_empty()
  }

  /// True when a port uses host mode.
  pub fn publishes_host_ports(&self) -> bool {
    self.ports.iter().any(|p| p.mode == PortMode::Host)
  }

  /// True when the service mounts anything that outlives the container.
  pub fn has_persistent_mounts(&self) -> bool {
    self.mounts.iter().any(Mount::is_persistent)
  }

  /// Explicit value for a parameter key: the extension block wins over labels.
  pub fn explicit(&self, key: &str) -> Option<&str> {
    self.extension.get(key).or_else(|| self.labels.get(key)).map(String::as_str)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PortMode {
  #[default]
  Ingress,
  Host,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
  pub target: String,
  pub published: Option<String>,
  pub protocol: Option<String>,
  pub mode: PortMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
  pub kind: MountKind,
  pub source: Option<String>,
  pub target: String,
}

impl Mount {
  pub fn is_persistent(&self) -> bool {
    self.kind != MountKind::Tmpfs
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
  Volume,
  Bind,
  Tmpfs,
}

/// The `deploy` block. Numeric fields stay textual until inference validates them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deploy {
  pub mode: Option<String>,
  pub replicas: Option<String>,
  pub restart_condition: Option<String>,
}

/// The `healthcheck` block, verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthCheck {
  pub test: Vec<String>,
  pub interval: Option<String>,
  pub timeout: Option<String>,
  pub retries: Option<String>,
  pub start_period: Option<String>,
  pub disable: bool,
}

/// Whether and how a service is exposed outside the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Exposure {
  #[default]
  None,
  Enabled,
  Domains(Vec<String>),
}

impl Exposure {
  /// Parameter value form: `false`, `true`, or comma separated domains.
  pub fn to_param(&self) -> String {
    match self {
      Exposure::None => "false".to_string(),
      Exposure::Enabled => "true".to_string(),
      Exposure::Domains(domains) => domains.join(","),
    }
  }

  /// Decode the parameter value form.
  pub fn from_param(value: &str) -> Self {
    match value.trim() {
      "" | "false" => Exposure::None,
      "true" => Exposure::Enabled,
      other => Exposure::Domains(
        other
          .split(',')
          .map(str::trim)
          .filter(|d| !d.is_empty())
          .map(String::from)
          .collect(),
      ),
    }
  }
}

/// A top-level named volume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Volume {
  pub name: String,
  pub labels: IndexMap<String, String>,
  pub extension: IndexMap<String, String>,
}

impl Volume {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Default::default()
    }
  }

  pub fn explicit(&self, key: &str) -> Option<&str> {
    self.extension.get(key).or_else(|| self.labels.get(key)).map(String::as_str)
  }
}
