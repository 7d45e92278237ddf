//! Compose document loading.
//!
//! Reads one or more compose files into a [`SourceModel`]. Only the facts that
//! parameter inference and reconciliation need are kept; everything else in
//! the document is ignored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

use super::types::{Deploy, Exposure, HealthCheck, Mount, MountKind, Port, PortMode, Service, SourceModel, Volume};
use crate::consts::EXTENSION_KEY;
use crate::error::{ParseError, ValidationError};
use crate::params::keys::SERVICE_EXPOSE;
use crate::types::EntityRef;
use crate::util::scalar::{RawScalar, describe, scalar_to_string};

/// Errors that can occur while loading compose sources.
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("no compose sources given")]
  NoSources,

  #[error("failed to read compose file {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error(transparent)]
  Parse(#[from] ParseError),

  #[error("failed to read env file {} for service {service}: {source}", path.display())]
  EnvFile {
    service: String,
    path: PathBuf,
    source: io::Error,
  },

  #[error(transparent)]
  Validation(#[from] ValidationError),
}

/// Load and merge compose files in order. Later files extend or override
/// earlier ones; the declared version comes from the first file that has one.
pub fn load_sources(paths: &[PathBuf]) -> Result<SourceModel, SourceError> {
  let (first, rest) = paths.split_first().ok_or(SourceError::NoSources)?;

  let mut model = load_source(first)?;
  for path in rest {
    let next = load_source(path)?;
    merge_model(&mut model, next);
  }

  debug!(
    sources = paths.len(),
    services = model.services.len(),
    volumes = model.volumes.len(),
    version = %model.version,
    "loaded compose sources"
  );
  Ok(model)
}

/// Load a single compose file.
pub fn load_source(path: &Path) -> Result<SourceModel, SourceError> {
  let content = fs::read_to_string(path).map_err(|e| SourceError::Read {
    path: path.to_path_buf(),
    source: e,
  })?;
  parse_source(path, &content)
}

/// Parse compose content. `path` identifies the document in errors and
/// anchors relative `env_file` references.
pub fn parse_source(path: &Path, content: &str) -> Result<SourceModel, SourceError> {
  let raw: RawCompose = if content.trim().is_empty() {
    RawCompose::default()
  } else {
    serde_yaml::from_str(content).map_err(|e| ParseError::new(path, e))?
  };

  let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
  raw.into_model(base_dir)
}

fn merge_model(base: &mut SourceModel, next: SourceModel) {
  if base.version.is_empty() {
    base.version = next.version;
  }

  for (name, service) in next.services {
    match base.services.get_mut(&name) {
      Some(existing) => merge_service(existing, service),
      None => {
        base.services.insert(name, service);
      }
    }
  }

  for (name, volume) in next.volumes {
    match base.volumes.get_mut(&name) {
      Some(existing) => {
        existing.labels.extend(volume.labels);
        existing.extension.extend(volume.extension);
      }
      None => {
        base.volumes.insert(name, volume);
      }
    }
  }

  base.secrets.extend(next.secrets);
  base.configs.extend(next.configs);
}

fn merge_service(base: &mut Service, next: Service) {
  if next.image.is_some() {
    base.image = next.image;
  }

  for port in next.ports {
    if !base.ports.contains(&port) {
      base.ports.push(port);
    }
  }

  for mount in next.mounts {
    match base.mounts.iter_mut().find(|m| m.target == mount.target) {
      Some(existing) => *existing = mount,
      None => base.mounts.push(mount),
    }
  }

  base.environment.extend(next.environment);
  for file in next.env_files {
    if !base.env_files.contains(&file) {
      base.env_files.push(file);
    }
  }

  if let Some(deploy) = next.deploy {
    let target = base.deploy.get_or_insert_with(Deploy::default);
    if deploy.mode.is_some() {
      target.mode = deploy.mode;
    }
    if deploy.replicas.is_some() {
      target.replicas = deploy.replicas;
    }
    if deploy.restart_condition.is_some() {
      target.restart_condition = deploy.restart_condition;
    }
  }

  if next.healthcheck.is_some() {
    base.healthcheck = next.healthcheck;
  }

  base.labels.extend(next.labels);
  base.extension.extend(next.extension);

  if next.exposure != Exposure::None {
    base.exposure = next.exposure;
  }
}

// ---------------------------------------------------------------------------
// Raw document shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct RawCompose {
  #[serde(default)]
  version: Option<RawScalar>,
  #[serde(default)]
  services: Option<IndexMap<String, Option<RawService>>>,
  #[serde(default)]
  volumes: Option<IndexMap<String, Option<RawVolume>>>,
  #[serde(default)]
  secrets: Option<IndexMap<String, Value>>,
  #[serde(default)]
  configs: Option<IndexMap<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawService {
  #[serde(default)]
  image: Option<String>,
  #[serde(default)]
  ports: Vec<RawPort>,
  #[serde(default)]
  volumes: Vec<RawMount>,
  #[serde(default)]
  environment: Option<RawEnvironment>,
  #[serde(default)]
  env_file: Option<RawEnvFile>,
  #[serde(default)]
  deploy: Option<RawDeploy>,
  #[serde(default)]
  healthcheck: Option<RawHealthCheck>,
  #[serde(default)]
  labels: Option<RawLabels>,
  #[serde(rename = "x-stagehand", default)]
  extension: Option<IndexMap<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVolume {
  #[serde(default)]
  labels: Option<RawLabels>,
  #[serde(rename = "x-stagehand", default)]
  extension: Option<IndexMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPort {
  Long {
    target: RawScalar,
    #[serde(default)]
    published: Option<RawScalar>,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    mode: Option<String>,
  },
  Short(RawScalar),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMount {
  Long {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    source: Option<String>,
    target: String,
  },
  Short(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEnvironment {
  Map(IndexMap<String, Option<RawScalar>>),
  List(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEnvFile {
  One(String),
  Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLabels {
  Map(IndexMap<String, Option<RawScalar>>),
  List(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
struct RawDeploy {
  #[serde(default)]
  mode: Option<String>,
  #[serde(default)]
  replicas: Option<RawScalar>,
  #[serde(default)]
  restart_policy: Option<RawRestartPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRestartPolicy {
  #[serde(default)]
  condition: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHealthCheck {
  #[serde(default)]
  test: Option<RawTest>,
  #[serde(default)]
  interval: Option<RawScalar>,
  #[serde(default)]
  timeout: Option<RawScalar>,
  #[serde(default)]
  retries: Option<RawScalar>,
  #[serde(default)]
  start_period: Option<RawScalar>,
  #[serde(default)]
  disable: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTest {
  Exec(Vec<String>),
  Shell(String),
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

impl RawCompose {
  fn into_model(self, base_dir: &Path) -> Result<SourceModel, SourceError> {
    let mut model = SourceModel {
      version: self.version.map(RawScalar::into_string).unwrap_or_default(),
      ..Default::default()
    };

    for (name, raw) in self.services.unwrap_or_default() {
      let service = raw.unwrap_or_default().into_service(&name, base_dir)?;
      model.services.insert(name, service);
    }

    for (name, raw) in self.volumes.unwrap_or_default() {
      let raw = raw.unwrap_or_default();
      let entity = EntityRef::volume(&name);
      let volume = Volume {
        name: name.clone(),
        labels: raw.labels.map(labels_to_map).unwrap_or_default(),
        extension: extension_to_map(&entity, raw.extension.unwrap_or_default())?.0,
      };
      model.volumes.insert(name, volume);
    }

    model.secrets = names(self.secrets);
    model.configs = names(self.configs);
    Ok(model)
  }
}

fn names(map: Option<IndexMap<String, Value>>) -> IndexSet<String> {
  map.map(|m| m.into_keys().collect()).unwrap_or_default()
}

impl RawService {
  fn into_service(self, name: &str, base_dir: &Path) -> Result<Service, SourceError> {
    let entity = EntityRef::service(name);

    let mut environment = match self.environment {
      Some(RawEnvironment::Map(map)) => map.into_iter().map(|(k, v)| (k, v.map(RawScalar::into_string))).collect(),
      Some(RawEnvironment::List(list)) => list.iter().map(|entry| split_assignment(entry)).collect(),
      None => IndexMap::new(),
    };

    // Entries from env files take precedence over direct declarations.
    let env_files: Vec<PathBuf> = match self.env_file {
      Some(RawEnvFile::One(path)) => vec![path],
      Some(RawEnvFile::Many(paths)) => paths,
      None => Vec::new(),
    }
    .into_iter()
    .map(|file| base_dir.join(file))
    .collect();
    for path in &env_files {
      let content = fs::read_to_string(path).map_err(|e| SourceError::EnvFile {
        service: name.to_string(),
        path: path.clone(),
        source: e,
      })?;
      for (key, value) in parse_env_file(&content) {
        environment.insert(key, value);
      }
    }

    let labels = self.labels.map(labels_to_map).unwrap_or_default();
    let (extension, extension_exposure) = extension_to_map(&entity, self.extension.unwrap_or_default())?;
    let exposure = match extension_exposure {
      Some(exposure) => exposure,
      None => labels.get(SERVICE_EXPOSE).map(|v| Exposure::from_param(v)).unwrap_or_default(),
    };

    Ok(Service {
      name: name.to_string(),
      image: self.image,
      ports: self.ports.into_iter().map(RawPort::into_port).collect(),
      mounts: self.volumes.into_iter().map(RawMount::into_mount).collect(),
      environment,
      env_files,
      deploy: self.deploy.map(|d| Deploy {
        mode: d.mode,
        replicas: d.replicas.map(RawScalar::into_string),
        restart_condition: d.restart_policy.and_then(|r| r.condition),
      }),
      healthcheck: self.healthcheck.map(RawHealthCheck::into_healthcheck),
      labels,
      extension,
      exposure,
    })
  }
}

impl RawPort {
  fn into_port(self) -> Port {
    match self {
      RawPort::Long {
        target,
        published,
        protocol,
        mode,
      } => Port {
        target: target.into_string(),
        published: published.map(RawScalar::into_string).filter(|p| !p.is_empty()),
        protocol,
        mode: match mode.as_deref() {
          Some("host") => PortMode::Host,
          _ => PortMode::Ingress,
        },
      },
      RawPort::Short(spec) => parse_short_port(spec.as_str()),
    }
  }
}

/// Parse `[HOST:]PUBLISHED:TARGET[/PROTOCOL]` or a bare `TARGET`.
fn parse_short_port(spec: &str) -> Port {
  let (addr, protocol) = match spec.split_once('/') {
    Some((addr, proto)) => (addr, Some(proto.to_string())),
    None => (spec, None),
  };

  let parts: Vec<&str> = addr.split(':').collect();
  let target = parts.last().copied().unwrap_or_default().to_string();
  let published = if parts.len() >= 2 {
    Some(parts[parts.len() - 2].to_string()).filter(|p| !p.is_empty())
  } else {
    None
  };

  Port {
    target,
    published,
    protocol,
    mode: PortMode::Ingress,
  }
}

impl RawMount {
  fn into_mount(self) -> Mount {
    match self {
      RawMount::Long { kind, source, target } => Mount {
        kind: match kind.as_deref() {
          Some("bind") => MountKind::Bind,
          Some("tmpfs") => MountKind::Tmpfs,
          _ => MountKind::Volume,
        },
        source,
        target,
      },
      RawMount::Short(spec) => {
        let mut parts = spec.splitn(3, ':');
        let first = parts.next().unwrap_or_default().to_string();
        match parts.next() {
          Some(target) => {
            let kind = if first.starts_with(['.', '/', '~']) {
              MountKind::Bind
            } else {
              MountKind::Volume
            };
            Mount {
              kind,
              source: Some(first),
              target: target.to_string(),
            }
          }
          None => Mount {
            kind: MountKind::Volume,
            source: None,
            target: first,
          },
        }
      }
    }
  }
}

impl RawHealthCheck {
  fn into_healthcheck(self) -> HealthCheck {
    let test = match self.test {
      Some(RawTest::Exec(list)) => list,
      Some(RawTest::Shell(cmd)) => vec!["CMD-SHELL".to_string(), cmd],
      None => Vec::new(),
    };
    let disabled_by_test = test.first().is_some_and(|t| t.eq_ignore_ascii_case("NONE"));

    HealthCheck {
      test,
      interval: self.interval.map(RawScalar::into_string),
      timeout: self.timeout.map(RawScalar::into_string),
      retries: self.retries.map(RawScalar::into_string),
      start_period: self.start_period.map(RawScalar::into_string),
      disable: self.disable.unwrap_or(false) || disabled_by_test,
    }
  }
}

fn split_assignment(entry: &str) -> (String, Option<String>) {
  match entry.split_once('=') {
    Some((key, value)) => (key.trim().to_string(), Some(value.to_string())),
    None => (entry.trim().to_string(), None),
  }
}

fn labels_to_map(labels: RawLabels) -> IndexMap<String, String> {
  match labels {
    RawLabels::Map(map) => map
      .into_iter()
      .map(|(k, v)| (k, v.map(RawScalar::into_string).unwrap_or_default()))
      .collect(),
    RawLabels::List(list) => list
      .iter()
      .map(|entry| {
        let (k, v) = split_assignment(entry);
        (k, v.unwrap_or_default())
      })
      .collect(),
  }
}

/// Split the extension block into scalar parameter values and the decoded exposure.
fn extension_to_map(
  entity: &EntityRef,
  extension: IndexMap<String, Value>,
) -> Result<(IndexMap<String, String>, Option<Exposure>), ValidationError> {
  let mut values = IndexMap::new();
  let mut exposure = None;

  for (key, value) in extension {
    if key == SERVICE_EXPOSE {
      exposure = Some(decode_exposure(entity, &value)?);
      continue;
    }
    let text = scalar_to_string(&value).ok_or_else(|| {
      ValidationError::new(
        entity.clone(),
        format!("{}.{}", EXTENSION_KEY, key),
        describe(&value),
        "expected a scalar value",
      )
    })?;
    values.insert(key, text);
  }

  Ok((values, exposure))
}

/// Decode `service.expose`: a boolean, a comma separated string, or a list of domains.
fn decode_exposure(entity: &EntityRef, value: &Value) -> Result<Exposure, ValidationError> {
  match value {
    Value::Null => Ok(Exposure::None),
    Value::Bool(true) => Ok(Exposure::Enabled),
    Value::Bool(false) => Ok(Exposure::None),
    Value::String(s) => Ok(Exposure::from_param(s)),
    Value::Sequence(items) => {
      let mut domains = Vec::with_capacity(items.len());
      for item in items {
        match item {
          Value::String(domain) if !domain.trim().is_empty() => domains.push(domain.trim().to_string()),
          other => {
            return Err(ValidationError::new(
              entity.clone(),
              format!("{}.{}", EXTENSION_KEY, SERVICE_EXPOSE),
              describe(other),
              "expected a domain name",
            ));
          }
        }
      }
      if domains.is_empty() {
        Ok(Exposure::None)
      } else {
        Ok(Exposure::Domains(domains))
      }
    }
    other => Err(ValidationError::new(
      entity.clone(),
      format!("{}.{}", EXTENSION_KEY, SERVICE_EXPOSE),
      describe(other),
      "expected a boolean, a domain list, or comma separated domains",
    )),
  }
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped.
fn parse_env_file(content: &str) -> Vec<(String, Option<String>)> {
  content
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty() && !line.starts_with('#'))
    .map(|line| {
      let line = line.strip_prefix("export ").unwrap_or(line);
      let (key, value) = split_assignment(line);
      (key, value.map(|v| unquote(v.trim()).to_string()))
    })
    .collect()
}

fn unquote(value: &str) -> &str {
  for quote in ['"', '\''] {
    if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
      return &value[1..value.len() - 1];
    }
  }
  value
}
