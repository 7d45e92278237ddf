//! Inference of parameter values from source facts.
//!
//! Inference is pure: the same entity always yields the same parameters, in
//! catalog order. Explicit values from the `x-stagehand` block or labels
//! replace inferred ones. Every emitted value is validated before returning,
//! so callers never see a partial result.

use tracing::{debug, warn};

use super::Parameters;
use super::keys::*;
use crate::error::ValidationError;
use crate::source::{Exposure, HealthCheck, Service, Volume};
use crate::types::{EntityKind, EntityRef};

/// Placeholder probe command for services that declare no healthcheck.
fn placeholder_command(service: &str) -> Vec<String> {
  vec![
    "echo".to_string(),
    format!("Define healthcheck command for service {service}"),
  ]
}

/// Infer the parameter map for a service.
pub fn infer_service(service: &Service) -> Result<Parameters, ValidationError> {
  let entity = EntityRef::service(&service.name);
  warn_unknown_explicit(&entity, service.extension.keys());

  let mut params = Parameters::new();
  for spec in catalog_for(EntityKind::Service) {
    let value = match explicit_service_value(spec.key, service) {
      Some(explicit) => Some(explicit.to_string()),
      None => inferred_service_value(spec, service, &entity)?,
    };

    if let Some(value) = value {
      spec
        .validate(&value)
        .map_err(|reason| ValidationError::new(entity.clone(), spec.key, &value, reason))?;
      params.insert(spec.key.to_string(), value);
    }
  }

  debug!(service = %service.name, count = params.len(), "inferred parameters");
  Ok(params)
}

/// Infer the parameter map for a volume.
pub fn infer_volume(volume: &Volume) -> Result<Parameters, ValidationError> {
  let entity = EntityRef::volume(&volume.name);
  warn_unknown_explicit(&entity, volume.extension.keys());

  let mut params = Parameters::new();
  for spec in catalog_for(EntityKind::Volume) {
    let value = volume.explicit(spec.key).or(spec.default);
    if let Some(value) = value {
      spec
        .validate(value)
        .map_err(|reason| ValidationError::new(entity.clone(), spec.key, value, reason))?;
      params.insert(spec.key.to_string(), value.to_string());
    }
  }

  Ok(params)
}

/// Explicit values apply to every key except an exposure type on a service
/// that publishes nothing. A headless service is the one exposure that makes
/// sense without published ports.
fn explicit_service_value<'a>(key: &str, service: &'a Service) -> Option<&'a str> {
  let explicit = service.explicit(key)?;
  if key == SERVICE_TYPE && !service.publishes_ports() && explicit != SERVICE_HEADLESS {
    return None;
  }
  Some(explicit)
}

fn inferred_service_value(
  spec: &ParamSpec,
  service: &Service,
  entity: &EntityRef,
) -> Result<Option<String>, ValidationError> {
  let disabled_probe = service.healthcheck.as_ref().is_some_and(|h| h.disable);
  let healthcheck = service.healthcheck.as_ref().filter(|h| !h.disable);

  let value = match spec.key {
    WORKLOAD_TYPE => Some(workload_type(service).to_string()),
    WORKLOAD_REPLICAS => Some(replicas(service, entity)?),
    WORKLOAD_RESTART_POLICY => Some(restart_policy(service).to_string()),
    SERVICE_TYPE => Some(service_type(service).to_string()),
    SERVICE_EXPOSE => match &service.exposure {
      Exposure::None => None,
      exposure => Some(exposure.to_param()),
    },

    WORKLOAD_LIVENESS_PROBE_TYPE if disabled_probe => Some(PROBE_NONE.to_string()),
    WORKLOAD_LIVENESS_PROBE_COMMAND
    | WORKLOAD_LIVENESS_PROBE_TIMEOUT
    | WORKLOAD_LIVENESS_PROBE_INITIAL_DELAY
    | WORKLOAD_LIVENESS_PROBE_PERIOD
    | WORKLOAD_LIVENESS_PROBE_FAILURE_THRESHOLD
      if disabled_probe =>
    {
      None
    }
    WORKLOAD_LIVENESS_PROBE_COMMAND => Some(probe_command(service, healthcheck)),
    WORKLOAD_LIVENESS_PROBE_TIMEOUT => probe_field(entity, "healthcheck.timeout", healthcheck.and_then(|h| h.timeout.as_deref()), spec)?,
    WORKLOAD_LIVENESS_PROBE_INITIAL_DELAY => probe_field(
      entity,
      "healthcheck.start_period",
      healthcheck.and_then(|h| h.start_period.as_deref()),
      spec,
    )?,
    WORKLOAD_LIVENESS_PROBE_PERIOD => probe_field(entity, "healthcheck.interval", healthcheck.and_then(|h| h.interval.as_deref()), spec)?,
    WORKLOAD_LIVENESS_PROBE_FAILURE_THRESHOLD => {
      probe_field(entity, "healthcheck.retries", healthcheck.and_then(|h| h.retries.as_deref()), spec)?
    }

    _ => spec.default.map(String::from),
  };
  Ok(value)
}

/// Global services run one replica per node; persistent mounts need stable identity.
fn workload_type(service: &Service) -> &'static str {
  let global = service
    .deploy
    .as_ref()
    .and_then(|d| d.mode.as_deref())
    .is_some_and(|mode| mode == "global");

  if global {
    WORKLOAD_DAEMONSET
  } else if service.has_persistent_mounts() {
    WORKLOAD_STATEFULSET
  } else {
    WORKLOAD_DEPLOYMENT
  }
}

fn replicas(service: &Service, entity: &EntityRef) -> Result<String, ValidationError> {
  let Some(raw) = service.deploy.as_ref().and_then(|d| d.replicas.as_deref()) else {
    return Ok("1".to_string());
  };

  match raw.trim().parse::<u64>() {
    Ok(n) if n > 0 => Ok(n.to_string()),
    _ => Err(ValidationError::new(
      entity.clone(),
      "deploy.replicas",
      raw,
      "expected a positive integer",
    )),
  }
}

fn restart_policy(service: &Service) -> &'static str {
  match service.deploy.as_ref().and_then(|d| d.restart_condition.as_deref()) {
    Some("on-failure") => RESTART_ON_FAILURE,
    Some("none") => RESTART_NEVER,
    _ => RESTART_ALWAYS,
  }
}

fn service_type(service: &Service) -> &'static str {
  if !service.publishes_ports() {
    SERVICE_NONE
  } else if service.publishes_host_ports() {
    SERVICE_NODE_PORT
  } else {
    SERVICE_CLUSTER_IP
  }
}

/// The probe command as a JSON array. A leading `CMD` marker is dropped and
/// `CMD-SHELL` becomes an explicit shell invocation.
fn probe_command(service: &Service, healthcheck: Option<&HealthCheck>) -> String {
  let test = healthcheck.map(|h| h.test.as_slice()).unwrap_or_default();

  let command: Vec<String> = match test.split_first() {
    Some((marker, rest)) if marker.eq_ignore_ascii_case("CMD") => rest.to_vec(),
    Some((marker, rest)) if marker.eq_ignore_ascii_case("CMD-SHELL") => {
      vec!["/bin/sh".to_string(), "-c".to_string(), rest.join(" ")]
    }
    Some(_) => test.to_vec(),
    None => Vec::new(),
  };

  let command = if command.is_empty() || command.iter().all(|c| c.trim().is_empty()) {
    placeholder_command(&service.name)
  } else {
    command
  };

  // Serializing a Vec<String> cannot fail.
  serde_json::to_string(&command).unwrap_or_else(|_| "[]".to_string())
}

/// A probe setting taken verbatim from the healthcheck, or the catalog default.
/// Source values are checked here so errors name the compose field.
fn probe_field(
  entity: &EntityRef,
  field: &str,
  value: Option<&str>,
  spec: &ParamSpec,
) -> Result<Option<String>, ValidationError> {
  match value {
    Some(value) => {
      spec
        .validate(value)
        .map_err(|reason| ValidationError::new(entity.clone(), field, value, reason))?;
      Ok(Some(value.trim().to_string()))
    }
    None => Ok(spec.default.map(String::from)),
  }
}

fn warn_unknown_explicit<'a>(entity: &EntityRef, keys: impl Iterator<Item = &'a String>) {
  for key in keys {
    if lookup(key).is_none() {
      warn!(entity = %entity, key = %key, "ignoring unknown parameter in x-stagehand block");
    }
  }
}
