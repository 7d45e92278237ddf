//! The parameter catalog.
//!
//! Every recognised key has exactly one [`Policy`], fixed here. Keys outside
//! the catalog are passed through reconciliation untouched.

use crate::types::EntityKind;

pub const WORKLOAD_TYPE: &str = "workload.type";
pub const WORKLOAD_REPLICAS: &str = "workload.replicas";
pub const WORKLOAD_RESTART_POLICY: &str = "workload.restart-policy";
pub const WORKLOAD_IMAGE_PULL_POLICY: &str = "workload.image-pull-policy";
pub const WORKLOAD_IMAGE_PULL_SECRET: &str = "workload.image-pull-secret";
pub const WORKLOAD_SERVICE_ACCOUNT_NAME: &str = "workload.service-account-name";
pub const WORKLOAD_ROLLING_UPDATE_MAX_SURGE: &str = "workload.rolling-update-max-surge";
pub const WORKLOAD_CPU: &str = "workload.cpu";
pub const WORKLOAD_MAX_CPU: &str = "workload.max-cpu";
pub const WORKLOAD_MEMORY: &str = "workload.memory";
pub const WORKLOAD_MAX_MEMORY: &str = "workload.max-memory";
pub const WORKLOAD_RUN_AS_USER: &str = "workload.security-context-run-as-user";
pub const WORKLOAD_RUN_AS_GROUP: &str = "workload.security-context-run-as-group";
pub const WORKLOAD_FS_GROUP: &str = "workload.security-context-fs-group";
pub const WORKLOAD_LIVENESS_PROBE_TYPE: &str = "workload.liveness-probe-type";
pub const WORKLOAD_LIVENESS_PROBE_COMMAND: &str = "workload.liveness-probe-command";
pub const WORKLOAD_LIVENESS_PROBE_TIMEOUT: &str = "workload.liveness-probe-timeout";
pub const WORKLOAD_LIVENESS_PROBE_INITIAL_DELAY: &str = "workload.liveness-probe-initial-delay";
pub const WORKLOAD_LIVENESS_PROBE_PERIOD: &str = "workload.liveness-probe-period";
pub const WORKLOAD_LIVENESS_PROBE_FAILURE_THRESHOLD: &str = "workload.liveness-probe-failure-threshold";
pub const WORKLOAD_READINESS_PROBE_TYPE: &str = "workload.readiness-probe-type";
pub const SERVICE_TYPE: &str = "service.type";
pub const SERVICE_NODEPORT: &str = "service.nodeport";
pub const SERVICE_EXPOSE: &str = "service.expose";
pub const SERVICE_EXPOSE_TLS_SECRET: &str = "service.expose.tls-secret";
pub const VOLUME_SIZE: &str = "volume.size";
pub const VOLUME_STORAGE_CLASS: &str = "volume.storage-class";

pub const WORKLOAD_DEPLOYMENT: &str = "Deployment";
pub const WORKLOAD_STATEFULSET: &str = "StatefulSet";
pub const WORKLOAD_DAEMONSET: &str = "DaemonSet";

pub const SERVICE_NONE: &str = "none";
pub const SERVICE_CLUSTER_IP: &str = "ClusterIP";
pub const SERVICE_NODE_PORT: &str = "NodePort";
pub const SERVICE_LOAD_BALANCER: &str = "LoadBalancer";
pub const SERVICE_HEADLESS: &str = "Headless";

pub const RESTART_ALWAYS: &str = "Always";
pub const RESTART_ON_FAILURE: &str = "OnFailure";
pub const RESTART_NEVER: &str = "Never";

pub const PROBE_EXEC: &str = "exec";
pub const PROBE_NONE: &str = "none";

/// How reconciliation treats a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
  /// Recomputed from source facts on every pass; overwrites the stored value.
  Derived,
  /// Defaulted once, then preserved verbatim.
  Tunable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Constraint {
  OneOf(&'static [&'static str]),
  PositiveInt,
  NonNegativeInt,
  PortNumber,
  Cpu,
  Memory,
  Duration,
  Command,
  Text,
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
  pub key: &'static str,
  pub kind: EntityKind,
  pub policy: Policy,
  /// Value inference falls back to. Keys without one are only validated.
  pub default: Option<&'static str>,
  constraint: Constraint,
}

const fn spec(
  key: &'static str,
  kind: EntityKind,
  policy: Policy,
  default: Option<&'static str>,
  constraint: Constraint,
) -> ParamSpec {
  ParamSpec {
    key,
    kind,
    policy,
    default,
    constraint,
  }
}

const WORKLOAD_TYPES: &[&str] = &[WORKLOAD_DEPLOYMENT, WORKLOAD_STATEFULSET, WORKLOAD_DAEMONSET];
const SERVICE_TYPES: &[&str] = &[
  SERVICE_NONE,
  SERVICE_CLUSTER_IP,
  SERVICE_NODE_PORT,
  SERVICE_LOAD_BALANCER,
  SERVICE_HEADLESS,
];
const RESTART_POLICIES: &[&str] = &[RESTART_ALWAYS, RESTART_ON_FAILURE, RESTART_NEVER];
const PULL_POLICIES: &[&str] = &["IfNotPresent", "Always", "Never"];
const PROBE_TYPES: &[&str] = &[PROBE_EXEC, "http", "tcp", PROBE_NONE];

use Constraint::*;
use EntityKind::{Service as Svc, Volume as Vol};
use Policy::{Derived, Tunable};

/// The closed set of recognised keys, in the order inference emits them.
pub const CATALOG: &[ParamSpec] = &[
  spec(WORKLOAD_TYPE, Svc, Derived, Some(WORKLOAD_DEPLOYMENT), OneOf(WORKLOAD_TYPES)),
  spec(WORKLOAD_REPLICAS, Svc, Tunable, Some("1"), PositiveInt),
  spec(WORKLOAD_RESTART_POLICY, Svc, Tunable, Some(RESTART_ALWAYS), OneOf(RESTART_POLICIES)),
  spec(WORKLOAD_IMAGE_PULL_POLICY, Svc, Tunable, Some("IfNotPresent"), OneOf(PULL_POLICIES)),
  spec(WORKLOAD_IMAGE_PULL_SECRET, Svc, Tunable, None, Text),
  spec(WORKLOAD_SERVICE_ACCOUNT_NAME, Svc, Tunable, Some("default"), Text),
  spec(WORKLOAD_ROLLING_UPDATE_MAX_SURGE, Svc, Tunable, Some("1"), NonNegativeInt),
  spec(WORKLOAD_CPU, Svc, Tunable, Some("0.1"), Cpu),
  spec(WORKLOAD_MAX_CPU, Svc, Tunable, Some("0.5"), Cpu),
  spec(WORKLOAD_MEMORY, Svc, Tunable, Some("10Mi"), Memory),
  spec(WORKLOAD_MAX_MEMORY, Svc, Tunable, Some("500Mi"), Memory),
  spec(WORKLOAD_RUN_AS_USER, Svc, Tunable, None, NonNegativeInt),
  spec(WORKLOAD_RUN_AS_GROUP, Svc, Tunable, None, NonNegativeInt),
  spec(WORKLOAD_FS_GROUP, Svc, Tunable, None, NonNegativeInt),
  spec(WORKLOAD_LIVENESS_PROBE_TYPE, Svc, Tunable, Some(PROBE_EXEC), OneOf(PROBE_TYPES)),
  spec(WORKLOAD_LIVENESS_PROBE_COMMAND, Svc, Tunable, None, Command),
  spec(WORKLOAD_LIVENESS_PROBE_TIMEOUT, Svc, Tunable, Some("10s"), Duration),
  spec(WORKLOAD_LIVENESS_PROBE_INITIAL_DELAY, Svc, Tunable, Some("1m"), Duration),
  spec(WORKLOAD_LIVENESS_PROBE_PERIOD, Svc, Tunable, Some("1m"), Duration),
  spec(WORKLOAD_LIVENESS_PROBE_FAILURE_THRESHOLD, Svc, Tunable, Some("3"), PositiveInt),
  spec(WORKLOAD_READINESS_PROBE_TYPE, Svc, Tunable, Some(PROBE_NONE), OneOf(PROBE_TYPES)),
  spec(SERVICE_TYPE, Svc, Derived, Some(SERVICE_NONE), OneOf(SERVICE_TYPES)),
  spec(SERVICE_NODEPORT, Svc, Tunable, None, PortNumber),
  spec(SERVICE_EXPOSE, Svc, Tunable, None, Text),
  spec(SERVICE_EXPOSE_TLS_SECRET, Svc, Tunable, None, Text),
  spec(VOLUME_SIZE, Vol, Tunable, Some("100Mi"), Memory),
  spec(VOLUME_STORAGE_CLASS, Vol, Tunable, None, Text),
];

/// Find the catalog entry for a key.
pub fn lookup(key: &str) -> Option<&'static ParamSpec> {
  CATALOG.iter().find(|s| s.key == key)
}

/// Catalog entries for one entity kind, in catalog order.
pub fn catalog_for(kind: EntityKind) -> impl Iterator<Item = &'static ParamSpec> {
  CATALOG.iter().filter(move |s| s.kind == kind)
}

/// Policy of a key, `None` for keys outside the catalog.
pub fn policy_of(key: &str) -> Option<Policy> {
  lookup(key).map(|s| s.policy)
}

impl ParamSpec {
  /// Check a value against this key's constraint. The error is a human readable reason.
  pub fn validate(&self, value: &str) -> Result<(), String> {
    match self.constraint {
      OneOf(allowed) => {
        if allowed.contains(&value) {
          Ok(())
        } else {
          Err(format!("expected one of {}", allowed.join(", ")))
        }
      }
      PositiveInt => match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(()),
        _ => Err("expected a positive integer".to_string()),
      },
      NonNegativeInt => value
        .trim()
        .parse::<u64>()
        .map(|_| ())
        .map_err(|_| "expected a non-negative integer".to_string()),
      PortNumber => match value.trim().parse::<u16>() {
        Ok(n) if n > 0 => Ok(()),
        _ => Err("expected a port number".to_string()),
      },
      Cpu => {
        if is_quantity(value, CPU_SUFFIXES) {
          Ok(())
        } else {
          Err("expected a CPU quantity such as 0.5 or 500m".to_string())
        }
      }
      Memory => {
        if is_quantity(value, MEMORY_SUFFIXES) {
          Ok(())
        } else {
          Err("expected a memory quantity such as 512Mi or 1G".to_string())
        }
      }
      Duration => humantime::parse_duration(value.trim())
        .map(|_| ())
        .map_err(|e| format!("expected a duration such as 30s or 1m30s ({e})")),
      Command => match serde_json::from_str::<Vec<String>>(value) {
        Ok(cmd) if !cmd.is_empty() => Ok(()),
        _ => Err("expected a non-empty JSON array of strings".to_string()),
      },
      Text => Ok(()),
    }
  }
}

const CPU_SUFFIXES: &[&str] = &["", "m"];
const MEMORY_SUFFIXES: &[&str] = &[
  "", "k", "M", "G", "T", "P", "E", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei",
];

/// A decimal number followed by one of `suffixes`.
fn is_quantity(value: &str, suffixes: &[&str]) -> bool {
  let value = value.trim();
  let split = value
    .find(|c: char| !(c.is_ascii_digit() || c == '.'))
    .unwrap_or(value.len());
  let (number, suffix) = value.split_at(split);

  let valid_number = !number.is_empty()
    && number.matches('.').count() <= 1
    && number.chars().any(|c| c.is_ascii_digit());

  valid_number && suffixes.contains(&suffix)
}
