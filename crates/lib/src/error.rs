//! Reconciliation error taxonomy.
//!
//! - [`ParseError`]: a source or override document is not well-formed. Fatal
//!   for the whole run, surfaced through the loading errors.
//! - [`ValidationError`]: an inferred or stored parameter value violates its
//!   constraint. Fatal for the environment being reconciled.
//! - [`ReferenceError`]: an environment variable binding points at a secret or
//!   config that is not declared. Logged and reported, never fatal.
//! - [`ConflictError`]: reserved for cross-environment constraints.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::EntityRef;

/// A document could not be parsed.
#[derive(Debug, Error)]
#[error("failed to parse {}: {source}", path.display())]
pub struct ParseError {
  pub path: PathBuf,
  #[source]
  pub source: serde_yaml::Error,
}

impl ParseError {
  pub fn new(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
    Self {
      path: path.into(),
      source,
    }
  }
}

/// A value failed its declared constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity}: invalid value {value:?} for {field}: {reason}")]
pub struct ValidationError {
  pub entity: EntityRef,
  /// Parameter key or source field path, e.g. `workload.replicas` or `deploy.replicas`.
  pub field: String,
  pub value: String,
  pub reason: String,
}

impl ValidationError {
  pub fn new(entity: EntityRef, field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
    Self {
      entity,
      field: field.into(),
      value: value.into(),
      reason: reason.into(),
    }
  }
}

/// What an environment variable binding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
  Secret,
  Config,
}

impl std::fmt::Display for ReferenceKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ReferenceKind::Secret => f.write_str("secret"),
      ReferenceKind::Config => f.write_str("config"),
    }
  }
}

/// A binding references something the source does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity}: variable {variable} references undeclared {kind} '{target}'")]
pub struct ReferenceError {
  pub entity: EntityRef,
  pub variable: String,
  pub kind: ReferenceKind,
  pub target: String,
}

/// Not produced today; the Derived/Tunable split keeps environments independent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conflict between environments {environments:?}: {reason}")]
pub struct ConflictError {
  pub environments: Vec<String>,
  pub reason: String,
}

/// A failure that stops one environment from reconciling.
#[derive(Debug, Error)]
pub enum ReconcileError {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  /// Reserved for cross-environment constraints; nothing raises it yet.
  #[error(transparent)]
  Conflict(#[from] ConflictError),
}

/// A reconciliation failure attributed to one environment.
#[derive(Debug, Error)]
#[error("environment '{environment}': {error}")]
pub struct EnvironmentFailure {
  pub environment: String,
  #[source]
  pub error: ReconcileError,
}
