//! Change report types.
//!
//! A [`ChangeReport`] holds one [`EnvironmentReport`] per reconciled
//! environment, in manifest declaration order. Each environment report is
//! an ordered log of [`Change`]s plus the non-fatal warnings raised while
//! reconciling it.

use std::fmt;

use serde::Serialize;

use crate::types::EntityRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
  Added,
  Updated,
  Deleted,
  Unchanged,
}

impl ChangeKind {
  pub fn as_str(self) -> &'static str {
    match self {
      ChangeKind::Added => "added",
      ChangeKind::Updated => "updated",
      ChangeKind::Deleted => "deleted",
      ChangeKind::Unchanged => "unchanged",
    }
  }
}

/// What a change applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "subject", rename_all = "snake_case")]
pub enum Subject {
  /// The document's declared schema version.
  Version,
  /// A whole service or volume.
  Entity { entity: EntityRef },
  /// One parameter of an entity.
  Parameter { entity: EntityRef, key: String },
  /// One environment variable of a service.
  EnvVar { entity: EntityRef, name: String },
}

/// One entry in an environment's change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
  #[serde(flatten)]
  pub subject: Subject,
  pub kind: ChangeKind,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub old: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub new: Option<String>,
}

impl Change {
  pub fn new(subject: Subject, kind: ChangeKind) -> Self {
    Self {
      subject,
      kind,
      old: None,
      new: None,
    }
  }

  pub fn with_old(mut self, old: impl Into<String>) -> Self {
    self.old = Some(old.into());
    self
  }

  pub fn with_new(mut self, new: impl Into<String>) -> Self {
    self.new = Some(new.into());
    self
  }

  /// The entity this change is scoped to, `None` for document-level changes.
  pub fn entity(&self) -> Option<&EntityRef> {
    match &self.subject {
      Subject::Version => None,
      Subject::Entity { entity } | Subject::Parameter { entity, .. } | Subject::EnvVar { entity, .. } => Some(entity),
    }
  }

  /// Parameter key or variable name, when the change is field-level.
  pub fn field(&self) -> Option<&str> {
    match &self.subject {
      Subject::Parameter { key, .. } => Some(key),
      Subject::EnvVar { name, .. } => Some(name),
      Subject::Version | Subject::Entity { .. } => None,
    }
  }

  pub fn is_change(&self) -> bool {
    self.kind != ChangeKind::Unchanged
  }
}

impl fmt::Display for Change {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.subject {
      Subject::Version => write!(f, "version {}", self.kind.as_str())?,
      Subject::Entity { entity } => write!(f, "{entity} {}", self.kind.as_str())?,
      Subject::Parameter { entity, key } => write!(f, "{entity}: {key} {}", self.kind.as_str())?,
      Subject::EnvVar { entity, name } => write!(f, "{entity}: env var {name} {}", self.kind.as_str())?,
    }

    match (&self.old, &self.new) {
      (Some(old), Some(new)) => write!(f, " from {old} to {new}"),
      (None, Some(new)) => write!(f, " ({new})"),
      (Some(old), None) => write!(f, " (was {old})"),
      (None, None) => Ok(()),
    }
  }
}

/// Everything that happened to one environment in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvironmentReport {
  pub environment: String,
  pub changes: Vec<Change>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<String>,
  /// Set when reconciliation failed; the environment's document was left as it was.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl EnvironmentReport {
  pub fn new(environment: impl Into<String>) -> Self {
    Self {
      environment: environment.into(),
      ..Default::default()
    }
  }

  pub fn record(&mut self, change: Change) {
    self.changes.push(change);
  }

  pub fn warn(&mut self, warning: impl Into<String>) {
    self.warnings.push(warning.into());
  }

  /// True when nothing but `unchanged` entries were recorded.
  pub fn is_empty(&self) -> bool {
    !self.changes.iter().any(Change::is_change)
  }

  pub fn failed(&self) -> bool {
    self.error.is_some()
  }

  /// Changes that actually modified the document.
  pub fn effective_changes(&self) -> impl Iterator<Item = &Change> {
    self.changes.iter().filter(|c| c.is_change())
  }
}

/// The report of one reconciliation pass over a set of environments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
  pub environments: Vec<EnvironmentReport>,
}

impl ChangeReport {
  pub fn push(&mut self, report: EnvironmentReport) {
    self.environments.push(report);
  }

  pub fn environment(&self, name: &str) -> Option<&EnvironmentReport> {
    self.environments.iter().find(|e| e.environment == name)
  }

  /// True when no environment recorded a change.
  pub fn is_empty(&self) -> bool {
    self.environments.iter().all(EnvironmentReport::is_empty)
  }

  pub fn change_count(&self) -> usize {
    self.environments.iter().map(|e| e.effective_changes().count()).sum()
  }
}
