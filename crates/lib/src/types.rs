//! Identity types shared across modules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two kinds of entity that reconciliation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
  Service,
  Volume,
}

impl EntityKind {
  pub fn as_str(self) -> &'static str {
    match self {
      EntityKind::Service => "service",
      EntityKind::Volume => "volume",
    }
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A named entity, unique within its kind in a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
  pub kind: EntityKind,
  pub name: String,
}

impl EntityRef {
  pub fn service(name: impl Into<String>) -> Self {
    Self {
      kind: EntityKind::Service,
      name: name.into(),
    }
  }

  pub fn volume(name: impl Into<String>) -> Self {
    Self {
      kind: EntityKind::Volume,
      name: name.into(),
    }
  }
}

impl fmt::Display for EntityRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.kind, self.name)
  }
}
