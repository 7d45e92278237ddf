//! Environment variable bindings.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_yaml::Value;

use crate::error::ReferenceKind;
use crate::util::scalar::{describe, scalar_to_string};

const SECRET_PREFIX: &str = "secret";
const CONFIG_PREFIX: &str = "config";

/// The value an environment variable takes in one environment.
///
/// On disk a binding is a plain string: `secret.<name>.<key>` and
/// `config.<name>.<key>` are references, anything else is a literal, and
/// `null` marks a variable that still needs a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnvBinding {
  Literal(String),
  Secret { name: String, key: String },
  Config { name: String, key: String },
  Unassigned,
}

impl EnvBinding {
  /// Decode the on-disk string form.
  pub fn parse(value: &str) -> Self {
    match reference_parts(value) {
      Some((ReferenceKind::Secret, name, key)) => EnvBinding::Secret { name, key },
      Some((ReferenceKind::Config, name, key)) => EnvBinding::Config { name, key },
      None => EnvBinding::Literal(value.to_string()),
    }
  }

  /// Binding for a variable as declared in the source.
  pub fn from_source(value: Option<&str>) -> Self {
    value.map_or(EnvBinding::Unassigned, EnvBinding::parse)
  }

  /// The secret or config this binding points at, if any.
  pub fn reference(&self) -> Option<(ReferenceKind, &str)> {
    match self {
      EnvBinding::Secret { name, .. } => Some((ReferenceKind::Secret, name)),
      EnvBinding::Config { name, .. } => Some((ReferenceKind::Config, name)),
      EnvBinding::Literal(_) | EnvBinding::Unassigned => None,
    }
  }

  pub fn is_unassigned(&self) -> bool {
    matches!(self, EnvBinding::Unassigned)
  }

  /// The on-disk string form, `None` when unassigned.
  pub fn to_value(&self) -> Option<String> {
    match self {
      EnvBinding::Literal(value) => Some(value.clone()),
      EnvBinding::Secret { name, key } => Some(format!("{SECRET_PREFIX}.{name}.{key}")),
      EnvBinding::Config { name, key } => Some(format!("{CONFIG_PREFIX}.{name}.{key}")),
      EnvBinding::Unassigned => None,
    }
  }
}

fn reference_parts(value: &str) -> Option<(ReferenceKind, String, String)> {
  let mut parts = value.splitn(3, '.');
  let kind = match parts.next()? {
    SECRET_PREFIX => ReferenceKind::Secret,
    CONFIG_PREFIX => ReferenceKind::Config,
    _ => return None,
  };
  let name = parts.next().filter(|n| !n.is_empty())?;
  let key = parts.next().filter(|k| !k.is_empty())?;
  Some((kind, name.to_string(), key.to_string()))
}

impl fmt::Display for EnvBinding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.to_value() {
      Some(value) => f.write_str(&value),
      None => f.write_str("<unassigned>"),
    }
  }
}

impl Serialize for EnvBinding {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self.to_value() {
      Some(value) => serializer.serialize_str(&value),
      None => serializer.serialize_none(),
    }
  }
}

impl<'de> Deserialize<'de> for EnvBinding {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let value = Value::deserialize(deserializer)?;
    binding_from_value(&value).map_err(de::Error::custom)
  }
}

fn binding_from_value(value: &Value) -> Result<EnvBinding, String> {
  if value.is_null() {
    return Ok(EnvBinding::Unassigned);
  }
  scalar_to_string(value)
    .map(|s| EnvBinding::parse(&s))
    .ok_or_else(|| format!("expected a scalar binding, found {}", describe(value)))
}

/// Accept both the mapping form and the compose `KEY=value` list form.
pub(crate) fn env_bindings<'de, D>(deserializer: D) -> Result<indexmap::IndexMap<String, EnvBinding>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(deserializer)?;
  let mut bindings = indexmap::IndexMap::new();

  match value {
    Value::Null => {}
    Value::Mapping(mapping) => {
      for (name, binding) in mapping {
        let name = scalar_to_string(&name)
          .ok_or_else(|| de::Error::custom(format!("expected a variable name, found {}", describe(&name))))?;
        let binding = binding_from_value(&binding).map_err(de::Error::custom)?;
        bindings.insert(name, binding);
      }
    }
    Value::Sequence(entries) => {
      for entry in entries {
        let entry = scalar_to_string(&entry)
          .ok_or_else(|| de::Error::custom(format!("expected NAME=value, found {}", describe(&entry))))?;
        match entry.split_once('=') {
          Some((name, binding)) => bindings.insert(name.to_string(), EnvBinding::parse(binding)),
          None => bindings.insert(entry, EnvBinding::Unassigned),
        };
      }
    }
    other => {
      return Err(de::Error::custom(format!(
        "expected environment mapping or list, found {}",
        describe(&other)
      )));
    }
  }

  Ok(bindings)
}
