//! Loosely typed YAML scalars.
//!
//! Compose documents freely mix `replicas: 3` and `replicas: "3"`. Values that
//! are validated later are kept as their textual form so a malformed value can
//! be reported against the field it came from instead of failing the parse.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Any YAML scalar, kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RawScalar(pub String);

impl RawScalar {
  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn into_string(self) -> String {
    self.0
  }
}

impl<'de> Deserialize<'de> for RawScalar {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(&value)
      .map(RawScalar)
      .ok_or_else(|| de::Error::custom(format!("expected a scalar value, found {}", describe(&value))))
  }
}

/// Render a scalar YAML value as text. Returns `None` for null, sequences and mappings.
pub fn scalar_to_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Tagged(tagged) => scalar_to_string(&tagged.value),
    Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
  }
}

pub(crate) fn describe(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Sequence(_) => "a sequence",
    Value::Mapping(_) => "a mapping",
    Value::Tagged(_) => "a tagged value",
  }
}

/// Deserialize a mapping of scalars into ordered strings.
pub fn scalar_map<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<IndexMap<String, RawScalar>>::deserialize(deserializer)?;
  Ok(
    raw
      .unwrap_or_default()
      .into_iter()
      .map(|(k, v)| (k, v.into_string()))
      .collect(),
  )
}

/// Deserialize an optional scalar into text, empty when absent or null.
pub fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<RawScalar>::deserialize(deserializer)?;
  Ok(raw.map(RawScalar::into_string).unwrap_or_default())
}
