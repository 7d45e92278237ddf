//! Detection of secrets committed as plain environment values.
//!
//! Variables whose name or literal value looks sensitive are reported so the
//! user can move them into a secret reference. Secret and config references
//! are never flagged, and variables without a value have nothing to leak.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::manifest::{Manifest, ManifestError};
use crate::overrides::{EnvBinding, OverrideDocument};
use crate::source::{SourceError, SourceModel, load_sources};
use crate::types::EntityRef;

struct Matcher {
  description: &'static str,
  name: Option<Regex>,
  value: Option<Regex>,
}

fn matcher(description: &'static str, name: Option<&str>, value: Option<&str>) -> Matcher {
  Matcher {
    description,
    name: name.map(|p| Regex::new(p).expect("secret name matcher")),
    value: value.map(|p| Regex::new(p).expect("secret value matcher")),
  }
}

static MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
  vec![
    matcher("password", Some(r"(?i)pass(word|wd)?([_-]|$)|(?i)pwd"), None),
    matcher("secret", Some(r"(?i)secret"), None),
    matcher("token", Some(r"(?i)token"), None),
    matcher("api key", Some(r"(?i)api[_-]?key"), None),
    matcher(
      "private key",
      Some(r"(?i)private[_-]?key"),
      Some(r"-----BEGIN ([A-Z]+ )?PRIVATE KEY-----"),
    ),
    matcher(
      "access key",
      Some(r"(?i)access[_-]?key"),
      Some(r"\b(AKIA|ASIA)[0-9A-Z]{16}\b"),
    ),
  ]
});

/// Where a suspicious value was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "location", rename_all = "lowercase")]
pub enum SecretLocation {
  /// The compose sources.
  Source,
  /// An environment's override document.
  Environment { environment: String },
}

/// One variable that looks like it carries a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretHit {
  #[serde(flatten)]
  pub location: SecretLocation,
  pub entity: EntityRef,
  pub variable: String,
  /// Which matcher fired.
  pub matcher: &'static str,
}

impl std::fmt::Display for SecretHit {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.location {
      SecretLocation::Source => write!(f, "source")?,
      SecretLocation::Environment { environment } => write!(f, "environment {environment}")?,
    }
    write!(
      f,
      ": {} variable {} looks like a {}",
      self.entity, self.variable, self.matcher
    )
  }
}

#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Source(#[from] SourceError),
}

/// Name of the first matcher that flags this variable.
fn classify(name: &str, value: &str) -> Option<&'static str> {
  if value.trim().is_empty() {
    return None;
  }
  if EnvBinding::parse(value).reference().is_some() {
    return None;
  }
  MATCHERS
    .iter()
    .find(|m| {
      m.name.as_ref().is_some_and(|re| re.is_match(name)) || m.value.as_ref().is_some_and(|re| re.is_match(value))
    })
    .map(|m| m.description)
}

fn report(hit: &SecretHit) {
  warn!(
    entity = %hit.entity,
    variable = %hit.variable,
    matcher = hit.matcher,
    "possible secret in plain text; consider a secret reference"
  );
}

/// Scan source environment values.
pub fn detect_in_source(source: &SourceModel) -> Vec<SecretHit> {
  let mut hits = Vec::new();
  for (service_name, service) in &source.services {
    for (variable, value) in &service.environment {
      let Some(matcher) = value.as_deref().and_then(|v| classify(variable, v)) else {
        continue;
      };
      let hit = SecretHit {
        location: SecretLocation::Source,
        entity: EntityRef::service(service_name),
        variable: variable.clone(),
        matcher,
      };
      report(&hit);
      hits.push(hit);
    }
  }
  hits
}

/// Scan literal bindings in one environment's override document.
pub fn detect_in_document(environment: &str, doc: &OverrideDocument) -> Vec<SecretHit> {
  let mut hits = Vec::new();
  for (service_name, service) in &doc.services {
    for (variable, binding) in &service.environment {
      let EnvBinding::Literal(value) = binding else {
        continue;
      };
      let Some(matcher) = classify(variable, value) else {
        continue;
      };
      let hit = SecretHit {
        location: SecretLocation::Environment {
          environment: environment.to_string(),
        },
        entity: EntityRef::service(service_name),
        variable: variable.clone(),
        matcher,
      };
      report(&hit);
      hits.push(hit);
    }
  }
  hits
}

/// Scan literal bindings in every environment's override document.
pub fn detect_in_manifest(manifest: &Manifest) -> Vec<SecretHit> {
  manifest
    .environments
    .iter()
    .flat_map(|env| detect_in_document(&env.name, &env.overrides))
    .collect()
}

/// Scan the sources and every override document of the project at `root`.
pub fn detect_secrets(root: &Path) -> Result<Vec<SecretHit>, SecretsError> {
  let manifest = Manifest::load(root)?;
  let source = load_sources(&manifest.source_paths())?;

  let mut hits = detect_in_source(&source);
  hits.extend(detect_in_manifest(&manifest));
  Ok(hits)
}
