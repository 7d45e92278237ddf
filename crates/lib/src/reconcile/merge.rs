//! Field-by-field merge of inferred parameters and declared variables into
//! stored override entries.
//!
//! Derived keys are overwritten, Tunable keys are only filled in when
//! missing, and keys outside the catalog are never touched.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{ReferenceError, ReferenceKind, ValidationError};
use crate::overrides::EnvBinding;
use crate::params::keys::catalog_for;
use crate::params::{Parameters, Policy, lookup};
use crate::report::{Change, ChangeKind, EnvironmentReport, Subject};
use crate::source::SourceModel;
use crate::types::EntityRef;

/// Merge freshly inferred parameters into a stored entry. Returns whether anything changed.
pub(super) fn merge_parameters(
  entity: &EntityRef,
  stored: &mut Parameters,
  inferred: &Parameters,
  report: &mut EnvironmentReport,
) -> bool {
  let mut changed = false;

  for spec in catalog_for(entity.kind) {
    let key = spec.key;
    let subject = || Subject::Parameter {
      entity: entity.clone(),
      key: key.to_string(),
    };

    match spec.policy {
      Policy::Derived => match (inferred.get(key), stored.get(key).cloned()) {
        (Some(new), Some(old)) if *new != old => {
          stored.insert(key.to_string(), new.clone());
          report.record(Change::new(subject(), ChangeKind::Updated).with_old(old).with_new(new));
          changed = true;
        }
        (Some(new), None) => {
          stored.insert(key.to_string(), new.clone());
          report.record(Change::new(subject(), ChangeKind::Added).with_new(new));
          changed = true;
        }
        (None, Some(old)) => {
          stored.shift_remove(key);
          report.record(Change::new(subject(), ChangeKind::Deleted).with_old(old));
          changed = true;
        }
        _ => {}
      },
      Policy::Tunable => {
        if let Some(default) = inferred.get(key) {
          if !stored.contains_key(key) {
            stored.insert(key.to_string(), default.clone());
            report.record(Change::new(subject(), ChangeKind::Added).with_new(default));
            changed = true;
          }
        }
      }
    }
  }

  if changed {
    debug!(entity = %entity, "merged parameters");
  }
  changed
}

/// Diff stored variables against the source's declared ones, by name.
///
/// Declared variables missing from the entry are added with their source
/// binding; stored variables no longer declared are removed; everything
/// else keeps its stored binding.
pub(super) fn diff_environment(
  entity: &EntityRef,
  stored: &mut IndexMap<String, EnvBinding>,
  declared: &IndexMap<String, Option<String>>,
  report: &mut EnvironmentReport,
) -> bool {
  let mut changed = false;

  for (name, value) in declared {
    if !stored.contains_key(name) {
      stored.insert(name.clone(), EnvBinding::from_source(value.as_deref()));
      report.record(Change::new(env_subject(entity, name), ChangeKind::Added));
      changed = true;
    }
  }

  let removed: Vec<String> = stored.keys().filter(|name| !declared.contains_key(*name)).cloned().collect();
  for name in removed {
    stored.shift_remove(&name);
    report.record(Change::new(env_subject(entity, &name), ChangeKind::Deleted));
    changed = true;
  }

  changed
}

fn env_subject(entity: &EntityRef, name: &str) -> Subject {
  Subject::EnvVar {
    entity: entity.clone(),
    name: name.to_string(),
  }
}

/// Report bindings that reference secrets or configs the source does not declare.
///
/// These are warnings: the referent may be declared in another layer.
pub(super) fn check_references(
  entity: &EntityRef,
  bindings: &IndexMap<String, EnvBinding>,
  source: &SourceModel,
  report: &mut EnvironmentReport,
) -> Vec<ReferenceError> {
  let mut errors = Vec::new();

  for (variable, binding) in bindings {
    let Some((kind, target)) = binding.reference() else {
      continue;
    };
    let declared = match kind {
      ReferenceKind::Secret => source.secrets.contains(target),
      ReferenceKind::Config => source.configs.contains(target),
    };
    if declared {
      continue;
    }

    let error = ReferenceError {
      entity: entity.clone(),
      variable: variable.clone(),
      kind,
      target: target.to_string(),
    };
    warn!(environment = %report.environment, "{error}");
    report.warn(error.to_string());
    errors.push(error);
  }

  errors
}

/// Check every stored catalog value of an entity against its constraint.
pub(super) fn validate_parameters(entity: &EntityRef, params: &Parameters) -> Result<(), ValidationError> {
  for (key, value) in params {
    let Some(spec) = lookup(key).filter(|s| s.kind == entity.kind) else {
      continue;
    };
    spec
      .validate(value)
      .map_err(|reason| ValidationError::new(entity.clone(), key, value, reason))?;
  }
  Ok(())
}
