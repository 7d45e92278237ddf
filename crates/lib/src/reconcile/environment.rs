//! Reconciliation of a single environment.
//!
//! Four phases run against a working copy of the stored document: version
//! sync, entity diff, parameter merge and environment variable diff. The
//! copy replaces the stored document only when every phase succeeded, so a
//! failed environment never ends up half merged.

use tracing::debug;

use super::entities::{base_service_override, base_volume_override};
use super::merge::{check_references, diff_environment, merge_parameters, validate_parameters};
use crate::error::ReconcileError;
use crate::overrides::OverrideDocument;
use crate::params::{infer_service, infer_volume};
use crate::report::{Change, ChangeKind, EnvironmentReport, Subject};
use crate::source::SourceModel;
use crate::types::EntityRef;

/// Reconcile one environment's document against the source.
///
/// Returns the updated document and the environment's change log. On error
/// the caller keeps its original document.
pub fn reconcile_environment(
  name: &str,
  current: &OverrideDocument,
  source: &SourceModel,
) -> Result<(OverrideDocument, EnvironmentReport), ReconcileError> {
  let mut doc = current.clone();
  let mut report = EnvironmentReport::new(name);

  sync_version(&mut doc, source, &mut report);
  reconcile_services(&mut doc, source, &mut report)?;
  reconcile_volumes(&mut doc, source, &mut report)?;

  for (service, entry) in &doc.services {
    validate_parameters(&EntityRef::service(service), &entry.labels)?;
  }
  for (volume, entry) in &doc.volumes {
    validate_parameters(&EntityRef::volume(volume), &entry.labels)?;
  }

  debug!(
    environment = %name,
    changes = report.effective_changes().count(),
    warnings = report.warnings.len(),
    "environment reconciled"
  );
  Ok((doc, report))
}

fn sync_version(doc: &mut OverrideDocument, source: &SourceModel, report: &mut EnvironmentReport) {
  if doc.version == source.version {
    return;
  }

  let mut change = Change::new(Subject::Version, ChangeKind::Updated);
  if !doc.version.is_empty() {
    change = change.with_old(&doc.version);
  }
  if !source.version.is_empty() {
    change = change.with_new(&source.version);
  }
  report.record(change);
  doc.version = source.version.clone();
}

fn entity_subject(entity: EntityRef) -> Subject {
  Subject::Entity { entity }
}

fn reconcile_services(
  doc: &mut OverrideDocument,
  source: &SourceModel,
  report: &mut EnvironmentReport,
) -> Result<(), ReconcileError> {
  // Additions, in source order.
  let mut added = Vec::new();
  for (name, service) in &source.services {
    if doc.services.contains_key(name) {
      continue;
    }
    let entity = EntityRef::service(name);
    let entry = base_service_override(service)?;
    check_references(&entity, &entry.environment, source, report);
    doc.services.insert(name.clone(), entry);
    report.record(Change::new(entity_subject(entity), ChangeKind::Added));
    added.push(name.as_str());
  }

  // Deletions, in stored order.
  let removed: Vec<String> = doc
    .services
    .keys()
    .filter(|name| !source.services.contains_key(*name))
    .cloned()
    .collect();
  for name in removed {
    doc.services.shift_remove(&name);
    report.record(Change::new(entity_subject(EntityRef::service(name)), ChangeKind::Deleted));
  }

  // Common entities, in source order.
  for (name, service) in &source.services {
    if added.contains(&name.as_str()) {
      continue;
    }
    let entity = EntityRef::service(name);
    let Some(entry) = doc.services.get_mut(name) else {
      continue;
    };
    let inferred = infer_service(service)?;

    let params_changed = merge_parameters(&entity, &mut entry.labels, &inferred, report);
    let env_changed = diff_environment(&entity, &mut entry.environment, &service.environment, report);
    check_references(&entity, &entry.environment, source, report);

    if !params_changed && !env_changed {
      report.record(Change::new(entity_subject(entity), ChangeKind::Unchanged));
    }
  }

  Ok(())
}

fn reconcile_volumes(
  doc: &mut OverrideDocument,
  source: &SourceModel,
  report: &mut EnvironmentReport,
) -> Result<(), ReconcileError> {
  let mut added = Vec::new();
  for (name, volume) in &source.volumes {
    if doc.volumes.contains_key(name) {
      continue;
    }
    doc.volumes.insert(name.clone(), base_volume_override(volume)?);
    report.record(Change::new(entity_subject(EntityRef::volume(name)), ChangeKind::Added));
    added.push(name.as_str());
  }

  let removed: Vec<String> = doc
    .volumes
    .keys()
    .filter(|name| !source.volumes.contains_key(*name))
    .cloned()
    .collect();
  for name in removed {
    doc.volumes.shift_remove(&name);
    report.record(Change::new(entity_subject(EntityRef::volume(name)), ChangeKind::Deleted));
  }

  for (name, volume) in &source.volumes {
    if added.contains(&name.as_str()) {
      continue;
    }
    let entity = EntityRef::volume(name);
    let Some(entry) = doc.volumes.get_mut(name) else {
      continue;
    };
    let inferred = infer_volume(volume)?;
    if !merge_parameters(&entity, &mut entry.labels, &inferred, report) {
      report.record(Change::new(entity_subject(entity), ChangeKind::Unchanged));
    }
  }

  Ok(())
}
