//! The reconciliation engine.
//!
//! [`reconcile`] is the single entry point used by every workflow: it loads
//! the manifest and sources, reconciles the selected environments one after
//! another and returns the updated manifest together with a change report.
//! Nothing is written until the caller asks for it with
//! [`ReconcileOutcome::persist`].

mod entities;
mod environment;
mod merge;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::error::EnvironmentFailure;
use crate::manifest::{Manifest, ManifestError};
use crate::overrides::OverrideDocument;
use crate::report::{ChangeReport, EnvironmentReport, Reporter};
use crate::secrets::{SecretHit, detect_in_document, detect_in_source};
use crate::source::{SourceError, SourceModel, load_sources};

pub use entities::{base_document, base_service_override, base_volume_override};
pub use environment::reconcile_environment;

/// Which environments to reconcile. An empty list means all of them.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
  pub environments: Vec<String>,
}

/// Failures that abort a whole run, before any environment is touched.
#[derive(Debug, Error)]
pub enum RunError {
  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Source(#[from] SourceError),
}

/// Result of one reconciliation pass.
#[derive(Debug)]
pub struct ReconcileOutcome {
  /// The manifest with every successfully reconciled environment updated in memory.
  pub manifest: Manifest,
  pub report: ChangeReport,
  /// Environments that failed; their documents are unchanged.
  pub failures: Vec<EnvironmentFailure>,
  /// `env_file` paths the sources read.
  pub env_files: Vec<PathBuf>,
}

impl ReconcileOutcome {
  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }

  /// Write back every environment that reconciled successfully and changed.
  pub fn persist(&self) -> Result<Vec<PathBuf>, ManifestError> {
    let mut written = Vec::new();
    for env in &self.report.environments {
      if env.failed() || env.is_empty() {
        continue;
      }
      written.push(self.manifest.write_environment(&env.environment)?);
    }
    Ok(written)
  }
}

/// Load the project at `root` and reconcile the selected environments.
pub fn reconcile(
  root: &Path,
  options: &ReconcileOptions,
  reporter: &mut dyn Reporter,
) -> Result<ReconcileOutcome, RunError> {
  let manifest = Manifest::load(root)?;
  let source = load_sources(&manifest.source_paths())?;
  Ok(reconcile_manifest(manifest, &source, options, reporter)?)
}

/// Reconcile an already loaded manifest against a source model.
///
/// Environments run in declaration order. A failing environment is recorded
/// and skipped; the others still run.
pub fn reconcile_manifest(
  mut manifest: Manifest,
  source: &SourceModel,
  options: &ReconcileOptions,
  reporter: &mut dyn Reporter,
) -> Result<ReconcileOutcome, ManifestError> {
  let selected = manifest.select(&options.environments)?;
  let source_secrets = detect_in_source(source);
  let mut report = ChangeReport::default();
  let mut failures = Vec::new();

  for name in selected {
    let Some(env) = manifest.environment_mut(&name) else {
      continue;
    };
    info!(environment = %name, "reconciling environment");

    match reconcile_environment(&name, &env.overrides, source) {
      Ok((doc, mut env_report)) => {
        warn_secrets(&mut env_report, &source_secrets, &doc);
        env.overrides = doc;
        env_report.render_to(reporter);
        report.push(env_report);
      }
      Err(error) => {
        warn!(environment = %name, error = %error, "reconciliation failed");
        let mut env_report = EnvironmentReport::new(&name);
        env_report.error = Some(error.to_string());
        env_report.render_to(reporter);
        report.push(env_report);
        failures.push(EnvironmentFailure {
          environment: name,
          error,
        });
      }
    }
  }

  Ok(ReconcileOutcome {
    manifest,
    report,
    failures,
    env_files: source.env_files(),
  })
}

/// Add plain text secrets to the report. A source value that was copied into
/// the environment is reported once, against the environment.
fn warn_secrets(report: &mut EnvironmentReport, source_hits: &[SecretHit], doc: &OverrideDocument) {
  let env_hits = detect_in_document(&report.environment, doc);
  let copied = |hit: &SecretHit| {
    env_hits
      .iter()
      .any(|e| e.entity == hit.entity && e.variable == hit.variable)
  };
  let source_only: Vec<&SecretHit> = source_hits.iter().filter(|hit| !copied(hit)).collect();
  for hit in source_only.into_iter().chain(&env_hits) {
    report.warn(hit.to_string());
  }
}
