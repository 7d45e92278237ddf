//! Development loop: reconcile, watch, reconcile again.
//!
//! A background [`PollWatcher`] task feeds changed paths into a bounded
//! queue. The main loop drains whatever has queued up, collapses it into one
//! follow-up pass, and checks the shutdown signal only between passes.

mod watcher;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::consts::{CHANGE_QUEUE_CAPACITY, SANDBOX_ENV};
use crate::manifest::ManifestError;
use crate::reconcile::{ReconcileOptions, ReconcileOutcome, RunError, reconcile};
use crate::report::Reporter;

pub use watcher::PollWatcher;
use watcher::{Stamp, stamp};

#[derive(Debug, Error)]
pub enum DevError {
  #[error(transparent)]
  Run(#[from] RunError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),
}

/// Options for the development loop.
#[derive(Debug, Clone)]
pub struct DevOptions {
  /// Environments to keep reconciled
  pub environments: Vec<String>,
  /// How often watched files are polled
  pub poll_interval: Duration,
  /// Capacity of the change queue
  pub queue_capacity: usize,
}

impl Default for DevOptions {
  fn default() -> Self {
    Self {
      environments: vec![SANDBOX_ENV.to_string()],
      poll_interval: Duration::from_millis(500),
      queue_capacity: CHANGE_QUEUE_CAPACITY,
    }
  }
}

/// What a finished loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevSummary {
  /// Reconciliation passes run, the initial one included.
  pub passes: usize,
}

/// Files the loop wrote itself, so their change notifications can be ignored.
#[derive(Debug, Default)]
struct OwnWrites {
  stamps: HashMap<PathBuf, Stamp>,
}

impl OwnWrites {
  fn record(&mut self, paths: &[PathBuf]) {
    for path in paths {
      self.stamps.insert(path.clone(), stamp(path));
    }
  }

  /// Drop paths whose current state is exactly what the loop wrote.
  fn filter(&mut self, paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths
      .into_iter()
      .filter(|path| match self.stamps.get(path) {
        Some(written) if *written == stamp(path) => {
          self.stamps.remove(path);
          false
        }
        _ => true,
      })
      .collect()
  }
}

/// Collapse everything queued behind `first` into one batch, first-seen order.
fn coalesce(first: PathBuf, changes: &mut mpsc::Receiver<PathBuf>) -> Vec<PathBuf> {
  let mut paths = vec![first];
  while let Ok(path) = changes.try_recv() {
    if !paths.contains(&path) {
      paths.push(path);
    }
  }
  paths
}

fn pass(
  root: &Path,
  options: &ReconcileOptions,
  reporter: &mut dyn Reporter,
  own_writes: &mut OwnWrites,
) -> Result<ReconcileOutcome, DevError> {
  let outcome = reconcile(root, options, reporter)?;
  let written = outcome.persist()?;
  own_writes.record(&written);
  Ok(outcome)
}

/// Run the development loop until `shutdown` flips to `true`.
///
/// The initial pass must load; environment failures in any pass are reported
/// and the loop keeps going so the user can fix the source. `handler` is
/// called with each coalesced batch of changed paths before the pass runs.
pub async fn run(
  root: &Path,
  options: &DevOptions,
  handler: &mut dyn FnMut(&[PathBuf]),
  reporter: &mut dyn Reporter,
  mut shutdown: watch::Receiver<bool>,
) -> Result<DevSummary, DevError> {
  let reconcile_options = ReconcileOptions {
    environments: options.environments.clone(),
  };
  let mut own_writes = OwnWrites::default();

  let outcome = pass(root, &reconcile_options, reporter, &mut own_writes)?;
  let mut passes = 1;

  let manifest = &outcome.manifest;
  let mut watched = manifest.source_paths();
  watched.extend(outcome.env_files.iter().cloned());
  for name in manifest.select(&reconcile_options.environments)? {
    if let Some(env) = manifest.environment(&name) {
      watched.push(manifest.environment_path(env));
    }
  }

  let (tx, mut rx) = mpsc::channel(options.queue_capacity.max(1));
  let watcher = PollWatcher::new(watched, options.poll_interval);
  let task = tokio::spawn(watcher.run(tx, shutdown.clone()));

  info!(root = %root.display(), "watching for changes");
  reporter.info("watching for changes, stop with Ctrl+C");

  loop {
    if *shutdown.borrow() {
      break;
    }

    tokio::select! {
      next = rx.recv() => {
        let Some(first) = next else {
          debug!("watcher ended");
          break;
        };
        let paths = own_writes.filter(coalesce(first, &mut rx));
        if paths.is_empty() {
          continue;
        }

        let listed: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        reporter.info(&format!("change detected in: {}", listed.join(", ")));
        handler(&paths);

        if let Err(e) = pass(root, &reconcile_options, reporter, &mut own_writes) {
          warn!(error = %e, "reconciliation pass failed");
          reporter.warning(&e.to_string());
        }
        passes += 1;
      }
      changed = shutdown.changed() => {
        if changed.is_err() || *shutdown.borrow() {
          break;
        }
      }
    }
  }

  drop(rx);
  task.abort();
  debug!(passes, "development loop stopped");
  Ok(DevSummary { passes })
}
