//! Poll-based file watcher.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

/// What a file looked like at the last poll. `None` when it did not exist.
pub(crate) type Stamp = Option<(SystemTime, u64)>;

pub(crate) fn stamp(path: &Path) -> Stamp {
  let meta = fs::metadata(path).ok()?;
  Some((meta.modified().ok()?, meta.len()))
}

/// Watches a fixed set of files by comparing modification time and size.
#[derive(Debug)]
pub struct PollWatcher {
  interval: Duration,
  stamps: HashMap<PathBuf, Stamp>,
  order: Vec<PathBuf>,
}

impl PollWatcher {
  /// Record the current state of `paths`; only later changes are reported.
  pub fn new(paths: Vec<PathBuf>, interval: Duration) -> Self {
    let stamps = paths.iter().map(|p| (p.clone(), stamp(p))).collect();
    Self {
      interval,
      stamps,
      order: paths,
    }
  }

  /// Paths that were written, created or removed since the last poll.
  pub fn poll(&mut self) -> Vec<PathBuf> {
    let mut changed = Vec::new();
    for path in &self.order {
      let current = stamp(path);
      let previous = self.stamps.insert(path.clone(), current);
      if previous != Some(current) {
        changed.push(path.clone());
      }
    }
    changed
  }

  /// Poll until shutdown, pushing changed paths into `changes`.
  ///
  /// A full queue drops the notification: a pass is already pending and it
  /// will pick the change up.
  pub async fn run(mut self, changes: mpsc::Sender<PathBuf>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(self.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        _ = ticker.tick() => {
          for path in self.poll() {
            trace!(path = %path.display(), "file changed");
            match changes.try_send(path) {
              Ok(()) => {}
              Err(mpsc::error::TrySendError::Full(path)) => {
                debug!(path = %path.display(), "change queue full, coalescing");
              }
              Err(mpsc::error::TrySendError::Closed(_)) => return,
            }
          }
        }
        changed = shutdown.changed() => {
          if changed.is_err() || *shutdown.borrow() {
            debug!("watcher stopping");
            return;
          }
        }
      }
    }
  }
}
