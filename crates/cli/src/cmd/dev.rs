//! Implementation of the `stagehand dev` command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::debug;

use stagehand_lib::dev::{DevOptions, run};

use crate::output::{ConsoleReporter, print_info};

/// Execute the dev command: reconcile, then keep reconciling on change until Ctrl+C.
pub fn cmd_dev(dir: &Path, envs: Vec<String>, poll_interval: Duration) -> Result<()> {
  let mut options = DevOptions {
    poll_interval,
    ..Default::default()
  };
  if !envs.is_empty() {
    options.environments = envs;
  }

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let summary = rt
    .block_on(async {
      let (stop, shutdown) = watch::channel(false);
      tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
          let _ = stop.send(true);
        }
      });

      let mut handler = |paths: &[PathBuf]| {
        for path in paths {
          debug!(path = %path.display(), "change handled");
        }
      };
      run(dir, &options, &mut handler, &mut ConsoleReporter, shutdown).await
    })
    .context("Development loop failed")?;

  print_info(&format!("Stopped after {} pass(es)", summary.passes));
  Ok(())
}
