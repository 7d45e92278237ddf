//! Implementation of the `stagehand reconcile` command.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use stagehand_lib::reconcile::{ReconcileOptions, reconcile};
use stagehand_lib::report::{NoopReporter, Reporter};

use crate::output::{ConsoleReporter, OutputFormat, print_error, print_info, print_json, print_success};

/// Execute the reconcile command.
///
/// Every selected environment is reconciled; the ones that succeed are
/// written back (unless `dry_run`), the ones that fail are left untouched
/// and make the command exit non-zero.
pub fn cmd_reconcile(dir: &Path, envs: Vec<String>, dry_run: bool, output: OutputFormat) -> Result<()> {
  let options = ReconcileOptions { environments: envs };

  let mut console = ConsoleReporter;
  let mut noop = NoopReporter;
  let reporter: &mut dyn Reporter = if output.is_json() { &mut noop } else { &mut console };

  let outcome = reconcile(dir, &options, reporter).context("Failed to reconcile")?;

  let written = if dry_run {
    Vec::new()
  } else {
    outcome.persist().context("Failed to write override files")?
  };
  for path in &written {
    info!(path = %path.display(), "override file updated");
  }

  if output.is_json() {
    print_json(&serde_json::json!({
      "dry_run": dry_run,
      "report": outcome.report,
      "written": written,
    }))?;
  } else if dry_run {
    print_info(&format!(
      "Dry run: {} change(s) not written",
      outcome.report.change_count()
    ));
  } else if written.is_empty() {
    print_info("Nothing to update");
  } else {
    print_success(&format!("Updated {} override file(s)", written.len()));
  }

  if !outcome.is_success() {
    for failure in &outcome.failures {
      print_error(&failure.to_string());
    }
    bail!("{} environment(s) failed to reconcile", outcome.failures.len());
  }

  Ok(())
}
