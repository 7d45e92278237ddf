//! Implementation of the `stagehand detect-secrets` command.

use std::path::Path;

use anyhow::{Context, Result};

use stagehand_lib::secrets::detect_secrets;

use crate::output::{OutputFormat, print_json, print_success, print_warning};

pub fn cmd_detect_secrets(dir: &Path, output: OutputFormat) -> Result<()> {
  let hits = detect_secrets(dir).context("Failed to scan for secrets")?;

  if output.is_json() {
    return print_json(&hits);
  }

  if hits.is_empty() {
    print_success("No plain text secrets detected");
    return Ok(());
  }

  for hit in &hits {
    print_warning(&hit.to_string());
  }
  println!();
  println!("Move these values into secrets and bind them as secret.<name>.<key>.");
  Ok(())
}
