//! Implementation of the `stagehand envs` command.

use std::path::Path;

use anyhow::{Context, Result};

use stagehand_lib::manifest::Manifest;

use crate::output::{OutputFormat, print_info, print_json, print_stat};

pub fn cmd_envs(dir: &Path, output: OutputFormat) -> Result<()> {
  let manifest = Manifest::load(dir).context("Failed to load project manifest")?;

  if output.is_json() {
    let envs: Vec<_> = manifest
      .environments
      .iter()
      .map(|env| {
        serde_json::json!({
          "name": env.name,
          "file": env.file,
          "services": env.overrides.services.len(),
          "volumes": env.overrides.volumes.len(),
        })
      })
      .collect();
    return print_json(&envs);
  }

  if manifest.environments.is_empty() {
    print_info("No environments declared");
    return Ok(());
  }

  for env in &manifest.environments {
    print_stat(&env.name, &env.file.display().to_string());
  }
  Ok(())
}
