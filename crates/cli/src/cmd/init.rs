//! Implementation of the `stagehand init` command.
//!
//! Scaffolds a project: detects compose sources, writes `stagehand.yaml` and
//! one fully populated override document per environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use stagehand_lib::init::{InitOptions, init};

use crate::output::{OutputFormat, print_json, print_warning, symbols};

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the project is already initialized, no compose source
/// is found, or a source fails to parse or validate.
pub fn cmd_init(dir: &Path, files: Vec<PathBuf>, envs: Vec<String>, output: OutputFormat) -> Result<()> {
  let options = InitOptions {
    working_dir: dir.to_path_buf(),
    compose_files: files,
    environments: envs,
  };

  let result = init(&options).context("Failed to initialize project")?;

  if output.is_json() {
    let environments: Vec<_> = result
      .environments
      .iter()
      .map(|(name, path)| serde_json::json!({ "name": name, "file": path }))
      .collect();
    return print_json(&serde_json::json!({
      "root": result.root,
      "manifest": result.manifest_path,
      "sources": result.sources,
      "environments": environments,
      "secrets": result.secrets,
    }));
  }

  for hit in &result.secrets {
    print_warning(&hit.to_string());
  }

  println!(
    "{} {}",
    symbols::SUCCESS.green(),
    "Initialized stagehand project!".green().bold()
  );
  println!();
  println!("  {} Manifest: {}", symbols::INFO.cyan(), result.manifest_path.display());
  for source in &result.sources {
    println!("  {} Source:   {}", symbols::INFO.cyan(), source.display());
  }
  for (name, path) in &result.environments {
    println!(
      "  {} {} {} {}",
      symbols::INFO.cyan(),
      name.bold(),
      symbols::ARROW,
      path.display()
    );
  }
  println!();
  println!("{}", "Next steps:".bold());
  println!("  1. Tune parameters in the override files");
  println!("  2. Run: {}", "stagehand reconcile".cyan());

  Ok(())
}
