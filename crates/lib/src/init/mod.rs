//! Initialize a stagehand project.
//!
//! This module provides the core logic for the `stagehand init` command,
//! which scaffolds a project from its compose sources:
//! - `stagehand.yaml` listing the sources and environments
//! - one override document per environment, fully populated by inference

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consts::{DEFAULT_COMPOSE_FILES, SANDBOX_ENV, override_file_name};
use crate::error::ValidationError;
use crate::manifest::{Environment, Manifest, ManifestError, manifest_path};
use crate::reconcile::base_document;
use crate::secrets::{SecretHit, detect_in_source};
use crate::source::{SourceError, load_sources};

/// Errors that can occur during initialization.
#[derive(Debug, Error)]
pub enum InitError {
  #[error("project already initialized: {} exists", path.display())]
  AlreadyInitialized { path: PathBuf },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to canonicalize path {}: {source}", path.display())]
  Canonicalize { path: PathBuf, source: std::io::Error },

  #[error("cannot find compose source {}", path.display())]
  SourceNotFound { path: PathBuf },

  #[error("no compose file found in {} (looked for {})", dir.display(), DEFAULT_COMPOSE_FILES.join(", "))]
  NoComposeFiles { dir: PathBuf },

  #[error("invalid environment name '{name}': use letters, digits, '-' or '_'")]
  InvalidEnvironmentName { name: String },

  #[error(transparent)]
  Source(#[from] SourceError),

  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),
}

/// Options for initializing a project.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
  /// Project root
  pub working_dir: PathBuf,
  /// Explicit compose sources; empty means auto-detect
  pub compose_files: Vec<PathBuf>,
  /// Environments to create in addition to the sandbox
  pub environments: Vec<String>,
}

/// Result of a successful initialization.
#[derive(Debug)]
pub struct InitResult {
  /// The project root (canonicalized)
  pub root: PathBuf,
  /// Path to the created manifest
  pub manifest_path: PathBuf,
  /// Compose sources, relative to the root where possible
  pub sources: Vec<PathBuf>,
  /// Environment names and their override documents
  pub environments: Vec<(String, PathBuf)>,
  /// Plain text secrets found in the sources
  pub secrets: Vec<SecretHit>,
}

/// Initialize a project.
///
/// # Errors
///
/// Returns an error if:
/// - the project already has a manifest
/// - no compose source can be found, or a source fails to parse or validate
/// - an environment name is invalid
/// - writing the manifest or an override document fails
pub fn init(options: &InitOptions) -> Result<InitResult, InitError> {
  let root = prepare_root(&options.working_dir)?;

  let existing = manifest_path(&root);
  if existing.exists() {
    return Err(InitError::AlreadyInitialized { path: existing });
  }

  let sources = detect_sources(&root, &options.compose_files)?;
  let source_paths: Vec<PathBuf> = sources.iter().map(|p| root.join(p)).collect();
  for source in &sources {
    info!(source = %source.display(), "using compose source");
  }

  // Validating every entity up front means a new environment never starts invalid.
  let model = load_sources(&source_paths)?;
  let base = base_document(&model)?;
  let secrets = detect_in_source(&model);

  let mut manifest = Manifest::new(&root, sources.clone());
  for name in environment_names(&options.environments)? {
    let file = PathBuf::from(override_file_name(&name));
    if root.join(&file).exists() {
      warn!(environment = %name, path = %file.display(), "replacing existing override file");
    }
    manifest.add_environment(Environment::new(&name, file, base.clone()))?;
  }

  manifest.write()?;
  debug!(root = %root.display(), "project initialized");

  let environments = manifest
    .environments
    .iter()
    .map(|e| (e.name.clone(), manifest.environment_path(e)))
    .collect();

  Ok(InitResult {
    manifest_path: manifest_path(&root),
    root,
    sources,
    environments,
    secrets,
  })
}

fn prepare_root(dir: &Path) -> Result<PathBuf, InitError> {
  fs::create_dir_all(dir).map_err(|source| InitError::CreateDir {
    path: dir.to_path_buf(),
    source,
  })?;
  dunce::canonicalize(dir).map_err(|source| InitError::Canonicalize {
    path: dir.to_path_buf(),
    source,
  })
}

/// Resolve the compose sources, relative to `root` where possible.
///
/// Without explicit sources the first default compose file is used, followed
/// by its `.override` companion when present.
fn detect_sources(root: &Path, explicit: &[PathBuf]) -> Result<Vec<PathBuf>, InitError> {
  if !explicit.is_empty() {
    return explicit
      .iter()
      .map(|path| {
        let absolute = if path.is_absolute() { path.clone() } else { root.join(path) };
        if !absolute.is_file() {
          return Err(InitError::SourceNotFound { path: path.clone() });
        }
        Ok(relative_to(root, &absolute))
      })
      .collect();
  }

  let primary = DEFAULT_COMPOSE_FILES
    .iter()
    .find(|name| root.join(name).is_file())
    .ok_or_else(|| InitError::NoComposeFiles { dir: root.to_path_buf() })?;

  let mut sources = vec![PathBuf::from(primary)];
  if let Some(companion) = override_companion(primary) {
    if root.join(&companion).is_file() {
      sources.push(PathBuf::from(companion));
    }
  }
  Ok(sources)
}

/// `docker-compose.yaml` -> `docker-compose.override.yaml`.
fn override_companion(file: &str) -> Option<String> {
  let (stem, ext) = file.rsplit_once('.')?;
  Some(format!("{stem}.override.{ext}"))
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
  path.strip_prefix(root).map(Path::to_path_buf).unwrap_or_else(|_| path.to_path_buf())
}

/// Requested environments with the sandbox first, duplicates dropped.
fn environment_names(requested: &[String]) -> Result<Vec<String>, InitError> {
  let mut names = vec![SANDBOX_ENV.to_string()];
  for name in requested {
    let name = name.trim();
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
      return Err(InitError::InvalidEnvironmentName { name: name.to_string() });
    }
    if !names.iter().any(|n| n == name) {
      names.push(name.to_string());
    }
  }
  Ok(names)
}
