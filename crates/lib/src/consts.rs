//! Project-wide names and defaults.

/// Manifest file written at the project root by `init`.
pub const MANIFEST_FILENAME: &str = "stagehand.yaml";

/// Sandbox environment that every project gets.
pub const SANDBOX_ENV: &str = "dev";

/// Compose extension block carrying explicit parameter values.
pub const EXTENSION_KEY: &str = "x-stagehand";

/// Override documents are named `<prefix>.<env>.yaml` at the project root.
pub const OVERRIDE_FILE_PREFIX: &str = "docker-compose.env";

/// Compose files looked up when `init` is not given explicit sources.
pub const DEFAULT_COMPOSE_FILES: &[&str] = &["docker-compose.yaml", "docker-compose.yml", "compose.yaml", "compose.yml"];

/// Capacity of the change notification queue used by the dev loop.
pub const CHANGE_QUEUE_CAPACITY: usize = 50;

/// Returns the override document file name for an environment.
pub fn override_file_name(env: &str) -> String {
  format!("{}.{}.yaml", OVERRIDE_FILE_PREFIX, env)
}
