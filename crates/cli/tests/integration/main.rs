//! End-to-end tests driving the stagehand binary against compose projects.

mod common;

mod envs_tests;
mod init_tests;
mod reconcile_tests;
mod secrets_tests;
