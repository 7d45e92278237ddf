//! Project level reconciliation scenarios: init a compose project, edit the
//! sources or overrides, reconcile, inspect what landed on disk.

mod common;

mod env_tests;
mod lifecycle_tests;
mod policy_tests;
