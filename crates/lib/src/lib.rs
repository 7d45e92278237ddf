//! stagehand-lib: Core types and logic for stagehand
//!
//! This crate turns one canonical compose description into per-environment
//! override documents and keeps them synchronised:
//! - `source`: the parsed compose project (services, volumes, secrets)
//! - `params`: the parameter catalog and inference from source facts
//! - `overrides`: per-environment override documents
//! - `manifest`: the project manifest listing sources and environments
//! - `reconcile`: the diff/merge engine applying Derived/Tunable policy
//! - `report`: the change report and the reporter sink it renders into
//! - `init`: project scaffolding from an existing compose file
//! - `secrets`: plain text secret detection in sources and overrides
//! - `dev`: the watch-and-reconcile development loop

pub mod consts;
pub mod dev;
pub mod error;
pub mod init;
pub mod manifest;
pub mod overrides;
pub mod params;
pub mod reconcile;
pub mod report;
pub mod secrets;
pub mod source;
pub mod types;
pub mod util;
