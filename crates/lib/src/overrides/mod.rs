//! Override documents and the environment variable bindings they carry.

mod binding;
mod document;

pub use binding::EnvBinding;
pub use document::{OverrideDocument, OverrideError, ServiceOverride, VolumeOverride};
