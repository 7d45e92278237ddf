//! Parameters: the catalog of recognised keys and inference from source facts.

mod infer;
pub mod keys;

use indexmap::IndexMap;

pub use infer::{infer_service, infer_volume};
pub use keys::{ParamSpec, Policy, lookup, policy_of};

/// Ordered parameter map, as stored in an override document's labels.
pub type Parameters = IndexMap<String, String>;
