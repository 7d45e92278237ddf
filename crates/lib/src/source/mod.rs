//! The canonical compose description, as a structural model.

mod load;
mod types;

pub use load::{SourceError, load_source, load_sources, parse_source};
pub use types::*;
