//! Change reports and the reporter sinks they render into.

mod render;
mod reporter;
mod types;

pub use render::NOTHING_TO_UPDATE;
pub use reporter::{MemoryReporter, NoopReporter, ReportLine, Reporter, Style};
pub use types::*;
