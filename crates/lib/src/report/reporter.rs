//! Reporter sinks.
//!
//! Human-facing progress and change output goes through a [`Reporter`]
//! passed in by the caller. The library never prints directly.

use std::fmt;

/// How a line should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
  Header,
  Added,
  Updated,
  Deleted,
  Warning,
  Error,
  Info,
}

impl Style {
  /// Leading marker used in plain text output.
  pub fn marker(self) -> &'static str {
    match self {
      Style::Header => "",
      Style::Added => "+",
      Style::Updated => "~",
      Style::Deleted => "-",
      Style::Warning => "!",
      Style::Error => "x",
      Style::Info => "*",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
  pub indent: usize,
  pub style: Style,
  pub text: String,
}

impl ReportLine {
  pub fn new(indent: usize, style: Style, text: impl Into<String>) -> Self {
    Self {
      indent,
      style,
      text: text.into(),
    }
  }
}

impl fmt::Display for ReportLine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let pad = "  ".repeat(self.indent);
    match self.style {
      Style::Header => write!(f, "{pad}{}", self.text),
      style => write!(f, "{pad}{} {}", style.marker(), self.text),
    }
  }
}

/// Receives rendered lines.
pub trait Reporter {
  fn emit(&mut self, line: &ReportLine);

  fn info(&mut self, text: &str) {
    self.emit(&ReportLine::new(0, Style::Info, text));
  }

  fn warning(&mut self, text: &str) {
    self.emit(&ReportLine::new(0, Style::Warning, text));
  }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
  pub lines: Vec<ReportLine>,
}

impl MemoryReporter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn text(&self) -> String {
    self.lines.iter().map(|l| format!("{l}\n")).collect()
  }
}

impl Reporter for MemoryReporter {
  fn emit(&mut self, line: &ReportLine) {
    self.lines.push(line.clone());
  }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
  fn emit(&mut self, _line: &ReportLine) {}
}
