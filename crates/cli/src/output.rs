//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output: coloured status
//! messages, Unicode symbols, JSON output, and a reporter that prints
//! change reports as they are produced.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use stagehand_lib::report::{ReportLine, Reporter, Style};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const ADD: &str = "+";
  pub const MODIFY: &str = "~";
  pub const REMOVE: &str = "-";
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// Prints report lines to stdout with coloured symbols.
pub struct ConsoleReporter;

fn symbol(style: Style) -> &'static str {
  match style {
    Style::Header => "",
    Style::Added => symbols::ADD,
    Style::Updated => symbols::MODIFY,
    Style::Deleted => symbols::REMOVE,
    Style::Warning => symbols::WARNING,
    Style::Error => symbols::ERROR,
    Style::Info => symbols::INFO,
  }
}

impl Reporter for ConsoleReporter {
  fn emit(&mut self, line: &ReportLine) {
    let pad = "  ".repeat(line.indent);
    let sym = symbol(line.style);
    match line.style {
      Style::Header => println!("{pad}{}", line.text.if_supports_color(Stream::Stdout, |s| s.bold())),
      Style::Added => println!("{pad}{} {}", sym.if_supports_color(Stream::Stdout, |s| s.green()), line.text),
      Style::Updated => println!("{pad}{} {}", sym.if_supports_color(Stream::Stdout, |s| s.yellow()), line.text),
      Style::Deleted => println!("{pad}{} {}", sym.if_supports_color(Stream::Stdout, |s| s.red()), line.text),
      Style::Warning => println!(
        "{pad}{} {}",
        sym.if_supports_color(Stream::Stdout, |s| s.yellow()),
        line.text.if_supports_color(Stream::Stdout, |s| s.yellow())
      ),
      Style::Error => println!(
        "{pad}{} {}",
        sym.if_supports_color(Stream::Stdout, |s| s.red()),
        line.text.if_supports_color(Stream::Stdout, |s| s.red())
      ),
      Style::Info => println!(
        "{pad}{} {}",
        sym.if_supports_color(Stream::Stdout, |s| s.blue()),
        line.text.if_supports_color(Stream::Stdout, |s| s.dimmed())
      ),
    }
  }
}
