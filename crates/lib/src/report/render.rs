//! Rendering change reports into reporter lines.

use std::fmt;

use super::reporter::{ReportLine, Reporter, Style};
use super::types::{ChangeKind, ChangeReport, EnvironmentReport};

pub const NOTHING_TO_UPDATE: &str = "nothing to update";

impl EnvironmentReport {
  /// Lines for this environment's block: a header, then one line per change.
  pub fn lines(&self) -> Vec<ReportLine> {
    let mut lines = vec![ReportLine::new(0, Style::Header, format!("environment {}", self.environment))];

    if let Some(error) = &self.error {
      lines.push(ReportLine::new(1, Style::Error, format!("failed: {error}")));
    } else if self.is_empty() {
      lines.push(ReportLine::new(1, Style::Info, NOTHING_TO_UPDATE));
    } else {
      for change in self.effective_changes() {
        let style = match change.kind {
          ChangeKind::Added => Style::Added,
          ChangeKind::Updated => Style::Updated,
          ChangeKind::Deleted => Style::Deleted,
          ChangeKind::Unchanged => Style::Info,
        };
        lines.push(ReportLine::new(1, style, change.to_string()));
      }
    }

    for warning in &self.warnings {
      lines.push(ReportLine::new(1, Style::Warning, warning.clone()));
    }
    lines
  }

  pub fn render_to(&self, reporter: &mut dyn Reporter) {
    for line in self.lines() {
      reporter.emit(&line);
    }
  }
}

impl ChangeReport {
  pub fn render_to(&self, reporter: &mut dyn Reporter) {
    for env in &self.environments {
      env.render_to(reporter);
    }
  }
}

impl fmt::Display for EnvironmentReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for line in self.lines() {
      writeln!(f, "{line}")?;
    }
    Ok(())
  }
}

impl fmt::Display for ChangeReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for env in &self.environments {
      write!(f, "{env}")?;
    }
    Ok(())
  }
}
