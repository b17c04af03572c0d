//! Console output for the CLI: colored text or machine-readable JSON

use crate::error::Result;
use colored::Colorize;
use serde::Serialize;

/// Writes command results either as styled text or as JSON
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    json: bool,
}

impl OutputFormatter {
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { json }
    }

    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.json
    }

    /// Plain informational line; suppressed in JSON mode
    pub fn info(&self, message: &str) {
        if !self.json {
            println!("{message}");
        }
    }

    pub fn success(&self, message: &str) {
        if !self.json {
            println!("{} {message}", "✓".green().bold());
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.json {
            eprintln!("{} {message}", "!".yellow().bold());
        }
    }

    /// Errors always go to stderr, also in JSON mode
    pub fn error(&self, message: &str) {
        eprintln!("{} {message}", "Error:".red().bold());
    }

    /// A bold section heading
    pub fn heading(&self, title: &str) {
        if !self.json {
            println!("{}", title.bold().underline());
        }
    }

    /// Aligned `key: value` line
    pub fn field(&self, key: &str, value: &str) {
        if !self.json {
            println!("  {:<16} {value}", format!("{key}:").dimmed());
        }
    }

    /// Print a value as pretty JSON regardless of mode
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print a value as JSON, only in JSON mode
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        if self.json {
            self.json(value)?;
        }
        Ok(())
    }
}

/// Color a status name the way the dashboard does
#[must_use]
pub fn colored_status(status: crate::core::Status) -> String {
    use crate::core::Status;
    let label = status.as_str();
    match status {
        Status::Open => label.blue().to_string(),
        Status::InProgress => label.yellow().to_string(),
        Status::Resolved => label.green().to_string(),
        Status::Closed => label.dimmed().to_string(),
    }
}

/// Color a priority name by its usual severity
#[must_use]
pub fn colored_priority(priority: &str) -> String {
    match priority.to_lowercase().as_str() {
        "critical" => priority.red().bold().to_string(),
        "high" => priority.red().to_string(),
        "medium" => priority.yellow().to_string(),
        "low" => priority.green().to_string(),
        _ => priority.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Status;

    #[test]
    fn test_plain_text_without_color() {
        colored::control::set_override(false);
        assert_eq!(colored_status(Status::InProgress), "In Progress");
        assert_eq!(colored_priority("Urgent"), "Urgent");
    }
}
