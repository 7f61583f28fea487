//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table of rows, or a message when there are none
pub fn print_rows<T: Tabled>(rows: &[T], empty_message: &str) {
    if rows.is_empty() {
        println!("{}", empty_message.yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Color a reconciliation status or pod health label
pub fn color_status(status: &str) -> String {
    match status {
        "AllOK" | "running_and_ready" => status.green().to_string(),
        "NeedsRecheck" | "pending_unschedulable" => status.yellow().to_string(),
        "unschedulable" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Format a duration as whole seconds, e.g. `60s`
pub fn format_duration(duration: Duration) -> String {
    format!("{}s", duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(60)), "60s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1s");
    }

    #[test]
    fn test_color_status_preserves_text() {
        colored::control::set_override(false);
        assert_eq!(color_status("AllOK"), "AllOK");
        assert_eq!(color_status("other"), "other");
    }
}
