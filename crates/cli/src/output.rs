//! Terminal output
//!
//! Results go to stdout, diagnostics to stderr.

use imgtools_core::Error;
use owo_colors::OwoColorize;
use std::time::Duration;

/// Status line helpers
pub struct Status;

impl Status {
    /// Print a success line
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error line
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning line
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info line
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print an underlined section title
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }
}

/// Print a structured error with its code, context and suggestion.
pub fn print_error(error: &Error) {
    eprintln!(
        "{} {} {}",
        "✗".red(),
        format!("[{}]", error.code).dimmed(),
        error.message
    );
    if let Some(context) = &error.context {
        eprintln!("  {} {}", "context:".dimmed(), context);
    }
    if let Some(suggestion) = &error.suggestion {
        eprintln!("  {} {}", "hint:".cyan(), suggestion);
    }
}

/// Format a duration for display
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        return format!("{millis}ms");
    }
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let whole = duration.as_secs();
        format!("{}m {}s", whole / 60, whole % 60)
    }
}

/// `1 file`, `3 files`
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// `width x height` as printed in reports.
pub fn format_dimensions(width: u32, height: u32) -> String {
    format!("{width}x{height}")
}

/// Upscale chain such as `x3 → x2`, or `none` without passes.
pub fn format_scales(scales: &[u32]) -> String {
    if scales.is_empty() {
        return "none".to_string();
    }
    scales
        .iter()
        .map(|s| format!("x{s}"))
        .collect::<Vec<_>>()
        .join(" → ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_millis(5500)), "5.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(1, "file", "files"), "1 file");
        assert_eq!(format_count(0, "file", "files"), "0 files");
        assert_eq!(format_count(5, "image", "images"), "5 images");
    }

    #[test]
    fn test_format_dimensions() {
        assert_eq!(format_dimensions(1920, 1080), "1920x1080");
    }

    #[test]
    fn test_format_scales() {
        assert_eq!(format_scales(&[]), "none");
        assert_eq!(format_scales(&[4]), "x4");
        assert_eq!(format_scales(&[3, 2]), "x3 → x2");
    }
}
