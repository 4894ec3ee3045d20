//! Progress indicators for batch runs.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} images ({eta}) {msg}";

/// Whether a human is watching stderr, where bars are drawn.
pub fn is_interactive() -> bool {
    console::user_attended_stderr()
}

/// Progress bar over `total` images.
///
/// Hidden when `quiet` is set or stderr is not a terminal, so JSON output
/// and piped runs stay clean.
pub fn image_progress(total: u64, quiet: bool) -> ProgressBar {
    if quiet || !is_interactive() {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░");

    let pb = ProgressBar::new(total).with_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Advance by one image, showing its name.
pub fn advance(pb: &ProgressBar, name: &str) {
    pb.set_message(name.to_string());
    pb.inc(1);
}

/// Finish with a success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {message}"));
}

/// Finish with an error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✗ {message}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_progress_is_hidden() {
        let pb = image_progress(3, true);
        assert!(pb.is_hidden());
        advance(&pb, "a.png");
        advance(&pb, "b.png");
        assert_eq!(pb.position(), 2);
        finish_success(&pb, "done");
        assert!(pb.is_finished());
    }

    #[test]
    fn test_finish_error() {
        let pb = image_progress(1, true);
        finish_error(&pb, "1 failed");
        assert!(pb.is_finished());
    }
}
