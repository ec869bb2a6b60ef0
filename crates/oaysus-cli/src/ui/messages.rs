//! One-line status messages on stderr.

use owo_colors::{OwoColorize, Stream::Stderr};

pub fn success(message: &str) {
    eprintln!("{}", format_success(message));
}

pub fn info(message: &str) {
    eprintln!("{}", format_info(message));
}

pub fn warning(message: &str) {
    eprintln!("{}", format_warning(message));
}

pub fn error(message: &str) {
    eprintln!("{}", format_error(message));
}

fn format_success(message: &str) -> String {
    format!("{} {}", "✓".if_supports_color(Stderr, |t| t.green()), message)
}

fn format_info(message: &str) -> String {
    format!("{} {}", "ℹ".if_supports_color(Stderr, |t| t.blue()), message)
}

fn format_warning(message: &str) -> String {
    format!(
        "{} {}",
        "⚠".if_supports_color(Stderr, |t| t.yellow()),
        message.if_supports_color(Stderr, |t| t.yellow())
    )
}

fn format_error(message: &str) -> String {
    format!(
        "{} {}",
        "✗".if_supports_color(Stderr, |t| t.red()),
        message.if_supports_color(Stderr, |t| t.red())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_status_lines() {
        owo_colors::set_override(false);

        assert_eq!(format_success("Built 3 components"), "✓ Built 3 components");
        assert_eq!(format_info("Analyzing imports"), "ℹ Analyzing imports");
        assert_eq!(
            format_warning("Failed to bundle react-dom/server"),
            "⚠ Failed to bundle react-dom/server"
        );
        assert_eq!(
            format_error("Stage 'build-client' failed"),
            "✗ Stage 'build-client' failed"
        );
    }
}
