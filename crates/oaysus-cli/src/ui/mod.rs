//! Terminal output: status lines, the stage spinner and the publish summary.
//!
//! Everything here writes to stderr so that `--json` output on stdout stays
//! machine-readable.
//!
//! # Examples
//!
//! ```no_run
//! use oaysus_cli::ui;
//!
//! ui::init_colors(false);
//! ui::info("Building theme pack");
//! ui::success("Done");
//! ```

mod format;
mod messages;
mod spinner;

pub use format::{format_duration, print_publish_summary};
pub use messages::{error, info, success, warning};
pub use spinner::StageSpinner;

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
}

/// Whether colored output should be used on stderr.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise colors follow the terminal.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }
    console::user_attended_stderr()
}

/// Apply the `--no-color` flag and environment to `owo-colors` and `console`.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && should_use_color();
    owo_colors::set_override(enabled);
    console::set_colors_enabled_stderr(enabled);
}

/// Whether spinners should be drawn.
pub(crate) fn interactive() -> bool {
    !is_ci() && console::user_attended_stderr()
}
