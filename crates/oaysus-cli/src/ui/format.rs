//! Duration formatting and the end-of-build summary.

use console::Term;
use oaysus_build::{PipelineReport, format_bundle_size};
use owo_colors::{OwoColorize, Stream::Stderr};
use std::path::Path;
use std::time::Duration;

/// Format a duration as `ms`, seconds or `m s`.
///
/// ```
/// use oaysus_cli::ui::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print components, dependency bundles and the upload list to stderr.
pub fn print_publish_summary(report: &PipelineReport, output_dir: &Path, elapsed: Duration) {
    let width = (Term::stderr().size().1 as usize).min(80);
    let bullet = "▸".if_supports_color(Stderr, |t| t.blue()).to_string();

    eprintln!("\n{}", "Theme Pack".if_supports_color(Stderr, |t| t.bold()));
    eprintln!("{}", "─".repeat(width));

    if let Some(framework) = report.framework {
        eprintln!("  {} {}", bold("Framework:"), framework);
    }

    if let Some(build) = &report.build {
        for component in &build.components {
            eprintln!(
                "  {} {} {}",
                bullet,
                bold(&component.name),
                dimmed(&format_bundle_size(component.size))
            );
        }
    }

    if let Some(server) = &report.server {
        eprintln!(
            "  {} {} server bundle(s), {}",
            bullet,
            server.components.len(),
            dimmed(&format_bundle_size(server.total_size))
        );
    }

    if !report.bundled_deps.is_empty() {
        eprintln!("\n  {}", bold("Dependencies"));
        for dep in &report.bundled_deps {
            let extra = if dep.additional_exports.is_empty() {
                String::new()
            } else {
                format!(" +{} sub-export(s)", dep.additional_exports.len())
            };
            eprintln!(
                "  {} {}@{}{} {}",
                bullet,
                dep.name,
                dep.version,
                extra,
                dimmed(&format_bundle_size(dep.size))
            );
        }
    }

    eprintln!("{}", "─".repeat(width));
    eprintln!(
        "  {} {} file(s), {} in {}",
        bold("Upload:"),
        report.artifacts.len(),
        green(&format_bundle_size(report.total_artifact_size())),
        green(&format_duration(elapsed))
    );
    eprintln!("  {} {}", bold("Output:"), output_dir.display());

    if !report.warnings.is_empty() {
        eprintln!(
            "  {} {} warning(s)",
            "⚠".if_supports_color(Stderr, |t| t.yellow()),
            report.warnings.len()
        );
    }
    eprintln!();
}

fn bold(text: &str) -> String {
    text.if_supports_color(Stderr, |t| t.bold()).to_string()
}

fn dimmed(text: &str) -> String {
    text.if_supports_color(Stderr, |t| t.dimmed()).to_string()
}

fn green(text: &str) -> String {
    text.if_supports_color(Stderr, |t| t.green()).to_string()
}
