//! Module specifier helpers.

use once_cell::sync::Lazy;
use regex::Regex;

const CSS_EXTENSIONS: &[&str] = &[".css", ".scss", ".less", ".sass"];

/// `/css` or `/styles` as a whole path segment, at the end or followed by more path.
static CSS_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:css|styles)(?:/|$)").expect("valid CSS segment regex"));

/// Whether a specifier refers to a package rather than a local file or builtin.
pub fn is_external(specifier: &str) -> bool {
    !(specifier.starts_with('.') || specifier.starts_with('/') || specifier.starts_with("node:"))
}

/// Package name of a bare specifier (`@scope/pkg/sub` → `@scope/pkg`).
pub fn get_package_name(specifier: &str) -> String {
    let mut segments = specifier.split('/');
    match segments.next() {
        Some(scope) if scope.starts_with('@') => match segments.next() {
            Some(name) => format!("{}/{}", scope, name),
            None => scope.to_string(),
        },
        Some(name) => name.to_string(),
        None => specifier.to_string(),
    }
}

/// Sub-path after the package name, or `None` for the package root.
pub fn get_sub_export(specifier: &str) -> Option<String> {
    let package = get_package_name(specifier);
    specifier
        .strip_prefix(&package)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

/// Whether a specifier imports a stylesheet.
pub fn is_css_import(specifier: &str) -> bool {
    CSS_EXTENSIONS.iter().any(|ext| specifier.ends_with(ext)) || CSS_SEGMENT.is_match(specifier)
}

/// File name the bundler emits for a JS sub-export (`internal/client` → `internal-client.js`).
pub fn sub_export_filename(sub_export: &str) -> String {
    format!("{}.js", sub_export.replace('/', "-"))
}

/// File name the bundler emits for a CSS sub-path (`css/navigation` → `css-navigation.css`).
pub fn stylesheet_filename(sub_path: &str) -> String {
    let stem = CSS_EXTENSIONS
        .iter()
        .find_map(|ext| sub_path.strip_suffix(ext))
        .unwrap_or(sub_path);
    format!("{}.css", stem.replace('/', "-"))
}
