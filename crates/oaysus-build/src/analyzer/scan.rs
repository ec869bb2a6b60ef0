//! Textual import extraction and the bounded local-import walk.

use once_cell::sync::Lazy;
use path_clean::PathClean;
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Upper bound on files visited by a single [`walk_component`] call.
///
/// The budget is per component: `analyze` walks each entry separately, so
/// every component gets its own allowance.
pub const MAX_VISITED_FILES: usize = 50;

/// Extensions tried, in order, before the literal path.
const RESOLVE_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js"];

/// Local files worth scanning for further imports.
const SCRIPT_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js", "mjs", "cjs", "svelte", "vue"];

static STATIC_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:import|export)\s[^'";]*?\bfrom\s*['"]([^'"]+)['"]"#)
        .expect("valid static import regex")
});

static SIDE_EFFECT_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bimport\s*['"]([^'"]+)['"]"#).expect("valid side-effect import regex")
});

static DYNAMIC_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid dynamic import regex")
});

static REQUIRE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid require regex")
});

/// Import specifiers in `source`, in source order, each listed once.
pub fn extract_specifiers(source: &str) -> Vec<String> {
    let mut found: Vec<(usize, &str)> = [
        &*STATIC_IMPORT,
        &*SIDE_EFFECT_IMPORT,
        &*DYNAMIC_IMPORT,
        &*REQUIRE_CALL,
    ]
    .into_iter()
    .flat_map(|pattern| {
        pattern
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|m| (m.start(), m.as_str()))
    })
    .collect();
    found.sort_by_key(|(offset, _)| *offset);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter(|(_, specifier)| seen.insert(*specifier))
        .map(|(_, specifier)| specifier.to_string())
        .collect()
}

/// Resolve a source path by appending each known extension, then the literal path.
pub fn resolve_source(path: &Path) -> Option<PathBuf> {
    RESOLVE_EXTENSIONS
        .iter()
        .map(|ext| {
            let mut candidate = path.as_os_str().to_owned();
            candidate.push(".");
            candidate.push(ext);
            PathBuf::from(candidate)
        })
        .chain(std::iter::once(path.to_path_buf()))
        .find(|candidate| candidate.is_file())
}

fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

/// Walk an entry file and the local files it reaches inside `component_dir`.
///
/// Returns every specifier seen, in visit order. Local specifiers are
/// followed breadth-first; files outside `component_dir` are not visited.
pub fn walk_component(entry: &Path, component_dir: &Path) -> Vec<String> {
    let component_dir = component_dir.to_path_buf().clean();
    let mut specifiers = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([entry.to_path_buf()]);

    while let Some(candidate) = queue.pop_front() {
        if visited.len() >= MAX_VISITED_FILES {
            debug!(
                entry = %entry.display(),
                "Import walk stopped at {} files",
                MAX_VISITED_FILES
            );
            break;
        }

        let Some(file) = resolve_source(&candidate) else {
            warn!("Skipping unreadable source {}", candidate.display());
            continue;
        };
        let file = file.clean();
        if !visited.insert(file.clone()) {
            continue;
        }

        let source = match std::fs::read_to_string(&file) {
            Ok(source) => source,
            Err(e) => {
                warn!("Skipping unreadable source {}: {}", file.display(), e);
                continue;
            }
        };

        let base = file.parent().unwrap_or(&component_dir).to_path_buf();
        for specifier in extract_specifiers(&source) {
            if specifier.starts_with('.') {
                let local = base.join(&specifier).clean();
                let in_component = local.starts_with(&component_dir);
                if in_component && resolve_source(&local).is_some_and(|p| is_script(&p)) {
                    queue.push_back(local);
                }
            }
            specifiers.push(specifier);
        }
    }

    specifiers
}
