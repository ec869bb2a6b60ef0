//! Import analysis for component sources.
//!
//! Scans each component entry (and the local files it imports inside the same
//! component directory) for module specifiers, keeps the ones that name a
//! package declared in the manifest, and groups them per package.
//!
//! Framework runtime packages and development tooling are never reported:
//! the runtime is externalized by every builder anyway, and tooling must not
//! reach a bundle.

mod scan;
mod specifier;

pub use scan::{MAX_VISITED_FILES, extract_specifiers, resolve_source, walk_component};
pub use specifier::{
    get_package_name, get_sub_export, is_css_import, is_external, stylesheet_filename,
    sub_export_filename,
};

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::deps::{is_dev_only, is_framework_runtime};
use crate::manifest::clean_version;
use crate::types::DetectedDependency;

/// Detect the external packages used by a set of component entry files.
///
/// `manifest_deps` maps declared package names to their version ranges.
/// Specifiers whose package is not declared are dropped without a warning.
pub fn analyze(
    entry_paths: &[PathBuf],
    manifest_deps: &IndexMap<String, String>,
) -> Vec<DetectedDependency> {
    let mut detected: IndexMap<String, DetectedDependency> = IndexMap::new();

    for entry in entry_paths {
        let component_dir = entry.parent().unwrap_or(Path::new("."));
        for specifier in walk_component(entry, component_dir) {
            record(&mut detected, &specifier, manifest_deps);
        }
    }

    debug!(
        count = detected.len(),
        packages = ?detected.keys().collect::<Vec<_>>(),
        "Detected external dependencies"
    );
    detected.into_values().collect()
}

fn record(
    detected: &mut IndexMap<String, DetectedDependency>,
    specifier: &str,
    manifest_deps: &IndexMap<String, String>,
) {
    if !is_external(specifier) {
        return;
    }

    let name = get_package_name(specifier);
    let Some(range) = manifest_deps.get(&name) else {
        return;
    };
    if is_framework_runtime(specifier) || is_dev_only(&name) {
        return;
    }

    let dep = detected
        .entry(name.clone())
        .or_insert_with(|| DetectedDependency {
            name,
            version: clean_version(range),
            imports: Vec::new(),
            sub_exports: Vec::new(),
            has_css: false,
            css_imports: Vec::new(),
        });

    push_unique(&mut dep.imports, specifier);
    if is_css_import(specifier) {
        dep.has_css = true;
        push_unique(&mut dep.css_imports, specifier);
    } else if let Some(sub_export) = get_sub_export(specifier) {
        push_unique(&mut dep.sub_exports, &sub_export);
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn deps(entries: &[(&str, &str)]) -> IndexMap<String, String> {
        entries
            .iter()
            .map(|(name, version)| (name.to_string(), version.to_string()))
            .collect()
    }

    fn component(root: &Path, name: &str, source: &str) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        let entry = dir.join("index.tsx");
        std::fs::write(&entry, source).unwrap();
        entry
    }

    #[test]
    fn test_swiper_scenario() {
        let temp = TempDir::new().unwrap();
        let entry = component(
            temp.path(),
            "carousel",
            "import React from 'react';\n\
             import { Swiper } from 'swiper';\n\
             import { SwiperSlide } from 'swiper/react';\n\
             import 'swiper/css';\n",
        );

        let detected = analyze(
            &[entry],
            &deps(&[("react", "^18.2.0"), ("react-dom", "^18.2.0"), ("swiper", "^11.0.0")]),
        );

        assert_eq!(
            detected,
            vec![DetectedDependency {
                name: "swiper".into(),
                version: "11.0.0".into(),
                imports: vec!["swiper".into(), "swiper/react".into(), "swiper/css".into()],
                sub_exports: vec!["react".into()],
                has_css: true,
                css_imports: vec!["swiper/css".into()],
            }]
        );
    }

    #[test]
    fn test_undeclared_packages_are_dropped() {
        let temp = TempDir::new().unwrap();
        let entry = component(
            temp.path(),
            "hero",
            "import x from 'undeclared';\nimport clsx from 'clsx';",
        );

        let detected = analyze(&[entry], &deps(&[("clsx", "~2.1.0")]));

        let names: Vec<_> = detected.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["clsx"]);
        assert_eq!(detected[0].version, "2.1.0");
    }

    #[test]
    fn test_runtime_and_dev_packages_are_excluded() {
        let temp = TempDir::new().unwrap();
        let entry = component(
            temp.path(),
            "hero",
            "import { jsx } from 'react/jsx-runtime';\nimport type { T } from '@types/thing';",
        );

        let detected = analyze(
            &[entry],
            &deps(&[("react", "^18.0.0"), ("@types/thing", "^1.0.0")]),
        );

        assert!(detected.is_empty());
    }

    #[test]
    fn test_aggregates_across_components() {
        let temp = TempDir::new().unwrap();
        let a = component(temp.path(), "a", "import '@scope/ui/button';");
        let b = component(temp.path(), "b", "import { x } from '@scope/ui';");

        let detected = analyze(&[a, b], &deps(&[("@scope/ui", "1.0.0")]));

        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].imports, vec!["@scope/ui/button", "@scope/ui"]);
        assert_eq!(detected[0].sub_exports, vec!["button"]);
        assert!(!detected[0].has_css);
    }

    #[test]
    fn test_visit_budget_is_per_component() {
        let temp = TempDir::new().unwrap();
        let mut entries = Vec::new();
        let mut declared = Vec::new();
        for prefix in ["a", "b"] {
            let dir = temp.path().join(prefix);
            std::fs::create_dir_all(&dir).unwrap();
            for i in 0..(MAX_VISITED_FILES + 5) {
                std::fs::write(
                    dir.join(format!("f{i}.ts")),
                    format!("import './f{}';\nimport '{prefix}-pkg-{i}';", i + 1),
                )
                .unwrap();
                declared.push((format!("{prefix}-pkg-{i}"), "1.0.0".to_string()));
            }
            entries.push(dir.join("f0.ts"));
        }
        let declared: IndexMap<String, String> = declared.into_iter().collect();

        let detected = analyze(&entries, &declared);

        for prefix in ["a", "b"] {
            let count = detected
                .iter()
                .filter(|d| d.name.starts_with(&format!("{prefix}-pkg-")))
                .count();
            assert_eq!(count, MAX_VISITED_FILES);
        }
    }

    #[test]
    fn test_missing_entry_is_skipped() {
        let temp = TempDir::new().unwrap();
        let detected = analyze(
            &[temp.path().join("ghost/index.tsx")],
            &deps(&[("clsx", "2.0.0")]),
        );
        assert!(detected.is_empty());
    }
}
