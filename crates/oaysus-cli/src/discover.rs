//! Component discovery.
//!
//! A theme pack keeps one directory per component:
//!
//! ```text
//! components/
//! ├── hero/
//! │   ├── index.tsx      (index.vue / index.svelte for SFC frameworks)
//! │   └── schema.json
//! └── footer/
//!     ├── index.tsx
//!     └── schema.json
//! ```
//!
//! `components/` and `src/components/` are searched unless the config names a
//! directory.

use crate::error::{CliError, Result, ResultExt};
use oaysus_build::{ComponentInfo, Framework, PackageManifest, ValidatedPackage, detect_framework};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_COMPONENT_DIRS: &[&str] = &["components", "src/components"];
const SCHEMA_FILE: &str = "schema.json";

/// Read `package.json` from `project_root`.
pub fn load_manifest(project_root: &Path) -> Result<PackageManifest> {
    let path = project_root.join("package.json");
    if !path.exists() {
        return Err(CliError::FileNotFound(path));
    }
    Ok(PackageManifest::load(project_root)?)
}

/// Locate the component directory.
pub fn components_root(project_root: &Path, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let dir = project_root.join(dir);
        return if dir.is_dir() {
            Ok(dir)
        } else {
            Err(CliError::NoComponents(dir))
        };
    }

    DEFAULT_COMPONENT_DIRS
        .iter()
        .map(|dir| project_root.join(dir))
        .find(|dir| dir.is_dir())
        .ok_or_else(|| CliError::NoComponents(project_root.join(DEFAULT_COMPONENT_DIRS[0])))
}

/// Collect every component under `root` whose entry file matches `framework`.
///
/// Directories without an entry file are skipped. Results are sorted by
/// directory name.
pub fn discover_components(root: &Path, framework: Framework) -> Result<Vec<ComponentInfo>> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)
        .with_path(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    let mut components = Vec::new();
    let mut seen = HashSet::new();

    for dir in dirs {
        let Some(entry_point) = find_entry(&dir, framework) else {
            debug!(
                "Skipping {}: no index.{{{}}}",
                dir.display(),
                framework.entry_extensions().join(",")
            );
            continue;
        };

        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let schema = read_schema(&dir)?;

        let name = schema
            .get("type")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| dir_name.clone());
        let display_name = schema
            .get("displayName")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| title_case(&dir_name));

        if !seen.insert(name.clone()) {
            return Err(CliError::InvalidArgument(format!(
                "Duplicate component type '{}' in {}",
                name,
                dir.display()
            )));
        }

        components.push(ComponentInfo {
            name,
            display_name,
            path: dir,
            entry_point,
            schema,
        });
    }

    Ok(components)
}

/// Load the manifest and components of a theme project.
pub fn load_package(project_root: &Path, components_dir: Option<&Path>) -> Result<ValidatedPackage> {
    let package_json = load_manifest(project_root)?;
    let framework = detect_framework(&package_json);
    let root = components_root(project_root, components_dir)?;
    let components = discover_components(&root, framework)?;

    if components.is_empty() {
        return Err(CliError::NoComponents(root));
    }
    debug!(
        "Found {} {} component(s) in {}",
        components.len(),
        framework,
        root.display()
    );

    Ok(ValidatedPackage {
        valid: true,
        components,
        package_json,
        inferred_config: None,
    })
}

fn find_entry(dir: &Path, framework: Framework) -> Option<PathBuf> {
    framework
        .entry_extensions()
        .iter()
        .map(|ext| dir.join(format!("index.{}", ext)))
        .find(|path| path.is_file())
}

fn read_schema(dir: &Path) -> Result<serde_json::Value> {
    let path = dir.join(SCHEMA_FILE);
    if !path.exists() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    let content = std::fs::read_to_string(&path).with_path(&path)?;
    serde_json::from_str(&content).context(format!("Invalid {}", path.display()))
}

/// `hero-banner` → `Hero Banner`
fn title_case(name: &str) -> String {
    name.split(['-', '_', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
