//! Typed package manifest and the theme manifest written on publish.
//!
//! `package.json` is decoded once, at the validation boundary, into
//! [`PackageManifest`]. Everything downstream works on the typed value.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::framework::Framework;
use crate::{Error, Result};

/// The parts of `package.json` the build pipeline reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub dependencies: IndexMap<String, String>,

    #[serde(default)]
    pub dev_dependencies: IndexMap<String, String>,

    /// Corepack `packageManager` field (e.g. `pnpm@9.0.0`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,

    /// Theme metadata under the `oaysus` key.
    #[serde(default, rename = "oaysus", skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeMetadata>,
}

/// Theme-level metadata declared by the pack author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PackageManifest {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// Parse a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Read and parse `package.json` from a project root.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join("package.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;
        Self::from_json(&content).map_err(|e| {
            Error::InvalidManifest(format!("{}: {}", path.display(), e))
        })
    }

    /// Merged `dependencies` + `devDependencies`. Runtime entries win on conflict.
    pub fn all_dependencies(&self) -> IndexMap<String, String> {
        let mut merged = self.dev_dependencies.clone();
        for (name, range) in &self.dependencies {
            merged.insert(name.clone(), range.clone());
        }
        merged
    }

    /// Whether a package is declared in either dependency table.
    pub fn declares(&self, package: &str) -> bool {
        self.dependencies.contains_key(package) || self.dev_dependencies.contains_key(package)
    }

    /// Declared version range of a package, runtime table first.
    pub fn declared_range(&self, package: &str) -> Option<&str> {
        self.dependencies
            .get(package)
            .or_else(|| self.dev_dependencies.get(package))
            .map(String::as_str)
    }

    /// Cleaned version of the framework runtime package, if declared.
    pub fn framework_version(&self, framework: Framework) -> Option<String> {
        self.declared_range(framework.runtime_package())
            .map(clean_version)
    }

    /// Name used for the theme in the manifest and default storage paths.
    pub fn theme_name(&self) -> &str {
        self.theme
            .as_ref()
            .and_then(|t| t.name.as_deref())
            .unwrap_or(&self.name)
    }
}

/// Strip range operators from a declared version (`^11.0.0` → `11.0.0`).
///
/// Only the first alternative of `a || b` ranges is kept.
pub fn clean_version(range: &str) -> String {
    let first = range.split("||").next().unwrap_or(range).trim();
    let first = first.split_whitespace().next().unwrap_or(first);
    first
        .trim_start_matches(|c: char| matches!(c, '^' | '~' | '>' | '<' | '=' | 'v' | ' '))
        .to_string()
}

/// Major version of a declared range, if it starts with a number.
pub fn major_version(range: &str) -> Option<u64> {
    clean_version(range)
        .split('.')
        .next()
        .and_then(|major| major.parse().ok())
}

/// Theme manifest written to `manifest.json` and read by the SSR runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeManifest {
    pub framework: Framework,
    pub framework_version: String,
    pub components: Vec<String>,
    pub deps: Vec<ManifestDependency>,
    pub created_at: String,
}

/// One hosted dependency entry in the theme manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDependency {
    pub name: String,
    pub version: String,
    pub r2_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_exports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css_imports: Vec<String>,
}

impl ThemeManifest {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
