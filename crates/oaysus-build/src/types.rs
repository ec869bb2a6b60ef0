//! Data passed between pipeline stages.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::manifest::PackageManifest;

/// One discovered component of a theme pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    /// Schema type identifier, unique within the theme pack.
    pub name: String,
    pub display_name: String,
    /// Component source directory.
    pub path: PathBuf,
    /// Absolute path to the framework-specific source file.
    pub entry_point: PathBuf,
    /// Prop definitions.
    #[serde(default)]
    pub schema: serde_json::Value,
}

/// Output of the (external) package validator.
#[derive(Debug, Clone)]
pub struct ValidatedPackage {
    pub valid: bool,
    pub components: Vec<ComponentInfo>,
    pub package_json: PackageManifest,
    pub inferred_config: Option<serde_json::Value>,
}

/// A declared package and its cleaned version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencySpec {
    pub name: String,
    pub version: String,
}

impl DependencySpec {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// `<name>@<version>`, the directory name used under `deps/`.
    pub fn dir_name(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// An external package referenced by component source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedDependency {
    pub name: String,
    /// Declared version with range operators removed.
    pub version: String,
    /// Exact specifiers seen, in first-seen order.
    pub imports: Vec<String>,
    /// Sub-paths of non-CSS imports (`swiper/react` → `react`).
    pub sub_exports: Vec<String>,
    #[serde(rename = "hasCSS")]
    pub has_css: bool,
    #[serde(rename = "cssImports")]
    pub css_imports: Vec<String>,
}

impl DetectedDependency {
    pub fn spec(&self) -> DependencySpec {
        DependencySpec::new(&self.name, &self.version)
    }
}

/// One compiled client artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentBuildOutput {
    pub name: String,
    pub display_name: String,
    pub js_path: PathBuf,
    pub css_path: Option<PathBuf>,
    pub schema_path: PathBuf,
    /// JS plus CSS byte length.
    pub size: u64,
}

/// One self-contained server-rendering artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerBuildOutput {
    pub name: String,
    pub display_name: String,
    pub js_path: PathBuf,
    pub size: u64,
}

/// Compiled utility-CSS stylesheet for the whole theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeCss {
    pub path: PathBuf,
    pub size: u64,
}

/// Aggregate outcome of the client build phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub success: bool,
    pub output_dir: PathBuf,
    /// Components built before the first failure, if any.
    pub components: Vec<ComponentBuildOutput>,
    pub total_size: u64,
    pub error: Option<String>,
    pub theme_css_path: Option<PathBuf>,
    pub theme_css_size: Option<u64>,
}

impl BuildResult {
    pub(crate) fn failed(
        output_dir: PathBuf,
        components: Vec<ComponentBuildOutput>,
        error: impl Into<String>,
    ) -> Self {
        let total_size = components.iter().map(|c| c.size).sum();
        Self {
            success: false,
            output_dir,
            components,
            total_size,
            error: Some(error.into()),
            theme_css_path: None,
            theme_css_size: None,
        }
    }
}

/// Aggregate outcome of the server build phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerBuildResult {
    /// `false` when at least one component failed; the rest are still listed.
    pub success: bool,
    pub output_dir: PathBuf,
    pub components: Vec<ServerBuildOutput>,
    pub total_size: u64,
    pub error: Option<String>,
}

/// A third-party or framework package repackaged as a standalone ES module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundledDependency {
    pub name: String,
    pub version: String,
    /// Path of `deps/<name>@<version>/index.js`.
    pub main_bundle: PathBuf,
    /// Sub-export (`internal/client`) → emitted bundle path.
    pub additional_exports: IndexMap<String, PathBuf>,
    /// CSS import specifier (`swiper/css`) → emitted stylesheet path.
    #[serde(default)]
    pub stylesheets: IndexMap<String, PathBuf>,
    /// Bytes across every file above.
    pub size: u64,
}

/// A server-side dependency bundle used by SSR output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDependencyBundle {
    pub name: String,
    pub version: String,
    /// Specifier the bundle provides (`react-dom/server`).
    pub specifier: String,
    pub path: PathBuf,
    pub size: u64,
}
