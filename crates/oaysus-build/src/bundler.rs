//! Standalone ES-module bundles of framework and third-party packages.
//!
//! Every package lands in `deps/<name>@<version>/` with `index.js` as its
//! main bundle and one flat file per sub-export. Scratch entry modules are
//! created in a `.oaysus-temp-*` directory that is removed on every path.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analyzer::{get_package_name, get_sub_export, stylesheet_filename, sub_export_filename};
use crate::compiler::{CompileMode, CompileRequest, CompileTarget, Compiler, ExternalPolicy};
use crate::deps::matches_package;
use crate::framework::Framework;
use crate::frameworks::{FrameworkTable, MAIN_BUNDLE_FILE, RuntimeExport};
use crate::fs_util::{file_size, scratch_dir, write_file};
use crate::types::{BundledDependency, DependencySpec, DetectedDependency, ServerDependencyBundle};
use crate::{Error, Result};

/// Directory under the build output that holds dependency bundles.
pub const DEPS_DIR: &str = "deps";

/// Where and how dependency bundles are written.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    pub project_root: PathBuf,
    /// The `deps/` directory.
    pub output_dir: PathBuf,
    pub minify: bool,
    pub mode: CompileMode,
}

impl BundleOptions {
    pub fn new(project_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            output_dir: output_dir.into(),
            minify: true,
            mode: CompileMode::Production,
        }
    }

    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// `deps/<name>@<version>/`.
    pub fn package_dir(&self, name: &str, version: &str) -> PathBuf {
        self.output_dir.join(format!("{}@{}", name, version))
    }
}

/// Bundles dependencies for one framework.
#[async_trait]
pub trait Bundler: Send + Sync {
    fn framework(&self) -> Framework;

    fn compiler(&self) -> &Arc<dyn Compiler>;

    fn table(&self) -> &'static FrameworkTable;

    /// Drop development-only packages. Pure and order-preserving.
    fn filter_runtime_dependencies(&self, deps: &[DependencySpec]) -> Vec<DependencySpec> {
        crate::deps::filter_runtime_dependencies(deps)
    }

    /// Runtime packages left external when bundling `name`.
    fn dependency_externals(&self, name: &str) -> ExternalPolicy {
        ExternalPolicy::none().with_packages(
            self.table()
                .runtime_packages
                .iter()
                .copied()
                .filter(|package| !matches_package(name, package)),
        )
    }

    /// Bundle each dependency plus the framework modules it owns.
    ///
    /// A failing main bundle fails the call. A failing framework sub-export
    /// is logged and left out.
    async fn bundle_dependencies(
        &self,
        deps: &[DependencySpec],
        options: &BundleOptions,
    ) -> Result<Vec<BundledDependency>> {
        let scratch = scratch_dir(&options.project_root)?;
        let table = self.table();
        let mut bundles: Vec<BundledDependency> = Vec::new();

        for dep in deps {
            let owned: Vec<&RuntimeExport> = table.client_exports_of(&dep.name).collect();

            if owned.is_empty() {
                let main = bundle_module(
                    self.compiler(),
                    self.framework(),
                    options,
                    scratch.path(),
                    &dep.name,
                    &options.package_dir(&dep.name, &dep.version),
                    MAIN_BUNDLE_FILE,
                    self.dependency_externals(&dep.name),
                    CompileTarget::Browser,
                )
                .await?;
                bundles.push(BundledDependency {
                    name: dep.name.clone(),
                    version: dep.version.clone(),
                    main_bundle: main.clone(),
                    additional_exports: IndexMap::new(),
                    stylesheets: IndexMap::new(),
                    size: file_size(&main),
                });
                continue;
            }

            for export in owned {
                let dir = options.package_dir(export.package, &dep.version);
                let externals = ExternalPolicy::none().with_specifiers(export.externals.iter().copied());
                let result = bundle_module(
                    self.compiler(),
                    self.framework(),
                    options,
                    scratch.path(),
                    &export.specifier(),
                    &dir,
                    &export.file_name(),
                    externals,
                    CompileTarget::Browser,
                )
                .await;

                match (export.subpath, result) {
                    (None, Ok(path)) => bundles.push(BundledDependency {
                        name: export.package.to_string(),
                        version: dep.version.clone(),
                        size: file_size(&path),
                        main_bundle: path,
                        additional_exports: IndexMap::new(),
                        stylesheets: IndexMap::new(),
                    }),
                    (None, Err(e)) => return Err(e),
                    (Some(subpath), Ok(path)) => {
                        match bundles.iter_mut().find(|b| b.name == export.package) {
                            Some(bundle) => {
                                bundle.size += file_size(&path);
                                bundle.additional_exports.insert(subpath.to_string(), path);
                            }
                            None => warn!(
                                "Bundled {} without its main package bundle",
                                export.specifier()
                            ),
                        }
                    }
                    (Some(_), Err(e)) => {
                        warn!("Skipping {}: {}", export.specifier(), e);
                    }
                }
            }
        }

        info!(
            framework = %self.framework(),
            count = bundles.len(),
            size = get_bundle_size(&bundles),
            "Bundled framework dependencies"
        );
        Ok(bundles)
    }

    /// Bundle the server-side modules (`react-dom/server`) for the declared
    /// framework packages. Failures are logged and skipped.
    async fn bundle_server_dependencies(
        &self,
        deps: &[DependencySpec],
        options: &BundleOptions,
    ) -> Vec<ServerDependencyBundle> {
        let scratch = match scratch_dir(&options.project_root) {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Server dependency bundling skipped: {}", e);
                return Vec::new();
            }
        };

        let mut bundles = Vec::new();
        for dep in deps {
            for export in self.table().server_exports_of(&dep.name) {
                let specifier = export.specifier();
                let result = bundle_module(
                    self.compiler(),
                    self.framework(),
                    options,
                    scratch.path(),
                    &specifier,
                    &options.package_dir(export.package, &dep.version),
                    &export.file_name(),
                    ExternalPolicy::none().with_specifiers(export.externals.iter().copied()),
                    CompileTarget::Server,
                )
                .await;

                match result {
                    Ok(path) => bundles.push(ServerDependencyBundle {
                        name: export.package.to_string(),
                        version: dep.version.clone(),
                        specifier,
                        size: file_size(&path),
                        path,
                    }),
                    Err(e) => warn!("Server bundle for {} failed: {}", specifier, e),
                }
            }
        }
        bundles
    }

    /// Bundle packages found by the import analyzer, one file per
    /// sub-export plus one stylesheet per CSS import.
    ///
    /// A failing main bundle fails the call; sub-exports and stylesheets
    /// are skipped with a warning.
    async fn bundle_detected_dependencies(
        &self,
        detected: &[DetectedDependency],
        options: &BundleOptions,
    ) -> Result<Vec<BundledDependency>> {
        if detected.is_empty() {
            return Ok(Vec::new());
        }

        let scratch = scratch_dir(&options.project_root)?;
        let mut bundles = Vec::with_capacity(detected.len());

        for dep in detected {
            let dir = options.package_dir(&dep.name, &dep.version);
            let externals = self.dependency_externals(&dep.name);

            let main_bundle = bundle_module(
                self.compiler(),
                self.framework(),
                options,
                scratch.path(),
                &dep.name,
                &dir,
                MAIN_BUNDLE_FILE,
                externals.clone(),
                CompileTarget::Browser,
            )
            .await?;
            let mut size = file_size(&main_bundle);

            let mut additional_exports = IndexMap::new();
            for sub_export in &dep.sub_exports {
                let specifier = format!("{}/{}", dep.name, sub_export);
                let result = bundle_module(
                    self.compiler(),
                    self.framework(),
                    options,
                    scratch.path(),
                    &specifier,
                    &dir,
                    &sub_export_filename(sub_export),
                    externals.clone().with_specifier(dep.name.as_str()),
                    CompileTarget::Browser,
                )
                .await;
                match result {
                    Ok(path) => {
                        size += file_size(&path);
                        additional_exports.insert(sub_export.clone(), path);
                    }
                    Err(e) => warn!("Skipping sub-export {}: {}", specifier, e),
                }
            }

            let mut stylesheets = IndexMap::new();
            for css_import in &dep.css_imports {
                match copy_package_stylesheet(&options.project_root, css_import, &dir) {
                    Ok(path) => {
                        size += file_size(&path);
                        stylesheets.insert(css_import.clone(), path);
                    }
                    Err(e) => warn!("Skipping stylesheet {}: {}", css_import, e),
                }
            }

            debug!(package = %dep.name, size, "Bundled detected dependency");
            bundles.push(BundledDependency {
                name: dep.name.clone(),
                version: dep.version.clone(),
                main_bundle,
                additional_exports,
                stylesheets,
                size,
            });
        }

        Ok(bundles)
    }
}

/// Compile a re-export entry for `specifier` into `out_dir/file_name`.
#[allow(clippy::too_many_arguments)]
async fn bundle_module(
    compiler: &Arc<dyn Compiler>,
    framework: Framework,
    options: &BundleOptions,
    scratch: &Path,
    specifier: &str,
    out_dir: &Path,
    file_name: &str,
    externals: ExternalPolicy,
    target: CompileTarget,
) -> Result<PathBuf> {
    let entry = scratch.join(format!("{}.entry.js", scratch_name(specifier, target)));
    write_file(&entry, reexport_module(specifier)?)?;

    let request = CompileRequest::new(entry, &options.project_root, out_dir, file_name, framework)
        .with_externals(externals)
        .with_target(target)
        .with_minify(options.minify)
        .with_mode(options.mode);

    let output = compiler.compile(&request).await?;
    Ok(output.js_path)
}

/// `export * from 'pkg'` plus a default export of the namespace.
fn reexport_module(specifier: &str) -> Result<String> {
    let literal = serde_json::to_string(specifier)?;
    Ok(format!(
        "export * from {literal};\nimport * as __pkg from {literal};\nexport default (__pkg.default ?? __pkg);\n"
    ))
}

fn scratch_name(specifier: &str, target: CompileTarget) -> String {
    let flat: String = specifier
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    match target {
        CompileTarget::Browser => flat,
        CompileTarget::Server => format!("{}.server", flat),
    }
}

/// Copy the stylesheet behind a package CSS specifier into `dir`.
fn copy_package_stylesheet(project_root: &Path, specifier: &str, dir: &Path) -> Result<PathBuf> {
    let source = resolve_package_stylesheet(project_root, specifier)
        .ok_or_else(|| Error::MissingEntry(project_root.join("node_modules").join(specifier)))?;
    let sub_path = get_sub_export(specifier).unwrap_or_else(|| "style".to_string());
    let target = dir.join(stylesheet_filename(&sub_path));

    let css = std::fs::read(&source)
        .map_err(|e| Error::io(format!("Failed to read {}", source.display()), e))?;
    write_file(&target, css)?;
    Ok(target)
}

/// Resolve a package CSS specifier through `exports`, then the file system.
fn resolve_package_stylesheet(project_root: &Path, specifier: &str) -> Option<PathBuf> {
    let package = get_package_name(specifier);
    let package_dir = project_root.join("node_modules").join(&package);
    let manifest: Option<serde_json::Value> = std::fs::read_to_string(package_dir.join("package.json"))
        .ok()
        .and_then(|json| serde_json::from_str(&json).ok());

    let Some(sub_path) = get_sub_export(specifier) else {
        return manifest
            .as_ref()
            .and_then(|m| m.get("style"))
            .and_then(|style| style.as_str())
            .map(|style| package_dir.join(style))
            .filter(|path| path.is_file());
    };

    let exported = manifest
        .as_ref()
        .and_then(|m| m.get("exports"))
        .and_then(|exports| exports.get(format!("./{}", sub_path)))
        .and_then(export_target)
        .map(|target| package_dir.join(target));

    exported
        .into_iter()
        .chain([
            package_dir.join(&sub_path),
            package_dir.join(format!("{}.css", sub_path)),
            package_dir.join(&sub_path).join("index.css"),
        ])
        .find(|path| path.is_file())
}

/// File path of an `exports` entry, preferring style and browser conditions.
fn export_target(entry: &serde_json::Value) -> Option<&str> {
    match entry {
        serde_json::Value::String(path) => Some(path),
        serde_json::Value::Object(conditions) => ["style", "browser", "import", "default"]
            .iter()
            .find_map(|key| conditions.get(*key))
            .and_then(export_target),
        _ => None,
    }
}

/// Total bytes across bundles.
pub fn get_bundle_size(bundles: &[BundledDependency]) -> u64 {
    bundles.iter().map(|b| b.size).sum()
}

/// Human-readable size (`512 B`, `1.5 KB`, `2.0 MB`).
pub fn format_bundle_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let value = bytes as f64;
    if value < KB {
        format!("{} B", bytes)
    } else if value < MB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{:.1} MB", value / MB)
    }
}
