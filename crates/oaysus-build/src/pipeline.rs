//! Publish orchestration.
//!
//! Stages run in a fixed order, each on the output of the ones before:
//!
//! ```text
//! validate → analyze-imports → install-deps → build-client → build-server
//!   → bundle-framework-deps → bundle-detected-deps → bundle-server-deps
//!   → write-manifest → generate-import-map → upload
//! ```
//!
//! The first fatal failure ends the run. Server builds and server dependency
//! bundles only add warnings. `upload` stops at the handoff: it lists the
//! files the uploader has to push.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::analyzer::analyze;
use crate::builder::{BuildContext, Builder};
use crate::bundler::{BundleOptions, Bundler, DEPS_DIR, get_bundle_size};
use crate::framework::{Framework, detect_framework};
use crate::fs_util::{list_files, write_file};
use crate::import_map::{
    CdnImportMapOptions, ImportMap, ImportMapGenerator, ImportMapWithStylesheets,
    R2ImportMapOptions,
};
use crate::manifest::{ManifestDependency, PackageManifest, ThemeManifest};
use crate::package_manager::PackageManager;
use crate::registry::FrameworkRegistry;
use crate::types::{
    BuildResult, BundledDependency, DependencySpec, DetectedDependency, ServerBuildResult,
    ServerDependencyBundle, ValidatedPackage,
};
use crate::{Error, Result};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const IMPORT_MAP_FILE: &str = "import-map.json";

/// One step of a publish run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Validate,
    AnalyzeImports,
    InstallDeps,
    BuildClient,
    BuildServer,
    BundleFrameworkDeps,
    BundleDetectedDeps,
    BundleServerDeps,
    WriteManifest,
    GenerateImportMap,
    Upload,
}

impl Stage {
    pub const ALL: [Stage; 11] = [
        Stage::Validate,
        Stage::AnalyzeImports,
        Stage::InstallDeps,
        Stage::BuildClient,
        Stage::BuildServer,
        Stage::BundleFrameworkDeps,
        Stage::BundleDetectedDeps,
        Stage::BundleServerDeps,
        Stage::WriteManifest,
        Stage::GenerateImportMap,
        Stage::Upload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::AnalyzeImports => "analyze-imports",
            Stage::InstallDeps => "install-deps",
            Stage::BuildClient => "build-client",
            Stage::BuildServer => "build-server",
            Stage::BundleFrameworkDeps => "bundle-framework-deps",
            Stage::BundleDetectedDeps => "bundle-detected-deps",
            Stage::BundleServerDeps => "bundle-server-deps",
            Stage::WriteManifest => "write-manifest",
            Stage::GenerateImportMap => "generate-import-map",
            Stage::Upload => "upload",
        }
    }

    /// Human-readable label for progress output.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Validate => "Validating package",
            Stage::AnalyzeImports => "Analyzing imports",
            Stage::InstallDeps => "Installing dependencies",
            Stage::BuildClient => "Building components",
            Stage::BuildServer => "Building server bundles",
            Stage::BundleFrameworkDeps => "Bundling framework dependencies",
            Stage::BundleDetectedDeps => "Bundling detected dependencies",
            Stage::BundleServerDeps => "Bundling server dependencies",
            Stage::WriteManifest => "Writing manifest",
            Stage::GenerateImportMap => "Generating import map",
            Stage::Upload => "Preparing upload",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress callbacks, one pair per stage.
pub trait StageObserver: Send + Sync {
    fn on_stage_start(&self, _stage: Stage) {}

    fn on_stage_complete(&self, _stage: Stage) {}

    fn on_warning(&self, _stage: Stage, _message: &str) {}
}

struct NoopObserver;

impl StageObserver for NoopObserver {}

/// Shared flag checked before each stage.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Settings for a publish run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub project_root: PathBuf,
    /// Output directory, relative to the project root.
    pub output_dir_name: String,
    /// Used for the import map when no R2 public URL is set.
    pub cdn_url: String,
    /// Public origin of the asset bucket. Enables self-hosted import maps.
    pub r2_public_url: Option<String>,
    /// Theme prefix inside the bucket. Defaults to `<theme>/<version>`.
    pub r2_base_path: Option<String>,
    pub minify: bool,
    /// Run `<package manager> install` when `node_modules` is missing.
    pub install_missing_deps: bool,
    pub tool_timeout_secs: u64,
}

impl PipelineOptions {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            output_dir_name: ".oaysus-build".to_string(),
            cdn_url: "https://esm.sh".to_string(),
            r2_public_url: None,
            r2_base_path: None,
            minify: true,
            install_missing_deps: true,
            tool_timeout_secs: 120,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.project_root.join(&self.output_dir_name)
    }

    /// Bucket prefix for this theme version.
    pub fn r2_base_path_for(&self, manifest: &PackageManifest) -> String {
        self.r2_base_path
            .clone()
            .unwrap_or_else(|| format!("{}/{}", manifest.theme_name(), manifest.version))
    }
}

/// A file the uploader pushes, keyed relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishArtifact {
    /// `/`-separated path relative to the output directory.
    pub key: String,
    pub path: PathBuf,
    pub content_type: &'static str,
    pub size: u64,
}

/// Everything a publish run produced, including partial results on failure.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub success: bool,
    pub error: Option<String>,
    pub failed_stage: Option<Stage>,
    pub framework: Option<Framework>,
    pub detected_deps: Vec<DetectedDependency>,
    pub build: Option<BuildResult>,
    pub server: Option<ServerBuildResult>,
    pub bundled_deps: Vec<BundledDependency>,
    pub server_deps: Vec<ServerDependencyBundle>,
    pub manifest: Option<ThemeManifest>,
    pub import_map: Option<ImportMapWithStylesheets>,
    pub artifacts: Vec<PublishArtifact>,
    pub warnings: Vec<String>,
    #[serde(skip)]
    current_stage: Option<Stage>,
}

impl PipelineReport {
    /// Total bytes of every bundled dependency.
    pub fn bundled_size(&self) -> u64 {
        get_bundle_size(&self.bundled_deps)
    }

    pub fn total_artifact_size(&self) -> u64 {
        self.artifacts.iter().map(|a| a.size).sum()
    }
}

/// Resolved per-framework implementations for one run.
struct Implementations {
    framework: Framework,
    builder: Arc<dyn Builder>,
    bundler: Arc<dyn Bundler>,
    import_maps: Arc<dyn ImportMapGenerator>,
}

/// Runs every stage of a publish for one validated package.
pub struct PublishPipeline {
    options: PipelineOptions,
    registry: FrameworkRegistry,
    observer: Arc<dyn StageObserver>,
    cancellation: CancellationFlag,
}

impl PublishPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            registry: FrameworkRegistry::default(),
            observer: Arc::new(NoopObserver),
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_registry(mut self, registry: FrameworkRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run every stage. Never fails; the report carries the first fatal error.
    pub async fn run(&self, package: &ValidatedPackage) -> PipelineReport {
        let started = Instant::now();
        let mut report = PipelineReport::default();

        match self.execute(package, &mut report).await {
            Ok(()) => {
                report.success = true;
                info!(
                    artifacts = report.artifacts.len(),
                    warnings = report.warnings.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Publish pipeline complete"
                );
            }
            Err(e) => {
                let stage = report.current_stage;
                warn!(stage = ?stage, "Publish pipeline failed: {}", e);
                report.success = false;
                report.failed_stage = stage;
                report.error = Some(e.to_string());
            }
        }
        report
    }

    async fn execute(&self, package: &ValidatedPackage, report: &mut PipelineReport) -> Result<()> {
        let manifest = &package.package_json;
        let output_dir = self.options.output_dir();

        self.enter(Stage::Validate, report)?;
        let implementations = self.validate(package)?;
        report.framework = Some(implementations.framework);
        self.complete(Stage::Validate);

        let mut ctx = BuildContext::new(&self.options.project_root, &output_dir, manifest.clone())
            .with_minify(self.options.minify)
            .with_tool_timeout(self.options.tool_timeout_secs);

        self.enter(Stage::AnalyzeImports, report)?;
        let entries: Vec<PathBuf> = package
            .components
            .iter()
            .map(|component| ctx.entry_path(component))
            .collect();
        let detected = analyze(&entries, &manifest.all_dependencies());
        debug!(count = detected.len(), "Detected external dependencies");
        ctx.detected_deps = detected.clone();
        report.detected_deps = detected;
        self.complete(Stage::AnalyzeImports);

        self.enter(Stage::InstallDeps, report)?;
        self.install_dependencies(manifest).await?;
        self.complete(Stage::InstallDeps);

        self.enter(Stage::BuildClient, report)?;
        let build = implementations
            .builder
            .build_components(&package.components, &ctx)
            .await;
        let build_error = (!build.success)
            .then(|| build.error.clone().unwrap_or_else(|| "client build failed".into()));
        report.build = Some(build);
        if let Some(error) = build_error {
            return Err(Error::Build(error));
        }
        self.complete(Stage::BuildClient);

        self.enter(Stage::BuildServer, report)?;
        let server = implementations
            .builder
            .build_server_components(&package.components, &ctx)
            .await;
        if let Some(error) = &server.error {
            self.warn(Stage::BuildServer, format!("Server build incomplete: {}", error), report);
        }
        report.server = Some(server);
        self.complete(Stage::BuildServer);

        let bundle_options = BundleOptions::new(&self.options.project_root, output_dir.join(DEPS_DIR))
            .with_minify(self.options.minify);

        self.enter(Stage::BundleFrameworkDeps, report)?;
        let framework_deps = implementations
            .import_maps
            .get_dependencies_to_bundle(manifest);
        let to_bundle: Vec<DependencySpec> = implementations
            .bundler
            .filter_runtime_dependencies(&framework_deps)
            .into_iter()
            .filter(|dep| !report.detected_deps.iter().any(|d| d.name == dep.name))
            .collect();
        let bundled = implementations
            .bundler
            .bundle_dependencies(&to_bundle, &bundle_options)
            .await?;
        report.bundled_deps.extend(bundled);
        self.complete(Stage::BundleFrameworkDeps);

        self.enter(Stage::BundleDetectedDeps, report)?;
        if !report.detected_deps.is_empty() {
            let bundled = implementations
                .bundler
                .bundle_detected_dependencies(&report.detected_deps, &bundle_options)
                .await?;
            report.bundled_deps.extend(bundled);
        }
        self.complete(Stage::BundleDetectedDeps);

        self.enter(Stage::BundleServerDeps, report)?;
        report.server_deps = implementations
            .bundler
            .bundle_server_dependencies(&framework_deps, &bundle_options)
            .await;
        self.complete(Stage::BundleServerDeps);

        self.enter(Stage::WriteManifest, report)?;
        let theme_manifest = self.theme_manifest(implementations.framework, manifest, report);
        write_file(&output_dir.join(MANIFEST_FILE), theme_manifest.to_json_pretty()?)?;
        report.manifest = Some(theme_manifest);
        self.complete(Stage::WriteManifest);

        self.enter(Stage::GenerateImportMap, report)?;
        let import_map = self.import_map(implementations.import_maps.as_ref(), manifest, report);
        write_file(&output_dir.join(IMPORT_MAP_FILE), import_map.import_map().to_json_pretty()?)?;
        report.import_map = Some(import_map);
        self.complete(Stage::GenerateImportMap);

        self.enter(Stage::Upload, report)?;
        report.artifacts = collect_artifacts(&output_dir)?;
        self.complete(Stage::Upload);

        Ok(())
    }

    fn enter(&self, stage: Stage, report: &mut PipelineReport) -> Result<()> {
        report.current_stage = Some(stage);
        if self.cancellation.is_cancelled() {
            return Err(Error::Cancelled(stage));
        }
        debug!(stage = %stage, "Stage started");
        self.observer.on_stage_start(stage);
        Ok(())
    }

    fn complete(&self, stage: Stage) {
        debug!(stage = %stage, "Stage complete");
        self.observer.on_stage_complete(stage);
    }

    fn warn(&self, stage: Stage, message: String, report: &mut PipelineReport) {
        warn!(stage = %stage, "{}", message);
        self.observer.on_warning(stage, &message);
        report.warnings.push(message);
    }

    fn validate(&self, package: &ValidatedPackage) -> Result<Implementations> {
        if !package.valid {
            return Err(Error::InvalidPackage(
                "package did not pass validation".to_string(),
            ));
        }
        if package.components.is_empty() {
            return Err(Error::InvalidPackage("no components found".to_string()));
        }

        let framework = detect_framework(&package.package_json);
        Ok(Implementations {
            framework,
            builder: self.registry.get_builder(framework)?,
            bundler: self.registry.get_bundler(framework)?,
            import_maps: self.registry.get_import_map_generator(framework)?,
        })
    }

    async fn install_dependencies(&self, manifest: &PackageManifest) -> Result<()> {
        let root = &self.options.project_root;
        if root.join("node_modules").is_dir() {
            debug!("node_modules present, skipping install");
            return Ok(());
        }
        if !self.options.install_missing_deps {
            debug!("node_modules missing, install disabled");
            return Ok(());
        }

        let package_manager = PackageManager::require(root, Some(manifest))?;
        info!(package_manager = package_manager.name(), "Installing dependencies");
        package_manager
            .install(root)
            .timeout_secs(self.options.tool_timeout_secs)
            .run()
            .await?;
        Ok(())
    }

    fn theme_manifest(
        &self,
        framework: Framework,
        manifest: &PackageManifest,
        report: &PipelineReport,
    ) -> ThemeManifest {
        let components = report
            .build
            .as_ref()
            .map(|build| build.components.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default();

        let deps = report
            .bundled_deps
            .iter()
            .map(|dep| ManifestDependency {
                name: dep.name.clone(),
                version: dep.version.clone(),
                r2_path: format!("{}/{}@{}", DEPS_DIR, dep.name, dep.version),
                sub_exports: dep.additional_exports.keys().cloned().collect(),
                css_imports: dep.stylesheets.keys().cloned().collect(),
            })
            .collect();

        ThemeManifest {
            framework,
            framework_version: manifest
                .framework_version(framework)
                .unwrap_or_else(|| "latest".to_string()),
            components,
            deps,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn import_map(
        &self,
        generator: &dyn ImportMapGenerator,
        manifest: &PackageManifest,
        report: &mut PipelineReport,
    ) -> ImportMapWithStylesheets {
        let Some(public_url) = &self.options.r2_public_url else {
            let map = generator.generate_import_map_from_package_json(
                manifest,
                &CdnImportMapOptions {
                    cdn_url: self.options.cdn_url.clone(),
                    detected_deps: report.detected_deps.clone(),
                },
            );
            return ImportMapWithStylesheets {
                imports: map.imports,
                stylesheets: Default::default(),
            };
        };

        let options = R2ImportMapOptions {
            r2_public_url: public_url.clone(),
            r2_base_path: self.options.r2_base_path_for(manifest),
            detected_deps: report.detected_deps.clone(),
        };
        let import_map = generator.generate_import_map_with_stylesheets(manifest, &options);

        for missing in missing_bundles(&import_map.import_map(), &options, &self.options.output_dir()) {
            self.warn(
                Stage::GenerateImportMap,
                format!("Import map references {} but no bundle was written", missing),
                report,
            );
        }
        import_map
    }
}

impl fmt::Debug for PublishPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishPipeline")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Specifiers whose R2 URL has no matching file in the output directory.
fn missing_bundles(map: &ImportMap, options: &R2ImportMapOptions, output_dir: &Path) -> Vec<String> {
    let prefix = format!(
        "{}/",
        [
            options.r2_public_url.trim_end_matches('/'),
            options.r2_base_path.trim_matches('/'),
        ]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
    );

    map.imports
        .iter()
        .filter_map(|(specifier, url)| {
            let relative = url.strip_prefix(&prefix)?;
            (!output_dir.join(relative).is_file()).then(|| specifier.clone())
        })
        .collect()
}

/// Every file under the output directory, keyed for upload.
fn collect_artifacts(output_dir: &Path) -> Result<Vec<PublishArtifact>> {
    list_files(output_dir)?
        .into_iter()
        .map(|relative| {
            let path = output_dir.join(&relative);
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            Ok(PublishArtifact {
                content_type: content_type(&path),
                size: std::fs::metadata(&path)
                    .map_err(|e| Error::io(format!("Failed to stat {}", path.display()), e))?
                    .len(),
                key,
                path,
            })
        })
        .collect()
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("js" | "mjs") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("map") => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stage_names() {
        let names: Vec<_> = Stage::ALL.iter().map(Stage::as_str).collect();
        assert_eq!(names.first(), Some(&"validate"));
        assert_eq!(names.last(), Some(&"upload"));
        assert_eq!(Stage::BundleDetectedDeps.to_string(), "bundle-detected-deps");
        assert_eq!(
            serde_json::to_string(&Stage::BuildServer).unwrap(),
            "\"build-server\""
        );
    }

    #[test]
    fn test_cancellation_flag_is_shared() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_default_r2_base_path() {
        let options = PipelineOptions::new("/theme");
        let manifest = PackageManifest::new("acme-theme", "1.2.0");
        assert_eq!(options.r2_base_path_for(&manifest), "acme-theme/1.2.0");
        assert_eq!(options.output_dir(), PathBuf::from("/theme/.oaysus-build"));
    }

    #[test]
    fn test_collect_artifacts() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("hero/index.js"), "export {}").unwrap();
        write_file(&temp.path().join("deps/@vue/shared@3.4.0/index.js"), "x").unwrap();
        write_file(&temp.path().join("manifest.json"), "{}").unwrap();

        let artifacts = collect_artifacts(temp.path()).unwrap();
        let keys: Vec<_> = artifacts.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["deps/@vue/shared@3.4.0/index.js", "hero/index.js", "manifest.json"]
        );
        assert_eq!(artifacts[2].content_type, "application/json");
        assert_eq!(artifacts[1].size, 9);
    }

    #[test]
    fn test_missing_bundles() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("deps/svelte@5.0.0/index.js"), "x").unwrap();

        let options = R2ImportMapOptions {
            r2_public_url: "https://assets.example.com".into(),
            r2_base_path: "t/1.0.0".into(),
            detected_deps: Vec::new(),
        };
        let mut map = ImportMap::new();
        map.insert("svelte", options.dependency_url("svelte", "5.0.0", "index.js"));
        map.insert("svelte/store", options.dependency_url("svelte", "5.0.0", "store.js"));

        assert_eq!(missing_bundles(&map, &options, temp.path()), vec!["svelte/store"]);
    }
}
