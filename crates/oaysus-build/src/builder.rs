//! Component builds: client bundles, server-rendering bundles and theme CSS.
//!
//! The build flow is the same for every framework. Implementations supply
//! the compiler, the runtime packages to externalize and the SSR wrapper
//! template; the provided methods do the rest.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::compiler::{CompileMode, CompileRequest, CompileTarget, Compiler, ExternalPolicy};
use crate::framework::Framework;
use crate::fs_util::{reset_dir, scratch_dir, write_file};
use crate::manifest::PackageManifest;
use crate::tailwind;
use crate::types::{
    BuildResult, ComponentBuildOutput, ComponentInfo, DetectedDependency, ServerBuildOutput,
    ServerBuildResult, ThemeCss,
};
use crate::{Error, Result};

pub const CLIENT_FILE: &str = "index.js";
pub const STYLE_FILE: &str = "style.css";
pub const SCHEMA_FILE: &str = "schema.json";
pub const SERVER_FILE: &str = "server.js";

/// Inputs shared by every build call of one publish.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub project_root: PathBuf,
    /// Build output root (`<root>/.oaysus-build`).
    pub output_dir: PathBuf,
    pub manifest: PackageManifest,
    /// Third-party packages to externalize from client bundles.
    pub detected_deps: Vec<DetectedDependency>,
    pub minify: bool,
    pub mode: CompileMode,
    pub tool_timeout_secs: u64,
}

impl BuildContext {
    pub fn new(
        project_root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        manifest: PackageManifest,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            output_dir: output_dir.into(),
            manifest,
            detected_deps: Vec::new(),
            minify: true,
            mode: CompileMode::Production,
            tool_timeout_secs: 120,
        }
    }

    pub fn with_detected_deps(mut self, deps: Vec<DetectedDependency>) -> Self {
        self.detected_deps = deps;
        self
    }

    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    pub fn with_tool_timeout(mut self, secs: u64) -> Self {
        self.tool_timeout_secs = secs;
        self
    }

    /// Absolute entry path of a component.
    pub fn entry_path(&self, component: &ComponentInfo) -> PathBuf {
        if component.entry_point.is_absolute() {
            component.entry_point.clone()
        } else {
            self.project_root.join(&component.entry_point)
        }
    }

    pub fn component_dir(&self, component: &ComponentInfo) -> PathBuf {
        self.output_dir.join(&component.name)
    }
}

/// Compiles theme components for one framework.
#[async_trait]
pub trait Builder: Send + Sync {
    fn framework(&self) -> Framework;

    fn compiler(&self) -> &Arc<dyn Compiler>;

    /// Runtime packages externalized, with all sub-paths, from client bundles.
    fn runtime_packages(&self) -> &'static [&'static str];

    /// Module source that imports the component from `entry` (a JS string
    /// literal) and exports it together with `render(props)`.
    fn ssr_wrapper(&self, entry: &str) -> String;

    /// Externals of a client bundle: the runtime plus every detected package
    /// name and exact import. Everything else is inlined.
    fn client_externals(&self, ctx: &BuildContext) -> ExternalPolicy {
        ctx.detected_deps.iter().fold(
            ExternalPolicy::none().with_packages(self.runtime_packages().iter().copied()),
            |policy, dep| {
                policy
                    .with_specifier(dep.name.as_str())
                    .with_specifiers(dep.imports.iter().map(String::as_str))
            },
        )
    }

    /// Clean the output directory, build each component, then theme CSS.
    ///
    /// Stops at the first failed component; earlier outputs stay listed.
    async fn build_components(
        &self,
        components: &[ComponentInfo],
        ctx: &BuildContext,
    ) -> BuildResult {
        if let Err(e) = reset_dir(&ctx.output_dir) {
            return BuildResult::failed(ctx.output_dir.clone(), Vec::new(), e.to_string());
        }

        let mut built = Vec::with_capacity(components.len());
        for component in components {
            match self.build_client_component(component, ctx).await {
                Ok(output) => {
                    debug!(component = %component.name, size = output.size, "Built client bundle");
                    built.push(output);
                }
                Err(e) => {
                    let error = format!("Failed to build component '{}': {}", component.name, e);
                    return BuildResult::failed(ctx.output_dir.clone(), built, error);
                }
            }
        }

        let theme_css = self.build_theme_css(components, ctx).await;
        let total_size = built.iter().map(|c| c.size).sum();
        info!(
            framework = %self.framework(),
            components = built.len(),
            total_size,
            "Client build complete"
        );

        BuildResult {
            success: true,
            output_dir: ctx.output_dir.clone(),
            components: built,
            total_size,
            error: None,
            theme_css_path: theme_css.as_ref().map(|css| css.path.clone()),
            theme_css_size: theme_css.as_ref().map(|css| css.size),
        }
    }

    async fn build_client_component(
        &self,
        component: &ComponentInfo,
        ctx: &BuildContext,
    ) -> Result<ComponentBuildOutput> {
        let entry = ctx.entry_path(component);
        if !entry.exists() {
            return Err(Error::MissingEntry(entry));
        }

        let out_dir = ctx.component_dir(component);
        let request = CompileRequest::new(
            entry,
            &ctx.project_root,
            &out_dir,
            CLIENT_FILE,
            self.framework(),
        )
        .with_css(STYLE_FILE)
        .with_externals(self.client_externals(ctx))
        .with_target(CompileTarget::Browser)
        .with_minify(ctx.minify)
        .with_mode(ctx.mode);

        let output = self.compiler().compile(&request).await?;
        let schema_path = write_schema(component, &out_dir)?;

        Ok(ComponentBuildOutput {
            name: component.name.clone(),
            display_name: component.display_name.clone(),
            js_path: output.js_path.clone(),
            css_path: output.css_path.clone(),
            schema_path,
            size: output.total_size(),
        })
    }

    /// Build a self-contained `server.js` per component.
    ///
    /// A failing component is logged and left out; the others still build.
    async fn build_server_components(
        &self,
        components: &[ComponentInfo],
        ctx: &BuildContext,
    ) -> ServerBuildResult {
        let scratch = match scratch_dir(&ctx.project_root) {
            Ok(dir) => dir,
            Err(e) => {
                return ServerBuildResult {
                    success: false,
                    output_dir: ctx.output_dir.clone(),
                    error: Some(e.to_string()),
                    ..Default::default()
                };
            }
        };

        let mut built = Vec::new();
        let mut errors = Vec::new();
        for component in components {
            match self
                .build_server_component(component, ctx, scratch.path())
                .await
            {
                Ok(output) => built.push(output),
                Err(e) => {
                    warn!("SSR build failed for '{}': {}", component.name, e);
                    errors.push(format!("{}: {}", component.name, e));
                }
            }
        }

        let total_size = built.iter().map(|c| c.size).sum();
        ServerBuildResult {
            success: errors.is_empty(),
            output_dir: ctx.output_dir.clone(),
            components: built,
            total_size,
            error: (!errors.is_empty()).then(|| errors.join("; ")),
        }
    }

    async fn build_server_component(
        &self,
        component: &ComponentInfo,
        ctx: &BuildContext,
        scratch: &Path,
    ) -> Result<ServerBuildOutput> {
        let entry = ctx.entry_path(component);
        if !entry.exists() {
            return Err(Error::MissingEntry(entry));
        }

        let entry_literal = serde_json::to_string(&entry.to_string_lossy())?;
        let wrapper = scratch.join(format!("{}.server.js", component.name));
        write_file(&wrapper, self.ssr_wrapper(&entry_literal))?;

        let request = CompileRequest::new(
            wrapper,
            &ctx.project_root,
            ctx.component_dir(component),
            SERVER_FILE,
            self.framework(),
        )
        .with_externals(ExternalPolicy::none())
        .with_target(CompileTarget::Server)
        .with_minify(ctx.minify)
        .with_mode(ctx.mode);

        let output = self.compiler().compile(&request).await?;

        Ok(ServerBuildOutput {
            name: component.name.clone(),
            display_name: component.display_name.clone(),
            js_path: output.js_path.clone(),
            size: output.js_size,
        })
    }

    /// Compile `theme.css` when a utility-CSS framework is declared.
    ///
    /// Returns `None` when skipped or when the build fails.
    async fn build_theme_css(
        &self,
        components: &[ComponentInfo],
        ctx: &BuildContext,
    ) -> Option<ThemeCss> {
        match tailwind::build_theme_css(components, ctx).await {
            Ok(css) => css,
            Err(e) => {
                warn!("Theme CSS build failed: {}", e);
                None
            }
        }
    }
}

/// Copy `schema.json` next to the bundle, or write the in-memory schema.
fn write_schema(component: &ComponentInfo, out_dir: &Path) -> Result<PathBuf> {
    let source = component.path.join(SCHEMA_FILE);
    let target = out_dir.join(SCHEMA_FILE);

    if source.is_file() {
        std::fs::copy(&source, &target)
            .map_err(|e| Error::io(format!("Failed to copy {}", source.display()), e))?;
    } else {
        write_file(&target, serde_json::to_string_pretty(&component.schema)?)?;
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn component(dir: &Path) -> ComponentInfo {
        ComponentInfo {
            name: "hero".into(),
            display_name: "Hero".into(),
            path: dir.to_path_buf(),
            entry_point: dir.join("index.tsx"),
            schema: serde_json::json!({ "props": { "title": { "type": "string" } } }),
        }
    }

    #[test]
    fn test_write_schema_copies_file_unchanged() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join(SCHEMA_FILE), "{\"props\":{}}").unwrap();

        let out = temp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        let path = write_schema(&component(&source), &out).unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "{\"props\":{}}");
    }

    #[test]
    fn test_write_schema_falls_back_to_in_memory_schema() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let path = write_schema(&component(temp.path()), &out).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["props"]["title"]["type"], "string");
    }

    #[test]
    fn test_entry_path_resolves_relative_entries() {
        let ctx = BuildContext::new("/theme", "/theme/.oaysus-build", PackageManifest::default());
        let mut info = component(Path::new("/theme/components/hero"));
        info.entry_point = PathBuf::from("components/hero/index.tsx");

        assert_eq!(
            ctx.entry_path(&info),
            PathBuf::from("/theme/components/hero/index.tsx")
        );
        assert_eq!(
            ctx.component_dir(&info),
            PathBuf::from("/theme/.oaysus-build/hero")
        );
    }
}
