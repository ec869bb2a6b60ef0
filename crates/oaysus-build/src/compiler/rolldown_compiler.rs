//! Rolldown-backed [`Compiler`].

use async_trait::async_trait;
use rolldown::{
    BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, InputItem, OutputFormat, Platform,
    RawMinifyOptions,
};
use rolldown_common::Output;
use rolldown_plugin::__inner::SharedPluginable;
use std::sync::Arc;
use tracing::debug;

use super::plugins::{ExternalizePlugin, ProductionModePlugin, SfcCompilerPlugin};
use super::{CompileMode, CompileOutput, CompileRequest, CompileTarget, Compiler};
use crate::fs_util::{ensure_dir, file_size, write_file};
use crate::{Error, Result};

/// Default timeout for framework compiler subprocesses.
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;

/// Compiles with Rolldown: ESM output, no source maps.
#[derive(Debug, Clone)]
pub struct RolldownCompiler {
    tool_timeout_secs: u64,
}

impl RolldownCompiler {
    pub fn new() -> Self {
        Self {
            tool_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }

    /// Timeout for each single-file-component compiler call.
    pub fn with_tool_timeout(mut self, secs: u64) -> Self {
        self.tool_timeout_secs = secs;
        self
    }

    fn plugins(&self, request: &CompileRequest) -> Vec<SharedPluginable> {
        let mut plugins: Vec<SharedPluginable> =
            vec![Arc::new(ExternalizePlugin::new(request.externals.clone()))];

        if request.framework.uses_sfc() {
            plugins.push(Arc::new(SfcCompilerPlugin::new(
                request.framework,
                request.target,
                &request.cwd,
                self.tool_timeout_secs,
            )));
        }

        if request.mode == CompileMode::Production {
            plugins.push(Arc::new(ProductionModePlugin));
        }

        plugins
    }

    fn options(&self, request: &CompileRequest) -> BundlerOptions {
        let platform = match request.target {
            CompileTarget::Browser => Platform::Browser,
            CompileTarget::Server => Platform::Node,
        };

        BundlerOptions {
            input: Some(vec![InputItem {
                name: Some(entry_name(&request.file_name)),
                import: request.entry.to_string_lossy().into_owned(),
            }]),
            cwd: Some(request.cwd.clone()),
            format: Some(OutputFormat::Esm),
            platform: Some(platform),
            minify: request.minify.then(|| RawMinifyOptions::from(true)),
            sourcemap: None,
            ..Default::default()
        }
    }
}

impl Default for RolldownCompiler {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_name(file_name: &str) -> String {
    file_name
        .strip_suffix(".js")
        .unwrap_or(file_name)
        .to_string()
}

#[async_trait]
impl Compiler for RolldownCompiler {
    async fn compile(&self, request: &CompileRequest) -> Result<CompileOutput> {
        if !request.entry.exists() {
            return Err(Error::MissingEntry(request.entry.clone()));
        }

        debug!(
            entry = %request.entry.display(),
            target = ?request.target,
            externals = ?request.externals,
            "Compiling"
        );

        let mut bundler = RolldownBundlerBuilder::default()
            .with_options(self.options(request))
            .with_plugins(self.plugins(request))
            .build()
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        let bundle = bundler
            .generate()
            .await
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        ensure_dir(&request.out_dir)?;

        let js_path = request.js_path();
        let mut css = String::new();
        let mut wrote_entry = false;

        for output in &bundle.assets {
            match output {
                Output::Chunk(chunk) if chunk.is_entry && !wrote_entry => {
                    write_file(&js_path, chunk.code.as_bytes())?;
                    wrote_entry = true;
                }
                Output::Chunk(chunk) => {
                    let path = request.out_dir.join(chunk.filename.to_string());
                    write_file(&path, chunk.code.as_bytes())?;
                }
                Output::Asset(asset) if asset.filename.ends_with(".css") => {
                    if !css.is_empty() {
                        css.push('\n');
                    }
                    css.push_str(&String::from_utf8_lossy(asset.source.as_bytes()));
                }
                Output::Asset(asset) => {
                    let path = request.out_dir.join(asset.filename.to_string());
                    write_file(&path, asset.source.as_bytes())?;
                }
            }
        }

        if !wrote_entry {
            return Err(Error::Bundler {
                message: format!("No entry chunk emitted for {}", request.entry.display()),
            });
        }

        let css_path = match &request.css_file_name {
            Some(name) if !css.is_empty() => {
                let path = request.out_dir.join(name);
                write_file(&path, &css)?;
                Some(path)
            }
            _ => None,
        };

        let js_size = file_size(&js_path);
        let css_size = css_path.as_deref().map(file_size).unwrap_or(0);

        Ok(CompileOutput {
            js_path,
            css_path,
            js_size,
            css_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ExternalPolicy;
    use crate::framework::Framework;

    #[test]
    fn test_entry_name_strips_extension() {
        assert_eq!(entry_name("index.js"), "index");
        assert_eq!(entry_name("server.js"), "server");
        assert_eq!(entry_name("bundle"), "bundle");
    }

    #[test]
    fn test_options_follow_target() {
        let compiler = RolldownCompiler::new();
        let request = CompileRequest::new("/p/a.tsx", "/p", "/p/out", "server.js", Framework::React)
            .with_target(CompileTarget::Server)
            .with_minify(false);

        let options = compiler.options(&request);
        assert!(matches!(options.platform, Some(Platform::Node)));
        assert!(options.minify.is_none());
        assert!(options.sourcemap.is_none());
    }

    #[test]
    fn test_plugins_for_sfc_frameworks() {
        let compiler = RolldownCompiler::new();
        let react = CompileRequest::new("/p/a.tsx", "/p", "/p/out", "index.js", Framework::React)
            .with_externals(ExternalPolicy::none().with_package("react"));
        let svelte = CompileRequest::new("/p/a.svelte", "/p", "/p/out", "index.js", Framework::Svelte);

        assert_eq!(compiler.plugins(&react).len(), 2);
        assert_eq!(compiler.plugins(&svelte).len(), 3);
        assert_eq!(
            compiler
                .plugins(&react.with_mode(CompileMode::Development))
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_missing_entry_is_reported() {
        let temp = tempfile::TempDir::new().unwrap();
        let request = CompileRequest::new(
            temp.path().join("missing.tsx"),
            temp.path(),
            temp.path().join("out"),
            "index.js",
            Framework::React,
        );

        let err = RolldownCompiler::new().compile(&request).await.unwrap_err();
        assert!(matches!(err, Error::MissingEntry(_)));
    }

    /// `src/index.js` importing two paths of `ext-pkg` plus a local module,
    /// with `ext-pkg` installed under `node_modules`.
    fn project_with_local_and_package_imports() -> tempfile::TempDir {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path();
        write_file(
            &root.join("src/index.js"),
            r#"import { greet } from "ext-pkg";
import sub from "ext-pkg/sub";
import { message } from "./util.js";

export default function render() {
  return [greet(), sub, message, process.env.NODE_ENV];
}
"#,
        )
        .unwrap();
        write_file(
            &root.join("src/util.js"),
            "export const message = \"local-util-marker\";\n",
        )
        .unwrap();
        write_file(
            &root.join("node_modules/ext-pkg/package.json"),
            r#"{ "name": "ext-pkg", "version": "1.0.0", "main": "index.js",
  "exports": { ".": "./index.js", "./sub": "./sub.js" } }"#,
        )
        .unwrap();
        write_file(
            &root.join("node_modules/ext-pkg/index.js"),
            "export function greet() { return \"ext-pkg-main-marker\"; }\n",
        )
        .unwrap();
        write_file(
            &root.join("node_modules/ext-pkg/sub.js"),
            "export default \"ext-pkg-sub-marker\";\n",
        )
        .unwrap();
        temp
    }

    #[tokio::test]
    async fn test_client_build_keeps_external_packages_bare() {
        let temp = project_with_local_and_package_imports();
        let request = CompileRequest::new(
            temp.path().join("src/index.js"),
            temp.path(),
            temp.path().join("out"),
            "index.js",
            Framework::React,
        )
        .with_externals(ExternalPolicy::none().with_package("ext-pkg"))
        .with_minify(false);

        let output = RolldownCompiler::new().compile(&request).await.unwrap();
        let code = std::fs::read_to_string(&output.js_path).unwrap();

        assert_eq!(output.js_path, temp.path().join("out/index.js"));
        assert!(code.contains("\"ext-pkg\""), "{code}");
        assert!(code.contains("\"ext-pkg/sub\""), "{code}");
        assert!(code.contains("local-util-marker"), "{code}");
        assert!(!code.contains("ext-pkg-main-marker"), "{code}");
        assert!(!code.contains("ext-pkg-sub-marker"), "{code}");
        assert!(!code.contains("process.env.NODE_ENV"), "{code}");
        assert!(!code.contains("./util.js"), "{code}");
    }

    #[tokio::test]
    async fn test_server_build_without_externals_inlines_everything() {
        let temp = project_with_local_and_package_imports();
        let request = CompileRequest::new(
            temp.path().join("src/index.js"),
            temp.path(),
            temp.path().join("out"),
            "server.js",
            Framework::React,
        )
        .with_target(CompileTarget::Server)
        .with_minify(false);

        let output = RolldownCompiler::new().compile(&request).await.unwrap();
        let code = std::fs::read_to_string(&output.js_path).unwrap();

        assert_eq!(output.js_path, temp.path().join("out/server.js"));
        assert!(code.contains("ext-pkg-main-marker"), "{code}");
        assert!(code.contains("ext-pkg-sub-marker"), "{code}");
        assert!(code.contains("local-util-marker"), "{code}");
        assert!(!code.contains("from \"ext-pkg"), "{code}");
        assert!(output.js_size > 0);
    }
}
