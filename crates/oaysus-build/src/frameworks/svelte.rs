//! Svelte: `.svelte` components compiled through the project's own compiler.
//!
//! Compiled components import `svelte/internal/*` directly, so the runtime
//! ships as one bundle per sub-path.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{FrameworkTable, RuntimeExport};
use crate::builder::Builder;
use crate::bundler::{BundleOptions, Bundler};
use crate::compiler::Compiler;
use crate::framework::Framework;
use crate::import_map::ImportMapGenerator;
use crate::types::{DependencySpec, ServerDependencyBundle};

const fn svelte_export(subpath: &'static str) -> RuntimeExport {
    RuntimeExport {
        owner: "svelte",
        package: "svelte",
        subpath: Some(subpath),
        externals: &["svelte"],
    }
}

pub static TABLE: FrameworkTable = FrameworkTable {
    framework: Framework::Svelte,
    runtime_packages: &["svelte"],
    client_exports: &[
        RuntimeExport {
            owner: "svelte",
            package: "svelte",
            subpath: None,
            externals: &[],
        },
        svelte_export("internal/client"),
        svelte_export("internal/disclose-version"),
        svelte_export("store"),
        svelte_export("motion"),
        svelte_export("transition"),
        svelte_export("animate"),
        svelte_export("easing"),
    ],
    server_exports: &[],
    allowlist: Some(&["svelte"]),
};

pub struct SvelteBuilder {
    compiler: Arc<dyn Compiler>,
}

impl SvelteBuilder {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        Self { compiler }
    }
}

impl Builder for SvelteBuilder {
    fn framework(&self) -> Framework {
        Framework::Svelte
    }

    fn compiler(&self) -> &Arc<dyn Compiler> {
        &self.compiler
    }

    fn runtime_packages(&self) -> &'static [&'static str] {
        TABLE.runtime_packages
    }

    fn ssr_wrapper(&self, entry: &str) -> String {
        format!(
            r#"import {{ render as renderComponent }} from 'svelte/server';
import Component from {entry};

export {{ Component }};
export default Component;

export function render(props = {{}}) {{
  return renderComponent(Component, {{ props }}).html;
}}
"#
        )
    }
}

pub struct SvelteBundler {
    compiler: Arc<dyn Compiler>,
}

impl SvelteBundler {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        Self { compiler }
    }
}

#[async_trait]
impl Bundler for SvelteBundler {
    fn framework(&self) -> Framework {
        Framework::Svelte
    }

    fn compiler(&self) -> &Arc<dyn Compiler> {
        &self.compiler
    }

    fn table(&self) -> &'static FrameworkTable {
        &TABLE
    }

    /// Server dependency bundles are not produced for Svelte: server
    /// component bundles inline the Svelte server runtime.
    async fn bundle_server_dependencies(
        &self,
        _deps: &[DependencySpec],
        _options: &BundleOptions,
    ) -> Vec<ServerDependencyBundle> {
        debug!("Svelte server dependency bundling is not supported, skipping");
        Vec::new()
    }
}

#[derive(Debug, Default)]
pub struct SvelteImportMapGenerator;

impl ImportMapGenerator for SvelteImportMapGenerator {
    fn framework(&self) -> Framework {
        Framework::Svelte
    }

    fn table(&self) -> &'static FrameworkTable {
        &TABLE
    }
}
