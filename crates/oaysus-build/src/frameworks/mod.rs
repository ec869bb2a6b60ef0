//! Per-framework implementations of [`Builder`](crate::Builder),
//! [`Bundler`](crate::Bundler) and [`ImportMapGenerator`](crate::ImportMapGenerator).
//!
//! Each framework is described by one static [`FrameworkTable`]. The bundler
//! emits files named from it and the import-map generator builds URLs from
//! it, so the two cannot drift apart.

pub mod react;
pub mod svelte;
pub mod vue;

pub use react::{ReactBuilder, ReactBundler, ReactImportMapGenerator};
pub use svelte::{SvelteBuilder, SvelteBundler, SvelteImportMapGenerator};
pub use vue::{VueBuilder, VueBundler, VueImportMapGenerator};

use crate::analyzer::sub_export_filename;
use crate::framework::Framework;

/// Main bundle file name inside a `deps/<name>@<version>/` directory.
pub const MAIN_BUNDLE_FILE: &str = "index.js";

/// One module a framework ships as its own bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeExport {
    /// Declared package whose version this bundle takes.
    pub owner: &'static str,
    /// Package the module belongs to. Differs from `owner` for companion
    /// packages such as `@vue/runtime-core`.
    pub package: &'static str,
    pub subpath: Option<&'static str>,
    /// Exact specifiers left as imports when bundling this module.
    pub externals: &'static [&'static str],
}

impl RuntimeExport {
    /// Bare specifier this bundle satisfies (`svelte/internal/client`).
    pub fn specifier(&self) -> String {
        match self.subpath {
            Some(subpath) => format!("{}/{}", self.package, subpath),
            None => self.package.to_string(),
        }
    }

    /// File name inside `deps/<package>@<version>/`.
    pub fn file_name(&self) -> String {
        match self.subpath {
            Some(subpath) => sub_export_filename(subpath),
            None => MAIN_BUNDLE_FILE.to_string(),
        }
    }
}

/// Static description of a framework's runtime.
#[derive(Debug)]
pub struct FrameworkTable {
    pub framework: Framework,
    /// Externalized, with every sub-path, from client component bundles.
    pub runtime_packages: &'static [&'static str],
    /// Modules bundled for the browser and listed in the import map.
    pub client_exports: &'static [RuntimeExport],
    /// Modules bundled for server-rendering output.
    pub server_exports: &'static [RuntimeExport],
    /// Declared packages that are bundled and mapped. `None` takes every
    /// declared runtime dependency.
    pub allowlist: Option<&'static [&'static str]>,
}

impl FrameworkTable {
    /// Client exports whose version comes from `owner`.
    pub fn client_exports_of<'a>(
        &'a self,
        owner: &'a str,
    ) -> impl Iterator<Item = &'a RuntimeExport> + 'a {
        self.client_exports.iter().filter(move |e| e.owner == owner)
    }

    pub fn server_exports_of<'a>(
        &'a self,
        owner: &'a str,
    ) -> impl Iterator<Item = &'a RuntimeExport> + 'a {
        self.server_exports.iter().filter(move |e| e.owner == owner)
    }

    /// Whether `name` is one of this framework's runtime packages.
    pub fn is_runtime_package(&self, name: &str) -> bool {
        self.runtime_packages.contains(&name)
    }
}

/// Table for a framework with a linked implementation.
pub fn table(framework: Framework) -> Option<&'static FrameworkTable> {
    match framework {
        Framework::React => Some(&react::TABLE),
        Framework::Vue => Some(&vue::TABLE),
        Framework::Svelte => Some(&svelte::TABLE),
        Framework::Solid | Framework::Preact => None,
    }
}
