//! The bundler seam.
//!
//! Builders and dependency bundlers describe *what* to compile with a
//! [`CompileRequest`]; a [`Compiler`] decides *how*. The production
//! implementation is [`RolldownCompiler`]. Tests substitute a recording fake.

mod plugins;
mod rolldown_compiler;

pub use plugins::{ExternalizePlugin, ProductionModePlugin, SfcCompilerPlugin};
pub use rolldown_compiler::RolldownCompiler;

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::Result;
use crate::deps::matches_package;
use crate::framework::Framework;

/// Runtime the output is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileTarget {
    /// Modern browsers, loaded through an import map.
    Browser,
    /// A server JS runtime, self-contained.
    Server,
}

/// Value of `process.env.NODE_ENV` baked into the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompileMode {
    #[default]
    Production,
    /// Leaves `process.env.NODE_ENV` references untouched.
    Development,
}

/// Which module specifiers stay as bare imports in the output.
///
/// Packages match themselves and every sub-path; specifiers match exactly.
/// Anything else is inlined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalPolicy {
    packages: BTreeSet<String>,
    specifiers: BTreeSet<String>,
}

impl ExternalPolicy {
    /// Inline everything.
    pub fn none() -> Self {
        Self::default()
    }

    /// Externalize a package and all of its sub-paths.
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.packages.insert(package.into());
        self
    }

    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages.extend(packages.into_iter().map(Into::into));
        self
    }

    /// Externalize one exact specifier.
    pub fn with_specifier(mut self, specifier: impl Into<String>) -> Self {
        self.specifiers.insert(specifier.into());
        self
    }

    pub fn with_specifiers<I, S>(mut self, specifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specifiers.extend(specifiers.into_iter().map(Into::into));
        self
    }

    pub fn is_external(&self, specifier: &str) -> bool {
        self.specifiers.contains(specifier)
            || self
                .packages
                .iter()
                .any(|package| matches_package(specifier, package))
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.specifiers.is_empty()
    }

    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(String::as_str)
    }

    pub fn specifiers(&self) -> impl Iterator<Item = &str> {
        self.specifiers.iter().map(String::as_str)
    }
}

/// One compile call: a single entry module to one ES-module file.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub entry: PathBuf,
    /// Directory the bundler resolves `node_modules` from.
    pub cwd: PathBuf,
    pub out_dir: PathBuf,
    /// Name of the entry chunk inside `out_dir` (`index.js`, `server.js`).
    pub file_name: String,
    /// Collect emitted CSS into this file. `None` drops CSS assets.
    pub css_file_name: Option<String>,
    pub externals: ExternalPolicy,
    pub target: CompileTarget,
    /// Framework whose single-file components may appear in the graph.
    pub framework: Framework,
    pub minify: bool,
    pub mode: CompileMode,
}

impl CompileRequest {
    pub fn new(
        entry: impl Into<PathBuf>,
        cwd: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
        framework: Framework,
    ) -> Self {
        Self {
            entry: entry.into(),
            cwd: cwd.into(),
            out_dir: out_dir.into(),
            file_name: file_name.into(),
            css_file_name: None,
            externals: ExternalPolicy::none(),
            target: CompileTarget::Browser,
            framework,
            minify: true,
            mode: CompileMode::Production,
        }
    }

    pub fn with_css(mut self, css_file_name: impl Into<String>) -> Self {
        self.css_file_name = Some(css_file_name.into());
        self
    }

    pub fn with_externals(mut self, externals: ExternalPolicy) -> Self {
        self.externals = externals;
        self
    }

    pub fn with_target(mut self, target: CompileTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    pub fn with_mode(mut self, mode: CompileMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn js_path(&self) -> PathBuf {
        self.out_dir.join(&self.file_name)
    }
}

/// Files written by a compile call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutput {
    pub js_path: PathBuf,
    pub css_path: Option<PathBuf>,
    pub js_size: u64,
    pub css_size: u64,
}

impl CompileOutput {
    pub fn total_size(&self) -> u64 {
        self.js_size + self.css_size
    }
}

/// Compiles one entry module into an ES-module file on disk.
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, request: &CompileRequest) -> Result<CompileOutput>;
}
