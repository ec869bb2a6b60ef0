//! # oaysus-build
//!
//! Build orchestration for Oaysus theme packs.
//!
//! Takes a validated set of components plus a target UI framework and produces
//! everything the uploader needs: client bundles, server-rendering bundles,
//! standalone ES-module bundles of third-party dependencies, an import map and
//! a theme manifest. Compilation itself is delegated to Rolldown through the
//! [`compiler::Compiler`] seam.
//!
//! ## Quick Start
//!
//! ```no_run
//! use oaysus_build::{PipelineOptions, PublishPipeline, ValidatedPackage};
//!
//! # async fn example(package: ValidatedPackage) -> oaysus_build::Result<()> {
//! let pipeline = PublishPipeline::new(PipelineOptions::new("/path/to/theme"));
//! let report = pipeline.run(&package).await;
//!
//! if let Some(error) = &report.error {
//!     eprintln!("build failed: {error}");
//! }
//! for artifact in &report.artifacts {
//!     println!("{} ({} bytes)", artifact.key, artifact.size);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Output layout
//!
//! ```text
//! .oaysus-build/
//! ├── <component>/index.js, style.css, schema.json, server.js
//! ├── deps/<pkg>@<version>/index.js (+ one file per sub-export)
//! ├── theme.css
//! ├── import-map.json
//! └── manifest.json
//! ```

pub mod analyzer;
pub mod builder;
pub mod bundler;
pub mod compiler;
pub mod deps;
pub mod framework;
pub mod frameworks;
pub mod fs_util;
pub mod import_map;
pub mod manifest;
pub mod package_manager;
pub mod pipeline;
pub mod registry;
pub mod tailwind;
pub mod tool;
pub mod types;

pub use analyzer::{analyze, get_package_name, get_sub_export, is_css_import, is_external};
pub use builder::{BuildContext, Builder};
pub use bundler::{BundleOptions, Bundler, format_bundle_size, get_bundle_size};
pub use compiler::{
    CompileMode, CompileOutput, CompileRequest, CompileTarget, Compiler, ExternalPolicy,
    RolldownCompiler,
};
pub use framework::{Framework, detect_framework};
pub use import_map::{
    CdnImportMapOptions, ImportMap, ImportMapGenerator, ImportMapWithStylesheets,
    R2ImportMapOptions,
};
pub use manifest::{ManifestDependency, PackageManifest, ThemeManifest};
pub use pipeline::{
    CancellationFlag, PipelineOptions, PipelineReport, PublishArtifact, PublishPipeline, Stage,
    StageObserver,
};
pub use registry::FrameworkRegistry;
pub use tool::ToolError;
pub use types::*;

/// Error types for oaysus-build operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error reported by the Rolldown bundler.
    #[error("Bundler error: {message}")]
    Bundler { message: String },

    /// A pipeline stage reported a fatal build failure.
    #[error("Build failed: {0}")]
    Build(String),

    /// A component or dependency entry file does not exist.
    #[error("Entry point not found: {}", .0.display())]
    MissingEntry(std::path::PathBuf),

    /// No implementation is linked for the requested framework.
    #[error("No implementation for framework {0}")]
    UnsupportedFramework(Framework),

    /// The package manifest is missing data the pipeline depends on.
    #[error("Invalid package manifest: {0}")]
    InvalidManifest(String),

    /// The validated package handed to the pipeline is unusable.
    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    /// An external command-line tool failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The pipeline was cancelled between stages.
    #[error("Build cancelled before stage '{0}'")]
    Cancelled(Stage),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error with context message.
    #[error("{message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization or deserialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for oaysus-build operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundler error from a Rolldown error batch.
    pub fn from_rolldown_batch(error: &dyn std::fmt::Debug) -> Self {
        Error::Bundler {
            message: format!("{:?}", error),
        }
    }

    pub(crate) fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Error::IoError {
            message: message.into(),
            source,
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Bundler { .. } => "OAYSUS_BUNDLER_ERROR",
            Error::Build(_) => "OAYSUS_BUILD_FAILED",
            Error::MissingEntry(_) => "OAYSUS_MISSING_ENTRY",
            Error::UnsupportedFramework(_) => "OAYSUS_UNSUPPORTED_FRAMEWORK",
            Error::InvalidManifest(_) => "OAYSUS_INVALID_MANIFEST",
            Error::InvalidPackage(_) => "OAYSUS_INVALID_PACKAGE",
            Error::Tool(_) => "OAYSUS_TOOL_ERROR",
            Error::Cancelled(_) => "OAYSUS_CANCELLED",
            Error::Io(_) | Error::IoError { .. } => "OAYSUS_IO_ERROR",
            Error::Json(_) => "OAYSUS_JSON_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::MissingEntry(path) => Some(Box::new(format!(
                "Check that {} exists and matches the component's framework.",
                path.display()
            ))),
            Error::UnsupportedFramework(framework) => Some(Box::new(format!(
                "Theme packs can target react, vue or svelte; '{}' is detected but not buildable yet.",
                framework
            ))),
            Error::InvalidManifest(_) => Some(Box::new(
                "Check package.json for a name, a version and a dependencies map.",
            )),
            Error::Bundler { .. } => Some(Box::new(
                "Fix the reported compile error and run the build again.",
            )),
            _ => None,
        }
    }
}
