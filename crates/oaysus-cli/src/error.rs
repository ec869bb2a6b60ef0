//! Error handling for the Oaysus CLI.
//!
//! `CliError` is what every command returns. Library errors convert into it
//! through `From`, and `main` turns it into a miette report.
//!
//! # Example
//!
//! ```rust,no_run
//! use oaysus_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_schema(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path).with_path(path)
//! }
//! ```

use oaysus_build::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration loading or validation failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from the build library
    #[error(transparent)]
    Build(#[from] oaysus_build::Error),

    /// The publish pipeline stopped at a stage
    #[error("{}", pipeline_message(.stage, .message))]
    Pipeline {
        stage: Option<Stage>,
        message: String,
    },

    /// No buildable components were found
    #[error("No components found under {}\n\nHint: Put each component in components/<name>/ with an index file and schema.json", .0.display())]
    NoComponents(PathBuf),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

fn pipeline_message(stage: &Option<Stage>, message: &str) -> String {
    match stage {
        Some(stage) => format!("Stage '{}' failed: {}", stage, message),
        None => message.to_string(),
    }
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Explicit `--config` path does not exist
    #[error("Config file not found: {}\n\nHint: Create oaysus.config.json in the project root or fix the --config path", .0.display())]
    NotFound(PathBuf),

    /// Merged configuration could not be deserialized
    #[error("Invalid configuration: {0}\n\nHint: Check oaysus.config.json field names and types")]
    Extract(String),

    /// A field holds an unusable value
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Adds context to errors on their way up to a command.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint line to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}

/// Convert a CLI error into a miette report for `main`.
pub fn cli_error_to_miette(err: CliError) -> miette::Report {
    match err {
        CliError::Build(e) => miette::Report::new(e),
        CliError::Pipeline { stage, message } => match stage {
            Some(stage) => miette::miette!(
                help = "Fix the error above and run `oaysus build` again.",
                "Stage '{}' failed: {}",
                stage,
                message
            ),
            None => miette::miette!("{}", message),
        },
        other => miette::miette!("{}", other),
    }
}
