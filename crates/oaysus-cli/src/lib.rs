//! Oaysus CLI - local builds of Oaysus theme packs.
//!
//! Runs the `oaysus-build` publish pipeline against a project directory and
//! stops at the upload handoff: artifacts are written under the output
//! directory and listed, nothing is sent over the network.
//!
//! # Architecture
//!
//! - [`cli`] - Argument definitions
//! - [`commands`] - `build`, `analyze` and `import-map`
//! - [`config`] - `oaysus.config.json` + environment + flag merging
//! - [`discover`] - Component discovery and package validation
//! - [`error`] - CLI error types and miette conversion
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - Status lines, stage spinner and summaries
//!
//! # Example
//!
//! ```rust,no_run
//! use oaysus_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod discover;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, ConfigError, Result, ResultExt};
