//! Command implementations.
//!
//! - [`build`] - Run the publish pipeline and list the upload artifacts
//! - [`analyze`] - Print detected third-party dependencies
//! - [`import_map`] - Print the import map for the project manifest
//!
//! Each command exposes an `execute` function taking its parsed arguments.

pub mod analyze;
pub mod build;
pub mod import_map;
pub(crate) mod utils;

pub use analyze::execute as analyze_execute;
pub use build::execute as build_execute;
pub use import_map::execute as import_map_execute;
