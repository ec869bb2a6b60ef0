//! `oaysus analyze`: print the external packages the components import.

use crate::cli::AnalyzeArgs;
use crate::commands::utils;
use crate::config::ConfigOverrides;
use crate::discover;
use crate::error::Result;
use crate::ui;
use oaysus_build::{DetectedDependency, analyze};
use std::path::{Path, PathBuf};

/// Execute the analyze command.
///
/// Prints a JSON array of detected dependencies on stdout.
pub fn execute(args: AnalyzeArgs) -> Result<()> {
    let (root, config) = utils::load_project(&args.project, &ConfigOverrides::default())?;
    let deps = detect(&root, config.components_dir.as_deref())?;

    ui::info(&format!("Detected {} external package(s)", deps.len()));
    utils::print_json(&deps)
}

/// Discover components and run import analysis over their entry files.
pub fn detect(root: &Path, components_dir: Option<&Path>) -> Result<Vec<DetectedDependency>> {
    let package = discover::load_package(root, components_dir)?;
    let entries: Vec<PathBuf> = package
        .components
        .iter()
        .map(|c| c.entry_point.clone())
        .collect();
    Ok(analyze(&entries, &package.package_json.all_dependencies()))
}
