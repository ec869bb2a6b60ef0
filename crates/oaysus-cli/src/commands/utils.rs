//! Helpers shared by the commands.

use crate::cli::{ProjectArgs, UrlArgs};
use crate::config::{ConfigOverrides, OaysusConfig};
use crate::error::{CliError, Result};
use oaysus_build::{FrameworkRegistry, RolldownCompiler};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Absolute project root from `--root`, or the current directory.
pub fn resolve_project_root(root: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let root = match root {
        Some(root) if root.is_absolute() => root.to_path_buf(),
        Some(root) => cwd.join(root),
        None => cwd,
    };
    if !root.is_dir() {
        return Err(CliError::FileNotFound(root));
    }
    Ok(root)
}

/// Config overrides for the URL flags.
pub fn url_overrides(urls: &UrlArgs) -> ConfigOverrides {
    ConfigOverrides {
        cdn_url: urls.cdn_url.clone(),
        r2_public_url: urls.r2_public_url.clone(),
        r2_base_path: urls.r2_base_path.clone(),
        ..Default::default()
    }
}

/// Resolve the project root and load its configuration.
pub fn load_project(
    project: &ProjectArgs,
    overrides: &ConfigOverrides,
) -> Result<(PathBuf, OaysusConfig)> {
    let root = resolve_project_root(project.root.as_deref())?;
    let config = OaysusConfig::load(&root, project.config.as_deref(), overrides)?;
    Ok((root, config))
}

/// Framework registry backed by Rolldown.
pub fn registry(config: &OaysusConfig) -> FrameworkRegistry {
    let compiler = RolldownCompiler::new().with_tool_timeout(config.tool_timeout_secs);
    FrameworkRegistry::new(Arc::new(compiler))
}

/// Write pretty JSON to stdout.
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
