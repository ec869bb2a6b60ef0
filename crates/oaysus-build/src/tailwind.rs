//! Theme stylesheet generation with the Tailwind CSS CLI.
//!
//! v3 projects are driven by their `tailwind.config.*`; without one the step
//! is skipped. v4 needs no config: the generated entry lists each component
//! directory as a `@source`.

use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::builder::BuildContext;
use crate::fs_util::{file_size, scratch_dir, write_file};
use crate::manifest::{PackageManifest, major_version};
use crate::package_manager::PackageManager;
use crate::tool::ToolCommand;
use crate::types::{ComponentInfo, ThemeCss};
use crate::Result;

pub const TAILWIND_PACKAGE: &str = "tailwindcss";
pub const THEME_CSS_FILE: &str = "theme.css";

const CONFIG_FILES: &[&str] = &[
    "tailwind.config.js",
    "tailwind.config.cjs",
    "tailwind.config.mjs",
    "tailwind.config.ts",
];

/// Generation strategy, chosen by the declared major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailwindVariant {
    /// `@tailwind` directives plus a JS config file.
    V3,
    /// `@import "tailwindcss"` with `@source` globs.
    V4,
}

/// Variant of the declared `tailwindcss` dependency, if any.
///
/// Ranges without a numeric major (`latest`, `next`) are treated as v4.
pub fn detect_variant(manifest: &PackageManifest) -> Option<TailwindVariant> {
    let range = manifest.declared_range(TAILWIND_PACKAGE)?;
    match major_version(range) {
        Some(major) if major < 4 => Some(TailwindVariant::V3),
        _ => Some(TailwindVariant::V4),
    }
}

/// First `tailwind.config.*` in the project root.
pub fn find_config(project_root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| project_root.join(name))
        .find(|path| path.is_file())
}

/// Contents of the temporary CLI input stylesheet.
pub fn entry_css(variant: TailwindVariant, source_dirs: &[PathBuf]) -> String {
    match variant {
        TailwindVariant::V3 => {
            "@tailwind base;\n@tailwind components;\n@tailwind utilities;\n".to_string()
        }
        TailwindVariant::V4 => {
            let mut css = String::from("@import \"tailwindcss\";\n");
            for dir in source_dirs {
                css.push_str(&format!(
                    "@source {};\n",
                    serde_json::Value::String(dir.to_string_lossy().into_owned())
                ));
            }
            css
        }
    }
}

/// Component directories in first-seen order, each listed once.
pub fn source_dirs(components: &[ComponentInfo]) -> Vec<PathBuf> {
    components
        .iter()
        .map(|c| c.path.clone())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// CLI invocation compiling `input` into `output`. Only v3 passes `-c`.
pub fn tailwind_command(
    package_manager: PackageManager,
    variant: TailwindVariant,
    config: Option<&Path>,
    input: &Path,
    output: &Path,
    ctx: &BuildContext,
) -> ToolCommand {
    let mut command = package_manager
        .exec(TAILWIND_PACKAGE, &ctx.project_root)
        .timeout_secs(ctx.tool_timeout_secs);
    if let (TailwindVariant::V3, Some(config)) = (variant, config) {
        command = command.arg("-c").arg(config.to_string_lossy());
    }
    command = command
        .arg("-i")
        .arg(input.to_string_lossy())
        .arg("-o")
        .arg(output.to_string_lossy());
    if ctx.minify {
        command = command.arg("--minify");
    }
    command
}

/// Build `<output>/theme.css`. `Ok(None)` means the step does not apply.
pub async fn build_theme_css(
    components: &[ComponentInfo],
    ctx: &BuildContext,
) -> Result<Option<ThemeCss>> {
    let Some(variant) = detect_variant(&ctx.manifest) else {
        debug!("No tailwindcss dependency declared, skipping theme CSS");
        return Ok(None);
    };

    let config = find_config(&ctx.project_root);
    if variant == TailwindVariant::V3 && config.is_none() {
        debug!("Tailwind v3 declared without a config file, skipping theme CSS");
        return Ok(None);
    }

    let package_manager = PackageManager::require(&ctx.project_root, Some(&ctx.manifest))?;
    let scratch = scratch_dir(&ctx.project_root)?;

    let input = scratch.path().join("theme.input.css");
    write_file(&input, entry_css(variant, &source_dirs(components)))?;

    let output = ctx.output_dir.join(THEME_CSS_FILE);
    let command = tailwind_command(
        package_manager,
        variant,
        config.as_deref(),
        &input,
        &output,
        ctx,
    );
    command.run().await?;

    let size = file_size(&output);
    info!(
        variant = ?variant,
        package_manager = package_manager.name(),
        size,
        "Built theme CSS"
    );
    Ok(Some(ThemeCss { path: output, size }))
}
