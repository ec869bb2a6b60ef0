//! `oaysus import-map`: print the import map for the project manifest.

use crate::cli::ImportMapArgs;
use crate::commands::{analyze, utils};
use crate::discover;
use crate::error::{CliError, Result};
use oaysus_build::{CdnImportMapOptions, R2ImportMapOptions, detect_framework};
use tracing::debug;

/// Execute the import-map command.
///
/// Uses bucket URLs when an R2 public URL is configured, CDN URLs otherwise.
/// Detected dependencies are included when components can be discovered.
pub fn execute(args: ImportMapArgs) -> Result<()> {
    let overrides = utils::url_overrides(&args.urls);
    let (root, config) = utils::load_project(&args.project, &overrides)?;
    let manifest = discover::load_manifest(&root)?;
    let framework = detect_framework(&manifest);
    let generator = utils::registry(&config).get_import_map_generator(framework)?;

    let detected_deps = match analyze::detect(&root, config.components_dir.as_deref()) {
        Ok(deps) => deps,
        Err(CliError::NoComponents(dir)) => {
            debug!("No components under {}, mapping manifest dependencies only", dir.display());
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    match &config.r2_public_url {
        Some(r2_public_url) => {
            let options = R2ImportMapOptions {
                r2_public_url: r2_public_url.clone(),
                r2_base_path: config.pipeline_options(&root).r2_base_path_for(&manifest),
                detected_deps,
            };
            if args.stylesheets {
                utils::print_json(&generator.generate_import_map_with_stylesheets(&manifest, &options))
            } else {
                utils::print_json(&generator.generate_import_map_with_r2_urls(&manifest, &options))
            }
        }
        None => {
            let options = CdnImportMapOptions {
                cdn_url: config.cdn_url.clone(),
                detected_deps,
            };
            utils::print_json(&generator.generate_import_map_from_package_json(&manifest, &options))
        }
    }
}
