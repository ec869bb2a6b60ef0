//! Import maps for hosted theme packs.
//!
//! Two URL modes exist. CDN mode points every specifier at a public ESM CDN.
//! R2 mode points at the bundles this crate writes under `deps/`, so file
//! names come from the same [`FrameworkTable`] and naming helpers the
//! bundler uses.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::analyzer::{get_sub_export, stylesheet_filename, sub_export_filename};
use crate::bundler::DEPS_DIR;
use crate::deps::is_dev_only;
use crate::framework::Framework;
use crate::frameworks::{FrameworkTable, MAIN_BUNDLE_FILE};
use crate::manifest::{PackageManifest, clean_version};
use crate::tailwind::{TAILWIND_PACKAGE, THEME_CSS_FILE};
use crate::types::{DependencySpec, DetectedDependency};
use crate::Result;

/// `{ "imports": { specifier: url } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMap {
    pub imports: IndexMap<String, String>,
}

impl ImportMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, specifier: impl Into<String>, url: impl Into<String>) {
        self.imports.insert(specifier.into(), url.into());
    }

    pub fn get(&self, specifier: &str) -> Option<&str> {
        self.imports.get(specifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Import map plus the stylesheets a page must link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMapWithStylesheets {
    pub imports: IndexMap<String, String>,
    /// Stylesheet key (`tailwindcss`, `swiper/css`) → URL or path.
    pub stylesheets: IndexMap<String, String>,
}

impl ImportMapWithStylesheets {
    pub fn import_map(&self) -> ImportMap {
        ImportMap {
            imports: self.imports.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CdnImportMapOptions {
    /// CDN origin, e.g. `https://esm.sh`.
    pub cdn_url: String,
    pub detected_deps: Vec<DetectedDependency>,
}

impl Default for CdnImportMapOptions {
    fn default() -> Self {
        Self {
            cdn_url: "https://esm.sh".to_string(),
            detected_deps: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct R2ImportMapOptions {
    /// Public origin of the bucket.
    pub r2_public_url: String,
    /// Theme prefix inside the bucket, e.g. `my-theme/1.0.0`.
    pub r2_base_path: String,
    pub detected_deps: Vec<DetectedDependency>,
}

impl R2ImportMapOptions {
    /// URL of a file under `deps/<package>@<version>/`.
    pub fn dependency_url(&self, package: &str, version: &str, file: &str) -> String {
        r2_dependency_url(&self.r2_public_url, &self.r2_base_path, package, version, file)
    }
}

/// `<cdn>/<package>@<version>[/<subpath>]`.
pub fn cdn_url(cdn: &str, package: &str, version: &str, subpath: Option<&str>) -> String {
    let base = format!("{}/{}@{}", cdn.trim_end_matches('/'), package, version);
    match subpath {
        Some(subpath) => format!("{}/{}", base, subpath),
        None => base,
    }
}

/// `<public>/<base>/deps/<package>@<version>/<file>`, skipping empty segments.
pub fn r2_dependency_url(
    public_url: &str,
    base_path: &str,
    package: &str,
    version: &str,
    file: &str,
) -> String {
    let package_dir = format!("{}@{}", package, version);
    [
        public_url.trim_end_matches('/'),
        base_path.trim_matches('/'),
        DEPS_DIR,
        &package_dir,
        file,
    ]
    .iter()
    .filter(|segment| !segment.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join("/")
}

/// Produces import maps for one framework.
pub trait ImportMapGenerator: Send + Sync {
    fn framework(&self) -> Framework;

    fn table(&self) -> &'static FrameworkTable;

    /// Declared packages to bundle and map, dev-only packages removed.
    ///
    /// With an allowlist only listed packages are kept. Without one every
    /// runtime dependency is kept, plus the framework package wherever it is
    /// declared.
    fn get_dependencies_to_bundle(&self, manifest: &PackageManifest) -> Vec<DependencySpec> {
        let table = self.table();
        let candidates: Vec<(String, String)> = match table.allowlist {
            Some(allowlist) => manifest
                .all_dependencies()
                .into_iter()
                .filter(|(name, _)| allowlist.contains(&name.as_str()))
                .collect(),
            None => {
                let mut deps = manifest.dependencies.clone();
                let runtime = self.framework().runtime_package();
                if let Some(range) = manifest.declared_range(runtime) {
                    deps.entry(runtime.to_string())
                        .or_insert_with(|| range.to_string());
                }
                deps.into_iter().collect()
            }
        };

        candidates
            .into_iter()
            .filter(|(name, _)| !is_dev_only(name))
            .map(|(name, range)| DependencySpec::new(name, clean_version(&range)))
            .collect()
    }

    /// Import map with public-CDN URLs.
    fn generate_import_map_from_package_json(
        &self,
        manifest: &PackageManifest,
        options: &CdnImportMapOptions,
    ) -> ImportMap {
        let mut map = ImportMap::new();
        for dep in self.get_dependencies_to_bundle(manifest) {
            let mut owned = self.table().client_exports_of(&dep.name).peekable();
            if owned.peek().is_none() {
                map.insert(&dep.name, cdn_url(&options.cdn_url, &dep.name, &dep.version, None));
            }
            for export in owned {
                map.insert(
                    export.specifier(),
                    cdn_url(&options.cdn_url, export.package, &dep.version, export.subpath),
                );
            }
        }

        for dep in &options.detected_deps {
            map.insert(&dep.name, cdn_url(&options.cdn_url, &dep.name, &dep.version, None));
            for sub_export in &dep.sub_exports {
                map.insert(
                    format!("{}/{}", dep.name, sub_export),
                    cdn_url(&options.cdn_url, &dep.name, &dep.version, Some(sub_export)),
                );
            }
        }
        map
    }

    /// Import map pointing at the self-hosted bundles under `deps/`.
    fn generate_import_map_with_r2_urls(
        &self,
        manifest: &PackageManifest,
        options: &R2ImportMapOptions,
    ) -> ImportMap {
        let mut map = ImportMap::new();
        for dep in self.get_dependencies_to_bundle(manifest) {
            let mut owned = self.table().client_exports_of(&dep.name).peekable();
            if owned.peek().is_none() {
                map.insert(
                    &dep.name,
                    options.dependency_url(&dep.name, &dep.version, MAIN_BUNDLE_FILE),
                );
            }
            for export in owned {
                map.insert(
                    export.specifier(),
                    options.dependency_url(export.package, &dep.version, &export.file_name()),
                );
            }
        }

        for dep in &options.detected_deps {
            map.insert(
                &dep.name,
                options.dependency_url(&dep.name, &dep.version, MAIN_BUNDLE_FILE),
            );
            for sub_export in &dep.sub_exports {
                map.insert(
                    format!("{}/{}", dep.name, sub_export),
                    options.dependency_url(&dep.name, &dep.version, &sub_export_filename(sub_export)),
                );
            }
        }
        map
    }

    /// R2 import map plus stylesheet links: the theme stylesheet when the
    /// utility-CSS framework is declared, and one entry per detected CSS import.
    fn generate_import_map_with_stylesheets(
        &self,
        manifest: &PackageManifest,
        options: &R2ImportMapOptions,
    ) -> ImportMapWithStylesheets {
        let map = self.generate_import_map_with_r2_urls(manifest, options);
        let mut stylesheets = IndexMap::new();

        if manifest.declares(TAILWIND_PACKAGE) {
            stylesheets.insert(
                TAILWIND_PACKAGE.to_string(),
                format!("{}/{}", options.r2_base_path.trim_end_matches('/'), THEME_CSS_FILE),
            );
        }

        for dep in &options.detected_deps {
            for css_import in &dep.css_imports {
                let sub_path = get_sub_export(css_import).unwrap_or_else(|| "style".to_string());
                stylesheets.insert(
                    css_import.clone(),
                    options.dependency_url(&dep.name, &dep.version, &stylesheet_filename(&sub_path)),
                );
            }
        }

        ImportMapWithStylesheets {
            imports: map.imports,
            stylesheets,
        }
    }
}
