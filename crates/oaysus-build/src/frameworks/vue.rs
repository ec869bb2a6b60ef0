//! Vue 3: single-file components, `vue/server-renderer` rendering.
//!
//! `vue` re-exports `@vue/runtime-dom`, which sits on `runtime-core`,
//! `reactivity` and `shared`. Each layer is bundled once and imports the
//! layers beneath it.

use std::sync::Arc;

use super::{FrameworkTable, RuntimeExport};
use crate::builder::Builder;
use crate::bundler::Bundler;
use crate::compiler::Compiler;
use crate::framework::Framework;
use crate::import_map::ImportMapGenerator;

pub static TABLE: FrameworkTable = FrameworkTable {
    framework: Framework::Vue,
    runtime_packages: &[
        "vue",
        "@vue/runtime-dom",
        "@vue/runtime-core",
        "@vue/reactivity",
        "@vue/shared",
    ],
    client_exports: &[
        RuntimeExport {
            owner: "vue",
            package: "vue",
            subpath: None,
            externals: &[
                "@vue/runtime-dom",
                "@vue/runtime-core",
                "@vue/reactivity",
                "@vue/shared",
            ],
        },
        RuntimeExport {
            owner: "vue",
            package: "@vue/runtime-dom",
            subpath: None,
            externals: &["@vue/runtime-core", "@vue/reactivity", "@vue/shared"],
        },
        RuntimeExport {
            owner: "vue",
            package: "@vue/runtime-core",
            subpath: None,
            externals: &["@vue/reactivity", "@vue/shared"],
        },
        RuntimeExport {
            owner: "vue",
            package: "@vue/reactivity",
            subpath: None,
            externals: &["@vue/shared"],
        },
        RuntimeExport {
            owner: "vue",
            package: "@vue/shared",
            subpath: None,
            externals: &[],
        },
    ],
    server_exports: &[RuntimeExport {
        owner: "vue",
        package: "vue",
        subpath: Some("server-renderer"),
        externals: &["vue"],
    }],
    allowlist: None,
};

pub struct VueBuilder {
    compiler: Arc<dyn Compiler>,
}

impl VueBuilder {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        Self { compiler }
    }
}

impl Builder for VueBuilder {
    fn framework(&self) -> Framework {
        Framework::Vue
    }

    fn compiler(&self) -> &Arc<dyn Compiler> {
        &self.compiler
    }

    fn runtime_packages(&self) -> &'static [&'static str] {
        TABLE.runtime_packages
    }

    fn ssr_wrapper(&self, entry: &str) -> String {
        format!(
            r#"import {{ createSSRApp }} from 'vue';
import {{ renderToString }} from 'vue/server-renderer';
import Component from {entry};

export {{ Component }};
export default Component;

export async function render(props = {{}}) {{
  const app = createSSRApp(Component, props);
  return await renderToString(app);
}}
"#
        )
    }
}

pub struct VueBundler {
    compiler: Arc<dyn Compiler>,
}

impl VueBundler {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        Self { compiler }
    }
}

impl Bundler for VueBundler {
    fn framework(&self) -> Framework {
        Framework::Vue
    }

    fn compiler(&self) -> &Arc<dyn Compiler> {
        &self.compiler
    }

    fn table(&self) -> &'static FrameworkTable {
        &TABLE
    }
}

/// Maps every declared runtime dependency, not only the Vue runtime.
#[derive(Debug, Default)]
pub struct VueImportMapGenerator;

impl ImportMapGenerator for VueImportMapGenerator {
    fn framework(&self) -> Framework {
        Framework::Vue
    }

    fn table(&self) -> &'static FrameworkTable {
        &TABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import_map::R2ImportMapOptions;
    use crate::manifest::PackageManifest;

    fn manifest() -> PackageManifest {
        let mut manifest = PackageManifest::new("theme", "2.0.0");
        manifest.dependencies.insert("vue".into(), "^3.4.21".into());
        manifest.dependencies.insert("vue-router".into(), "^4.3.0".into());
        manifest.dependencies.insert("@types/node".into(), "^20.0.0".into());
        manifest.dev_dependencies.insert("vite".into(), "^5.0.0".into());
        manifest
    }

    #[test]
    fn test_dependencies_include_every_runtime_dependency() {
        let deps = VueImportMapGenerator.get_dependencies_to_bundle(&manifest());
        let names: Vec<_> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["vue", "vue-router"]);
    }

    #[test]
    fn test_framework_declared_as_dev_dependency_is_kept() {
        let mut manifest = PackageManifest::new("theme", "2.0.0");
        manifest.dev_dependencies.insert("vue".into(), "~3.4.0".into());

        let deps = VueImportMapGenerator.get_dependencies_to_bundle(&manifest);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].version, "3.4.0");
    }

    #[test]
    fn test_r2_import_map_maps_companion_packages() {
        let options = R2ImportMapOptions {
            r2_public_url: "https://assets.example.com".into(),
            r2_base_path: "theme/2.0.0".into(),
            detected_deps: Vec::new(),
        };
        let map = VueImportMapGenerator.generate_import_map_with_r2_urls(&manifest(), &options);

        assert_eq!(
            map.get("@vue/runtime-core"),
            Some("https://assets.example.com/theme/2.0.0/deps/@vue/runtime-core@3.4.21/index.js")
        );
        assert_eq!(
            map.get("vue-router"),
            Some("https://assets.example.com/theme/2.0.0/deps/vue-router@4.3.0/index.js")
        );
        assert!(map.get("vue/server-renderer").is_none());
    }

    #[test]
    fn test_runtime_layers_only_import_lower_layers() {
        let main = &TABLE.client_exports[0];
        assert_eq!(main.package, "vue");
        for layer in &TABLE.client_exports[1..] {
            assert!(main.externals.contains(&layer.package));
            assert!(!layer.externals.contains(&"vue"));
        }
    }
}
