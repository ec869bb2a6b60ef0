//! Shared fixtures for oaysus-build integration tests.
//!
//! Compilation is replaced by [`RecordingCompiler`], which writes a stub file
//! for every request and records what it was asked to do. The fixtures
//! therefore run without Node.js or a populated `node_modules`.

#![allow(dead_code)]

use async_trait::async_trait;
use oaysus_build::{
    CompileOutput, CompileRequest, CompileTarget, Compiler, ComponentInfo, Error, PackageManifest,
    Result, ValidatedPackage,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// One compile call seen by the recording compiler.
#[derive(Debug, Clone)]
pub struct RecordedCompile {
    pub request: CompileRequest,
    /// Entry module source at the time of the call.
    pub source: String,
}

type FailWhen = Box<dyn Fn(&CompileRequest) -> bool + Send + Sync>;

/// Compiler that writes `// stub <entry>` to the requested output path.
#[derive(Default)]
pub struct RecordingCompiler {
    calls: Mutex<Vec<RecordedCompile>>,
    fail_when: Option<FailWhen>,
}

impl RecordingCompiler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail every request matching `predicate`.
    pub fn failing_when(
        predicate: impl Fn(&CompileRequest) -> bool + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_when: Some(Box::new(predicate)),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCompile> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, target: CompileTarget) -> Vec<RecordedCompile> {
        self.calls()
            .into_iter()
            .filter(|call| call.request.target == target)
            .collect()
    }

    /// The call whose entry re-exports `specifier`.
    pub fn call_reexporting(&self, specifier: &str) -> Option<RecordedCompile> {
        let needle = format!("export * from \"{}\";", specifier);
        self.calls()
            .into_iter()
            .find(|call| call.source.starts_with(&needle))
    }
}

#[async_trait]
impl Compiler for RecordingCompiler {
    async fn compile(&self, request: &CompileRequest) -> Result<CompileOutput> {
        let source = std::fs::read_to_string(&request.entry).unwrap_or_default();
        self.calls.lock().unwrap().push(RecordedCompile {
            request: request.clone(),
            source,
        });

        if self.fail_when.as_ref().is_some_and(|fail| fail(request)) {
            return Err(Error::Bundler {
                message: format!("stub failure for {}", request.entry.display()),
            });
        }

        let js_path = request.js_path();
        std::fs::create_dir_all(&request.out_dir).unwrap();
        let code = format!("// stub {}\n", request.entry.display());
        std::fs::write(&js_path, &code).unwrap();

        Ok(CompileOutput {
            js_path,
            css_path: None,
            js_size: code.len() as u64,
            css_size: 0,
        })
    }
}

/// A theme project on disk.
pub struct Fixture {
    pub temp: TempDir,
    pub manifest: PackageManifest,
    pub components: Vec<ComponentInfo>,
}

impl Fixture {
    pub fn new(dependencies: &[(&str, &str)]) -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("node_modules")).unwrap();

        let mut manifest = PackageManifest::new("acme-theme", "1.0.0");
        for (name, range) in dependencies {
            manifest
                .dependencies
                .insert(name.to_string(), range.to_string());
        }

        Self {
            temp,
            manifest,
            components: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join(".oaysus-build")
    }

    /// Add `components/<name>/<file>` with `source` and a schema.
    pub fn component(mut self, name: &str, file: &str, source: &str) -> Self {
        let dir = self.root().join("components").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), source).unwrap();
        std::fs::write(
            dir.join("schema.json"),
            format!(r#"{{"type":"{}","props":{{}}}}"#, name),
        )
        .unwrap();

        self.components.push(ComponentInfo {
            name: name.to_string(),
            display_name: name.to_uppercase(),
            path: dir.clone(),
            entry_point: dir.join(file),
            schema: serde_json::json!({ "type": name, "props": {} }),
        });
        self
    }

    /// Write `node_modules/<package>/<path>`.
    pub fn node_module_file(self, package: &str, path: &str, contents: &str) -> Self {
        let file = self.root().join("node_modules").join(package).join(path);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, contents).unwrap();
        self
    }

    pub fn package(&self) -> ValidatedPackage {
        ValidatedPackage {
            valid: true,
            components: self.components.clone(),
            package_json: self.manifest.clone(),
            inferred_config: None,
        }
    }

    /// Names of scratch directories left in the project root.
    pub fn leftover_scratch_dirs(&self) -> Vec<String> {
        std::fs::read_dir(self.root())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(".oaysus-temp-"))
            .collect()
    }
}

/// React theme with a hero importing swiper, its React bindings and CSS.
pub fn react_fixture() -> Fixture {
    Fixture::new(&[
        ("react", "^18.2.0"),
        ("react-dom", "^18.2.0"),
        ("swiper", "^11.0.0"),
    ])
    .component(
        "hero",
        "index.tsx",
        r#"import React from 'react';
import { Swiper, SwiperSlide } from 'swiper/react';
import 'swiper/css';
import { format } from './format';
import debounce from 'lodash-es/debounce';

export default function Hero({ title }) {
  return <Swiper><SwiperSlide>{format(title)}</SwiperSlide></Swiper>;
}
"#,
    )
    .component(
        "footer",
        "index.tsx",
        "import React from 'react';\nexport default function Footer() { return <footer />; }\n",
    )
    .node_module_file(
        "swiper",
        "package.json",
        r#"{"name":"swiper","exports":{".":"./swiper.mjs","./react":"./swiper-react.mjs","./css":"./swiper.css"}}"#,
    )
    .node_module_file("swiper", "swiper.css", ".swiper{display:block}")
    .with_local_file("components/hero/format.ts", "export const format = (s) => s.trim();\n")
}

impl Fixture {
    pub fn with_local_file(self, relative: &str, contents: &str) -> Self {
        let path = self.root().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
        self
    }
}

pub fn svelte_fixture() -> Fixture {
    Fixture::new(&[("svelte", "^5.1.0")]).component(
        "banner",
        "index.svelte",
        "<script>\n  import { fade } from 'svelte/transition';\n  export let text;\n</script>\n<p transition:fade>{text}</p>\n",
    )
}

pub fn vue_fixture() -> Fixture {
    Fixture::new(&[("vue", "^3.4.21")]).component(
        "card",
        "index.vue",
        "<template><div>{{ title }}</div></template>\n<script setup>\ndefineProps(['title']);\n</script>\n",
    )
}
