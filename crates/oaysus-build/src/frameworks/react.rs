//! React: JSX/TSX components, `react-dom/server` rendering.

use std::sync::Arc;

use super::{FrameworkTable, RuntimeExport};
use crate::builder::Builder;
use crate::bundler::Bundler;
use crate::compiler::Compiler;
use crate::framework::Framework;
use crate::import_map::ImportMapGenerator;

pub static TABLE: FrameworkTable = FrameworkTable {
    framework: Framework::React,
    runtime_packages: &["react", "react-dom"],
    client_exports: &[
        RuntimeExport {
            owner: "react",
            package: "react",
            subpath: None,
            externals: &[],
        },
        RuntimeExport {
            owner: "react",
            package: "react",
            subpath: Some("jsx-runtime"),
            externals: &["react"],
        },
        RuntimeExport {
            owner: "react-dom",
            package: "react-dom",
            subpath: None,
            externals: &["react"],
        },
        RuntimeExport {
            owner: "react-dom",
            package: "react-dom",
            subpath: Some("client"),
            externals: &["react", "react-dom"],
        },
    ],
    server_exports: &[RuntimeExport {
        owner: "react-dom",
        package: "react-dom",
        subpath: Some("server"),
        externals: &["react"],
    }],
    allowlist: Some(&["react", "react-dom"]),
};

pub struct ReactBuilder {
    compiler: Arc<dyn Compiler>,
}

impl ReactBuilder {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        Self { compiler }
    }
}

impl Builder for ReactBuilder {
    fn framework(&self) -> Framework {
        Framework::React
    }

    fn compiler(&self) -> &Arc<dyn Compiler> {
        &self.compiler
    }

    fn runtime_packages(&self) -> &'static [&'static str] {
        TABLE.runtime_packages
    }

    fn ssr_wrapper(&self, entry: &str) -> String {
        format!(
            r#"import {{ createElement }} from 'react';
import {{ renderToString }} from 'react-dom/server';
import Component from {entry};

export {{ Component }};
export default Component;

export function render(props = {{}}) {{
  return renderToString(createElement(Component, props));
}}
"#
        )
    }
}

pub struct ReactBundler {
    compiler: Arc<dyn Compiler>,
}

impl ReactBundler {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        Self { compiler }
    }
}

impl Bundler for ReactBundler {
    fn framework(&self) -> Framework {
        Framework::React
    }

    fn compiler(&self) -> &Arc<dyn Compiler> {
        &self.compiler
    }

    fn table(&self) -> &'static FrameworkTable {
        &TABLE
    }
}

#[derive(Debug, Default)]
pub struct ReactImportMapGenerator;

impl ImportMapGenerator for ReactImportMapGenerator {
    fn framework(&self) -> Framework {
        Framework::React
    }

    fn table(&self) -> &'static FrameworkTable {
        &TABLE
    }
}
