//! Framework identifiers and detection from the package manifest.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::manifest::PackageManifest;

/// UI framework a theme pack is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    React,
    Vue,
    Svelte,
    Solid,
    Preact,
}

/// Detection order. The first package present in the merged dependency map wins.
const DETECTION_ORDER: &[(Framework, &str)] = &[
    (Framework::React, "react"),
    (Framework::Svelte, "svelte"),
    (Framework::Vue, "vue"),
    (Framework::Solid, "solid-js"),
    (Framework::Preact, "preact"),
];

impl Framework {
    /// All known frameworks, in detection order.
    pub const ALL: [Framework; 5] = [
        Framework::React,
        Framework::Svelte,
        Framework::Vue,
        Framework::Solid,
        Framework::Preact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::React => "react",
            Framework::Vue => "vue",
            Framework::Svelte => "svelte",
            Framework::Solid => "solid",
            Framework::Preact => "preact",
        }
    }

    /// npm package that carries the framework runtime.
    pub fn runtime_package(&self) -> &'static str {
        match self {
            Framework::React => "react",
            Framework::Vue => "vue",
            Framework::Svelte => "svelte",
            Framework::Solid => "solid-js",
            Framework::Preact => "preact",
        }
    }

    /// File extensions a component entry may use, in lookup order.
    pub fn entry_extensions(&self) -> &'static [&'static str] {
        match self {
            Framework::Svelte => &["svelte"],
            Framework::Vue => &["vue"],
            Framework::React | Framework::Solid | Framework::Preact => &["tsx", "jsx", "ts", "js"],
        }
    }

    /// Whether entries are single-file components that need the framework compiler.
    pub fn uses_sfc(&self) -> bool {
        matches!(self, Framework::Svelte | Framework::Vue)
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "react" => Ok(Framework::React),
            "vue" => Ok(Framework::Vue),
            "svelte" => Ok(Framework::Svelte),
            "solid" | "solid-js" => Ok(Framework::Solid),
            "preact" => Ok(Framework::Preact),
            other => Err(format!(
                "Unknown framework '{}'. Expected: react, vue, svelte, solid, preact",
                other
            )),
        }
    }
}

/// Detect the framework from merged `dependencies` + `devDependencies`.
///
/// Falls back to React when no known framework package is declared.
pub fn detect_framework(manifest: &PackageManifest) -> Framework {
    DETECTION_ORDER
        .iter()
        .find(|(_, package)| manifest.declares(package))
        .map(|(framework, _)| *framework)
        .unwrap_or(Framework::React)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(deps: &[&str], dev: &[&str]) -> PackageManifest {
        let mut m = PackageManifest::new("theme", "1.0.0");
        for d in deps {
            m.dependencies.insert(d.to_string(), "^1.0.0".to_string());
        }
        for d in dev {
            m.dev_dependencies.insert(d.to_string(), "^1.0.0".to_string());
        }
        m
    }

    #[test]
    fn test_detect_defaults_to_react() {
        assert_eq!(detect_framework(&manifest(&[], &[])), Framework::React);
        assert_eq!(detect_framework(&manifest(&["lodash"], &[])), Framework::React);
    }

    #[test]
    fn test_detect_priority_order() {
        assert_eq!(
            detect_framework(&manifest(&["vue", "svelte"], &[])),
            Framework::Svelte
        );
        assert_eq!(
            detect_framework(&manifest(&["vue", "react"], &[])),
            Framework::React
        );
        assert_eq!(
            detect_framework(&manifest(&["preact", "solid-js"], &[])),
            Framework::Solid
        );
    }

    #[test]
    fn test_detect_reads_dev_dependencies() {
        assert_eq!(detect_framework(&manifest(&[], &["svelte"])), Framework::Svelte);
    }

    #[test]
    fn test_from_str_roundtrip() {
        for framework in Framework::ALL {
            assert_eq!(framework.as_str().parse::<Framework>().unwrap(), framework);
        }
        assert!("angular".parse::<Framework>().is_err());
    }
}
