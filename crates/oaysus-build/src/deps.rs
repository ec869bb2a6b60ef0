//! Package classification shared by the analyzer, bundlers and import maps.

use crate::types::DependencySpec;

/// How a dev-tooling pattern matches a package name.
#[derive(Debug, Clone, Copy)]
enum NamePattern {
    Exact(&'static str),
    Prefix(&'static str),
}

impl NamePattern {
    fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Exact(exact) => name == *exact,
            NamePattern::Prefix(prefix) => name.starts_with(prefix),
        }
    }
}

/// Packages needed only for local tooling. Never shipped in a bundle.
const DEV_ONLY_PATTERNS: &[NamePattern] = &[
    // Type declarations
    NamePattern::Prefix("@types/"),
    NamePattern::Exact("typescript"),
    // Linters and formatters
    NamePattern::Exact("eslint"),
    NamePattern::Prefix("eslint-"),
    NamePattern::Prefix("@eslint/"),
    NamePattern::Prefix("@typescript-eslint/"),
    NamePattern::Exact("prettier"),
    NamePattern::Prefix("prettier-"),
    NamePattern::Exact("stylelint"),
    NamePattern::Prefix("stylelint-"),
    // Test frameworks
    NamePattern::Exact("vitest"),
    NamePattern::Prefix("@vitest/"),
    NamePattern::Exact("jest"),
    NamePattern::Prefix("jest-"),
    NamePattern::Prefix("@jest/"),
    NamePattern::Prefix("@testing-library/"),
    NamePattern::Exact("playwright"),
    NamePattern::Prefix("@playwright/"),
    // CSS tooling
    NamePattern::Exact("tailwindcss"),
    NamePattern::Prefix("@tailwindcss/"),
    NamePattern::Exact("postcss"),
    NamePattern::Prefix("postcss-"),
    NamePattern::Exact("autoprefixer"),
    NamePattern::Exact("sass"),
    NamePattern::Exact("less"),
    // Build tooling and plugin scopes
    NamePattern::Exact("vite"),
    NamePattern::Prefix("vite-plugin-"),
    NamePattern::Prefix("@vitejs/"),
    NamePattern::Prefix("@sveltejs/"),
    NamePattern::Exact("svelte-check"),
    NamePattern::Exact("svelte-preprocess"),
    NamePattern::Prefix("@vue/compiler-"),
    NamePattern::Exact("vue-tsc"),
    NamePattern::Exact("esbuild"),
    NamePattern::Exact("rollup"),
    NamePattern::Prefix("@rollup/"),
    NamePattern::Prefix("@babel/"),
    NamePattern::Exact("tsx"),
    NamePattern::Exact("ts-node"),
];

/// Framework runtime packages. Their sub-paths count as part of the runtime.
const FRAMEWORK_RUNTIME_PACKAGES: &[&str] = &["react", "react-dom", "vue", "svelte", "solid-js"];

/// Whether a package name matches a development-tooling pattern.
pub fn is_dev_only(name: &str) -> bool {
    DEV_ONLY_PATTERNS.iter().any(|pattern| pattern.matches(name))
}

/// Whether a specifier is a framework runtime package or one of its sub-paths.
pub fn is_framework_runtime(specifier: &str) -> bool {
    FRAMEWORK_RUNTIME_PACKAGES
        .iter()
        .any(|package| matches_package(specifier, package))
}

/// `specifier` is `package` itself or a sub-path of it.
pub fn matches_package(specifier: &str, package: &str) -> bool {
    specifier == package
        || specifier
            .strip_prefix(package)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Remove dev-only packages. Pure and order-preserving.
pub fn filter_runtime_dependencies(deps: &[DependencySpec]) -> Vec<DependencySpec> {
    deps.iter()
        .filter(|dep| !is_dev_only(&dep.name))
        .cloned()
        .collect()
}
