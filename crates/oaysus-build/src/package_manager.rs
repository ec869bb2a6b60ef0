//! Package manager detection and command construction.

use std::path::Path;

use crate::manifest::PackageManifest;
use crate::tool::{ToolCommand, ToolError};

/// Package managers a theme project may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Pnpm,
    Npm,
    Yarn,
    Bun,
    Deno,
}

/// Lockfiles checked in order when the manifest does not pin a manager.
const LOCKFILES: &[(&str, PackageManager)] = &[
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("yarn.lock", PackageManager::Yarn),
    ("deno.lock", PackageManager::Deno),
    ("package-lock.json", PackageManager::Npm),
];

impl PackageManager {
    /// Detect from the `packageManager` field, then lockfiles, then npm when a
    /// `package.json` exists.
    pub fn detect(project_root: &Path, manifest: Option<&PackageManifest>) -> Option<Self> {
        if let Some(pinned) = manifest.and_then(|m| m.package_manager.as_deref()) {
            if let Some(pm) = Self::from_corepack(pinned) {
                return Some(pm);
            }
        }

        for (lockfile, pm) in LOCKFILES {
            if project_root.join(lockfile).exists() {
                return Some(*pm);
            }
        }

        if manifest.is_some() || project_root.join("package.json").exists() {
            return Some(Self::Npm);
        }

        None
    }

    /// Like [`detect`](Self::detect) but reports the searched paths on failure.
    pub fn require(
        project_root: &Path,
        manifest: Option<&PackageManifest>,
    ) -> Result<Self, ToolError> {
        Self::detect(project_root, manifest).ok_or_else(|| ToolError::PackageManagerNotFound {
            searched_paths: std::iter::once("package.json")
                .chain(LOCKFILES.iter().map(|(file, _)| *file))
                .map(|file| project_root.join(file))
                .collect(),
        })
    }

    /// Parse a Corepack `packageManager` value such as `pnpm@9.1.0`.
    fn from_corepack(value: &str) -> Option<Self> {
        let name = value.split('@').next().unwrap_or(value);
        match name {
            "pnpm" => Some(Self::Pnpm),
            "npm" => Some(Self::Npm),
            "yarn" => Some(Self::Yarn),
            "bun" => Some(Self::Bun),
            "deno" => Some(Self::Deno),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pnpm => "pnpm",
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
            Self::Deno => "deno",
        }
    }

    /// Command prefix that runs a binary from the project's own dependencies.
    pub fn exec_command(&self, binary: &str) -> Vec<String> {
        let parts: Vec<&str> = match self {
            Self::Pnpm => vec!["pnpm", "exec", binary],
            Self::Npm => vec!["npx", "--no-install", binary],
            Self::Yarn => vec!["yarn", "exec", binary],
            Self::Bun => vec!["bunx", binary],
            Self::Deno => vec!["deno", "run", "--allow-all"],
        };
        let mut parts: Vec<String> = parts.into_iter().map(String::from).collect();
        if matches!(self, Self::Deno) {
            parts.push(deno_specifier(binary));
        }
        parts
    }

    /// Command that installs every declared dependency.
    pub fn install_command(&self) -> Vec<&'static str> {
        match self {
            Self::Deno => vec!["deno", "install"],
            other => vec![other.name(), "install"],
        }
    }

    /// Tool invocation for `binary` with this manager.
    pub fn exec(&self, binary: &str, cwd: &Path) -> ToolCommand {
        let parts = self.exec_command(binary);
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        ToolCommand::from_parts(&parts, cwd)
    }

    /// Tool invocation for `<pm> install`.
    pub fn install(&self, cwd: &Path) -> ToolCommand {
        ToolCommand::from_parts(&self.install_command(), cwd)
    }
}

/// npm specifier deno uses to run a CLI binary.
fn deno_specifier(binary: &str) -> String {
    match binary {
        "tailwindcss" => "npm:@tailwindcss/cli".to_string(),
        other => format!("npm:{}", other),
    }
}
