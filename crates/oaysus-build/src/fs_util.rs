//! Filesystem helpers for output and scratch directories.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::{Error, Result};

/// Prefix of every scratch directory created inside the project tree.
pub const SCRATCH_PREFIX: &str = ".oaysus-temp-";

/// Create a scratch directory under `project_root`.
///
/// It lives inside the project so that bare imports in generated wrapper
/// modules resolve against the project's `node_modules`. Removed on drop.
pub fn scratch_dir(project_root: &Path) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir_in(project_root)
        .map_err(|e| {
            Error::io(
                format!("Failed to create scratch directory in {}", project_root.display()),
                e,
            )
        })
}

/// Remove `dir` if present and recreate it empty.
pub fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .map_err(|e| Error::io(format!("Failed to clean {}", dir.display()), e))?;
    }
    ensure_dir(dir)
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::io(format!("Failed to create directory {}", dir.display()), e))
}

/// Write a file, creating parent directories.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    std::fs::write(path, contents)
        .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))
}

/// Byte length of a file, or 0 when it cannot be read.
pub fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Every regular file under `root`, sorted, as paths relative to `root`.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let message = format!("Failed to walk {}", root.display());
            match e.into_io_error() {
                Some(source) => Error::io(message, source),
                None => Error::Build(message),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_dir_is_removed_on_drop() {
        let project = TempDir::new().unwrap();
        let path = {
            let scratch = scratch_dir(project.path()).unwrap();
            let name = scratch.path().file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with(SCRATCH_PREFIX));
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_reset_dir_clears_contents() {
        let project = TempDir::new().unwrap();
        let out = project.path().join(".oaysus-build");
        write_file(&out.join("stale/index.js"), "old").unwrap();

        reset_dir(&out).unwrap();

        assert!(out.exists());
        assert!(list_files(&out).unwrap().is_empty());
    }

    #[test]
    fn test_list_files_is_sorted_and_relative() {
        let root = TempDir::new().unwrap();
        write_file(&root.path().join("b/index.js"), "b").unwrap();
        write_file(&root.path().join("a.json"), "{}").unwrap();

        let files = list_files(root.path()).unwrap();
        assert_eq!(files, vec![PathBuf::from("a.json"), PathBuf::from("b/index.js")]);
        assert_eq!(file_size(&root.path().join("a.json")), 2);
    }

    #[test]
    fn test_list_files_walks_nested_dirs_and_skips_dirs() {
        let root = TempDir::new().unwrap();
        write_file(&root.path().join("deps/swiper@11.0.5/react.js"), "r").unwrap();
        write_file(&root.path().join("deps/swiper@11.0.5/index.js"), "i").unwrap();
        write_file(&root.path().join("hero/index.js"), "h").unwrap();
        ensure_dir(&root.path().join("empty/inner")).unwrap();

        let files = list_files(root.path()).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("deps/swiper@11.0.5/index.js"),
                PathBuf::from("deps/swiper@11.0.5/react.js"),
                PathBuf::from("hero/index.js"),
            ]
        );
    }

    #[test]
    fn test_list_files_missing_root_is_an_error() {
        let root = TempDir::new().unwrap();
        assert!(list_files(&root.path().join("missing")).is_err());
    }
}
