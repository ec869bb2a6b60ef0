//! End-to-end tests for the `oaysus` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn oaysus() -> Command {
    let mut cmd = Command::cargo_bin("oaysus").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("OAYSUS_CDN_URL")
        .env_remove("OAYSUS_R2_PUBLIC_URL")
        .env_remove("OAYSUS_R2_BASE_PATH");
    cmd
}

fn react_theme() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(
        root.join("package.json"),
        r#"{
            "name": "acme-theme",
            "version": "1.2.0",
            "dependencies": {
                "react": "^18.2.0",
                "react-dom": "^18.2.0",
                "swiper": "^11.0.5"
            }
        }"#,
    )
    .unwrap();
    write_component(
        root,
        "hero",
        r#"import React from "react";
import { Swiper } from "swiper/react";
import "swiper/css";
export default function Hero() { return <Swiper />; }
"#,
    );
    temp
}

fn write_component(root: &Path, name: &str, source: &str) {
    let dir = root.join("components").join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("index.tsx"), source).unwrap();
    fs::write(dir.join("schema.json"), r#"{ "props": {} }"#).unwrap();
}

#[test]
fn test_help_lists_commands() {
    oaysus()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("import-map"));
}

#[test]
fn test_analyze_prints_detected_dependencies() {
    let theme = react_theme();
    oaysus()
        .args(["analyze", "--root"])
        .arg(theme.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""name": "swiper""#))
        .stdout(predicate::str::contains(r#""version": "11.0.5""#))
        .stdout(predicate::str::contains(r#""swiper/css""#));
}

#[test]
fn test_import_map_cdn_mode() {
    let theme = react_theme();
    oaysus()
        .args(["import-map", "--root"])
        .arg(theme.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""imports""#))
        .stdout(predicate::str::contains("https://esm.sh/react@18.2.0"))
        .stdout(predicate::str::contains("https://esm.sh/swiper@11.0.5/react"));
}

#[test]
fn test_import_map_r2_mode_with_stylesheets() {
    let theme = react_theme();
    oaysus()
        .args(["import-map", "--stylesheets", "--r2-public-url", "https://assets.example.com", "--root"])
        .arg(theme.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://assets.example.com/acme-theme/1.2.0/deps/swiper@11.0.5/index.js",
        ))
        .stdout(predicate::str::contains(r#""stylesheets""#))
        .stdout(predicate::str::contains(r#""swiper/css""#));
}

#[test]
fn test_config_file_is_read() {
    let theme = react_theme();
    fs::write(
        theme.path().join("oaysus.config.json"),
        r#"{ "cdn_url": "https://cdn.example.com" }"#,
    )
    .unwrap();
    oaysus()
        .args(["import-map", "--root"])
        .arg(theme.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("https://cdn.example.com/react@18.2.0"));
}

#[test]
fn test_missing_package_json_fails() {
    let temp = TempDir::new().unwrap();
    oaysus()
        .args(["analyze", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_build_without_components_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("package.json"),
        r#"{ "name": "empty", "version": "0.1.0" }"#,
    )
    .unwrap();
    oaysus()
        .args(["build", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No components found"));
}
