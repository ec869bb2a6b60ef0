//! End-to-end publish runs against fixture projects.

mod helpers;

use helpers::{RecordingCompiler, react_fixture, svelte_fixture, vue_fixture};
use oaysus_build::{
    CancellationFlag, CompileTarget, Framework, FrameworkRegistry, PipelineOptions,
    PipelineReport, PublishPipeline, Stage, StageObserver,
};
use std::sync::{Arc, Mutex};

fn pipeline(root: &std::path::Path, compiler: Arc<RecordingCompiler>) -> PublishPipeline {
    PublishPipeline::new(PipelineOptions::new(root))
        .with_registry(FrameworkRegistry::new(compiler))
}

fn r2_pipeline(root: &std::path::Path, compiler: Arc<RecordingCompiler>) -> PublishPipeline {
    let mut options = PipelineOptions::new(root);
    options.r2_public_url = Some("https://assets.example.com".to_string());
    PublishPipeline::new(options).with_registry(FrameworkRegistry::new(compiler))
}

fn artifact_keys(report: &PipelineReport) -> Vec<&str> {
    report.artifacts.iter().map(|a| a.key.as_str()).collect()
}

#[tokio::test]
async fn test_react_publish_writes_every_artifact() {
    let fixture = react_fixture();
    let compiler = RecordingCompiler::new();
    let report = pipeline(fixture.root(), compiler.clone())
        .run(&fixture.package())
        .await;

    assert!(report.success, "pipeline failed: {:?}", report.error);
    assert_eq!(report.framework, Some(Framework::React));

    let detected = &report.detected_deps;
    assert_eq!(detected.len(), 1);
    assert_eq!(detected[0].name, "swiper");
    assert_eq!(detected[0].version, "11.0.0");
    assert_eq!(detected[0].imports, vec!["swiper/react", "swiper/css"]);
    assert_eq!(detected[0].sub_exports, vec!["react"]);
    assert_eq!(detected[0].css_imports, vec!["swiper/css"]);

    let keys = artifact_keys(&report);
    for expected in [
        "hero/index.js",
        "hero/schema.json",
        "hero/server.js",
        "footer/index.js",
        "footer/server.js",
        "deps/react@18.2.0/index.js",
        "deps/react@18.2.0/jsx-runtime.js",
        "deps/react-dom@18.2.0/index.js",
        "deps/react-dom@18.2.0/client.js",
        "deps/react-dom@18.2.0/server.js",
        "deps/swiper@11.0.0/index.js",
        "deps/swiper@11.0.0/react.js",
        "deps/swiper@11.0.0/css.css",
        "manifest.json",
        "import-map.json",
    ] {
        assert!(keys.contains(&expected), "missing artifact {expected}: {keys:?}");
    }

    assert!(fixture.leftover_scratch_dirs().is_empty());
}

#[tokio::test]
async fn test_client_externals_are_runtime_plus_detected() {
    let fixture = react_fixture();
    let compiler = RecordingCompiler::new();
    let report = pipeline(fixture.root(), compiler.clone())
        .run(&fixture.package())
        .await;
    assert!(report.success);

    let hero = fixture.output_dir().join("hero");
    let client = compiler
        .calls_for(CompileTarget::Browser)
        .into_iter()
        .find(|call| call.request.out_dir == hero)
        .unwrap();

    let packages: Vec<_> = client.request.externals.packages().collect();
    let specifiers: Vec<_> = client.request.externals.specifiers().collect();
    assert_eq!(packages, vec!["react", "react-dom"]);
    assert_eq!(specifiers, vec!["swiper", "swiper/css", "swiper/react"]);

    assert!(client.request.externals.is_external("react/jsx-runtime"));
    assert!(!client.request.externals.is_external("lodash-es/debounce"));
    assert!(!client.request.externals.is_external("swiper/modules"));

    for server in compiler
        .calls_for(CompileTarget::Server)
        .into_iter()
        .filter(|call| call.request.file_name == "server.js" && call.request.out_dir.starts_with(&hero))
    {
        assert!(server.request.externals.is_empty());
    }
}

#[tokio::test]
async fn test_ssr_failure_keeps_client_build_and_outputs() {
    let fixture = react_fixture();
    let compiler = RecordingCompiler::failing_when(|request| {
        request.target == CompileTarget::Server
            && request.entry.to_string_lossy().ends_with(".server.js")
    });
    let report = pipeline(fixture.root(), compiler)
        .run(&fixture.package())
        .await;

    assert!(report.success, "pipeline failed: {:?}", report.error);
    assert!(report.build.as_ref().unwrap().success);

    let server = report.server.as_ref().unwrap();
    assert!(!server.success);
    assert!(server.components.is_empty());
    assert!(!report.warnings.is_empty());

    let manifest = report.manifest.as_ref().unwrap();
    assert_eq!(manifest.components, vec!["hero", "footer"]);
    assert!(fixture.output_dir().join("manifest.json").is_file());
    assert!(fixture.output_dir().join("import-map.json").is_file());
}

#[tokio::test]
async fn test_client_failure_aborts_before_bundling() {
    let fixture = react_fixture();
    let compiler = RecordingCompiler::failing_when(|request| {
        request.target == CompileTarget::Browser && request.out_dir.ends_with("footer")
    });
    let report = pipeline(fixture.root(), compiler.clone())
        .run(&fixture.package())
        .await;

    assert!(!report.success);
    assert_eq!(report.failed_stage, Some(Stage::BuildClient));
    assert!(report.error.as_deref().unwrap().contains("footer"));

    let build = report.build.as_ref().unwrap();
    assert_eq!(build.components.len(), 1);
    assert!(compiler.calls_for(CompileTarget::Server).is_empty());
    assert!(!fixture.output_dir().join("manifest.json").exists());
    assert!(fixture.leftover_scratch_dirs().is_empty());
}

#[tokio::test]
async fn test_r2_import_map_points_at_written_bundles() {
    for fixture in [react_fixture(), svelte_fixture(), vue_fixture()] {
        let report = r2_pipeline(fixture.root(), RecordingCompiler::new())
            .run(&fixture.package())
            .await;
        assert!(report.success, "pipeline failed: {:?}", report.error);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);

        let prefix = "https://assets.example.com/acme-theme/1.0.0/";
        let import_map = report.import_map.as_ref().unwrap();
        assert!(!import_map.imports.is_empty());
        for (specifier, url) in &import_map.imports {
            let relative = url.strip_prefix(prefix).unwrap();
            assert!(
                fixture.output_dir().join(relative).is_file(),
                "{specifier} → {url} has no bundle"
            );
        }
    }
}

#[tokio::test]
async fn test_cdn_import_map_file() {
    let fixture = svelte_fixture();
    let report = pipeline(fixture.root(), RecordingCompiler::new())
        .run(&fixture.package())
        .await;
    assert!(report.success);

    let written: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(fixture.output_dir().join("import-map.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(written["imports"]["svelte"], "https://esm.sh/svelte@5.1.0");
    assert_eq!(
        written["imports"]["svelte/internal/client"],
        "https://esm.sh/svelte@5.1.0/internal/client"
    );
}

#[tokio::test]
async fn test_manifest_lists_hosted_dependencies() {
    let fixture = vue_fixture();
    let report = pipeline(fixture.root(), RecordingCompiler::new())
        .run(&fixture.package())
        .await;
    assert!(report.success, "pipeline failed: {:?}", report.error);

    let written: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(fixture.output_dir().join("manifest.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(written["framework"], "vue");
    assert_eq!(written["frameworkVersion"], "3.4.21");
    assert_eq!(written["components"][0], "card");

    let paths: Vec<_> = written["deps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|dep| dep["r2Path"].as_str().unwrap().to_string())
        .collect();
    assert!(paths.contains(&"deps/vue@3.4.21".to_string()));
    assert!(paths.contains(&"deps/@vue/runtime-core@3.4.21".to_string()));
}

#[tokio::test]
async fn test_unsupported_framework_fails_validation() {
    let mut fixture = react_fixture();
    fixture.manifest.dependencies.clear();
    fixture
        .manifest
        .dependencies
        .insert("solid-js".into(), "^1.8.0".into());

    let compiler = RecordingCompiler::new();
    let report = pipeline(fixture.root(), compiler.clone())
        .run(&fixture.package())
        .await;

    assert!(!report.success);
    assert_eq!(report.failed_stage, Some(Stage::Validate));
    assert_eq!(report.framework, None);
    assert!(compiler.calls().is_empty());
}

#[tokio::test]
async fn test_cancelled_run_stops_before_first_stage() {
    let fixture = react_fixture();
    let cancellation = CancellationFlag::new();
    cancellation.cancel();

    let report = pipeline(fixture.root(), RecordingCompiler::new())
        .with_cancellation(cancellation)
        .run(&fixture.package())
        .await;

    assert!(!report.success);
    assert_eq!(report.failed_stage, Some(Stage::Validate));
    assert!(report.error.as_deref().unwrap().contains("cancelled"));
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl StageObserver for RecordingObserver {
    fn on_stage_start(&self, stage: Stage) {
        self.events.lock().unwrap().push(format!("start {stage}"));
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.events.lock().unwrap().push(format!("done {stage}"));
    }
}

#[tokio::test]
async fn test_observer_sees_every_stage_in_order() {
    let fixture = svelte_fixture();
    let observer = Arc::new(RecordingObserver::default());
    let report = pipeline(fixture.root(), RecordingCompiler::new())
        .with_observer(observer.clone())
        .run(&fixture.package())
        .await;
    assert!(report.success);

    let events = observer.events.lock().unwrap().clone();
    let expected: Vec<String> = Stage::ALL
        .iter()
        .flat_map(|stage| [format!("start {stage}"), format!("done {stage}")])
        .collect();
    assert_eq!(events, expected);
}
