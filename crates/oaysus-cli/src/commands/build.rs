//! `oaysus build`: run the publish pipeline up to the upload handoff.

use crate::cli::BuildArgs;
use crate::commands::utils;
use crate::config::ConfigOverrides;
use crate::discover;
use crate::error::{CliError, Result};
use crate::ui;
use oaysus_build::{CancellationFlag, PipelineReport, PublishPipeline};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Execute the build command.
///
/// # Build Process
///
/// 1. Load configuration (flags > env > file > defaults)
/// 2. Discover components and read `package.json`
/// 3. Run the pipeline with a stage spinner; Ctrl-C cancels between stages
/// 4. Print the summary, or the full report with `--json`
///
/// # Errors
///
/// Configuration and discovery errors, and [`CliError::Pipeline`] naming the
/// stage that failed.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let start_time = Instant::now();

    let (root, config) = utils::load_project(&args.project, &overrides(&args))?;
    let package = discover::load_package(&root, config.components_dir.as_deref())?;
    ui::info(&format!(
        "Building {} component(s) from {}",
        package.components.len(),
        root.display()
    ));

    let options = config.pipeline_options(&root);
    let output_dir = options.output_dir();

    let cancellation = CancellationFlag::new();
    let signal_flag = cancellation.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling after the current stage");
            signal_flag.cancel();
        }
    });

    let spinner = Arc::new(ui::StageSpinner::new());
    let pipeline = PublishPipeline::new(options)
        .with_registry(utils::registry(&config))
        .with_observer(spinner.clone())
        .with_cancellation(cancellation);

    let report = pipeline.run(&package).await;
    signal_task.abort();

    if args.json {
        spinner.finish();
        utils::print_json(&report)?;
    }

    if !report.success {
        if let Some(stage) = report.failed_stage {
            spinner.fail(stage);
        } else {
            spinner.finish();
        }
        return Err(failure(report));
    }

    spinner.finish();
    if !args.json {
        ui::print_publish_summary(&report, &output_dir, start_time.elapsed());
    }
    ui::success(&format!(
        "Build completed in {}",
        ui::format_duration(start_time.elapsed())
    ));

    Ok(())
}

fn overrides(args: &BuildArgs) -> ConfigOverrides {
    ConfigOverrides {
        output_dir: args.out_dir.clone(),
        minify: args.no_minify.then_some(false),
        install_missing_deps: args.no_install.then_some(false),
        ..utils::url_overrides(&args.urls)
    }
}

fn failure(report: PipelineReport) -> CliError {
    CliError::Pipeline {
        stage: report.failed_stage,
        message: report
            .error
            .unwrap_or_else(|| "build failed without an error message".to_string()),
    }
}
