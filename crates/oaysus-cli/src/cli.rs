//! Command-line interface definition.
//!
//! - `oaysus build` - Run the publish pipeline up to the upload handoff
//! - `oaysus analyze` - Print the third-party packages components import
//! - `oaysus import-map` - Print the import map for the current manifest

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Oaysus - build theme packs for hosted rendering
#[derive(Parser, Debug)]
#[command(
    name = "oaysus",
    version,
    about = "Build and package Oaysus theme packs",
    long_about = "Builds React, Vue and Svelte theme packs into client bundles, server-rendering\n\
                  bundles, standalone dependency bundles and an import map, ready for upload."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a theme pack
    ///
    /// Compiles every component, bundles framework and third-party
    /// dependencies, and writes manifest.json and import-map.json into the
    /// output directory.
    Build(BuildArgs),

    /// List detected third-party dependencies as JSON
    Analyze(AnalyzeArgs),

    /// Print the import map as JSON
    ImportMap(ImportMapArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Theme project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Config file (defaults to <root>/oaysus.config.json when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Import-map URL options shared by `build` and `import-map`.
#[derive(Args, Debug, Clone, Default)]
pub struct UrlArgs {
    /// ESM CDN used when no R2 public URL is configured
    #[arg(long, value_name = "URL")]
    pub cdn_url: Option<String>,

    /// Public URL of the asset bucket; switches the import map to self-hosted URLs
    #[arg(long, value_name = "URL")]
    pub r2_public_url: Option<String>,

    /// Theme prefix inside the bucket (defaults to <theme>/<version>)
    #[arg(long, value_name = "PATH")]
    pub r2_base_path: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub urls: UrlArgs,

    /// Output directory, relative to the project root
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<String>,

    /// Keep bundles readable
    #[arg(long)]
    pub no_minify: bool,

    /// Fail instead of installing dependencies when node_modules is missing
    #[arg(long)]
    pub no_install: bool,

    /// Print the full report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ImportMapArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub urls: UrlArgs,

    /// Include the stylesheet links (self-hosted mode only)
    #[arg(long, requires = "r2_public_url")]
    pub stylesheets: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from([
            "oaysus",
            "build",
            "--root",
            "/theme",
            "--r2-public-url",
            "https://assets.example.com",
            "--no-minify",
        ]);
        let Command::Build(args) = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(args.project.root, Some(PathBuf::from("/theme")));
        assert_eq!(
            args.urls.r2_public_url.as_deref(),
            Some("https://assets.example.com")
        );
        assert!(args.no_minify);
        assert!(!args.no_install);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["oaysus", "-v", "-q", "analyze"]).is_err());
    }

    #[test]
    fn test_stylesheets_require_r2() {
        assert!(Cli::try_parse_from(["oaysus", "import-map", "--stylesheets"]).is_err());
        assert!(
            Cli::try_parse_from([
                "oaysus",
                "import-map",
                "--stylesheets",
                "--r2-public-url",
                "https://a.example.com"
            ])
            .is_ok()
        );
    }
}
