//! Oaysus CLI - build and package theme packs.
//!
//! Parses arguments, initializes logging and dispatches to a command.

use clap::Parser;
use miette::Result;
use oaysus_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args).await,
        cli::Command::Analyze(analyze_args) => commands::analyze_execute(analyze_args),
        cli::Command::ImportMap(import_map_args) => commands::import_map_execute(import_map_args),
    };

    result.map_err(error::cli_error_to_miette)
}
