//! `sans` command-line tool.

use clap::{ColorChoice, Parser};
use sans_cli::commands::{run_decode, run_encode, run_validate};
use sans_cli::logging::{LogConfig, LogFormat, init_logging};
use sans_cli::summary::{instruments_table, print_outcome};
use sans_model::StaticSearchDirectories;
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{Cli, Command, DirectoryArgs, LogFormatArg, LogLevelArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let directories = search_directories(&cli.directories);
    let result = match &cli.command {
        Command::Validate(args) => run_validate(&args.settings, directories),
        Command::Encode(args) => run_encode(
            &args.settings.settings,
            directories,
            args.output.as_deref(),
            args.allow_invalid,
        ),
        Command::Decode(args) => run_decode(&args.bag),
        Command::Instruments => {
            println!("{}", instruments_table());
            std::process::exit(0);
        }
    };
    let exit_code = match result {
        Ok(outcome) => {
            // `encode` without --output owns stdout for the bag.
            let bag_on_stdout = matches!(
                &cli.command,
                Command::Encode(args)
                    if args.output.is_none() && (outcome.is_valid() || args.allow_invalid)
            );
            if bag_on_stdout {
                if let Err(error) = &outcome.validation {
                    eprintln!("{error}");
                }
            } else {
                print_outcome(&outcome);
            }
            if outcome.is_valid() { 0 } else { 1 }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn search_directories(args: &DirectoryArgs) -> StaticSearchDirectories {
    let directories = StaticSearchDirectories::new(args.search_dirs.clone());
    match &args.definitions_dir {
        Some(dir) => directories.with_definition_directory(dir),
        None => directories,
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
