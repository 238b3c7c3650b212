//! CLI argument definitions for the `sans` tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "sans",
    version,
    about = "Build, validate and encode SANS reduction states",
    long_about = "Build, validate and encode SANS reduction states.\n\n\
                  Reads a TOML user-settings file, selects the instrument-specific\n\
                  state variants from the sample scatter run, validates every state\n\
                  and emits the versioned JSON property bag."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub directories: DirectoryArgs,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build and validate the states described by a settings file.
    Validate(SettingsArgs),

    /// Build and validate, then write the JSON property bag.
    Encode(EncodeArgs),

    /// Decode and validate a JSON property bag.
    Decode(DecodeArgs),

    /// List the supported facility/instrument pairs.
    Instruments,
}

/// Where run files and instrument definitions are looked up.
#[derive(Args, Clone, Default)]
pub struct DirectoryArgs {
    /// Data search directory (repeatable, searched in order).
    #[arg(long = "search-dir", value_name = "DIR", global = true)]
    pub search_dirs: Vec<PathBuf>,

    /// Directory holding <INSTR>_Definition.xml and <INSTR>_Parameters.xml.
    #[arg(long = "definitions-dir", value_name = "DIR", global = true)]
    pub definitions_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SettingsArgs {
    /// TOML user-settings file.
    #[arg(value_name = "SETTINGS")]
    pub settings: PathBuf,
}

#[derive(Parser)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Write the property bag to this file (default: stdout).
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the property bag even if validation fails.
    #[arg(long = "allow-invalid")]
    pub allow_invalid: bool,
}

#[derive(Parser)]
pub struct DecodeArgs {
    /// JSON property bag written by `encode`.
    #[arg(value_name = "BAG")]
    pub bag: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
