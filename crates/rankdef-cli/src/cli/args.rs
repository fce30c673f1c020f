//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` so the same definition can be
//! composed into several commands.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Application description file (positional).
pub fn application_arg() -> Arg {
    Arg::new("application")
        .value_name("APPLICATION")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Application description (JSON)")
}

/// Compiler settings file (-c/--config).
pub fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Compiler settings (JSON)")
}

/// Schema scope (-s/--schema).
pub fn schema_arg() -> Arg {
    Arg::new("schema")
        .short('s')
        .long("schema")
        .value_name("SCHEMA")
        .help("Only rank profiles of this schema")
}

/// Rank profile name (-p/--profile).
pub fn profile_arg() -> Arg {
    Arg::new("profile")
        .short('p')
        .long("profile")
        .value_name("PROFILE")
        .help("Only this rank profile")
}

/// Log filter (--log-level).
pub fn log_level_arg() -> Arg {
    Arg::new("log_level")
        .long("log-level")
        .value_name("LEVEL")
        .help("Log level or filter directives (e.g. debug, rankdef_compiler=trace)")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Treat warnings as errors (--strict).
pub fn strict_arg() -> Arg {
    Arg::new("strict")
        .long("strict")
        .action(ArgAction::SetTrue)
        .help("Treat warnings as errors")
}

/// Output format (--format).
pub fn format_arg() -> Arg {
    Arg::new("format")
        .long("format")
        .value_name("FORMAT")
        .default_value("text")
        .value_parser(["text", "json"])
        .help("Output format")
}
