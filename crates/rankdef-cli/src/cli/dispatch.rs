//! Dispatch logic: extract params from ArgMatches and convert to command args.
//!
//! `*Params` structs mirror the command `*Args` but are populated from clap;
//! `Into<*Args>` bridges them to the command handlers.

use std::path::PathBuf;

use clap::ArgMatches;

use super::ColorChoice;
use crate::commands::check::CheckArgs;
use crate::commands::compile::{CompileArgs, OutputFormat};
use crate::commands::types::TypesArgs;
use crate::commands::{ApplicationArgs, Selection};

pub struct CheckParams {
    pub application: PathBuf,
    pub config: Option<PathBuf>,
    pub strict: bool,
    pub color: ColorChoice,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            application: application_path(m),
            config: m.get_one::<PathBuf>("config").cloned(),
            strict: m.get_flag("strict"),
            color: parse_color(m),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            application: ApplicationArgs {
                path: p.application,
                config: p.config,
            },
            strict: p.strict,
            color: p.color.should_colorize(),
        }
    }
}

pub struct CompileParams {
    pub application: PathBuf,
    pub config: Option<PathBuf>,
    pub schema: Option<String>,
    pub profile: Option<String>,
    pub format: OutputFormat,
    pub color: ColorChoice,
}

impl CompileParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            application: application_path(m),
            config: m.get_one::<PathBuf>("config").cloned(),
            schema: m.get_one::<String>("schema").cloned(),
            profile: m.get_one::<String>("profile").cloned(),
            format: parse_format(m),
            color: parse_color(m),
        }
    }
}

impl From<CompileParams> for CompileArgs {
    fn from(p: CompileParams) -> Self {
        Self {
            application: ApplicationArgs {
                path: p.application,
                config: p.config,
            },
            selection: Selection {
                schema: p.schema,
                profile: p.profile,
            },
            format: p.format,
            color: p.color.should_colorize(),
        }
    }
}

pub struct TypesParams {
    pub application: PathBuf,
    pub config: Option<PathBuf>,
    pub schema: Option<String>,
    pub profile: Option<String>,
    pub color: ColorChoice,
}

impl TypesParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            application: application_path(m),
            config: m.get_one::<PathBuf>("config").cloned(),
            schema: m.get_one::<String>("schema").cloned(),
            profile: m.get_one::<String>("profile").cloned(),
            color: parse_color(m),
        }
    }
}

impl From<TypesParams> for TypesArgs {
    fn from(p: TypesParams) -> Self {
        Self {
            application: ApplicationArgs {
                path: p.application,
                config: p.config,
            },
            selection: Selection {
                schema: p.schema,
                profile: p.profile,
            },
            color: p.color.should_colorize(),
        }
    }
}

fn application_path(m: &ArgMatches) -> PathBuf {
    m.get_one::<PathBuf>("application")
        .cloned()
        .unwrap_or_default()
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

fn parse_format(m: &ArgMatches) -> OutputFormat {
    match m.get_one::<String>("format").map(|s| s.as_str()) {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Text,
    }
}
