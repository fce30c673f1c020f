mod args;
mod commands;
mod dispatch;


use clap::ArgMatches;

pub use commands::build_cli;
pub use dispatch::{CheckParams, CompileParams, TypesParams};

/// `--color` setting. Only diagnostics are colored, and they go to stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn should_colorize(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// Log level requested on the command line, if any.
pub fn log_level(m: &ArgMatches) -> Option<String> {
    m.get_one::<String>("log_level").cloned()
}
