#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod cli;
mod commands;
mod logging;

use cli::{CheckParams, CompileParams, TypesParams, build_cli};

fn main() {
    let matches = build_cli().get_matches();

    if let Some((_, m)) = matches.subcommand() {
        logging::init(cli::log_level(m));
    }

    match matches.subcommand() {
        Some(("check", m)) => {
            let params = CheckParams::from_matches(m);
            commands::check::run(params.into());
        }
        Some(("compile", m)) => {
            let params = CompileParams::from_matches(m);
            commands::compile::run(params.into());
        }
        Some(("types", m)) => {
            let params = TypesParams::from_matches(m);
            commands::types::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}
