//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Args every command accepts.
fn with_common_args(cmd: Command) -> Command {
    cmd.arg(application_arg())
        .arg(config_arg())
        .arg(log_level_arg())
        .arg(color_arg())
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("rankdef")
        .about("Rank profile compiler: inheritance, expression typing and derivation")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(check_command())
        .subcommand(compile_command())
        .subcommand(types_command())
}

/// Compile every rank profile and report diagnostics.
pub fn check_command() -> Command {
    let cmd = Command::new("check")
        .about("Compile all rank profiles and report problems")
        .override_usage("  rankdef check <APPLICATION> [--strict]")
        .after_help(
            r#"EXAMPLES:
  rankdef check app.json              # errors only fail the check
  rankdef check app.json --strict     # warnings fail it too
  rankdef check app.json -c ranking.json"#,
        )
        .arg(strict_arg());
    with_common_args(cmd)
}

/// Print derived rank properties.
pub fn compile_command() -> Command {
    let cmd = Command::new("compile")
        .about("Compile rank profiles and print their derived properties")
        .override_usage("  rankdef compile <APPLICATION> [-s <SCHEMA>] [-p <PROFILE>]")
        .after_help(
            r#"EXAMPLES:
  rankdef compile app.json                      # every profile
  rankdef compile app.json -s music             # profiles of one schema
  rankdef compile app.json -s music -p fresh    # a single profile
  rankdef compile app.json --format json"#,
        )
        .arg(schema_arg())
        .arg(profile_arg())
        .arg(format_arg());
    with_common_args(cmd)
}

/// Print resolved function and feature types.
pub fn types_command() -> Command {
    let cmd = Command::new("types")
        .about("Print the resolved types of functions and features")
        .override_usage("  rankdef types <APPLICATION> [-s <SCHEMA>] [-p <PROFILE>]")
        .arg(schema_arg())
        .arg(profile_arg());
    with_common_args(cmd)
}
