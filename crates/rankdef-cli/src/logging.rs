//! Tracing subscriber setup for the `rankdef` binary.
//!
//! Filter priority: `--log-level`, then `RANKDEF_LOG`, then `RUST_LOG`,
//! then `warn`. Logs go to stderr so they never mix with derived output.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const LOG_ENV: &str = "RANKDEF_LOG";
pub const DEFAULT_LEVEL: &str = "warn";

pub fn init(level: Option<String>) {
    let filter = build_env_filter(level.as_deref());
    let use_ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(true)
        .without_time()
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn build_env_filter(level: Option<&str>) -> EnvFilter {
    if let Some(directives) = level {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("warning: ignoring --log-level '{directives}': {e}"),
        }
    }

    if let Ok(directives) = std::env::var(LOG_ENV)
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::new(DEFAULT_LEVEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_level_wins() {
        let filter = build_env_filter(Some("rankdef_compiler=debug"));
        assert_eq!(filter.to_string(), "rankdef_compiler=debug");
    }

    #[test]
    fn invalid_level_falls_back() {
        let filter = build_env_filter(Some("rankdef_compiler=loud"));
        assert_ne!(filter.to_string(), "rankdef_compiler=loud");
    }
}
