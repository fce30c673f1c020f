//! Test utilities: building applications from inline JSON and reading back
//! compiled profiles and derived properties.

use crate::profile::CompiledRankProfile;
use crate::{Application, CompilerConfig, Owner};

/// Load an application from JSON with the default config.
pub fn application(json: &str) -> Application {
    application_with(json, CompilerConfig::default())
}

pub fn application_with(json: &str, config: CompilerConfig) -> Application {
    Application::from_json(json, config).unwrap_or_else(|e| panic!("invalid application: {e}"))
}

/// Compile the profile `name` of `schema` (or a global profile when
/// `schema` is `None`), panicking on any error.
pub fn compiled(app: &Application, schema: Option<&str>, name: &str) -> CompiledRankProfile {
    profile(app, schema, name)
        .compile(&app.compile_context())
        .unwrap_or_else(|e| panic!("expected '{name}' to compile: {e}"))
}

/// Compile the profile `name`, expecting a failure, and return the message.
pub fn compile_error(app: &Application, schema: Option<&str>, name: &str) -> String {
    match profile(app, schema, name).compile(&app.compile_context()) {
        Ok(_) => panic!("expected '{name}' to fail to compile"),
        Err(e) => e.to_string(),
    }
}

/// Derived properties as `name: value` lines.
pub fn derived(app: &Application, profile: &CompiledRankProfile) -> String {
    app.derive(profile)
        .unwrap_or_else(|e| panic!("derive failed: {e}"))
        .iter()
        .map(|p| format!("{}: {}", p.name, p.value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn profile<'a>(
    app: &'a Application,
    schema: Option<&str>,
    name: &str,
) -> crate::profile::ProfileRef<'a> {
    let owner = schema.map(Owner::schema).unwrap_or(Owner::Global);
    app.registry()
        .get(&owner, name)
        .unwrap_or_else(|| panic!("no rank profile '{name}' in {owner}"))
}

/// Snapshot of the derived properties of one profile.
#[macro_export]
macro_rules! shot_derived {
    ($json:literal, $schema:expr, $profile:literal, @$snapshot:literal) => {{
        let app = $crate::test_utils::application(indoc::indoc!($json));
        let compiled = $crate::test_utils::compiled(&app, $schema, $profile);
        let output = $crate::test_utils::derived(&app, &compiled);
        insta::assert_snapshot!(output, @$snapshot);
    }};
}

/// Snapshot of the error raised when compiling one profile.
#[macro_export]
macro_rules! shot_compile_error {
    ($json:literal, $schema:expr, $profile:literal, @$snapshot:literal) => {{
        let app = $crate::test_utils::application(indoc::indoc!($json));
        let output = $crate::test_utils::compile_error(&app, $schema, $profile);
        insta::assert_snapshot!(output, @$snapshot);
    }};
}
