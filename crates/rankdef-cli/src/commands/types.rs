use std::fmt::Write;

use rankdef_compiler::CompiledRankProfile;
use rankdef_core::TensorType;

use super::{ApplicationArgs, Selection};

pub struct TypesArgs {
    pub application: ApplicationArgs,
    pub selection: Selection,
    pub color: bool,
}

pub fn run(args: TypesArgs) {
    let app = args.application.load().unwrap_or_else(|e| super::fail(e));
    let profiles = args
        .selection
        .profiles(&app)
        .unwrap_or_else(|e| super::fail(e));

    let context = app.compile_context();
    let mut out = String::new();
    for (i, profile) in profiles.iter().enumerate() {
        let compiled = profile.compile(&context).unwrap_or_else(|e| super::fail(e));
        if !compiled.diagnostics().is_empty() {
            eprint!("{}", compiled.diagnostics().render_colored(args.color));
        }
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&render_types(&compiled));
    }
    print!("{out}");
}

/// Resolved types of a compiled profile: functions, then every typed
/// feature, then query features that fell back to a scalar.
pub fn render_types(profile: &CompiledRankProfile) -> String {
    let mut out = String::new();
    let _ = match profile.owner().schema_name() {
        Some(schema) => writeln!(out, "# {schema}.{}", profile.name()),
        None => writeln!(out, "# {}", profile.name()),
    };

    section(
        &mut out,
        "functions",
        profile
            .function_types()
            .iter()
            .map(|(name, tensor_type)| (name.clone(), tensor_type)),
    );
    section(
        &mut out,
        "features",
        profile
            .feature_types()
            .iter()
            .map(|(feature, tensor_type)| (feature.to_string(), tensor_type)),
    );

    let undeclared = profile.query_features_not_declared();
    if !undeclared.is_empty() {
        out.push_str("undeclared:\n");
        for feature in undeclared {
            let _ = writeln!(out, "  {feature}");
        }
    }
    out
}

fn section<'a>(
    out: &mut String,
    title: &str,
    entries: impl Iterator<Item = (String, &'a TensorType)>,
) {
    let mut entries = entries.peekable();
    if entries.peek().is_none() {
        return;
    }
    let _ = writeln!(out, "{title}:");
    for (name, tensor_type) in entries {
        let _ = writeln!(out, "  {name}: {tensor_type}");
    }
}
