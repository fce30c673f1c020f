use std::fmt::Write;

use rankdef_compiler::profile::RankProperty;
use rankdef_compiler::{Application, CompiledRankProfile, Owner};
use serde::Serialize;

use super::{ApplicationArgs, Result, Selection};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub struct CompileArgs {
    pub application: ApplicationArgs,
    pub selection: Selection,
    pub format: OutputFormat,
    pub color: bool,
}

/// Derived properties of one rank profile.
#[derive(Debug, Serialize)]
pub struct DerivedProfile {
    pub schema: Option<String>,
    pub name: String,
    pub properties: Vec<DerivedProperty>,
}

#[derive(Debug, Serialize)]
pub struct DerivedProperty {
    pub name: String,
    pub value: String,
}

pub fn run(args: CompileArgs) {
    let app = args.application.load().unwrap_or_else(|e| super::fail(e));
    let (derived, warnings) =
        derive_selected(&app, &args.selection).unwrap_or_else(|e| super::fail(e));

    for compiled in &warnings {
        if !compiled.diagnostics().is_empty() {
            eprint!("{}", compiled.diagnostics().render_colored(args.color));
        }
    }

    match args.format {
        OutputFormat::Text => print!("{}", render_text(&derived)),
        OutputFormat::Json => match serde_json::to_string_pretty(&derived) {
            Ok(json) => println!("{json}"),
            Err(e) => super::fail(e),
        },
    }
}

/// Compile and derive the selected profiles. Compiled profiles are returned
/// alongside so their warnings can be reported.
pub fn derive_selected(
    app: &Application,
    selection: &Selection,
) -> Result<(Vec<DerivedProfile>, Vec<CompiledRankProfile>)> {
    let context = app.compile_context();
    let mut derived = Vec::new();
    let mut compiled_profiles = Vec::new();
    for profile in selection.profiles(app)? {
        let compiled = profile.compile(&context)?;
        let properties = app.derive(&compiled)?;
        derived.push(DerivedProfile {
            schema: schema_of(compiled.owner()),
            name: compiled.name().to_owned(),
            properties: properties.into_iter().map(DerivedProperty::from).collect(),
        });
        compiled_profiles.push(compiled);
    }
    Ok((derived, compiled_profiles))
}

pub fn render_text(profiles: &[DerivedProfile]) -> String {
    let mut out = String::new();
    for (i, profile) in profiles.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = match &profile.schema {
            Some(schema) => writeln!(out, "# {schema}.{}", profile.name),
            None => writeln!(out, "# {}", profile.name),
        };
        for property in &profile.properties {
            let _ = writeln!(out, "{}: {}", property.name, property.value);
        }
    }
    out
}

fn schema_of(owner: &Owner) -> Option<String> {
    owner.schema_name().map(str::to_owned)
}

impl From<RankProperty> for DerivedProperty {
    fn from(property: RankProperty) -> Self {
        Self {
            name: property.name,
            value: property.value,
        }
    }
}
