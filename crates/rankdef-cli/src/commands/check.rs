use rankdef_compiler::{Application, Diagnostics};

use super::ApplicationArgs;

pub struct CheckArgs {
    pub application: ApplicationArgs,
    pub strict: bool,
    pub color: bool,
}

pub fn run(args: CheckArgs) {
    let diagnostics = match args.application.load() {
        Ok(app) => check(&app),
        Err(super::CliError::Compiler(e)) => {
            let mut diagnostics = Diagnostics::new();
            diagnostics.report_error(&e);
            diagnostics
        }
        Err(e) => super::fail(e),
    };

    let failed = diagnostics.has_errors() || (args.strict && diagnostics.has_warnings());
    if !diagnostics.is_empty() {
        eprint!("{}", diagnostics.render_colored(args.color));
    }
    if failed {
        std::process::exit(1);
    }

    // Silent on success
}

/// Compile and derive every profile, collecting failures and warnings instead of
/// stopping at the first one.
pub fn check(app: &Application) -> Diagnostics {
    let context = app.compile_context();
    let mut diagnostics = Diagnostics::new();
    for profile in app.registry().profiles() {
        match profile.compile(&context) {
            Ok(compiled) => {
                diagnostics.extend(compiled.diagnostics().clone());
                if let Err(e) = app.derive(&compiled) {
                    diagnostics.report_error(&e);
                }
            }
            Err(e) => diagnostics.report_error(&e),
        }
    }
    tracing::debug!(
        errors = diagnostics.error_count(),
        warnings = diagnostics.warning_count(),
        "check finished"
    );
    diagnostics
}
