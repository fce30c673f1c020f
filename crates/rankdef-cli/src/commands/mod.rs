pub mod check;
pub mod compile;
pub mod types;


use std::path::PathBuf;

use rankdef_compiler::profile::ProfileRef;
use rankdef_compiler::{Application, CompilerConfig, Owner};

/// Where the application description and compiler settings come from.
pub struct ApplicationArgs {
    pub path: PathBuf,
    pub config: Option<PathBuf>,
}

/// Which rank profiles a command works on. Empty means all of them.
#[derive(Default)]
pub struct Selection {
    pub schema: Option<String>,
    pub profile: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Compiler(#[from] rankdef_compiler::Error),

    #[error("schema '{0}' is not declared in the application")]
    UnknownSchema(String),

    #[error("no rank profile '{name}' in {owner}")]
    UnknownProfile { owner: Owner, name: String },
}

pub type Result<T> = std::result::Result<T, CliError>;

impl ApplicationArgs {
    pub fn load(&self) -> Result<Application> {
        let config = match &self.config {
            Some(path) => CompilerConfig::load(path)?,
            None => CompilerConfig::default(),
        };
        tracing::debug!(path = %self.path.display(), "loading application");
        Ok(Application::load(&self.path, config)?)
    }
}

impl Selection {
    /// Profiles matching the selection, in registration order.
    ///
    /// A profile name without a schema looks among the global profiles.
    pub fn profiles<'a>(&self, app: &'a Application) -> Result<Vec<ProfileRef<'a>>> {
        let registry = app.registry();
        if let Some(schema) = &self.schema
            && registry.schema(schema).is_none()
        {
            return Err(CliError::UnknownSchema(schema.clone()));
        }

        let owner = match &self.schema {
            Some(schema) => Owner::schema(schema),
            None => Owner::Global,
        };

        match &self.profile {
            Some(name) => {
                let profile = registry
                    .get(&owner, name)
                    .ok_or_else(|| CliError::UnknownProfile {
                        owner,
                        name: name.clone(),
                    })?;
                Ok(vec![profile])
            }
            None if self.schema.is_some() => Ok(registry
                .profiles()
                .filter(|profile| profile.owner() == &owner)
                .collect()),
            None => Ok(registry.profiles().collect()),
        }
    }
}

/// Print an error and exit with status 1.
pub fn fail(error: impl std::fmt::Display) -> ! {
    eprintln!("error: {error}");
    std::process::exit(1);
}
