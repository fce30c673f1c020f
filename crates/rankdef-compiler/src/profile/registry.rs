//! Arena of every rank profile in an application, keyed by owner and name.
//!
//! Profiles refer to each other by [`ProfileId`]; the registry owns them all.

use std::fmt;

use indexmap::IndexMap;

use super::ProfileRef;
use super::rank_profile::RankProfile;
use crate::schema::Schema;
use crate::{Error, Result};

/// Scope a rank profile is declared in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Owner {
    Schema(String),
    Global,
}

impl Owner {
    pub fn schema(name: impl Into<String>) -> Self {
        Owner::Schema(name.into())
    }

    pub fn schema_name(&self) -> Option<&str> {
        match self {
            Owner::Schema(name) => Some(name),
            Owner::Global => None,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Schema(name) => write!(f, "schema '{name}'"),
            Owner::Global => f.write_str("the global rank profiles"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileId(u32);

impl ProfileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
pub struct RankProfileRegistry {
    schemas: IndexMap<String, Schema>,
    profiles: Vec<RankProfile>,
    index: IndexMap<(Owner, String), ProfileId>,
}

impl RankProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema together with its implicit `default` and
    /// `unranked` profiles.
    pub fn add_schema(&mut self, schema: Schema) -> Result<()> {
        if self.schemas.contains_key(schema.name()) {
            return Err(Error::DuplicateSchema(schema.name().to_owned()));
        }
        let owner = Owner::schema(schema.name());
        self.schemas.insert(schema.name().to_owned(), schema);
        self.insert(RankProfile::builtin_default(owner.clone()));
        self.insert(RankProfile::builtin_unranked(owner));
        Ok(())
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    /// Add a profile. A name already taken within the same owner is an
    /// error, except for `default` and `unranked`, which are replaced.
    pub fn add(&mut self, profile: RankProfile) -> Result<ProfileId> {
        if let Owner::Schema(schema) = &profile.owner
            && !self.schemas.contains_key(schema)
        {
            return Err(Error::UnknownSchema(schema.clone()));
        }
        let key = (profile.owner.clone(), profile.name.clone());
        let Some(&id) = self.index.get(&key) else {
            return Ok(self.insert(profile));
        };
        if !profile.is_overridable() {
            return Err(Error::DuplicateRankProfile {
                owner: profile.owner.clone(),
                name: profile.name.clone(),
            });
        }
        let replaced = &self.profiles[id.index()];
        if replaced.is_builtin() {
            tracing::debug!(profile = %profile.name, owner = %profile.owner, "replacing built-in rank profile");
        } else {
            tracing::warn!(
                profile = %profile.name,
                owner = %profile.owner,
                "rank profile declared more than once, the last declaration wins"
            );
        }
        self.profiles[id.index()] = profile;
        Ok(id)
    }

    fn insert(&mut self, profile: RankProfile) -> ProfileId {
        let id = ProfileId(self.profiles.len() as u32);
        self.index
            .insert((profile.owner.clone(), profile.name.clone()), id);
        self.profiles.push(profile);
        id
    }

    pub fn get(&self, owner: &Owner, name: &str) -> Option<ProfileRef<'_>> {
        self.lookup(owner, name).map(|id| self.profile(id))
    }

    pub fn get_global(&self, name: &str) -> Option<ProfileRef<'_>> {
        self.get(&Owner::Global, name)
    }

    /// Panics on an id from another registry.
    pub fn profile(&self, id: ProfileId) -> ProfileRef<'_> {
        ProfileRef::new(self, id)
    }

    pub(crate) fn raw(&self, id: ProfileId) -> &RankProfile {
        &self.profiles[id.index()]
    }

    /// All profiles in registration order.
    pub fn profiles(&self) -> impl Iterator<Item = ProfileRef<'_>> {
        self.index.values().map(|&id| self.profile(id))
    }

    pub fn profiles_of<'a>(&'a self, owner: &'a Owner) -> impl Iterator<Item = ProfileRef<'a>> {
        self.index
            .iter()
            .filter(move |((o, _), _)| o == owner)
            .map(|(_, &id)| self.profile(id))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    fn lookup(&self, owner: &Owner, name: &str) -> Option<ProfileId> {
        self.index.get(&(owner.clone(), name.to_owned())).copied()
    }

    /// Find the profile `name` as seen from `owner`: the owning schema,
    /// then the schemas it inherits, then the global profiles.
    pub fn resolve(&self, owner: &Owner, name: &str) -> Option<ProfileId> {
        match owner {
            Owner::Schema(schema) => self
                .resolve_in_schema(schema, name, &mut Vec::new())
                .or_else(|| self.lookup(&Owner::Global, name)),
            Owner::Global => self.lookup(&Owner::Global, name),
        }
    }

    /// Find `name` in the schemas that `schema` inherits, not in `schema` itself.
    pub fn resolve_in_parent_schemas(&self, schema: &str, name: &str) -> Option<ProfileId> {
        let mut visited = vec![schema.to_owned()];
        self.schemas
            .get(schema)?
            .inherited()
            .iter()
            .find_map(|parent| self.resolve_in_schema(parent, name, &mut visited))
    }

    fn resolve_in_schema(
        &self,
        schema: &str,
        name: &str,
        visited: &mut Vec<String>,
    ) -> Option<ProfileId> {
        if visited.iter().any(|v| v == schema) {
            return None;
        }
        visited.push(schema.to_owned());
        if let Some(id) = self.lookup(&Owner::schema(schema), name) {
            return Some(id);
        }
        self.schemas
            .get(schema)?
            .inherited()
            .iter()
            .find_map(|parent| self.resolve_in_schema(parent, name, visited))
    }
}
