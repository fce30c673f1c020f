//! Query profile types: typed request parameters, some of which are rank
//! features (`ranking.features.query(q)`).

use indexmap::IndexMap;
use rankdef_core::TensorType;

use crate::reference::Reference;
use crate::reference::feature_names::as_query_feature;
use crate::{Error, Result};

const RANK_FEATURE_PREFIXES: [&str; 3] = ["ranking.features.", "rankfeature.", "input."];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryProfileType {
    id: String,
    fields: IndexMap<String, TensorType>,
}

impl QueryProfileType {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, tensor_type: TensorType) -> Self {
        self.fields.insert(name.into(), tensor_type);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fields that declare rank features, keyed by the feature.
    pub fn feature_types(&self) -> impl Iterator<Item = (Reference, &TensorType)> {
        self.fields.iter().filter_map(|(name, tensor_type)| {
            let feature = RANK_FEATURE_PREFIXES
                .iter()
                .find_map(|prefix| name.strip_prefix(prefix))?;
            let reference = Reference::parse(feature).ok()?;
            // `input.q` is shorthand for `query(q)`.
            let reference = if reference.is_identifier() {
                as_query_feature(reference.name())
            } else {
                reference
            };
            Some((reference, tensor_type))
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryProfileRegistry {
    types: IndexMap<String, QueryProfileType>,
}

impl QueryProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, profile_type: QueryProfileType) {
        self.types.insert(profile_type.id.clone(), profile_type);
    }

    pub fn get(&self, id: &str) -> Option<&QueryProfileType> {
        self.types.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Feature types declared across all query profile types. The same
    /// feature declared in several types gets the most specific type they
    /// all generalize to.
    pub fn feature_types(&self) -> Result<IndexMap<Reference, TensorType>> {
        let mut types: IndexMap<Reference, TensorType> = IndexMap::new();
        for profile_type in self.types.values() {
            for (feature, declared) in profile_type.feature_types() {
                let generalized = match types.get(&feature) {
                    None => declared.clone(),
                    Some(existing) => existing
                        .dimensionwise_generalization_with(declared)
                        .ok_or_else(|| Error::QueryFeatureTypeConflict {
                            profile_type: profile_type.id.clone(),
                            feature: feature.to_string(),
                            declared: declared.clone(),
                            existing: existing.clone(),
                        })?,
                };
                types.insert(feature, generalized);
            }
        }
        Ok(types)
    }
}
