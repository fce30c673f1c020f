//! Effective (inherited) view of a rank profile.
//!
//! Inherited profiles are resolved on first access and checked for cycles
//! right away. Every getter combines the local declaration with what the
//! direct parents provide:
//! - single values: local wins, else the one value the parents agree on;
//!   parents providing different values is an error
//! - named definitions (functions, constants, inputs, models, rank
//!   settings): union over parents, the same name defined differently by
//!   two parents is an error, local declarations override
//! - feature sets: local set, else uniquely inherited, optionally extended
//!   with one named parent's set

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

use super::constant::Constant;
use super::function::RankingExpressionFunction;
use super::input::Input;
use super::onnx::OnnxModel;
use super::rank_profile::{InheritanceState, RankProfile};
use super::registry::{Owner, ProfileId, RankProfileRegistry};
use super::tuning::{MatchPhaseSettings, RankProperty, RankSetting, RankSettingKey, Tuning};
use crate::expr::RankingExpression;
use crate::reference::Reference;
use crate::schema::Schema;
use crate::{Error, Result};

/// A profile in its registry, giving access to the inherited view.
#[derive(Clone, Copy)]
pub struct ProfileRef<'r> {
    registry: &'r RankProfileRegistry,
    id: ProfileId,
}

impl fmt::Debug for ProfileRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileRef")
            .field("name", &self.name())
            .field("owner", self.owner())
            .finish()
    }
}

impl<'r> ProfileRef<'r> {
    pub(crate) fn new(registry: &'r RankProfileRegistry, id: ProfileId) -> Self {
        Self { registry, id }
    }

    pub fn id(&self) -> ProfileId {
        self.id
    }

    pub fn registry(&self) -> &'r RankProfileRegistry {
        self.registry
    }

    /// The profile as declared, without inheritance.
    pub fn raw(&self) -> &'r RankProfile {
        self.registry.raw(self.id)
    }

    pub fn name(&self) -> &'r str {
        &self.raw().name
    }

    pub fn owner(&self) -> &'r Owner {
        &self.raw().owner
    }

    pub fn schema(&self) -> Option<&'r Schema> {
        self.owner()
            .schema_name()
            .and_then(|name| self.registry.schema(name))
    }

    /// Directly inherited profiles, in declaration order.
    pub fn inherited(&self) -> Result<Vec<ProfileRef<'r>>> {
        Ok(self
            .inherited_ids()?
            .into_iter()
            .map(|id| self.registry.profile(id))
            .collect())
    }

    fn inherited_ids(&self) -> Result<Vec<ProfileId>> {
        let raw = self.raw();
        match &*raw.inheritance.borrow() {
            InheritanceState::Resolved(ids) => return Ok(ids.clone()),
            InheritanceState::Resolving => {
                return Err(Error::InheritanceCycle {
                    profile: raw.name.clone(),
                    chain: vec![raw.name.clone(), raw.name.clone()],
                });
            }
            InheritanceState::Unresolved => {}
        }

        *raw.inheritance.borrow_mut() = InheritanceState::Resolving;
        let resolved = self.lookup_parents().and_then(|ids| {
            self.check_no_cycle(&ids)?;
            Ok(ids)
        });
        *raw.inheritance.borrow_mut() = match &resolved {
            Ok(ids) => InheritanceState::Resolved(ids.clone()),
            Err(_) => InheritanceState::Unresolved,
        };
        if let Ok(ids) = &resolved {
            tracing::debug!(
                profile = %raw.name,
                owner = %raw.owner,
                parents = ids.len(),
                "resolved inherited rank profiles"
            );
        }
        resolved
    }

    fn lookup_parents(&self) -> Result<Vec<ProfileId>> {
        let raw = self.raw();
        raw.inherited_names
            .iter()
            .map(|name| {
                let found = match &raw.owner {
                    Owner::Schema(schema) if *name == raw.name => {
                        self.registry.resolve_in_parent_schemas(schema, name)
                    }
                    owner => self.registry.resolve(owner, name),
                };
                found.ok_or_else(|| Error::InheritedNotFound {
                    profile: raw.name.clone(),
                    inherited: name.clone(),
                    owner: raw.owner.clone(),
                })
            })
            .collect()
    }

    fn check_no_cycle(&self, parents: &[ProfileId]) -> Result<()> {
        let mut chain = vec![self.id];
        let mut finished = HashSet::new();
        self.walk_ancestors(parents, &mut chain, &mut finished)
    }

    fn walk_ancestors(
        &self,
        parents: &[ProfileId],
        chain: &mut Vec<ProfileId>,
        finished: &mut HashSet<ProfileId>,
    ) -> Result<()> {
        for &parent in parents {
            if let Some(start) = chain.iter().position(|&id| id == parent) {
                let names = chain[start..]
                    .iter()
                    .chain(std::iter::once(&parent))
                    .map(|&id| self.registry.raw(id).name.clone())
                    .collect();
                return Err(Error::InheritanceCycle {
                    profile: self.raw().name.clone(),
                    chain: names,
                });
            }
            if finished.contains(&parent) {
                continue;
            }
            let grandparents = self.registry.profile(parent).lookup_parents()?;
            chain.push(parent);
            self.walk_ancestors(&grandparents, chain, finished)?;
            chain.pop();
            finished.insert(parent);
        }
        Ok(())
    }

    /// The value the direct parents provide, if exactly one distinct value
    /// is provided. `None` from `getter` means the parent has no value.
    pub fn uniquely_inherited<T: PartialEq>(
        &self,
        getter: impl Fn(&ProfileRef<'r>) -> Result<Option<T>>,
        description: &str,
    ) -> Result<Option<T>> {
        let mut values: Vec<T> = Vec::new();
        let mut holders = Vec::new();
        for parent in self.inherited()? {
            if let Some(value) = getter(&parent)? {
                holders.push(parent.name().to_owned());
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
        if values.len() > 1 {
            return Err(Error::InheritanceConflict {
                profile: self.name().to_owned(),
                property: description.to_owned(),
                parents: holders,
            });
        }
        Ok(values.pop())
    }

    /// Union of the parents' definitions overlaid with the local ones.
    fn merged<K, V>(
        &self,
        kind: &'static str,
        local: &IndexMap<K, V>,
        getter: impl Fn(&ProfileRef<'r>) -> Result<IndexMap<K, V>>,
    ) -> Result<IndexMap<K, V>>
    where
        K: Hash + Eq + Clone + fmt::Display,
        V: PartialEq + Clone,
    {
        let mut all: IndexMap<K, V> = IndexMap::new();
        for parent in self.inherited()? {
            for (key, value) in getter(&parent)? {
                if let Some(existing) = all.get(&key)
                    && *existing != value
                {
                    return Err(Error::InheritedDefinitionConflict {
                        profile: self.name().to_owned(),
                        parent: parent.name().to_owned(),
                        kind,
                        name: key.to_string(),
                    });
                }
                all.insert(key, value);
            }
        }
        for (key, value) in local {
            all.insert(key.clone(), value.clone());
        }
        Ok(all)
    }

    fn direct_parent(&self, name: &str, what: &'static str) -> Result<ProfileRef<'r>> {
        self.inherited()?
            .into_iter()
            .find(|parent| parent.name() == name)
            .ok_or_else(|| Error::NotDirectlyInherited {
                profile: self.name().to_owned(),
                parent: name.to_owned(),
                what,
            })
    }

    pub fn first_phase(&self) -> Result<Option<RankingExpression>> {
        match &self.raw().first_phase {
            Some(expression) => Ok(Some(expression.clone())),
            None => self.uniquely_inherited(|p| p.first_phase(), "first-phase expression"),
        }
    }

    pub fn second_phase(&self) -> Result<Option<RankingExpression>> {
        match &self.raw().second_phase {
            Some(expression) => Ok(Some(expression.clone())),
            None => self.uniquely_inherited(|p| p.second_phase(), "second-phase expression"),
        }
    }

    pub fn global_phase(&self) -> Result<Option<RankingExpression>> {
        match &self.raw().global_phase {
            Some(expression) => Ok(Some(expression.clone())),
            None => self.uniquely_inherited(|p| p.global_phase(), "global-phase expression"),
        }
    }

    pub fn functions(&self) -> Result<IndexMap<String, RankingExpressionFunction>> {
        self.merged("function", &self.raw().functions, |p| p.functions())
    }

    pub fn constants(&self) -> Result<IndexMap<Reference, Constant>> {
        self.merged("constant", &self.raw().constants, |p| p.constants())
    }

    pub fn inputs(&self) -> Result<IndexMap<Reference, Input>> {
        self.merged("input", &self.raw().inputs, |p| p.inputs())
    }

    pub fn onnx_models(&self) -> Result<IndexMap<String, OnnxModel>> {
        self.merged("onnx model", &self.raw().onnx_models, |p| p.onnx_models())
    }

    pub fn rank_settings(&self) -> Result<IndexMap<RankSettingKey, RankSetting>> {
        self.merged("rank setting", &self.raw().rank_settings, |p| p.rank_settings())
    }

    pub fn filter_fields(&self) -> Result<IndexSet<String>> {
        let mut all = IndexSet::new();
        for parent in self.inherited()? {
            all.extend(parent.filter_fields()?);
        }
        all.extend(self.raw().filter_fields.iter().cloned());
        Ok(all)
    }

    pub fn summary_features(&self) -> Result<Option<IndexSet<Reference>>> {
        let raw = self.raw();
        self.feature_set(
            &raw.summary_features,
            raw.inherited_summary_features.as_deref(),
            "summary features",
            |p| p.summary_features(),
        )
    }

    pub fn match_features(&self) -> Result<Option<IndexSet<Reference>>> {
        let raw = self.raw();
        self.feature_set(
            &raw.match_features,
            raw.inherited_match_features.as_deref(),
            "match features",
            |p| p.match_features(),
        )
    }

    pub fn rank_features(&self) -> Result<Option<IndexSet<Reference>>> {
        self.feature_set(&self.raw().rank_features, None, "rank features", |p| {
            p.rank_features()
        })
    }

    fn feature_set(
        &self,
        local: &Option<IndexSet<Reference>>,
        inherit_from: Option<&str>,
        what: &'static str,
        getter: impl Fn(&ProfileRef<'r>) -> Result<Option<IndexSet<Reference>>>,
    ) -> Result<Option<IndexSet<Reference>>> {
        if let Some(parent) = inherit_from {
            let parent = self.direct_parent(parent, what)?;
            let mut all = getter(&parent)?.unwrap_or_default();
            all.extend(local.iter().flatten().cloned());
            return Ok(Some(all));
        }
        match local {
            Some(features) => Ok(Some(features.clone())),
            None => self.uniquely_inherited(getter, what),
        }
    }

    /// Inherited properties (from at most one parent) overlaid with the
    /// local ones, replacing by name.
    pub fn rank_properties(&self) -> Result<IndexMap<String, Vec<RankProperty>>> {
        let inherited = self.uniquely_inherited(
            |p| p.rank_properties().map(|props| Some(props).filter(|p| !p.is_empty())),
            "rank properties",
        )?;
        let mut all = inherited.unwrap_or_default();
        for (name, values) in &self.raw().rank_properties {
            all.insert(name.clone(), values.clone());
        }
        Ok(all)
    }

    /// Every tuning knob with inheritance applied.
    pub fn tuning(&self) -> Result<Tuning> {
        Ok(Tuning {
            rerank_count: self.rerank_count()?,
            keep_rank_count: self.keep_rank_count()?,
            global_phase_rerank_count: self.global_phase_rerank_count()?,
            num_threads_per_search: self.num_threads_per_search()?,
            min_hits_per_thread: self.min_hits_per_thread()?,
            num_search_partitions: self.num_search_partitions()?,
            termwise_limit: self.termwise_limit()?,
            rank_score_drop_limit: self.rank_score_drop_limit()?,
            second_phase_rank_score_drop_limit: self.second_phase_rank_score_drop_limit()?,
            post_filter_threshold: self.post_filter_threshold()?,
            approximate_threshold: self.approximate_threshold()?,
            target_hits_max_adjustment_factor: self.target_hits_max_adjustment_factor()?,
            match_phase: self.match_phase()?,
            ignore_default_rank_features: self.ignore_default_rank_features()?,
            strict: self.strict()?,
        })
    }
}

macro_rules! inherited_knobs {
    ($($knob:ident: $ty:ty => $description:literal),* $(,)?) => {
        impl<'r> ProfileRef<'r> {
            $(
                pub fn $knob(&self) -> Result<Option<$ty>> {
                    match &self.raw().tuning.$knob {
                        Some(value) => Ok(Some(value.clone())),
                        None => self.uniquely_inherited(|p| p.$knob(), $description),
                    }
                }
            )*
        }
    };
}

inherited_knobs! {
    rerank_count: u32 => "rerank-count",
    keep_rank_count: u32 => "keep-rank-count",
    global_phase_rerank_count: u32 => "global-phase rerank-count",
    num_threads_per_search: u32 => "num-threads-per-search",
    min_hits_per_thread: u32 => "min-hits-per-thread",
    num_search_partitions: u32 => "num-search-partitions",
    termwise_limit: f64 => "termwise-limit",
    rank_score_drop_limit: f64 => "rank-score-drop-limit",
    second_phase_rank_score_drop_limit: f64 => "second-phase rank-score-drop-limit",
    post_filter_threshold: f64 => "post-filter-threshold",
    approximate_threshold: f64 => "approximate-threshold",
    target_hits_max_adjustment_factor: f64 => "target-hits-max-adjustment-factor",
    match_phase: MatchPhaseSettings => "match-phase",
    ignore_default_rank_features: bool => "ignore-default-rank-features",
    strict: bool => "strict",
}
