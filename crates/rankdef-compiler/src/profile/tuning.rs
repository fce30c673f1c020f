use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric and boolean knobs of a rank profile. `None` means not set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Tuning {
    pub rerank_count: Option<u32>,
    pub keep_rank_count: Option<u32>,
    pub global_phase_rerank_count: Option<u32>,
    pub num_threads_per_search: Option<u32>,
    pub min_hits_per_thread: Option<u32>,
    pub num_search_partitions: Option<u32>,
    pub termwise_limit: Option<f64>,
    pub rank_score_drop_limit: Option<f64>,
    pub second_phase_rank_score_drop_limit: Option<f64>,
    pub post_filter_threshold: Option<f64>,
    pub approximate_threshold: Option<f64>,
    pub target_hits_max_adjustment_factor: Option<f64>,
    pub match_phase: Option<MatchPhaseSettings>,
    pub ignore_default_rank_features: Option<bool>,
    pub strict: Option<bool>,
}

/// Match-phase degradation: limit hits by an attribute's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MatchPhaseSettings {
    pub attribute: String,
    #[serde(default)]
    pub ascending: bool,
    pub max_hits: u64,
    #[serde(default = "default_max_filter_coverage")]
    pub max_filter_coverage: f64,
}

fn default_max_filter_coverage() -> f64 {
    MatchPhaseSettings::DEFAULT_MAX_FILTER_COVERAGE
}

impl MatchPhaseSettings {
    pub const DEFAULT_MAX_FILTER_COVERAGE: f64 = 0.2;

    pub fn new(attribute: impl Into<String>, max_hits: u64) -> Self {
        Self {
            attribute: attribute.into(),
            ascending: false,
            max_hits,
            max_filter_coverage: Self::DEFAULT_MAX_FILTER_COVERAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankSettingKind {
    Weight,
    RankType,
    LiteralBoost,
    #[serde(rename = "prefer-bitvector")]
    PreferBitVector,
}

impl RankSettingKind {
    pub fn name(self) -> &'static str {
        match self {
            RankSettingKind::Weight => "weight",
            RankSettingKind::RankType => "rank-type",
            RankSettingKind::LiteralBoost => "literal-boost",
            RankSettingKind::PreferBitVector => "prefer-bitvector",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "weight" => RankSettingKind::Weight,
            "rank-type" => RankSettingKind::RankType,
            "literal-boost" => RankSettingKind::LiteralBoost,
            "prefer-bitvector" => RankSettingKind::PreferBitVector,
            _ => return None,
        })
    }
}

/// A per-field setting. Identified by field and kind; the value is payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RankSetting {
    pub field: String,
    pub kind: RankSettingKind,
    pub value: String,
}

impl RankSetting {
    pub fn new(field: impl Into<String>, kind: RankSettingKind, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            value: value.into(),
        }
    }

    pub fn key(&self) -> RankSettingKey {
        RankSettingKey {
            field: self.field.clone(),
            kind: self.kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RankSettingKey {
    pub field: String,
    pub kind: RankSettingKind,
}

impl fmt::Display for RankSettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of field '{}'", self.kind.name(), self.field)
    }
}

/// Free-form `name: value` rank property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RankProperty {
    pub name: String,
    pub value: String,
}

impl RankProperty {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
