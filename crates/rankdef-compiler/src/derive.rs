//! Flattening a compiled profile into the ordered `name: value` rank
//! properties the ranking backend consumes.

use crate::Result;
use crate::config::CompilerConfig;
use crate::expr::{Expr, RankingExpression};
use crate::profile::{
    CompiledRankProfile, FIRST_PHASE, GLOBAL_PHASE, Owner, RankProperty, RankSettingKind,
    SECOND_PHASE,
};
use crate::reference::{Reference, feature_names};
use crate::resources::{DistributableResource, LargeRankingExpressions, RankingExpressionBody};

/// Rank properties of `profile`, in a stable order. Expression text longer
/// than the configured threshold is registered in `expressions` and
/// referenced by name.
pub fn derive(
    profile: &CompiledRankProfile,
    expressions: &LargeRankingExpressions,
    config: &CompilerConfig,
) -> Result<Vec<RankProperty>> {
    let mut deriver = Deriver {
        profile,
        expressions,
        threshold: config.large_expression_threshold,
        properties: Vec::new(),
    };
    deriver.phases()?;
    deriver.functions()?;
    deriver.features();
    deriver.tuning();
    deriver.field_settings();
    deriver.inputs();
    for property in profile.rank_properties() {
        deriver.push(property.name.clone(), property.value.clone());
    }
    tracing::debug!(
        profile = profile.name(),
        properties = deriver.properties.len(),
        "derived rank properties"
    );
    Ok(deriver.properties)
}

struct Deriver<'a> {
    profile: &'a CompiledRankProfile,
    expressions: &'a LargeRankingExpressions,
    threshold: usize,
    properties: Vec<RankProperty>,
}

impl Deriver<'_> {
    fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.push(RankProperty::new(name, value));
    }

    fn phases(&mut self) -> Result<()> {
        let profile = self.profile;
        let phases = [
            ("vespa.rank.firstphase", FIRST_PHASE, profile.first_phase()),
            ("vespa.rank.secondphase", SECOND_PHASE, profile.second_phase()),
            ("vespa.rank.globalphase", GLOBAL_PHASE, profile.global_phase()),
        ];
        for (property, name, phase) in phases {
            let Some(phase) = phase else {
                continue;
            };
            // A plain feature needs no expression of its own.
            if let Expr::Reference(feature) = &phase.root {
                self.push(property, self.feature_value(feature));
                continue;
            }
            self.push(property, format!("rankingExpression({name})"));
            self.expression(name, phase)?;
        }
        Ok(())
    }

    fn functions(&mut self) -> Result<()> {
        let profile = self.profile;
        for function in profile.functions().values() {
            if !function.arguments().is_empty() {
                continue;
            }
            self.expression(function.name(), &function.function.body)?;
        }
        Ok(())
    }

    fn expression(&mut self, name: &str, expression: &RankingExpression) -> Result<()> {
        let text = expression.to_string();
        if text.len() <= self.threshold {
            self.push(format!("rankingExpression({name}).rankingScript"), text);
            return Ok(());
        }
        let file_name = format!("{}.{name}.expression", self.scope());
        let bytes = text.len();
        let body = self.expressions.add(RankingExpressionBody::new(file_name, text))?;
        tracing::debug!(expression = name, bytes, "ranking expression shipped as a file");
        self.push(
            format!("rankingExpression({name}).expressionName"),
            body.name().to_owned(),
        );
        Ok(())
    }

    /// Prefix that keeps expression file names unique across owners.
    fn scope(&self) -> String {
        match self.profile.owner() {
            Owner::Schema(schema) => format!("{schema}.{}", self.profile.name()),
            Owner::Global => format!("global.{}", self.profile.name()),
        }
    }

    /// Functions are evaluated by the backend as `rankingExpression(name)`.
    fn feature_value(&self, feature: &Reference) -> String {
        if feature.is_identifier() && self.profile.functions().contains_key(feature.name()) {
            format!("rankingExpression({})", feature.name())
        } else {
            feature.to_string()
        }
    }

    fn features(&mut self) {
        let profile = self.profile;
        for feature in profile.summary_features() {
            self.push("vespa.summary.feature", self.feature_value(feature));
        }
        for feature in profile.match_features() {
            self.push("vespa.match.feature", self.feature_value(feature));
        }
        for feature in profile.rank_features() {
            self.push("vespa.dump.feature", self.feature_value(feature));
        }
        if profile.tuning().ignore_default_rank_features == Some(true) {
            self.push("vespa.dump.ignoredefaultfeatures", "true");
        }
    }

    fn tuning(&mut self) {
        let tuning = self.profile.tuning().clone();
        let counts = [
            ("vespa.hitcollector.heapsize", tuning.rerank_count),
            ("vespa.hitcollector.arraysize", tuning.keep_rank_count),
            ("vespa.globalphase.rerankcount", tuning.global_phase_rerank_count),
            ("vespa.matching.numthreadspersearch", tuning.num_threads_per_search),
            ("vespa.matching.minhitsperthread", tuning.min_hits_per_thread),
            ("vespa.matching.numsearchpartitions", tuning.num_search_partitions),
        ];
        for (name, value) in counts {
            if let Some(value) = value {
                self.push(name, value.to_string());
            }
        }
        let limits = [
            ("vespa.matching.termwise_limit", tuning.termwise_limit),
            ("vespa.hitcollector.rankscoredroplimit", tuning.rank_score_drop_limit),
            (
                "vespa.hitcollector.secondphase.rankscoredroplimit",
                tuning.second_phase_rank_score_drop_limit,
            ),
            ("vespa.matching.global_filter.upper_limit", tuning.post_filter_threshold),
            ("vespa.matching.global_filter.lower_limit", tuning.approximate_threshold),
            (
                "vespa.matching.nns.target_hits_max_adjustment_factor",
                tuning.target_hits_max_adjustment_factor,
            ),
        ];
        for (name, value) in limits {
            if let Some(value) = value {
                self.push(name, value.to_string());
            }
        }
        if let Some(match_phase) = tuning.match_phase {
            self.push("vespa.matchphase.degradation.attribute", match_phase.attribute);
            self.push(
                "vespa.matchphase.degradation.ascendingorder",
                match_phase.ascending.to_string(),
            );
            self.push(
                "vespa.matchphase.degradation.maxhits",
                match_phase.max_hits.to_string(),
            );
            self.push(
                "vespa.matchphase.degradation.maxfiltercoverage",
                match_phase.max_filter_coverage.to_string(),
            );
        }
    }

    fn field_settings(&mut self) {
        let profile = self.profile;
        for setting in profile.rank_settings() {
            let prefix = match setting.kind {
                RankSettingKind::Weight => "vespa.fieldweight",
                RankSettingKind::RankType => "vespa.rank.type",
                RankSettingKind::LiteralBoost => "vespa.literalboost",
                RankSettingKind::PreferBitVector => "vespa.prefer_bitvector",
            };
            self.push(format!("{prefix}.{}", setting.field), setting.value.clone());
        }
        for field in profile.filter_fields() {
            self.push(format!("vespa.isfilterfield.{field}"), "true");
        }
    }

    fn inputs(&mut self) {
        let profile = self.profile;
        for input in profile.inputs().values() {
            if !feature_names::is_query_feature(&input.name) {
                continue;
            }
            let Some(name) = input.name.simple_argument() else {
                continue;
            };
            self.push(format!("vespa.type.query.{name}"), input.tensor_type.to_string());
            if let Some(default) = &input.default_value {
                self.push(input.name.to_string(), default.clone());
            }
        }
    }
}
