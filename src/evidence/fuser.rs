//! Evidence fusion.
//!
//! Aggregates the records keyed to a variant into one `EvidenceBundle`:
//! per-dimension scores (observations are averaged within a source before
//! sources are combined, a chatty source cannot dominate), a confidence
//! tier driven by distinct-source count, freshness and category diversity,
//! and the aggregated failure/highlight texts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::reference::CanonicalVariant;

use super::{
    ConfidenceTier, Dimension, DimensionScore, EvidenceBundle, EvidenceRecord, EvidenceStore,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FuserConfig {
    /// A record older than this no longer counts as fresh.
    pub staleness_days: i64,
    /// Whether rolled-up (brand, model, generation) evidence may reach the
    /// Certified tier. Default: capped at Verified.
    pub allow_rollup_certified: bool,
    /// Maximum number of aggregated strengths/weaknesses kept.
    pub max_highlights: usize,
}

impl Default for FuserConfig {
    fn default() -> Self {
        FuserConfig { staleness_days: 365, allow_rollup_certified: false, max_highlights: 5 }
    }
}

pub struct Fuser {
    config: FuserConfig,
}

impl Fuser {
    pub fn new(config: FuserConfig) -> Self {
        Fuser { config }
    }

    pub fn fuse(&self, variant: &CanonicalVariant, store: &EvidenceStore) -> EvidenceBundle {
        self.fuse_at(variant, store, Utc::now())
    }

    /// Fusion with an explicit clock, the freshness window depends on it.
    pub fn fuse_at(
        &self,
        variant: &CanonicalVariant,
        store: &EvidenceStore,
        now: DateTime<Utc>,
    ) -> EvidenceBundle {
        let (records, rolled_up) = store.records_for(&variant.key, &variant.rollup_key());
        if records.is_empty() {
            return EvidenceBundle::empty(&variant.key, now);
        }

        let freshness_floor = now - Duration::days(self.config.staleness_days);
        let sources: HashSet<&str> = records.iter().map(|r| r.source.as_str()).collect();
        let categories: HashSet<_> = records.iter().map(|r| r.category).collect();
        let any_fresh = records.iter().any(|r| r.observed_at >= freshness_floor);

        let mut tier = compute_tier(sources.len(), categories.len(), any_fresh);
        if rolled_up && !self.config.allow_rollup_certified {
            tier = tier.min(ConfidenceTier::Verified);
        }

        let mut scores = BTreeMap::new();
        for dimension in Dimension::ALL {
            if let Some(score) = aggregate_dimension(records, dimension) {
                scores.insert(dimension, score);
            }
        }

        EvidenceBundle {
            variant_key: variant.key.clone(),
            rolled_up,
            computed_at: now,
            tier,
            source_count: sources.len(),
            scores,
            known_failures: dedup_verbatim(records.iter().flat_map(|r| &r.known_failures)),
            strengths: top_phrases(
                records.iter().flat_map(|r| &r.strengths),
                self.config.max_highlights,
            ),
            weaknesses: top_phrases(
                records.iter().flat_map(|r| &r.weaknesses),
                self.config.max_highlights,
            ),
        }
    }
}

/// Tier from (distinct sources, distinct categories, freshness). The rules
/// are monotonic in source count: another source can only move the tier up.
fn compute_tier(source_count: usize, category_count: usize, any_fresh: bool) -> ConfidenceTier {
    if source_count == 0 {
        ConfidenceTier::Unknown
    } else if source_count == 1 || !any_fresh {
        ConfidenceTier::Estimated
    } else if source_count >= 3 && category_count >= 2 {
        ConfidenceTier::Certified
    } else {
        ConfidenceTier::Verified
    }
}

/// Mean of per-source means, weighted by each source's declared
/// reliability weight (1.0 when absent).
fn aggregate_dimension(records: &[EvidenceRecord], dimension: Dimension) -> Option<DimensionScore> {
    struct SourceAccumulator {
        score_sum: f64,
        weight_sum: f64,
        count: usize,
    }

    let mut per_source: HashMap<&str, SourceAccumulator> = HashMap::new();
    for record in records {
        if let Some(value) = record.scores.get(&dimension) {
            let acc = per_source.entry(record.source.as_str()).or_insert(SourceAccumulator {
                score_sum: 0.0,
                weight_sum: 0.0,
                count: 0,
            });
            acc.score_sum += value;
            acc.weight_sum += record.weight.unwrap_or(1.0);
            acc.count += 1;
        }
    }
    if per_source.is_empty() {
        return None;
    }

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for acc in per_source.values() {
        let source_mean = acc.score_sum / acc.count as f64;
        let source_weight = acc.weight_sum / acc.count as f64;
        weighted_sum += source_mean * source_weight;
        weight_total += source_weight;
    }

    Some(DimensionScore {
        score: weighted_sum / weight_total,
        source_count: per_source.len(),
    })
}

fn dedup_verbatim<'a>(texts: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for text in texts {
        if seen.insert(text.as_str()) {
            out.push(text.clone());
        }
    }
    out
}

/// Most frequently repeated phrases first, ties by first appearance.
fn top_phrases<'a>(texts: impl Iterator<Item = &'a String>, max: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut order = 0usize;
    for text in texts {
        let key = text.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let entry = counts.entry(key).or_insert_with(|| {
            order += 1;
            (0, order)
        });
        entry.0 += 1;
    }
    let mut ranked: Vec<(String, usize, usize)> =
        counts.into_iter().map(|(text, (count, first))| (text, count, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(max).map(|(text, _, _)| text).collect()
}
