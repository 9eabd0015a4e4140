//! Secondary-source evidence: ingest model, store and fuser.

mod fuser;
mod store;

pub use fuser::{Fuser, FuserConfig};
pub use store::{load_evidence, EvidenceProblem, EvidenceStore, SharedEvidence};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The four scored dimensions. Every source sub-score is normalized to
/// 0-10 by the (out-of-scope) ingestion collaborator before it gets here.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Reliability,
    Comfort,
    Budget,
    Safety,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Reliability,
        Dimension::Comfort,
        Dimension::Budget,
        Dimension::Safety,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Reliability => "reliability",
            Dimension::Comfort => "comfort",
            Dimension::Budget => "budget",
            Dimension::Safety => "safety",
        }
    }
}

/// Broad provenance class of a source, used for the Certified diversity
/// requirement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    /// Technical press, workshop statistics.
    Technical,
    /// Owner reviews, sentiment aggregates.
    UserSentiment,
    /// Recall and defect registers.
    Official,
}

/// Confidence tier of a fused bundle. The derive order is the tier order,
/// adding evidence can only move rightwards.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Unknown,
    Estimated,
    Verified,
    Certified,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::Unknown => "unknown",
            ConfidenceTier::Estimated => "estimated",
            ConfidenceTier::Verified => "verified",
            ConfidenceTier::Certified => "certified",
        }
    }
}

/// One normalized observation from one source, keyed to a variant or to a
/// (brand, model, generation) rollup key. Append-only and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub source: String,
    pub category: SourceCategory,
    #[serde(default)]
    pub variant_key: Option<String>,
    #[serde(default)]
    pub rollup_key: Option<String>,
    pub observed_at: DateTime<Utc>,
    /// Optional explicit reliability weight; absent means 1.0.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub scores: HashMap<Dimension, f64>,
    #[serde(default)]
    pub known_failures: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

/// Aggregated score for one dimension.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DimensionScore {
    pub score: f64,
    pub source_count: usize,
}

/// The fused view of everything known about one variant, computed fresh
/// per request and immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceBundle {
    pub variant_key: String,
    /// True when the bundle was aggregated at (brand, model, generation)
    /// level because no variant-level evidence exists.
    pub rolled_up: bool,
    pub computed_at: DateTime<Utc>,
    pub tier: ConfidenceTier,
    pub source_count: usize,
    pub scores: BTreeMap<Dimension, DimensionScore>,
    pub known_failures: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

impl EvidenceBundle {
    pub fn empty(variant_key: &str, computed_at: DateTime<Utc>) -> Self {
        EvidenceBundle {
            variant_key: variant_key.to_string(),
            rolled_up: false,
            computed_at,
            tier: ConfidenceTier::Unknown,
            source_count: 0,
            scores: BTreeMap::new(),
            known_failures: Vec::new(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
        }
    }

    pub fn score(&self, dimension: Dimension) -> Option<f64> {
        self.scores.get(&dimension).map(|s| s.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_order_is_the_variant_order() {
        assert!(ConfidenceTier::Unknown < ConfidenceTier::Estimated);
        assert!(ConfidenceTier::Estimated < ConfidenceTier::Verified);
        assert!(ConfidenceTier::Verified < ConfidenceTier::Certified);
    }
}
