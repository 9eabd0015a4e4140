//! The enrichment pipeline and its terminal record.
//!
//! `Enricher` wires Normalizer -> Matcher -> Evidence Fuser -> Cost Model
//! -> Scoring into one request-scoped pass. It is stateless between
//! requests apart from the read-only snapshot handles and the optional
//! match cache, so independent listings can be enriched concurrently with
//! no coordination.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::cost::{CostBreakdown, CostError, CostModel, FuelPriceFeed};
use crate::evidence::{ConfidenceTier, Dimension, EvidenceBundle, Fuser, SharedEvidence};
use crate::listing::{normalize, ListingInput};
use crate::matcher::{
    CacheStats, DecisionBand, MatchCache, MatchResult, Matcher, NoMatchReason, ScoredCandidate,
};
use crate::reference::{CanonicalVariant, SnapshotStore};
use crate::scoring::{global_score, select_highlights, verdict, ScoringConfig, VerdictBand};

/// Matching and fusion failures degrade the record; only a missing cost
/// input aborts the request.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Cost(#[from] CostError),
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub key: String,
    pub brand: String,
    pub model: String,
    pub label: String,
    pub score: f64,
}

impl From<&ScoredCandidate> for CandidateSummary {
    fn from(candidate: &ScoredCandidate) -> Self {
        CandidateSummary {
            key: candidate.variant.key.clone(),
            brand: candidate.variant.brand.clone(),
            model: candidate.variant.model.clone(),
            label: candidate.variant.label.clone(),
            score: candidate.score,
        }
    }
}

/// Serializable projection of a `MatchResult`. Field names are part of the
/// output contract and stay stable across matcher revisions.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchSummary {
    NoMatch {
        reason: NoMatchReason,
    },
    Rejected {
        best: CandidateSummary,
    },
    Ambiguous {
        candidates: Vec<CandidateSummary>,
    },
    Resolved {
        variant: CanonicalVariant,
        band: DecisionBand,
        score: f64,
        similarity: f64,
        power_agreement: Option<bool>,
        fuel_agreement: Option<bool>,
        year_in_window: Option<bool>,
    },
}

impl MatchSummary {
    /// Stable label for metrics, mirrors `MatchResult::outcome_label`.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            MatchSummary::NoMatch { reason: NoMatchReason::BrandUnresolved } => "brand_unresolved",
            MatchSummary::NoMatch { reason: NoMatchReason::NoCandidates } => "no_candidates",
            MatchSummary::Rejected { .. } => "rejected",
            MatchSummary::Ambiguous { .. } => "ambiguous",
            MatchSummary::Resolved { band: DecisionBand::Auto, .. } => "auto",
            MatchSummary::Resolved { band: DecisionBand::Probable, .. } => "probable",
        }
    }

    fn from_result(result: &MatchResult) -> Self {
        match result {
            MatchResult::NoMatch { reason } => MatchSummary::NoMatch { reason: *reason },
            MatchResult::Rejected { best } => MatchSummary::Rejected { best: best.into() },
            MatchResult::Ambiguous { candidates } => MatchSummary::Ambiguous {
                candidates: candidates.iter().map(CandidateSummary::from).collect(),
            },
            MatchResult::Resolved { candidate, band } => MatchSummary::Resolved {
                variant: (*candidate.variant).clone(),
                band: *band,
                score: candidate.score,
                similarity: candidate.similarity,
                power_agreement: candidate.power_agreement,
                fuel_agreement: candidate.fuel_agreement,
                year_in_window: candidate.year_in_window,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvidenceSummary {
    pub tier: ConfidenceTier,
    pub source_count: usize,
    pub rolled_up: bool,
}

/// The terminal output of the core: everything the display layer renders.
/// Created fresh per request, immutable once returned.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentRecord {
    #[serde(rename = "match")]
    pub match_summary: MatchSummary,
    /// Provenance-aware confidence badge: the evidence tier, capped by how
    /// certain the linkage itself is.
    pub confidence: ConfidenceTier,
    pub evidence: Option<EvidenceSummary>,
    /// Per-dimension gauges, 0-10.
    pub dimension_scores: BTreeMap<Dimension, f64>,
    /// Global score, 0-20.
    pub global_score: Option<f64>,
    pub verdict: VerdictBand,
    pub verdict_text: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub known_failures: Vec<String>,
    pub monthly_cost: Option<CostBreakdown>,
    pub generated_at: DateTime<Utc>,
}

pub struct Enricher {
    matcher: Matcher,
    fuser: Fuser,
    cost_model: CostModel,
    scoring: ScoringConfig,
    cache: MatchCache,
    snapshots: Arc<SnapshotStore>,
    evidence: Arc<SharedEvidence>,
    prices: Arc<FuelPriceFeed>,
}

impl Enricher {
    pub fn new(
        config: EngineConfig,
        snapshots: Arc<SnapshotStore>,
        evidence: Arc<SharedEvidence>,
        prices: Arc<FuelPriceFeed>,
    ) -> Self {
        Enricher {
            matcher: Matcher::new(config.matcher),
            fuser: Fuser::new(config.evidence),
            cost_model: CostModel::new(config.cost),
            scoring: config.scoring,
            cache: MatchCache::new(config.match_cache_entries),
            snapshots,
            evidence,
            prices,
        }
    }

    /// Enrich one listing against the current snapshots.
    pub fn enrich(&self, input: &ListingInput) -> Result<EnrichmentRecord, EnrichError> {
        let listing = normalize(input);
        let snapshot = self.snapshots.current();

        let cache_key = listing.cache_key();
        let match_result = match self.cache.get(&cache_key, snapshot.version) {
            Some(cached) => cached,
            None => {
                let resolved = self.matcher.resolve(&listing, &snapshot.index);
                self.cache.put(cache_key, snapshot.version, resolved.clone());
                resolved
            }
        };

        let record = match match_result.resolved_variant().cloned() {
            Some(variant) => self.enrich_resolved(&match_result, &variant)?,
            None => degraded_record(&match_result),
        };
        Ok(record)
    }

    fn enrich_resolved(
        &self,
        match_result: &MatchResult,
        variant: &Arc<CanonicalVariant>,
    ) -> Result<EnrichmentRecord, EnrichError> {
        let bundle = self.fuser.fuse(variant, &self.evidence.current());
        let monthly_cost = self.cost_model.monthly_cost(variant, &self.prices.current())?;

        let global = global_score(&bundle, &self.scoring.weights);
        let band = verdict(global, bundle.score(Dimension::Reliability), &self.scoring.verdict);
        let (pros, cons) = select_highlights(&bundle);

        let confidence = bundle.tier.min(linkage_cap(match_result));

        Ok(EnrichmentRecord {
            match_summary: MatchSummary::from_result(match_result),
            confidence,
            evidence: Some(EvidenceSummary {
                tier: bundle.tier,
                source_count: bundle.source_count,
                rolled_up: bundle.rolled_up,
            }),
            dimension_scores: dimension_scores(&bundle),
            global_score: global,
            verdict: band,
            verdict_text: band.text().to_string(),
            pros,
            cons,
            known_failures: bundle.known_failures.clone(),
            monthly_cost: Some(monthly_cost),
            generated_at: bundle.computed_at,
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// No confident variant: the record still renders, with an honestly low
/// confidence badge and no figures that could be mistaken for real ones.
fn degraded_record(match_result: &MatchResult) -> EnrichmentRecord {
    EnrichmentRecord {
        match_summary: MatchSummary::from_result(match_result),
        confidence: ConfidenceTier::Unknown,
        evidence: None,
        dimension_scores: BTreeMap::new(),
        global_score: None,
        verdict: VerdictBand::Unrated,
        verdict_text: VerdictBand::Unrated.text().to_string(),
        pros: Vec::new(),
        cons: Vec::new(),
        known_failures: Vec::new(),
        monthly_cost: None,
        generated_at: Utc::now(),
    }
}

/// How much the badge may claim given the linkage certainty: an automatic
/// match does not cap the tier, a probable one caps it at Verified.
fn linkage_cap(match_result: &MatchResult) -> ConfidenceTier {
    match match_result {
        MatchResult::Resolved { band: DecisionBand::Auto, .. } => ConfidenceTier::Certified,
        MatchResult::Resolved { band: DecisionBand::Probable, .. } => ConfidenceTier::Verified,
        _ => ConfidenceTier::Estimated,
    }
}

fn dimension_scores(bundle: &EvidenceBundle) -> BTreeMap<Dimension, f64> {
    bundle.scores.iter().map(|(dimension, s)| (*dimension, s.score)).collect()
}
