//! Two-stage listing-to-variant resolution.
//!
//! Stage A ("blocking") restricts the reference index to the listing's
//! brand partition and, when a model token is present, to candidates whose
//! model matches it. Stage B re-ranks the survivors with a token-set
//! similarity plus agreement bonuses and a fuel-mismatch penalty, then maps
//! the top scores onto an explicit decision band.

mod cache;
mod levenshtein;
mod similarity;

pub use cache::{CacheStats, MatchCache};
pub use levenshtein::levenshtein_distance;
pub use similarity::token_set_ratio;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::listing::NormalizedListing;
use crate::reference::{CanonicalVariant, ReferenceIndex};

/// Why stage A produced nothing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchReason {
    BrandUnresolved,
    NoCandidates,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBand {
    Auto,
    Probable,
}

/// A candidate with its score and the agreement flags the re-ranking saw.
/// The flags ride along so a `Probable` match can be displayed or manually
/// confirmed downstream.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub variant: Arc<CanonicalVariant>,
    pub score: f64,
    pub similarity: f64,
    pub power_agreement: Option<bool>,
    pub fuel_agreement: Option<bool>,
    pub year_in_window: Option<bool>,
}

/// Outcome of a resolution. Every consumption site matches exhaustively,
/// "no match" and "matched with a low score" are different variants on
/// purpose.
#[derive(Debug, Clone)]
pub enum MatchResult {
    NoMatch { reason: NoMatchReason },
    Rejected { best: ScoredCandidate },
    Ambiguous { candidates: Vec<ScoredCandidate> },
    Resolved { candidate: ScoredCandidate, band: DecisionBand },
}

impl MatchResult {
    /// Stable label for metrics and logs.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            MatchResult::NoMatch { reason: NoMatchReason::BrandUnresolved } => "brand_unresolved",
            MatchResult::NoMatch { reason: NoMatchReason::NoCandidates } => "no_candidates",
            MatchResult::Rejected { .. } => "rejected",
            MatchResult::Ambiguous { .. } => "ambiguous",
            MatchResult::Resolved { band: DecisionBand::Auto, .. } => "auto",
            MatchResult::Resolved { band: DecisionBand::Probable, .. } => "probable",
        }
    }

    pub fn resolved_variant(&self) -> Option<&Arc<CanonicalVariant>> {
        match self {
            MatchResult::Resolved { candidate, .. } => Some(&candidate.variant),
            _ => None,
        }
    }
}

/// All matcher tunables. Documented configuration, not embedded constants;
/// the similarity scale is 0-100 and agreement bonuses can push a score
/// slightly above 100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatcherConfig {
    /// Score at or above which a match is accepted automatically.
    pub auto_threshold: f64,
    /// Score at or above which a match is probable (manual confirmation
    /// territory); below it the candidate is rejected.
    pub probable_threshold: f64,
    /// When the two best scores are closer than this, the result is
    /// ambiguous rather than an arbitrary pick.
    pub ambiguity_epsilon: f64,
    /// Tolerance on the DIN-hp comparison for the power-agreement bonus.
    pub power_tolerance_hp: f64,
    pub power_agreement_bonus: f64,
    pub fuel_agreement_bonus: f64,
    /// Different fuel implies a different engine family, this is large
    /// enough to keep any fuel-mismatched candidate out of the auto band.
    pub fuel_mismatch_penalty: f64,
    /// Listing year falling inside the candidate's generation window.
    pub year_window_bonus: f64,
    /// Maximum edit distance for the model-token blocking test.
    pub model_edit_distance: usize,
    /// Upper bound on candidates entering stage B.
    pub max_rerank_candidates: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            auto_threshold: 92.0,
            probable_threshold: 85.0,
            ambiguity_epsilon: 1.0,
            power_tolerance_hp: 5.0,
            power_agreement_bonus: 4.0,
            fuel_agreement_bonus: 3.0,
            fuel_mismatch_penalty: 30.0,
            year_window_bonus: 2.0,
            model_edit_distance: 2,
            max_rerank_candidates: 500,
        }
    }
}

pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    pub fn new(config: MatcherConfig) -> Self {
        Matcher { config }
    }

    /// Resolve a normalized listing against a reference snapshot.
    pub fn resolve(&self, listing: &NormalizedListing, index: &ReferenceIndex) -> MatchResult {
        // Stage A: blocking.
        let Some(brand) = listing.brand.as_deref() else {
            return MatchResult::NoMatch { reason: NoMatchReason::BrandUnresolved };
        };
        let partition = index.brand_partition(brand);
        if partition.is_empty() {
            return MatchResult::NoMatch { reason: NoMatchReason::NoCandidates };
        }

        let mut blocked: Vec<&Arc<CanonicalVariant>> = match listing.model.as_deref() {
            Some(model) => partition
                .iter()
                .filter(|v| self.model_matches(&v.model, model))
                .collect(),
            None => partition.iter().collect(),
        };
        if blocked.is_empty() {
            return MatchResult::NoMatch { reason: NoMatchReason::NoCandidates };
        }
        if blocked.len() > self.config.max_rerank_candidates {
            warn!(
                "Blocking left {} candidates for brand '{}', truncating to {}",
                blocked.len(),
                brand,
                self.config.max_rerank_candidates
            );
            blocked.truncate(self.config.max_rerank_candidates);
        }

        // Stage B: re-ranking.
        let listing_text = listing_comparison_text(listing);
        let mut scored: Vec<ScoredCandidate> = blocked
            .into_iter()
            .map(|variant| self.score_candidate(listing, &listing_text, variant))
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.variant.key.cmp(&b.variant.key))
        });

        self.decide(scored)
    }

    fn model_matches(&self, candidate_model: &str, listing_model: &str) -> bool {
        candidate_model.contains(listing_model)
            || listing_model.contains(candidate_model)
            || levenshtein_distance(candidate_model, listing_model)
                <= self.config.model_edit_distance
    }

    fn score_candidate(
        &self,
        listing: &NormalizedListing,
        listing_text: &str,
        variant: &Arc<CanonicalVariant>,
    ) -> ScoredCandidate {
        let similarity = token_set_ratio(listing_text, &variant.comparison_text());
        let mut score = similarity;

        let power_agreement = listing
            .power
            .map(|p| (variant.max_power_hp() - p.as_din_hp()).abs() <= self.config.power_tolerance_hp);
        if power_agreement == Some(true) {
            score += self.config.power_agreement_bonus;
        }

        let fuel_agreement = listing.fuel.map(|fuel| fuel == variant.fuel);
        match fuel_agreement {
            Some(true) => score += self.config.fuel_agreement_bonus,
            Some(false) => score -= self.config.fuel_mismatch_penalty,
            None => {}
        }

        let year_in_window = listing.year.map(|year| variant.window.contains(year));
        if year_in_window == Some(true) {
            score += self.config.year_window_bonus;
        }

        ScoredCandidate {
            variant: variant.clone(),
            score: score.max(0.0),
            similarity,
            power_agreement,
            fuel_agreement,
            year_in_window,
        }
    }

    fn decide(&self, scored: Vec<ScoredCandidate>) -> MatchResult {
        let mut iter = scored.into_iter();
        let best = match iter.next() {
            Some(best) => best,
            None => return MatchResult::NoMatch { reason: NoMatchReason::NoCandidates },
        };

        if best.score < self.config.probable_threshold {
            return MatchResult::Rejected { best };
        }

        let near: Vec<ScoredCandidate> = iter
            .take_while(|c| best.score - c.score < self.config.ambiguity_epsilon)
            .collect();
        if !near.is_empty() {
            let mut candidates = Vec::with_capacity(near.len() + 1);
            candidates.push(best);
            candidates.extend(near);
            return MatchResult::Ambiguous { candidates };
        }

        let band = if best.score >= self.config.auto_threshold {
            DecisionBand::Auto
        } else {
            DecisionBand::Probable
        };
        MatchResult::Resolved { candidate: best, band }
    }
}

/// The listing side of the comparison: declared brand and model joined with
/// the normalized free text. Token-set scoring dedups the repetitions.
fn listing_comparison_text(listing: &NormalizedListing) -> String {
    let mut text = String::new();
    if let Some(brand) = listing.brand.as_deref() {
        text.push_str(brand);
        text.push(' ');
    }
    if let Some(model) = listing.model.as_deref() {
        text.push_str(model);
        text.push(' ');
    }
    text.push_str(&listing.text);
    text
}
