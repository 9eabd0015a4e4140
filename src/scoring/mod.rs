//! Global score and verdict band.
//!
//! The 0-10 fused dimension scores combine into a 0-20 global score with
//! configurable weights; the verdict is a step function of the global
//! score with a reliability veto on the top band.

use serde::{Deserialize, Serialize};

use crate::evidence::{Dimension, EvidenceBundle};

/// Dimension weights for the global score. A configuration object by
/// design, these get recalibrated against observed outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub reliability: f64,
    pub comfort: f64,
    pub budget: f64,
    pub safety: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights { reliability: 0.40, comfort: 0.20, budget: 0.25, safety: 0.15 }
    }
}

impl ScoreWeights {
    fn weight(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Reliability => self.reliability,
            Dimension::Comfort => self.comfort,
            Dimension::Budget => self.budget,
            Dimension::Safety => self.safety,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictConfig {
    /// Global score floor (0-20) for the Excellent band.
    pub excellent_floor: f64,
    /// Reliability sub-score floor (0-10) the Excellent band also needs:
    /// unreliability is a veto, not one input among many.
    pub excellent_reliability_floor: f64,
    pub good_floor: f64,
    pub average_floor: f64,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        VerdictConfig {
            excellent_floor: 16.0,
            excellent_reliability_floor: 7.0,
            good_floor: 13.0,
            average_floor: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    pub verdict: VerdictConfig,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictBand {
    Excellent,
    Good,
    Average,
    Caution,
    /// No scored evidence at all; the record still renders, honestly.
    Unrated,
}

impl VerdictBand {
    pub fn text(&self) -> &'static str {
        match self {
            VerdictBand::Excellent => "Excellent pick in its class",
            VerdictBand::Good => "A solid, recommendable choice",
            VerdictBand::Average => "Decent, but better alternatives exist",
            VerdictBand::Caution => "Approach with caution",
            VerdictBand::Unrated => "Not enough data to rate this vehicle",
        }
    }
}

/// Weighted 0-20 global score over the dimensions present in the bundle.
/// Missing dimensions renormalize the weight mass instead of dragging the
/// score down as zeros. `None` when nothing is scored.
pub fn global_score(bundle: &EvidenceBundle, weights: &ScoreWeights) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for dimension in Dimension::ALL {
        if let Some(score) = bundle.score(dimension) {
            let weight = weights.weight(dimension);
            weighted_sum += score * weight;
            weight_total += weight;
        }
    }
    if weight_total <= 0.0 {
        return None;
    }
    Some(((weighted_sum / weight_total) * 2.0).clamp(0.0, 20.0))
}

/// Deterministic band from (global score, reliability sub-score). A high
/// global score cannot buy Excellent past a weak reliability figure.
pub fn verdict(
    global: Option<f64>,
    reliability: Option<f64>,
    config: &VerdictConfig,
) -> VerdictBand {
    let Some(global) = global else {
        return VerdictBand::Unrated;
    };
    if global >= config.excellent_floor
        && reliability.is_some_and(|r| r >= config.excellent_reliability_floor)
    {
        VerdictBand::Excellent
    } else if global >= config.good_floor {
        VerdictBand::Good
    } else if global >= config.average_floor {
        VerdictBand::Average
    } else {
        VerdictBand::Caution
    }
}

/// Pros/cons for display: the aggregated evidence phrases first, then
/// statements derived from dimension thresholds.
pub fn select_highlights(bundle: &EvidenceBundle) -> (Vec<String>, Vec<String>) {
    let mut pros = bundle.strengths.clone();
    let mut cons = bundle.weaknesses.clone();

    let mut derive = |dimension: Dimension, strong: &str, weak: &str| {
        match bundle.score(dimension) {
            Some(score) if score >= 7.0 => pros.push(strong.to_string()),
            Some(score) if score < 5.0 => cons.push(weak.to_string()),
            _ => {}
        }
    };
    derive(Dimension::Reliability, "Proven reliability", "Reliability below par");
    derive(Dimension::Budget, "Low running costs", "High running costs");
    derive(Dimension::Comfort, "Comfortable ride", "Comfort falls short");
    derive(Dimension::Safety, "Strong safety record", "Dated safety level");

    (pros, cons)
}
