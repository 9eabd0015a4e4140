//! Engine configuration.
//!
//! `EngineConfig` is the resolved set of tunables the pipeline runs with;
//! `FileConfig` is the optional TOML overlay. Every threshold, weight and
//! coefficient the components use lives here, none of them are embedded
//! constants.

mod file_config;

pub use file_config::FileConfig;

use serde::{Deserialize, Serialize};

use crate::cost::CostConfig;
use crate::evidence::FuserConfig;
use crate::matcher::MatcherConfig;
use crate::scoring::ScoringConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub matcher: MatcherConfig,
    pub evidence: FuserConfig,
    pub scoring: ScoringConfig,
    pub cost: CostConfig,
    /// Upper bound on the resolved-match cache.
    pub match_cache_entries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            matcher: MatcherConfig::default(),
            evidence: FuserConfig::default(),
            scoring: ScoringConfig::default(),
            cost: CostConfig::default(),
            match_cache_entries: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_documented_calibration() {
        let config = EngineConfig::default();
        assert_eq!(config.matcher.auto_threshold, 92.0);
        assert_eq!(config.matcher.probable_threshold, 85.0);
        assert_eq!(config.matcher.ambiguity_epsilon, 1.0);
        assert_eq!(config.evidence.staleness_days, 365);
        assert!(!config.evidence.allow_rollup_certified);
        assert_eq!(config.scoring.verdict.excellent_floor, 16.0);
        assert_eq!(config.cost.monthly_km, 1000.0);
    }
}
