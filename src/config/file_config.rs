use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::cost::CostConfig;
use crate::evidence::FuserConfig;
use crate::matcher::MatcherConfig;
use crate::scoring::ScoringConfig;

use super::EngineConfig;

/// Optional TOML overlay. Every section is optional; whatever is present
/// replaces the corresponding defaults wholesale, section by section.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub refresh_interval_secs: Option<u64>,

    // Engine sections
    pub matcher: Option<MatcherConfig>,
    pub evidence: Option<FuserConfig>,
    pub scoring: Option<ScoringConfig>,
    pub cost: Option<CostConfig>,
    pub match_cache_entries: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Resolve the engine configuration: defaults, overridden by whatever
    /// sections the file carries.
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(matcher) = &self.matcher {
            config.matcher = matcher.clone();
        }
        if let Some(evidence) = &self.evidence {
            config.evidence = evidence.clone();
        }
        if let Some(scoring) = &self.scoring {
            config.scoring = scoring.clone();
        }
        if let Some(cost) = &self.cost {
            config.cost = cost.clone();
        }
        if let Some(entries) = self.match_cache_entries {
            config.match_cache_entries = entries;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_resolves_to_defaults() {
        let file_config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(file_config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let toml_text = r#"
            port = 4000

            [matcher]
            auto_threshold = 95.0

            [evidence]
            allow_rollup_certified = true

            [cost]
            monthly_km = 1500.0
        "#;
        let file_config: FileConfig = toml::from_str(toml_text).unwrap();
        assert_eq!(file_config.port, Some(4000));

        let engine = file_config.engine_config();
        assert_eq!(engine.matcher.auto_threshold, 95.0);
        // Unspecified matcher fields fall back to their serde defaults
        assert_eq!(engine.matcher.probable_threshold, 85.0);
        assert!(engine.evidence.allow_rollup_certified);
        assert_eq!(engine.cost.monthly_km, 1500.0);
        assert_eq!(engine.scoring, ScoringConfig::default());
    }

    #[test]
    fn load_reads_toml_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[matcher]\nambiguity_epsilon = 2.5\n").unwrap();
        let file_config = FileConfig::load(file.path()).unwrap();
        assert_eq!(file_config.engine_config().matcher.ambiguity_epsilon, 2.5);
    }
}
