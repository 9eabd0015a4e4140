//! Evidence record storage and loading.
//!
//! Records arrive already normalized from the ingestion collaborator and
//! are kept append-only in memory, keyed by variant with a
//! (brand, model, generation) rollup fallback. A refresh builds a whole
//! new store and swaps the shared handle.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use super::EvidenceRecord;

#[derive(Debug)]
pub enum EvidenceProblem {
    /// Record carries neither a variant key nor a rollup key.
    Unkeyed { source: String },
    /// A sub-score fell outside the 0-10 contract and was clamped.
    ScoreOutOfRange { source: String, value: f64 },
}

pub struct EvidenceStore {
    by_variant: HashMap<String, Vec<EvidenceRecord>>,
    by_rollup: HashMap<String, Vec<EvidenceRecord>>,
    records: usize,
}

impl EvidenceStore {
    pub fn build(records: Vec<EvidenceRecord>) -> (Self, Vec<EvidenceProblem>) {
        let mut problems = Vec::new();
        let mut by_variant: HashMap<String, Vec<EvidenceRecord>> = HashMap::new();
        let mut by_rollup: HashMap<String, Vec<EvidenceRecord>> = HashMap::new();
        let mut kept = 0usize;

        for mut record in records {
            for value in record.scores.values_mut() {
                if !(0.0..=10.0).contains(value) {
                    problems.push(EvidenceProblem::ScoreOutOfRange {
                        source: record.source.clone(),
                        value: *value,
                    });
                    *value = value.clamp(0.0, 10.0);
                }
            }
            match (&record.variant_key, &record.rollup_key) {
                (Some(key), _) => {
                    by_variant.entry(key.clone()).or_default().push(record);
                    kept += 1;
                }
                (None, Some(key)) => {
                    by_rollup.entry(key.clone()).or_default().push(record);
                    kept += 1;
                }
                (None, None) => {
                    problems.push(EvidenceProblem::Unkeyed { source: record.source });
                }
            }
        }

        (EvidenceStore { by_variant, by_rollup, records: kept }, problems)
    }

    pub fn empty() -> Self {
        EvidenceStore { by_variant: HashMap::new(), by_rollup: HashMap::new(), records: 0 }
    }

    /// Records for a variant: the variant-level set when it exists,
    /// otherwise the rollup set. The flag says which one was used.
    pub fn records_for(&self, variant_key: &str, rollup_key: &str) -> (&[EvidenceRecord], bool) {
        if let Some(records) = self.by_variant.get(variant_key) {
            if !records.is_empty() {
                return (records.as_slice(), false);
            }
        }
        match self.by_rollup.get(rollup_key) {
            Some(records) => (records.as_slice(), true),
            None => (&[], false),
        }
    }

    pub fn records_count(&self) -> usize {
        self.records
    }
}

/// Swappable shared handle, same discipline as the reference snapshot:
/// requests clone the `Arc`, refresh replaces the pointer.
pub struct SharedEvidence {
    inner: RwLock<Arc<EvidenceStore>>,
}

impl SharedEvidence {
    pub fn new(store: EvidenceStore) -> Self {
        SharedEvidence { inner: RwLock::new(Arc::new(store)) }
    }

    pub fn current(&self) -> Arc<EvidenceStore> {
        self.inner.read().expect("evidence lock poisoned").clone()
    }

    pub fn replace(&self, store: EvidenceStore) {
        *self.inner.write().expect("evidence lock poisoned") = Arc::new(store);
    }
}

pub fn load_evidence<P: AsRef<Path>>(path: P) -> Result<(EvidenceStore, Vec<EvidenceProblem>)> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read evidence dataset: {:?}", path))?;
    let records: Vec<EvidenceRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse evidence dataset: {:?}", path))?;

    let (store, problems) = EvidenceStore::build(records);
    if !problems.is_empty() {
        warn!("Found {} problems in evidence dataset:", problems.len());
        for problem in problems.iter() {
            warn!("- {:?}", problem);
        }
    }
    info!("Evidence dataset loaded: {} records", store.records_count());
    Ok((store, problems))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{Dimension, SourceCategory};
    use chrono::Utc;
    use std::collections::HashMap;

    fn record(source: &str, variant_key: Option<&str>, rollup_key: Option<&str>) -> EvidenceRecord {
        EvidenceRecord {
            source: source.to_string(),
            category: SourceCategory::Technical,
            variant_key: variant_key.map(str::to_string),
            rollup_key: rollup_key.map(str::to_string),
            observed_at: Utc::now(),
            weight: None,
            scores: HashMap::from([(Dimension::Reliability, 7.0)]),
            known_failures: Vec::new(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
        }
    }

    #[test]
    fn variant_level_shadows_rollup() {
        let (store, problems) = EvidenceStore::build(vec![
            record("caradisiac", Some("v1"), None),
            record("fiches-auto", None, Some("renault|clio|4")),
        ]);
        assert!(problems.is_empty());

        let (records, rolled_up) = store.records_for("v1", "renault|clio|4");
        assert_eq!(records.len(), 1);
        assert!(!rolled_up);

        let (records, rolled_up) = store.records_for("v2", "renault|clio|4");
        assert_eq!(records.len(), 1);
        assert!(rolled_up);

        let (records, _) = store.records_for("v3", "peugeot|208|2");
        assert!(records.is_empty());
    }

    #[test]
    fn unkeyed_and_out_of_range_are_flagged() {
        let mut bad_score = record("autoplus", Some("v1"), None);
        bad_score.scores.insert(Dimension::Comfort, 14.0);
        let (store, problems) = EvidenceStore::build(vec![
            bad_score,
            record("orphan", None, None),
        ]);
        assert_eq!(store.records_count(), 1);
        assert!(problems
            .iter()
            .any(|p| matches!(p, EvidenceProblem::Unkeyed { source } if source == "orphan")));
        assert!(problems
            .iter()
            .any(|p| matches!(p, EvidenceProblem::ScoreOutOfRange { value, .. } if *value == 14.0)));

        let (records, _) = store.records_for("v1", "");
        assert_eq!(records[0].scores[&Dimension::Comfort], 10.0);
    }

    #[test]
    fn shared_handle_swaps_atomically() {
        let shared = SharedEvidence::new(EvidenceStore::empty());
        let before = shared.current();
        shared.replace(EvidenceStore::build(vec![record("caradisiac", Some("v1"), None)]).0);
        assert_eq!(before.records_count(), 0);
        assert_eq!(shared.current().records_count(), 1);
    }
}
