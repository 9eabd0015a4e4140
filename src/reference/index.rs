//! Brand-partitioned index and the versioned snapshot handle.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::CanonicalVariant;

/// Searchable view over the canonical dataset, partitioned by brand so the
/// matcher can restrict candidates before any scoring.
pub struct ReferenceIndex {
    by_brand: HashMap<String, Vec<Arc<CanonicalVariant>>>,
    by_key: HashMap<String, Arc<CanonicalVariant>>,
}

impl ReferenceIndex {
    pub fn build(variants: Vec<CanonicalVariant>) -> Self {
        let mut by_brand: HashMap<String, Vec<Arc<CanonicalVariant>>> = HashMap::new();
        let mut by_key = HashMap::with_capacity(variants.len());
        for variant in variants {
            let variant = Arc::new(variant);
            by_brand
                .entry(variant.brand.clone())
                .or_default()
                .push(variant.clone());
            by_key.insert(variant.key.clone(), variant);
        }
        ReferenceIndex { by_brand, by_key }
    }

    /// All variants of a canonical brand, empty for unknown brands.
    pub fn brand_partition(&self, brand: &str) -> &[Arc<CanonicalVariant>] {
        self.by_brand.get(brand).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, key: &str) -> Option<&Arc<CanonicalVariant>> {
        self.by_key.get(key)
    }

    pub fn variants_count(&self) -> usize {
        self.by_key.len()
    }

    pub fn brands_count(&self) -> usize {
        self.by_brand.len()
    }
}

/// One immutable, versioned view of the reference data. Requests hold an
/// `Arc` to it for their whole lifetime so a concurrent refresh can never
/// show them a half-updated index.
pub struct ReferenceSnapshot {
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    pub index: ReferenceIndex,
}

/// The swappable pointer to the active snapshot. Refresh builds a complete
/// new snapshot off to the side and replaces the pointer in one step.
pub struct SnapshotStore {
    inner: RwLock<Arc<ReferenceSnapshot>>,
}

impl SnapshotStore {
    pub fn new(index: ReferenceIndex) -> Self {
        let snapshot = ReferenceSnapshot { version: 1, loaded_at: Utc::now(), index };
        SnapshotStore { inner: RwLock::new(Arc::new(snapshot)) }
    }

    pub fn current(&self) -> Arc<ReferenceSnapshot> {
        self.inner.read().expect("snapshot lock poisoned").clone()
    }

    /// Swap in a freshly built index, returns the new version.
    pub fn replace(&self, index: ReferenceIndex) -> u64 {
        let mut guard = self.inner.write().expect("snapshot lock poisoned");
        let version = guard.version + 1;
        *guard = Arc::new(ReferenceSnapshot { version, loaded_at: Utc::now(), index });
        version
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_variant;
    use super::*;

    #[test]
    fn partitions_by_brand() {
        let index = ReferenceIndex::build(vec![
            test_variant("v1", "renault", "clio"),
            test_variant("v2", "renault", "megane"),
            test_variant("v3", "peugeot", "208"),
        ]);
        assert_eq!(index.brand_partition("renault").len(), 2);
        assert_eq!(index.brand_partition("peugeot").len(), 1);
        assert!(index.brand_partition("tesla").is_empty());
        assert_eq!(index.variants_count(), 3);
        assert_eq!(index.brands_count(), 2);
        assert!(index.get("v2").is_some());
        assert!(index.get("nope").is_none());
    }

    #[test]
    fn replace_bumps_version_and_old_handles_stay_valid() {
        let store = SnapshotStore::new(ReferenceIndex::build(vec![test_variant(
            "v1", "renault", "clio",
        )]));
        let before = store.current();
        assert_eq!(before.version, 1);

        let version = store.replace(ReferenceIndex::build(vec![
            test_variant("v1", "renault", "clio"),
            test_variant("v2", "renault", "megane"),
        ]));
        assert_eq!(version, 2);

        // The handle taken before the swap still sees the old index.
        assert_eq!(before.index.variants_count(), 1);
        assert_eq!(store.current().index.variants_count(), 2);
    }
}
