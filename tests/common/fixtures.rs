//! Test fixtures: small reference sets, evidence records and a fully
//! wired enricher, all built programmatically.
#![allow(dead_code)] // Not every test binary uses every fixture



use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use enrichment_server::config::EngineConfig;
use enrichment_server::cost::{FuelPriceFeed, FuelPrices};
use enrichment_server::enrich::Enricher;
use enrichment_server::evidence::{
    Dimension, EvidenceRecord, EvidenceStore, SharedEvidence, SourceCategory,
};
use enrichment_server::listing::{FuelType, ListingInput};
use enrichment_server::reference::{
    BodyCategory, CanonicalVariant, GenerationWindow, ReferenceIndex, SnapshotStore,
};

pub fn make_variant(
    key: &str,
    brand: &str,
    model: &str,
    generation: u8,
    fuel: FuelType,
    max_power_kw: f64,
    label: &str,
) -> CanonicalVariant {
    CanonicalVariant {
        key: key.to_string(),
        brand: brand.to_string(),
        model: model.to_string(),
        generation: Some(generation),
        window: GenerationWindow { start_year: 2012, end_year: Some(2019) },
        fuel,
        max_power_kw,
        fiscal_power: 4,
        consumption_mixed: 3.6,
        co2_g_km: Some(95),
        category: BodyCategory::CityCar,
        label: label.to_string(),
    }
}

/// The reference-set star of the end-to-end cases: Renault Clio IV diesel,
/// 66 kW (~89.7 DIN hp).
pub fn clio_iv_diesel() -> CanonicalVariant {
    make_variant("clio4-dci90", "renault", "clio", 4, FuelType::Diesel, 66.0, "CLIO dCi 90 ENERGY")
}

pub fn clio_iv_petrol(key: &str, max_power_kw: f64, label: &str) -> CanonicalVariant {
    make_variant(key, "renault", "clio", 4, FuelType::Petrol, max_power_kw, label)
}

/// The canonical test listing: declared brand/model/power, fuel only in
/// the free text.
pub fn clio_listing() -> ListingInput {
    ListingInput {
        brand: Some("Renault".to_string()),
        model: Some("Clio".to_string()),
        title: "Clio IV dci 90ch".to_string(),
        power: Some(90.0),
        ..Default::default()
    }
}

pub fn fresh_record(
    source: &str,
    category: SourceCategory,
    variant_key: &str,
    reliability: f64,
) -> EvidenceRecord {
    EvidenceRecord {
        source: source.to_string(),
        category,
        variant_key: Some(variant_key.to_string()),
        rollup_key: None,
        observed_at: Utc::now() - Duration::days(30),
        weight: None,
        scores: HashMap::from([
            (Dimension::Reliability, reliability),
            (Dimension::Comfort, 6.5),
            (Dimension::Budget, 7.5),
        ]),
        known_failures: Vec::new(),
        strengths: Vec::new(),
        weaknesses: Vec::new(),
    }
}

pub fn default_prices() -> FuelPrices {
    FuelPrices::from_pairs(vec![(FuelType::Diesel, 1.65), (FuelType::Petrol, 1.82)])
}

pub struct TestContext {
    pub enricher: Enricher,
    pub snapshots: Arc<SnapshotStore>,
    pub evidence: Arc<SharedEvidence>,
    pub prices: Arc<FuelPriceFeed>,
}

pub fn make_context(
    variants: Vec<CanonicalVariant>,
    records: Vec<EvidenceRecord>,
    prices: FuelPrices,
) -> TestContext {
    make_context_with_config(EngineConfig::default(), variants, records, prices)
}

pub fn make_context_with_config(
    config: EngineConfig,
    variants: Vec<CanonicalVariant>,
    records: Vec<EvidenceRecord>,
    prices: FuelPrices,
) -> TestContext {
    let snapshots = Arc::new(SnapshotStore::new(ReferenceIndex::build(variants)));
    let (store, problems) = EvidenceStore::build(records);
    assert!(problems.is_empty(), "fixture evidence had problems: {problems:?}");
    let evidence = Arc::new(SharedEvidence::new(store));
    let prices = Arc::new(FuelPriceFeed::new(prices));
    let enricher = Enricher::new(config, snapshots.clone(), evidence.clone(), prices.clone());
    TestContext { enricher, snapshots, evidence, prices }
}
