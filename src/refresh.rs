//! Periodic dataset refresh.
//!
//! Reloads the reference dataset, evidence store and fuel-price feed from
//! their source files and swaps the shared handles. Everything is loaded
//! before anything is swapped, so in-flight requests either see the old
//! generation or the new one, never a mix of a half-loaded refresh.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::cost::{load_fuel_prices, FuelPriceFeed};
use crate::evidence::{load_evidence, SharedEvidence};
use crate::reference::{load_reference, SnapshotStore};
use crate::server::metrics;

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub reference_version: u64,
    pub variants: usize,
    pub evidence_records: usize,
    pub fuel_types: usize,
}

pub struct Refresher {
    reference_path: PathBuf,
    evidence_path: PathBuf,
    prices_path: PathBuf,
    check_reference: bool,
    snapshots: Arc<SnapshotStore>,
    evidence: Arc<SharedEvidence>,
    prices: Arc<FuelPriceFeed>,
}

impl Refresher {
    pub fn new(
        reference_path: PathBuf,
        evidence_path: PathBuf,
        prices_path: PathBuf,
        check_reference: bool,
        snapshots: Arc<SnapshotStore>,
        evidence: Arc<SharedEvidence>,
        prices: Arc<FuelPriceFeed>,
    ) -> Self {
        Refresher {
            reference_path,
            evidence_path,
            prices_path,
            check_reference,
            snapshots,
            evidence,
            prices,
        }
    }

    /// Reload all three datasets, then swap. A failure in any load leaves
    /// every active handle untouched.
    pub fn refresh_all(&self) -> Result<RefreshReport> {
        let reference = load_reference(&self.reference_path, self.check_reference)?;
        let (evidence_store, _problems) = load_evidence(&self.evidence_path)?;
        let fuel_prices = load_fuel_prices(&self.prices_path)?;

        let variants = reference.index.variants_count();
        let evidence_records = evidence_store.records_count();
        let fuel_types = fuel_prices.len();

        let reference_version = self.snapshots.replace(reference.index);
        self.evidence.replace(evidence_store);
        self.prices.replace(fuel_prices);
        metrics::set_dataset_metrics(variants, reference_version, evidence_records);

        info!(
            "Refresh complete: snapshot v{} with {} variants, {} evidence records, {} fuel prices",
            reference_version, variants, evidence_records, fuel_types
        );
        Ok(RefreshReport { reference_version, variants, evidence_records, fuel_types })
    }
}

/// Background refresh loop. The first tick fires after one full interval,
/// startup already loaded everything.
pub fn spawn_periodic_refresh(refresher: Arc<Refresher>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = refresher.refresh_all() {
                error!("Dataset refresh failed, keeping previous snapshots: {:#}", e);
            }
        }
    });
}
