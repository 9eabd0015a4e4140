use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use crate::cost::FuelPriceFeed;
use crate::enrich::Enricher;
use crate::evidence::SharedEvidence;
use crate::reference::SnapshotStore;
use crate::refresh::Refresher;

use super::ServerConfig;

pub type GuardedEnricher = Arc<Enricher>;
pub type GuardedSnapshots = Arc<SnapshotStore>;
pub type GuardedEvidence = Arc<SharedEvidence>;
pub type GuardedPriceFeed = Arc<FuelPriceFeed>;
pub type GuardedRefresher = Arc<Refresher>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub enricher: GuardedEnricher,
    pub snapshots: GuardedSnapshots,
    pub evidence: GuardedEvidence,
    pub prices: GuardedPriceFeed,
    pub refresher: GuardedRefresher,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedEnricher {
    fn from_ref(input: &ServerState) -> Self {
        input.enricher.clone()
    }
}

impl FromRef<ServerState> for GuardedSnapshots {
    fn from_ref(input: &ServerState) -> Self {
        input.snapshots.clone()
    }
}

impl FromRef<ServerState> for GuardedEvidence {
    fn from_ref(input: &ServerState) -> Self {
        input.evidence.clone()
    }
}

impl FromRef<ServerState> for GuardedPriceFeed {
    fn from_ref(input: &ServerState) -> Self {
        input.prices.clone()
    }
}

impl FromRef<ServerState> for GuardedRefresher {
    fn from_ref(input: &ServerState) -> Self {
        input.refresher.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
