//! Current fuel prices.
//!
//! The upstream feed refreshes on its own cadence; the core only ever sees
//! one current price per fuel type, no history. The feed handle follows
//! the same swap discipline as the reference snapshot.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use crate::listing::FuelType;

/// Immutable price snapshot, euro per liter (per kWh for electric).
#[derive(Debug, Clone, Default)]
pub struct FuelPrices {
    by_fuel: HashMap<FuelType, f64>,
}

impl FuelPrices {
    pub fn from_pairs(pairs: Vec<(FuelType, f64)>) -> Self {
        FuelPrices { by_fuel: pairs.into_iter().collect() }
    }

    pub fn get(&self, fuel: FuelType) -> Option<f64> {
        self.by_fuel.get(&fuel).copied()
    }

    pub fn len(&self) -> usize {
        self.by_fuel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fuel.is_empty()
    }
}

pub struct FuelPriceFeed {
    inner: RwLock<Arc<FuelPrices>>,
}

impl FuelPriceFeed {
    pub fn new(prices: FuelPrices) -> Self {
        FuelPriceFeed { inner: RwLock::new(Arc::new(prices)) }
    }

    pub fn current(&self) -> Arc<FuelPrices> {
        self.inner.read().expect("price feed lock poisoned").clone()
    }

    pub fn replace(&self, prices: FuelPrices) {
        *self.inner.write().expect("price feed lock poisoned") = Arc::new(prices);
    }
}

/// Load a price snapshot from the feed file: a JSON object of
/// fuel-type -> price, e.g. `{"diesel": 1.65, "petrol": 1.82}`.
/// Non-positive prices are dropped, a price of zero is a feed defect and
/// must not silently zero a cost downstream.
pub fn load_fuel_prices<P: AsRef<Path>>(path: P) -> Result<FuelPrices> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fuel price feed: {:?}", path))?;
    let raw: HashMap<FuelType, f64> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse fuel price feed: {:?}", path))?;

    let mut by_fuel = HashMap::with_capacity(raw.len());
    for (fuel, price) in raw {
        if price > 0.0 {
            by_fuel.insert(fuel, price);
        } else {
            warn!("Dropping non-positive price {} for {}", price, fuel.as_str());
        }
    }
    if by_fuel.is_empty() {
        warn!("Fuel price feed {:?} contains no usable prices", path);
    }
    info!("Fuel prices loaded: {} fuel types", by_fuel.len());
    Ok(FuelPrices { by_fuel })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_and_drops_non_positive() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"diesel": 1.65, "petrol": 1.82, "electric": 0.0}"#)
            .unwrap();
        let prices = load_fuel_prices(file.path()).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.get(FuelType::Diesel), Some(1.65));
        assert_eq!(prices.get(FuelType::Electric), None);
    }

    #[test]
    fn feed_swap_keeps_old_handles_consistent() {
        let feed = FuelPriceFeed::new(FuelPrices::from_pairs(vec![(FuelType::Diesel, 1.60)]));
        let before = feed.current();
        feed.replace(FuelPrices::from_pairs(vec![(FuelType::Diesel, 1.72)]));
        assert_eq!(before.get(FuelType::Diesel), Some(1.60));
        assert_eq!(feed.current().get(FuelType::Diesel), Some(1.72));
    }
}
