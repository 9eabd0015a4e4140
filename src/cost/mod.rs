//! Monthly total-cost-of-ownership model.
//!
//! Pure arithmetic over canonical technical attributes and externally
//! supplied inputs: the current fuel price and per-category coefficient
//! tables. Nothing is baked in and nothing is silently defaulted; a
//! missing input fails the computation loudly.

mod prices;

pub use prices::{load_fuel_prices, FuelPriceFeed, FuelPrices};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::listing::FuelType;
use crate::reference::{BodyCategory, CanonicalVariant};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryCoefficients {
    /// Maintenance provision, euro per km (α).
    pub maintenance_per_km: f64,
    /// Insurance proxy intercept, euro per year (A0).
    pub insurance_base: f64,
    /// Insurance proxy slope, euro per fiscal hp per year (A1).
    pub insurance_per_fiscal_hp: f64,
}

/// Cost configuration: monthly distance and the per-category coefficient
/// tables. The defaults are a documented calibration, any of it can be
/// overridden from the config file without touching code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub monthly_km: f64,
    pub categories: HashMap<BodyCategory, CategoryCoefficients>,
}

impl Default for CostConfig {
    fn default() -> Self {
        let c = |maintenance_per_km, insurance_base, insurance_per_fiscal_hp| {
            CategoryCoefficients { maintenance_per_km, insurance_base, insurance_per_fiscal_hp }
        };
        CostConfig {
            monthly_km: 1000.0,
            categories: HashMap::from([
                (BodyCategory::CityCar, c(0.035, 320.0, 42.0)),
                (BodyCategory::CompactCar, c(0.040, 360.0, 46.0)),
                (BodyCategory::FamilyCar, c(0.048, 420.0, 52.0)),
                (BodyCategory::SmallSuv, c(0.042, 380.0, 48.0)),
                (BodyCategory::CompactSuv, c(0.048, 430.0, 54.0)),
                (BodyCategory::FamilySuv, c(0.056, 490.0, 60.0)),
                (BodyCategory::Minivan, c(0.046, 410.0, 50.0)),
                (BodyCategory::Van, c(0.052, 450.0, 44.0)),
            ]),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CostError {
    #[error("no current fuel price for {}", .0.as_str())]
    MissingFuelPrice(FuelType),
    #[error("no cost coefficients configured for category {}", .0.as_str())]
    MissingCoefficients(BodyCategory),
    #[error("variant {0} has no usable mixed consumption figure")]
    MissingConsumption(String),
}

/// Monthly cost breakdown. Exact sums, no rounding: presentation rounding
/// belongs to the display layer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CostBreakdown {
    pub fuel: f64,
    pub maintenance: f64,
    pub insurance: f64,
    pub total: f64,
    pub monthly_km: f64,
    pub price_per_unit: f64,
}

pub struct CostModel {
    config: CostConfig,
}

impl CostModel {
    pub fn new(config: CostConfig) -> Self {
        CostModel { config }
    }

    pub fn monthly_km(&self) -> f64 {
        self.config.monthly_km
    }

    /// Compute the monthly cost of a variant against the current price
    /// snapshot. Fails when a required input is absent: a plausible-looking
    /// zeroed cost would be worse than no cost.
    pub fn monthly_cost(
        &self,
        variant: &CanonicalVariant,
        prices: &FuelPrices,
    ) -> Result<CostBreakdown, CostError> {
        let price_per_unit = prices
            .get(variant.fuel)
            .ok_or(CostError::MissingFuelPrice(variant.fuel))?;
        let coefficients = self
            .config
            .categories
            .get(&variant.category)
            .ok_or(CostError::MissingCoefficients(variant.category))?;
        if variant.consumption_mixed <= 0.0 {
            return Err(CostError::MissingConsumption(variant.key.clone()));
        }

        let monthly_km = self.config.monthly_km;
        let fuel = (monthly_km / 100.0) * variant.consumption_mixed * price_per_unit;
        let maintenance = monthly_km * coefficients.maintenance_per_km;
        // Fiscal power is the regulatory quantity insurers price on;
        // maximum power never enters here.
        let insurance = (coefficients.insurance_base
            + coefficients.insurance_per_fiscal_hp * variant.fiscal_power as f64)
            / 12.0;

        Ok(CostBreakdown {
            fuel,
            maintenance,
            insurance,
            total: fuel + maintenance + insurance,
            monthly_km,
            price_per_unit,
        })
    }
}
