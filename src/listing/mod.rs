//! Listing input types and the text normalizer.

mod normalizer;
mod vocab;

pub use normalizer::{normalize, normalize_text};
pub use vocab::{canonical_brands, resolve_brand};

use serde::{Deserialize, Serialize};

/// Fuel vocabulary used across the whole pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Petrol,
    Diesel,
    Hybrid,
    PluginHybrid,
    Electric,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Petrol => "petrol",
            FuelType::Diesel => "diesel",
            FuelType::Hybrid => "hybrid",
            FuelType::PluginHybrid => "plugin_hybrid",
            FuelType::Electric => "electric",
        }
    }

    /// Price feeds and listings use loose labels, map the common ones.
    pub fn parse(s: &str) -> Option<FuelType> {
        match s.trim().to_lowercase().as_str() {
            "petrol" | "essence" | "gasoline" => Some(FuelType::Petrol),
            "diesel" | "gazole" | "gasoil" => Some(FuelType::Diesel),
            "hybrid" | "hybride" => Some(FuelType::Hybrid),
            "plugin_hybrid" | "phev" | "hybride_rechargeable" => Some(FuelType::PluginHybrid),
            "electric" | "electrique" | "ev" => Some(FuelType::Electric),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gearbox {
    Manual,
    Automatic,
    #[default]
    Unknown,
}

/// Power as declared on a listing, before unit disambiguation settles it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUnit {
    DinHp,
    Kw,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPower {
    pub value: f64,
    pub unit: PowerUnit,
}

pub const KW_TO_DIN_HP: f64 = 1.35962;

impl ExtractedPower {
    pub fn as_din_hp(&self) -> f64 {
        match self.unit {
            PowerUnit::DinHp => self.value,
            PowerUnit::Kw => self.value * KW_TO_DIN_HP,
        }
    }
}

/// A raw listing as handed over by the caller. Ephemeral, never persisted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListingInput {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Declared power, unit ambiguous (DIN hp or kW).
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub fuel: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub mileage_km: Option<u32>,
    #[serde(default)]
    pub price: Option<u32>,
}

/// Output of the normalizer. Unresolvable fields are carried as `None`,
/// never as an error.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedListing {
    /// Canonical brand resolved through the alias table.
    pub brand: Option<String>,
    /// Lowercased, diacritic-free model token.
    pub model: Option<String>,
    /// The whole normalized text (title + subtitle + description).
    pub text: String,
    pub power: Option<ExtractedPower>,
    pub fuel: Option<FuelType>,
    pub generation: Option<u8>,
    pub year: Option<u16>,
    pub mileage_km: Option<u32>,
    pub price: Option<u32>,
    pub gearbox: Gearbox,
}

impl NormalizedListing {
    /// Cache key over every field that can influence a match decision.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.brand.as_deref().unwrap_or("-"),
            self.model.as_deref().unwrap_or("-"),
            self.fuel.as_ref().map(FuelType::as_str).unwrap_or("-"),
            self.year.unwrap_or(0),
            self.power.map(|p| p.as_din_hp().round() as i64).unwrap_or(-1),
            self.text
        )
    }
}
