//! Canonical vehicle-variant reference data.
//!
//! The reference dataset is loaded once per refresh cycle, indexed by brand
//! for candidate blocking, and shared read-only across requests through a
//! versioned snapshot handle.

mod index;
mod load;

pub use index::{ReferenceIndex, ReferenceSnapshot, SnapshotStore};
pub use load::{load_reference, LoadOutcome, LoadProblem};

use serde::{Deserialize, Serialize};

use crate::listing::{FuelType, KW_TO_DIN_HP};

/// Production window of a variant, inclusive start, open or inclusive end.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationWindow {
    pub start_year: u16,
    #[serde(default)]
    pub end_year: Option<u16>,
}

impl GenerationWindow {
    pub fn contains(&self, year: u16) -> bool {
        year >= self.start_year && self.end_year.map_or(true, |end| year <= end)
    }

    pub fn is_valid(&self) -> bool {
        self.end_year.map_or(true, |end| end >= self.start_year)
    }
}

/// Body-style category, drives the cost coefficient lookup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyCategory {
    CityCar,
    CompactCar,
    FamilyCar,
    SmallSuv,
    CompactSuv,
    FamilySuv,
    Minivan,
    Van,
}

impl BodyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyCategory::CityCar => "city_car",
            BodyCategory::CompactCar => "compact_car",
            BodyCategory::FamilyCar => "family_car",
            BodyCategory::SmallSuv => "small_suv",
            BodyCategory::CompactSuv => "compact_suv",
            BodyCategory::FamilySuv => "family_suv",
            BodyCategory::Minivan => "minivan",
            BodyCategory::Van => "van",
        }
    }
}

/// One authoritative technical record for a specific vehicle configuration.
///
/// Immutable once loaded. `key` is unique across the dataset;
/// (brand, model, window, fuel, power) is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalVariant {
    /// Stable variant identifier from the upstream dataset.
    pub key: String,
    /// Canonical lowercase brand.
    pub brand: String,
    /// Canonical lowercase model.
    pub model: String,
    #[serde(default)]
    pub generation: Option<u8>,
    pub window: GenerationWindow,
    pub fuel: FuelType,
    /// Authoritative maximum power in kilowatts.
    pub max_power_kw: f64,
    /// Administrative (fiscal) horsepower. Insurance proxy only, never a
    /// substitute for maximum power.
    pub fiscal_power: u16,
    /// Mixed-cycle consumption, L/100km (kWh/100km for electric).
    pub consumption_mixed: f64,
    #[serde(default)]
    pub co2_g_km: Option<u16>,
    pub category: BodyCategory,
    /// Commercial designation as published ("CLIO dCi 90 ENERGY Zen").
    #[serde(default)]
    pub label: String,
}

impl CanonicalVariant {
    pub fn max_power_hp(&self) -> f64 {
        self.max_power_kw * KW_TO_DIN_HP
    }

    /// Key used to aggregate evidence at (brand, model, generation) level
    /// when no variant-level bundle exists.
    pub fn rollup_key(&self) -> String {
        match self.generation {
            Some(gen) => format!("{}|{}|{}", self.brand, self.model, gen),
            None => format!("{}|{}", self.brand, self.model),
        }
    }

    /// The text a listing is compared against during re-ranking.
    pub fn comparison_text(&self) -> String {
        let mut text = String::with_capacity(64);
        text.push_str(&self.brand);
        text.push(' ');
        text.push_str(&self.model);
        if let Some(roman) = self.generation.and_then(generation_roman) {
            text.push(' ');
            text.push_str(roman);
        }
        text.push(' ');
        text.push_str(self.fuel.as_str());
        let hp = self.max_power_hp().round() as i64;
        text.push_str(&format!(" {hp}ch "));
        text.push_str(&crate::listing::normalize_text(&self.label));
        text.trim_end().to_string()
    }
}

fn generation_roman(gen: u8) -> Option<&'static str> {
    match gen {
        1 => Some("i"),
        2 => Some("ii"),
        3 => Some("iii"),
        4 => Some("iv"),
        5 => Some("v"),
        6 => Some("vi"),
        7 => Some("vii"),
        8 => Some("viii"),
        9 => Some("ix"),
        10 => Some("x"),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn test_variant(key: &str, brand: &str, model: &str) -> CanonicalVariant {
    CanonicalVariant {
        key: key.to_string(),
        brand: brand.to_string(),
        model: model.to_string(),
        generation: None,
        window: GenerationWindow { start_year: 2012, end_year: None },
        fuel: FuelType::Diesel,
        max_power_kw: 66.0,
        fiscal_power: 5,
        consumption_mixed: 3.9,
        co2_g_km: Some(95),
        category: BodyCategory::CityCar,
        label: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_containment() {
        let open = GenerationWindow { start_year: 2012, end_year: None };
        assert!(open.contains(2012));
        assert!(open.contains(2026));
        assert!(!open.contains(2011));

        let closed = GenerationWindow { start_year: 2012, end_year: Some(2019) };
        assert!(closed.contains(2019));
        assert!(!closed.contains(2020));
        assert!(closed.is_valid());
        assert!(!GenerationWindow { start_year: 2020, end_year: Some(2019) }.is_valid());
    }

    #[test]
    fn comparison_text_carries_all_match_signals() {
        let mut variant = test_variant("v1", "renault", "clio");
        variant.generation = Some(4);
        variant.label = "CLIO dCi 90 ENERGY Zen".to_string();
        let text = variant.comparison_text();
        assert!(text.contains("renault clio iv diesel 90ch"), "got: {text}");
        assert!(text.contains("dci 90 energy zen"), "got: {text}");
    }

    #[test]
    fn rollup_key_includes_generation_when_known() {
        let mut variant = test_variant("v1", "renault", "clio");
        assert_eq!(variant.rollup_key(), "renault|clio");
        variant.generation = Some(4);
        assert_eq!(variant.rollup_key(), "renault|clio|4");
    }
}
