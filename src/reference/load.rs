//! Reference dataset loading.
//!
//! The upstream collaborator hands over a JSON collection of variant
//! records. Loading canonicalizes the text fields, validates each record,
//! and reports non-fatal problems instead of refusing the whole dataset.

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use crate::listing::{normalize_text, resolve_brand, FuelType};

use super::{BodyCategory, CanonicalVariant, GenerationWindow, ReferenceIndex};

#[derive(Debug)]
pub enum LoadProblem {
    DuplicateKey(String),
    InvalidWindow(String),
    NonPositivePower(String),
    NegativeConsumption(String),
    UnknownBrand { key: String, brand: String },
}

pub struct LoadOutcome {
    pub index: ReferenceIndex,
    pub problems: Vec<LoadProblem>,
}

/// Raw upstream record, text fields in whatever case the dataset uses.
#[derive(Debug, Deserialize)]
struct RawVariant {
    key: String,
    brand: String,
    model: String,
    #[serde(default)]
    generation: Option<u8>,
    start_year: u16,
    #[serde(default)]
    end_year: Option<u16>,
    fuel: FuelType,
    max_power_kw: f64,
    fiscal_power: u16,
    consumption_mixed: f64,
    #[serde(default)]
    co2_g_km: Option<u16>,
    category: BodyCategory,
    #[serde(default)]
    label: String,
}

pub fn load_reference<P: AsRef<Path>>(path: P, check_all: bool) -> Result<LoadOutcome> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read reference dataset: {:?}", path))?;
    let raw: Vec<RawVariant> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse reference dataset: {:?}", path))?;

    if raw.is_empty() {
        bail!("Reference dataset {:?} contains no variants", path);
    }

    let mut problems: Vec<LoadProblem> = Vec::new();
    let mut variants: Vec<CanonicalVariant> = Vec::with_capacity(raw.len());
    for record in raw {
        let brand_norm = normalize_text(&record.brand);
        let canonical_brand = match resolve_brand(&brand_norm) {
            Some(brand) => brand.to_string(),
            None => {
                problems.push(LoadProblem::UnknownBrand {
                    key: record.key.clone(),
                    brand: record.brand.clone(),
                });
                brand_norm
            }
        };
        variants.push(CanonicalVariant {
            key: record.key,
            brand: canonical_brand,
            model: normalize_text(&record.model),
            generation: record.generation,
            window: GenerationWindow {
                start_year: record.start_year,
                end_year: record.end_year,
            },
            fuel: record.fuel,
            max_power_kw: record.max_power_kw,
            fiscal_power: record.fiscal_power,
            consumption_mixed: record.consumption_mixed,
            co2_g_km: record.co2_g_km,
            category: record.category,
            label: record.label,
        });
    }

    if check_all {
        info!("Checking {} reference records...", variants.len());
        let mut check_problems: Vec<LoadProblem> = variants
            .par_iter()
            .filter_map(|v| {
                if !v.window.is_valid() {
                    Some(LoadProblem::InvalidWindow(v.key.clone()))
                } else if v.max_power_kw <= 0.0 {
                    Some(LoadProblem::NonPositivePower(v.key.clone()))
                } else if v.consumption_mixed < 0.0 {
                    Some(LoadProblem::NegativeConsumption(v.key.clone()))
                } else {
                    None
                }
            })
            .collect();
        problems.append(&mut check_problems);
    } else {
        info!("Skipping reference record checks.");
    }

    // Records with a broken window or power cannot be matched or costed,
    // drop them; duplicates keep the first occurrence.
    let rejected: HashSet<String> = problems
        .iter()
        .filter_map(|p| match p {
            LoadProblem::InvalidWindow(key)
            | LoadProblem::NonPositivePower(key)
            | LoadProblem::NegativeConsumption(key) => Some(key.clone()),
            _ => None,
        })
        .collect();

    let mut seen: HashSet<String> = HashSet::with_capacity(variants.len());
    let mut kept: Vec<CanonicalVariant> = Vec::with_capacity(variants.len());
    for variant in variants {
        if rejected.contains(&variant.key) {
            continue;
        }
        if !seen.insert(variant.key.clone()) {
            problems.push(LoadProblem::DuplicateKey(variant.key.clone()));
            continue;
        }
        kept.push(variant);
    }

    if !problems.is_empty() {
        warn!("Found {} problems in reference dataset:", problems.len());
        for problem in problems.iter() {
            warn!("- {:?}", problem);
        }
    }

    if kept.is_empty() {
        bail!("No usable variants left after checks in {:?}", path);
    }

    let index = ReferenceIndex::build(kept);
    info!(
        "Reference dataset loaded: {} variants across {} brands",
        index.variants_count(),
        index.brands_count()
    );
    Ok(LoadOutcome { index, problems })
}
