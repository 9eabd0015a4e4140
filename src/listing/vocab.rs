//! Fixed vocabularies: brand aliases, motorization tokens, gearbox keywords.
//!
//! These tables are the blocking-stage alias data. They intentionally carry
//! the frequent misspellings seen in real listings so that brand resolution
//! stays a plain table lookup.

use super::{FuelType, Gearbox};

/// Canonical brand -> accepted aliases (all lowercase, diacritic-free).
const BRAND_ALIASES: &[(&str, &[&str])] = &[
    ("alfa romeo", &["alfa romeo", "alfa"]),
    ("audi", &["audi"]),
    ("bmw", &["bmw"]),
    ("citroen", &["citroen"]),
    ("dacia", &["dacia"]),
    ("ds", &["ds", "ds automobiles"]),
    ("fiat", &["fiat"]),
    ("ford", &["ford"]),
    ("honda", &["honda"]),
    ("hyundai", &["hyundai"]),
    ("jaguar", &["jaguar"]),
    ("jeep", &["jeep"]),
    ("kia", &["kia"]),
    ("land rover", &["land rover", "landrover"]),
    ("lexus", &["lexus"]),
    ("mazda", &["mazda"]),
    ("mercedes", &["mercedes", "mercedes benz", "mb"]),
    ("mini", &["mini"]),
    ("nissan", &["nissan"]),
    ("opel", &["opel"]),
    ("peugeot", &["peugeot", "peugeo"]),
    ("porsche", &["porsche"]),
    ("renault", &["renault", "renaul"]),
    ("seat", &["seat"]),
    ("skoda", &["skoda"]),
    ("suzuki", &["suzuki"]),
    ("tesla", &["tesla"]),
    ("toyota", &["toyota"]),
    ("volkswagen", &["volkswagen", "vw", "volks"]),
    ("volvo", &["volvo"]),
];

/// Resolve a normalized text fragment to a canonical brand.
///
/// Tries an exact alias match on the fragment first, then looks for an
/// alias appearing as a word inside it (listings often put the brand in
/// the middle of the title).
pub fn resolve_brand(normalized: &str) -> Option<&'static str> {
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return None;
    }
    for &(canonical, aliases) in BRAND_ALIASES {
        if aliases.iter().any(|a| *a == trimmed) {
            return Some(canonical);
        }
    }
    // Multi-word aliases are matched on the raw fragment, single-word
    // aliases against individual tokens to avoid substring false hits
    // ("mini" inside "aluminium").
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    for &(canonical, aliases) in BRAND_ALIASES {
        for alias in aliases {
            if alias.contains(' ') {
                if trimmed.contains(alias) {
                    return Some(canonical);
                }
            } else if tokens.iter().any(|t| t == alias) {
                return Some(canonical);
            }
        }
    }
    None
}

/// All canonical brand names, for index partition sanity checks.
pub fn canonical_brands() -> impl Iterator<Item = &'static str> {
    BRAND_ALIASES.iter().map(|(canonical, _)| *canonical)
}

/// Motorization-family tokens and explicit fuel words, by fuel type.
/// Matched as whole words on the normalized text.
pub(super) const FUEL_KEYWORDS: &[(FuelType, &[&str])] = &[
    (
        FuelType::Electric,
        &[
            "electrique", "electric", "ev", "bev", "zoe", "leaf", "e-208", "e-2008", "e-c4",
            "e-tron", "id.3", "id.4", "model 3", "model s", "model x", "model y",
        ],
    ),
    (
        FuelType::PluginHybrid,
        &["phev", "plug-in", "plugin", "rechargeable", "225e", "330e", "530e"],
    ),
    (
        FuelType::Hybrid,
        &["hybride", "hybrid", "hev", "mhev", "e-tech", "etech", "e-cvt"],
    ),
    (
        FuelType::Diesel,
        &[
            "diesel", "gazole", "gasoil", "hdi", "bluehdi", "blue-hdi", "e-hdi", "tdi", "dci",
            "cdti", "crdi", "jtd", "multijet", "tdci", "ddis", "d4d", "dtec", "skyactiv-d",
        ],
    ),
    (
        FuelType::Petrol,
        &[
            "essence", "sp95", "sp98", "sans plomb", "e10", "tce", "puretech", "thp", "vti",
            "tfsi", "tsi", "fsi", "gti", "mpi", "vtec", "ecoboost", "skyactiv-g",
        ],
    ),
];

/// Motorization family codes that also carry the power figure right after
/// them ("dci 90", "puretech 130").
pub(super) const ENGINE_FAMILY_CODES: &[&str] = &[
    "hdi", "bluehdi", "tdi", "dci", "cdti", "crdi", "tdci", "tce", "puretech", "thp", "vti",
    "tsi", "tfsi", "ecoboost", "multijet",
];

pub(super) const GEARBOX_KEYWORDS: &[(Gearbox, &[&str])] = &[
    (
        Gearbox::Automatic,
        &[
            "automatique", "auto", "bva", "bva6", "bva7", "bva8", "dsg", "dct", "s-tronic",
            "stronic", "tiptronic", "eat6", "eat8", "edc", "cvt", "e-cvt", "robotisee",
            "pilotee",
        ],
    ),
    (
        Gearbox::Manual,
        &["manuelle", "manuel", "bvm", "bvm5", "bvm6", "mecanique", "5 vitesses", "6 vitesses"],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exact_and_alias() {
        assert_eq!(resolve_brand("renault"), Some("renault"));
        assert_eq!(resolve_brand("vw"), Some("volkswagen"));
        assert_eq!(resolve_brand("mercedes benz"), Some("mercedes"));
        assert_eq!(resolve_brand("peugeo"), Some("peugeot"));
    }

    #[test]
    fn resolves_brand_inside_text() {
        assert_eq!(
            resolve_brand("superbe renault clio iv dci 90"),
            Some("renault")
        );
        assert_eq!(resolve_brand("land rover defender 110"), Some("land rover"));
    }

    #[test]
    fn no_substring_false_positive() {
        // "mini" must not fire inside another word
        assert_eq!(resolve_brand("jantes aluminium 17 pouces"), None);
        assert_eq!(resolve_brand(""), None);
        assert_eq!(resolve_brand("trabant 601"), None);
    }
}
