//! Free-text listing normalization.
//!
//! Turns a noisy listing (title, subtitle, declared fields) into a
//! `NormalizedListing` with a canonical brand, a fixed fuel vocabulary and
//! a disambiguated power figure. The pass is pure and never fails:
//! anything unresolvable comes out as `None`.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use super::vocab::{self, ENGINE_FAMILY_CODES, FUEL_KEYWORDS, GEARBOX_KEYWORDS};
use super::{ExtractedPower, FuelType, Gearbox, ListingInput, NormalizedListing, PowerUnit};

const MIN_POWER_HP: f64 = 50.0;
const MAX_POWER_HP: f64 = 800.0;
const MIN_POWER_KW: f64 = 9.0;
const MAX_POWER_KW: f64 = 300.0;
const MIN_YEAR: u16 = 2000;
const MAX_YEAR: u16 = 2026;

lazy_static! {
    static ref RE_POWER_HP: Regex =
        Regex::new(r"\b(\d{2,3})\s*(?:ch|cv|hp|din)\b").expect("power regex");
    static ref RE_POWER_KW: Regex = Regex::new(r"\b(\d{2,3})\s*kw\b").expect("kw regex");
    static ref RE_ENGINE_POWER: Regex = {
        let families = ENGINE_FAMILY_CODES.join("|");
        Regex::new(&format!(r"\b(?:{families})\s*(\d{{2,3}})\b")).expect("engine power regex")
    };
    static ref RE_YEAR: Regex = Regex::new(r"\b(20[0-2][0-9])\b").expect("year regex");
}

/// Normalize a raw listing. Pure function, no I/O.
pub fn normalize(input: &ListingInput) -> NormalizedListing {
    let mut combined = input.title.clone();
    for part in [input.subtitle.as_deref(), input.description.as_deref()]
        .into_iter()
        .flatten()
    {
        combined.push(' ');
        combined.push_str(part);
    }
    let text = normalize_text(&combined);
    let tokens: Vec<&str> = text.split_whitespace().collect();

    let brand = input
        .brand
        .as_deref()
        .map(normalize_text)
        .and_then(|b| vocab::resolve_brand(&b).map(str::to_string))
        .or_else(|| vocab::resolve_brand(&text).map(str::to_string));

    let model = input
        .model
        .as_deref()
        .map(normalize_text)
        .filter(|m| !m.is_empty())
        .or_else(|| extract_model(&tokens, brand.as_deref()));

    let power = input
        .power
        .map(|value| disambiguate_power(value, &text))
        .or_else(|| extract_power(&text));

    let fuel = input
        .fuel
        .as_deref()
        .and_then(FuelType::parse)
        .or_else(|| extract_fuel(&tokens));

    let year = input
        .year
        .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
        .or_else(|| extract_year(&text));

    NormalizedListing {
        generation: extract_generation(&tokens, model.as_deref()),
        gearbox: extract_gearbox(&tokens),
        brand,
        model,
        text,
        power,
        fuel,
        year,
        mileage_km: input.mileage_km,
        price: input.price,
    }
}

/// Lowercase, fold diacritics, collapse separators. Hyphens and dots stay,
/// motorization codes like "e-hdi" or "id.3" depend on them.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match fold_diacritic(c) {
            Some(folded) => {
                for fc in folded.chars() {
                    push_normalized(&mut out, fc);
                }
            }
            None => push_normalized(&mut out, c),
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

fn push_normalized(out: &mut String, c: char) {
    let c = c.to_ascii_lowercase();
    if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
        out.push(c);
    } else if !out.is_empty() && !out.ends_with(' ') {
        out.push(' ');
    }
}

fn fold_diacritic(c: char) -> Option<&'static str> {
    match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' | 'À' | 'Â' | 'Ä' | 'Á' => Some("a"),
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => Some("e"),
        'î' | 'ï' | 'í' | 'Î' | 'Ï' => Some("i"),
        'ô' | 'ö' | 'ó' | 'õ' | 'Ô' | 'Ö' => Some("o"),
        'ù' | 'û' | 'ü' | 'ú' | 'Ù' | 'Û' | 'Ü' => Some("u"),
        'ç' | 'Ç' => Some("c"),
        'ñ' | 'Ñ' => Some("n"),
        'œ' => Some("oe"),
        'æ' => Some("ae"),
        // Unknown non-ASCII acts as a separator.
        _ if !c.is_ascii() => Some(" "),
        _ => None,
    }
}

/// Declared power with ambiguous unit: small values in a kW context are
/// kilowatts, everything else is DIN horsepower.
fn disambiguate_power(value: f64, text: &str) -> ExtractedPower {
    let unit = if value < 50.0 && text.split_whitespace().any(|t| t == "kw" || t.ends_with("kw")) {
        PowerUnit::Kw
    } else {
        PowerUnit::DinHp
    };
    ExtractedPower { value, unit }
}

/// Pull the power figure out of the free text. An explicit kW suffix wins,
/// otherwise the most frequently repeated hp candidate does (titles often
/// state the power twice, once as "90ch" and once as "dci 90").
fn extract_power(text: &str) -> Option<ExtractedPower> {
    if let Some(cap) = RE_POWER_KW.captures(text) {
        if let Ok(kw) = cap[1].parse::<f64>() {
            if (MIN_POWER_KW..=MAX_POWER_KW).contains(&kw) {
                return Some(ExtractedPower { value: kw, unit: PowerUnit::Kw });
            }
        }
    }

    let mut counts: HashMap<i64, usize> = HashMap::new();
    let mut order: Vec<i64> = Vec::new();
    for re in [&*RE_POWER_HP, &*RE_ENGINE_POWER] {
        for cap in re.captures_iter(text) {
            if let Ok(hp) = cap[1].parse::<f64>() {
                if (MIN_POWER_HP..=MAX_POWER_HP).contains(&hp) {
                    let key = hp as i64;
                    if !counts.contains_key(&key) {
                        order.push(key);
                    }
                    *counts.entry(key).or_insert(0) += 1;
                }
            }
        }
    }
    // Ties keep the first-seen candidate, the title states it first.
    let mut best: Option<(i64, usize)> = None;
    for key in order {
        let count = counts[&key];
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((key, count));
        }
    }
    best.map(|(hp, _)| ExtractedPower { value: hp as f64, unit: PowerUnit::DinHp })
}

fn extract_year(text: &str) -> Option<u16> {
    RE_YEAR
        .captures(text)
        .and_then(|cap| cap[1].parse::<u16>().ok())
        .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
}

/// First fuel family with a token hit wins; the table is ordered so that
/// the more specific drivetrains (electric, plug-in) shadow the generic
/// petrol/diesel tokens.
fn extract_fuel(tokens: &[&str]) -> Option<FuelType> {
    for (fuel, keywords) in FUEL_KEYWORDS {
        for keyword in *keywords {
            if keyword_matches(tokens, keyword) {
                return Some(*fuel);
            }
        }
    }
    None
}

fn extract_gearbox(tokens: &[&str]) -> Gearbox {
    let count = |keywords: &[&str]| -> usize {
        keywords
            .iter()
            .filter(|keyword| keyword_matches(tokens, keyword))
            .count()
    };
    let mut automatic = 0;
    let mut manual = 0;
    for (gearbox, keywords) in GEARBOX_KEYWORDS {
        match gearbox {
            Gearbox::Automatic => automatic = count(keywords),
            Gearbox::Manual => manual = count(keywords),
            Gearbox::Unknown => {}
        }
    }
    match automatic.cmp(&manual) {
        std::cmp::Ordering::Greater => Gearbox::Automatic,
        std::cmp::Ordering::Less => Gearbox::Manual,
        std::cmp::Ordering::Equal => Gearbox::Unknown,
    }
}

/// Whole-word (or whole-phrase) match against the token list.
fn keyword_matches(tokens: &[&str], keyword: &str) -> bool {
    let parts: Vec<&str> = keyword.split_whitespace().collect();
    match parts.len() {
        0 => false,
        1 => tokens.iter().any(|t| *t == parts[0]),
        n => tokens.windows(n).any(|w| w == parts.as_slice()),
    }
}

/// The token right after the brand alias is the model candidate
/// ("renault clio iv ..." -> "clio"). One- and two-digit pure numbers are
/// skipped, those are powers or trim codes, while "208"-style nameplates
/// pass.
fn extract_model(tokens: &[&str], brand: Option<&str>) -> Option<String> {
    let brand = brand?;
    let brand_tokens: Vec<&str> = brand.split_whitespace().collect();
    let pos = tokens
        .windows(brand_tokens.len())
        .position(|w| w == brand_tokens.as_slice())?;
    let candidate = tokens.get(pos + brand_tokens.len())?;
    let is_plausible = candidate.len() >= 2
        && (!candidate.chars().all(|c| c.is_ascii_digit()) || candidate.len() >= 3);
    if is_plausible {
        Some((*candidate).to_string())
    } else {
        None
    }
}

/// Generation marker: a roman numeral anywhere, or a single digit right
/// after the model token ("clio 5").
fn extract_generation(tokens: &[&str], model: Option<&str>) -> Option<u8> {
    for (i, token) in tokens.iter().enumerate() {
        if let Some(gen) = roman_to_generation(token) {
            // Bare "i", "v" and "x" are too common as trim letters, only
            // accept them straight after the model token.
            let needs_anchor = matches!(*token, "i" | "v" | "x");
            if !needs_anchor || follows_model(tokens, i, model) {
                return Some(gen);
            }
        }
        if token.len() == 1 && token.chars().all(|c| c.is_ascii_digit()) {
            if follows_model(tokens, i, model) {
                if let Ok(gen) = token.parse::<u8>() {
                    if (1..=9).contains(&gen) {
                        return Some(gen);
                    }
                }
            }
        }
    }
    None
}

fn follows_model(tokens: &[&str], index: usize, model: Option<&str>) -> bool {
    match (index.checked_sub(1).and_then(|i| tokens.get(i)), model) {
        (Some(prev), Some(model)) => *prev == model,
        _ => false,
    }
}

fn roman_to_generation(token: &str) -> Option<u8> {
    match token {
        "i" => Some(1),
        "ii" => Some(2),
        "iii" => Some(3),
        "iv" => Some(4),
        "v" => Some(5),
        "vi" => Some(6),
        "vii" => Some(7),
        "viii" => Some(8),
        "ix" => Some(9),
        "x" => Some(10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str) -> ListingInput {
        ListingInput { title: title.to_string(), ..Default::default() }
    }

    #[test]
    fn normalizes_text() {
        assert_eq!(
            normalize_text("Peugeot 3008 1.2 PureTech 130ch Allure (BVA) 2021"),
            "peugeot 3008 1.2 puretech 130ch allure bva 2021"
        );
        assert_eq!(normalize_text("Mégane Coupé"), "megane coupe");
        assert_eq!(normalize_text("  Clio   IV  "), "clio iv");
    }

    #[test]
    fn extracts_power_from_suffix_and_family() {
        let n = normalize(&listing("Renault Clio IV dCi 90ch"));
        assert_eq!(n.power, Some(ExtractedPower { value: 90.0, unit: PowerUnit::DinHp }));

        let n = normalize(&listing("Golf TDI 150"));
        assert_eq!(n.power.map(|p| p.value), Some(150.0));
    }

    #[test]
    fn repeated_power_wins_over_stray_number() {
        // "90" appears via both patterns, "110 ch" only once
        let n = normalize(&listing("Clio dci 90, 90ch, reprise possible 110 ch debattre"));
        assert_eq!(n.power.map(|p| p.value), Some(90.0));
    }

    #[test]
    fn explicit_kw_suffix_is_kilowatts() {
        let n = normalize(&listing("Zoe 41 kw electrique"));
        let p = n.power.unwrap();
        assert_eq!(p.unit, PowerUnit::Kw);
        assert!((p.as_din_hp() - 41.0 * 1.35962).abs() < 1e-9);
    }

    #[test]
    fn declared_small_power_with_kw_context_is_kw() {
        let mut input = listing("Renault Zoe 40kw");
        input.power = Some(41.0);
        let n = normalize(&input);
        assert_eq!(n.power.map(|p| p.unit), Some(PowerUnit::Kw));

        // No kW context: assume DIN hp even when small
        let mut input = listing("Citroen 2CV");
        input.power = Some(29.0);
        let n = normalize(&input);
        assert_eq!(n.power.map(|p| p.unit), Some(PowerUnit::DinHp));
    }

    #[test]
    fn infers_fuel_from_motorization_tokens() {
        assert_eq!(normalize(&listing("Clio IV dci 90")).fuel, Some(FuelType::Diesel));
        assert_eq!(normalize(&listing("308 PureTech 130")).fuel, Some(FuelType::Petrol));
        assert_eq!(normalize(&listing("Megane E-Tech")).fuel, Some(FuelType::Hybrid));
        assert_eq!(normalize(&listing("Kona inconnu")).fuel, None);
    }

    #[test]
    fn electric_shadows_petrol_tokens() {
        // "model 3" must win even with a stray petrol-looking token around
        let n = normalize(&listing("Tesla Model 3 performance gti look"));
        assert_eq!(n.fuel, Some(FuelType::Electric));
    }

    #[test]
    fn declared_fuel_wins_over_text() {
        let mut input = listing("Clio IV dci 90");
        input.fuel = Some("essence".to_string());
        assert_eq!(normalize(&input).fuel, Some(FuelType::Petrol));
    }

    #[test]
    fn extracts_generation_roman_and_digit() {
        assert_eq!(normalize(&listing("Renault Clio IV dci 90")).generation, Some(4));
        assert_eq!(normalize(&listing("Renault Clio 5 tce 100")).generation, Some(5));
        // Anchored single letters do not fire mid-text
        assert_eq!(normalize(&listing("Renault Captur boite v inconnue")).generation, None);
        assert_eq!(normalize(&listing("Golf V tsi")).generation, None); // model unknown brandless title has no brand
    }

    #[test]
    fn extracts_model_after_brand() {
        let n = normalize(&listing("Renault Clio IV dci 90"));
        assert_eq!(n.brand.as_deref(), Some("renault"));
        assert_eq!(n.model.as_deref(), Some("clio"));

        let n = normalize(&listing("Peugeot 208 PureTech 100"));
        assert_eq!(n.model.as_deref(), Some("208"));
    }

    #[test]
    fn unresolvable_fields_are_none_not_errors() {
        let n = normalize(&listing(""));
        assert_eq!(n.brand, None);
        assert_eq!(n.model, None);
        assert_eq!(n.power, None);
        assert_eq!(n.fuel, None);
        assert_eq!(n.year, None);
    }

    #[test]
    fn extracts_year_in_window() {
        assert_eq!(normalize(&listing("Clio IV 2016 dci")).year, Some(2016));
        assert_eq!(normalize(&listing("Clio 1999")).year, None);
    }

    #[test]
    fn gearbox_vote() {
        assert_eq!(normalize(&listing("308 bva eat8")).gearbox, Gearbox::Automatic);
        assert_eq!(normalize(&listing("Clio bvm5 manuelle")).gearbox, Gearbox::Manual);
        assert_eq!(normalize(&listing("Clio dci 90")).gearbox, Gearbox::Unknown);
    }
}
