//! Token-order-insensitive text similarity.
//!
//! Listings reorder words freely ("Clio IV dci 90ch" vs "dci 90 Clio IV"),
//! so the re-ranking measure works on token sets: the two texts are split
//! into words, and the similarity is the best edit-distance ratio among the
//! sorted intersection/difference recombinations. A text whose tokens are a
//! subset of the other's scores 100.

use std::collections::BTreeSet;
use unicode_segmentation::UnicodeSegmentation;

use super::levenshtein::similarity_ratio;

/// Tokenize for similarity: unicode words, with power suffixes stripped so
/// "90ch" and "90 ch" and a bare "90" all land on the same token.
fn tokens(text: &str) -> BTreeSet<String> {
    text.unicode_words()
        .map(|w| {
            let lower = w.to_lowercase();
            strip_power_suffix(&lower).unwrap_or(lower)
        })
        .collect()
}

fn strip_power_suffix(token: &str) -> Option<String> {
    for suffix in ["ch", "cv", "hp"] {
        if let Some(stem) = token.strip_suffix(suffix) {
            if !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()) {
                return Some(stem.to_string());
            }
        }
    }
    None
}

/// Token-set similarity on a 0-100 scale.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = tokens(a);
    let tokens_b = tokens(b);
    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 100.0;
    }
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a
        .intersection(&tokens_b)
        .map(String::as_str)
        .collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).map(String::as_str).collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).map(String::as_str).collect();

    let base = intersection.join(" ");
    let combined_a = join_parts(&base, &only_a);
    let combined_b = join_parts(&base, &only_b);

    similarity_ratio(&base, &combined_a)
        .max(similarity_ratio(&base, &combined_b))
        .max(similarity_ratio(&combined_a, &combined_b))
}

fn join_parts(base: &str, rest: &[&str]) -> String {
    if rest.is_empty() {
        return base.to_string();
    }
    if base.is_empty() {
        return rest.join(" ");
    }
    format!("{} {}", base, rest.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_order_does_not_matter() {
        let a = token_set_ratio("clio iv dci 90ch", "renault clio iv diesel 90ch dci 90");
        let b = token_set_ratio("dci 90 clio iv", "renault clio iv diesel 90ch dci 90");
        assert_eq!(a, b);
    }

    #[test]
    fn subset_scores_full_marks() {
        // All listing tokens appear in the candidate text
        let score = token_set_ratio("clio iv dci 90", "renault clio iv diesel 90ch dci energy");
        assert_eq!(score, 100.0);
    }

    #[test]
    fn power_suffix_is_normalized() {
        assert_eq!(token_set_ratio("dci 90ch", "dci 90"), 100.0);
        assert_eq!(token_set_ratio("130cv", "130"), 100.0);
        // Not a power token: suffix stays
        assert!(token_set_ratio("march", "mar") < 100.0);
    }

    #[test]
    fn disjoint_texts_score_low() {
        let score = token_set_ratio("clio iv dci", "passat tdi combi");
        assert!(score < 50.0, "got {score}");
    }

    #[test]
    fn identical_texts_score_100() {
        assert_eq!(token_set_ratio("golf vii tsi 110", "golf vii tsi 110"), 100.0);
        assert_eq!(token_set_ratio("", ""), 100.0);
        assert_eq!(token_set_ratio("golf", ""), 0.0);
    }
}
