//! Pipeline-level matching properties.

mod common;

use common::fixtures::*;

use enrichment_server::enrich::MatchSummary;
use enrichment_server::evidence::{ConfidenceTier, SourceCategory};
use enrichment_server::listing::ListingInput;

fn listing_with_title(title: &str) -> ListingInput {
    ListingInput {
        brand: Some("Renault".to_string()),
        model: Some("Clio".to_string()),
        title: title.to_string(),
        power: Some(90.0),
        ..Default::default()
    }
}

#[test]
fn word_order_does_not_change_the_resolution() {
    let ctx = make_context(
        vec![clio_iv_diesel(), clio_iv_petrol("clio4-tce120", 87.0, "CLIO TCe 120")],
        vec![],
        default_prices(),
    );

    let a = ctx.enricher.enrich(&listing_with_title("Clio IV dci 90ch")).unwrap();
    let b = ctx.enricher.enrich(&listing_with_title("dci 90 Clio IV")).unwrap();

    match (&a.match_summary, &b.match_summary) {
        (
            MatchSummary::Resolved { variant: va, score: sa, .. },
            MatchSummary::Resolved { variant: vb, score: sb, .. },
        ) => {
            assert_eq!(va.key, vb.key);
            assert_eq!(sa, sb, "reordered tokens must score identically");
        }
        other => panic!("expected two resolutions, got {other:?}"),
    }
}

#[test]
fn generation_level_evidence_rolls_up_with_capped_tier() {
    let rollup = |source: &str, category| {
        let mut record = fresh_record(source, category, "unused", 7.5);
        record.variant_key = None;
        record.rollup_key = Some("renault|clio|4".to_string());
        record
    };
    let ctx = make_context(
        vec![clio_iv_diesel()],
        vec![
            rollup("caradisiac", SourceCategory::Technical),
            rollup("fiabilauto", SourceCategory::UserSentiment),
            rollup("rappelconso", SourceCategory::Official),
        ],
        default_prices(),
    );

    let record = ctx.enricher.enrich(&clio_listing()).expect("enrich");
    let evidence = record.evidence.expect("evidence used");
    assert!(evidence.rolled_up);
    // Three diverse fresh sources, but rolled-up evidence stays Verified
    assert_eq!(evidence.tier, ConfidenceTier::Verified);
    assert!(record.global_score.is_some());
}
