use super::common::*;
use serde_json::json;
use std::sync::Arc;

use crate::workflows::underwriting::extraction::{failure_payload, ExtractionError};
use crate::workflows::underwriting::normalizer::fields;
use crate::workflows::underwriting::UnderwritingServiceError;

#[test]
fn batch_keeps_order_and_counts_flags() {
    let service = build_service(FakeExtractor::default());
    let submissions = vec![
        json!({ "Property Name": "North", "Fire Protection": "sprinklers", "Number of Stories": 1 }),
        json!({ "Property Name": "South", "Number of Stories": "Two-story" }),
        json!({ "Property Name": "East", "Natural Hazard Exposure": "Zone AE" }),
    ];

    let assessment = service.assess_batch(&submissions);

    let names: Vec<String> = assessment
        .profiles
        .iter()
        .map(|profile| profile.text("Property Name"))
        .collect();
    assert_eq!(names, ["North", "South", "East"]);
    assert!(!assessment.profiles[0].has_red_flags());
    assert_eq!(
        assessment.profiles[1].red_flags(),
        ["No sprinkler system", "Multi-story building"]
    );
    assert_eq!(
        assessment.profiles[2].red_flags(),
        ["No sprinkler system", "High-risk flood zone"]
    );

    let summary = &assessment.summary;
    assert_eq!(summary.properties_assessed, 3);
    assert_eq!(summary.properties_with_flags, 2);
    assert_eq!(summary.total_flags, 4);
    assert_eq!(summary.count_for("No sprinkler system"), 2);
}

#[test]
fn assess_matches_batch_of_one() {
    let service = build_service(FakeExtractor::default());
    let submission = json!({ "Prior Claims (Y/N)": "Yes", "Total Loss Amount": 150000 });

    let single = service.assess(&submission);
    let batch = service.assess_batch(std::slice::from_ref(&submission));

    assert_eq!(batch.profiles, vec![single.clone()]);
    assert!(single.red_flags().contains(&"Large prior losses".to_string()));
}

#[tokio::test]
async fn text_assessment_runs_extracted_fields_through_the_pipeline() {
    let extractor = FakeExtractor::returning(json!({
        "Property Name": "Riverside Cold Storage",
        "Number of Stories": "Two-story",
        "Sprinkler System (Y/N)": "Yes",
        "Flood Zone (e.g., Zone X, AE)": "AE"
    }));
    let extractor = Arc::new(extractor);
    let service = service_with(extractor.clone());
    let text = "Two-story cold storage facility in Zone AE, fully sprinklered.";

    let assessment = service.assess_text(text).await.expect("text assessed");

    assert_eq!(extractor.calls(), [text]);

    assert_eq!(assessment.extraction_error, None);
    assert_eq!(assessment.profile.text("Property Name"), "Riverside Cold Storage");
    assert_eq!(assessment.profile.text(fields::SPRINKLER_SYSTEM), "Yes");
    assert_eq!(
        assessment.profile.red_flags(),
        ["High-risk flood zone", "Multi-story building"]
    );
}

#[tokio::test]
async fn failed_extraction_still_yields_a_default_profile() {
    let service = build_service(FakeExtractor::returning(failure_payload(
        &ExtractionError::EmptyCompletion,
    )));

    let assessment = service
        .assess_text("Warehouse, details to follow")
        .await
        .expect("text assessed");

    assert_eq!(
        assessment.extraction_error.as_deref(),
        Some("LLM extraction failed: provider returned no completion")
    );
    assert_eq!(assessment.profile, service.assess(&json!({})));
}

#[tokio::test]
async fn blank_text_is_rejected_before_extraction() {
    let extractor = Arc::new(FakeExtractor::default());
    let service = service_with(extractor.clone());

    let error = service.assess_text("  \n ").await.expect_err("blank text");

    assert!(matches!(error, UnderwritingServiceError::EmptyText));
    assert!(extractor.calls().is_empty());
}
