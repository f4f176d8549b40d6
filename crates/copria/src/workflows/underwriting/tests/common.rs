use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};

use crate::workflows::underwriting::extraction::SubmissionExtractor;
use crate::workflows::underwriting::{
    NormalizerConfig, ProfileNormalizer, RuleSet, Schema, UnderwritingService,
};

pub(super) fn schema() -> Schema {
    serde_json::from_value(json!({
        "Property Information": [
            "Property Name",
            "Property Address",
            "State",
            "Year Built",
            "Total TIV"
        ],
        "COPE": [
            "Construction Type",
            "Occupancy Type",
            "Number of Stories",
            "Roof > 20 yrs",
            "Sprinkler System (Y/N)",
            "Fire Alarm (Y/N)"
        ],
        "Natural Hazards": [
            "Flood Zone (e.g., Zone X, AE)",
            "Earthquake Exposure (Low/Moderate/High or ShakeMap Zone)",
            "Wildfire Risk (Low/Moderate/High or ISO Class)"
        ],
        "Loss History": ["Prior Claims (Y/N)", "Total Loss Amount"],
        "Risk Factors": ["Hazardous Materials (Y/N)"]
    }))
    .expect("fixture schema")
}

pub(super) fn rules() -> RuleSet {
    RuleSet::from_values(vec![
        json!({
            "field": "Sprinkler System (Y/N)",
            "condition": "Sprinkler System (Y/N) == \"No\"",
            "description": "No sprinkler system"
        }),
        json!({
            "field": "Flood Zone (e.g., Zone X, AE)",
            "condition": "Flood Zone (e.g., Zone X, AE) contains 'AE' or 'VE' or 'A'",
            "description": "High-risk flood zone"
        }),
        json!({
            "field": "Number of Stories",
            "condition": "Number of Stories > 1",
            "description": "Multi-story building"
        }),
        json!({
            "field": "Prior Claims (Y/N)",
            "condition": "Prior Claims (Y/N) == \"Yes\" and Total Loss Amount > 100000",
            "description": "Large prior losses"
        }),
    ])
}

/// Extractor returning a canned payload and recording the text it was given.
#[derive(Default)]
pub(super) struct FakeExtractor {
    payload: Value,
    calls: Mutex<Vec<String>>,
}

impl FakeExtractor {
    pub(super) fn returning(payload: Value) -> Self {
        Self {
            payload,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("extractor mutex poisoned").clone()
    }
}

impl SubmissionExtractor for FakeExtractor {
    async fn extract(&self, text: &str, _schema: &Schema) -> Value {
        self.calls
            .lock()
            .expect("extractor mutex poisoned")
            .push(text.to_string());
        self.payload.clone()
    }
}

pub(super) fn build_service(extractor: FakeExtractor) -> UnderwritingService<FakeExtractor> {
    service_with(Arc::new(extractor))
}

pub(super) fn service_with(extractor: Arc<FakeExtractor>) -> UnderwritingService<FakeExtractor> {
    UnderwritingService::new(
        Arc::new(schema()),
        Arc::new(rules()),
        ProfileNormalizer::new(NormalizerConfig {
            reference_year: 2025,
        }),
        extractor,
    )
}

pub(super) async fn response_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json body")
}
