use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::underwriting::router::{extract_handler, ExtractRequest};
use crate::workflows::underwriting::underwriting_router;

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request")
}

#[tokio::test]
async fn profiles_route_returns_assessment() {
    let router = underwriting_router(Arc::new(build_service(FakeExtractor::default())));

    let response = router
        .oneshot(post_json(
            "/api/v1/underwriting/profiles",
            json!({
                "submissions": [
                    { "Property Name": "Dock 7", "Fire Protection": "sprinklers and alarm" },
                    { "Property Name": "Dock 8", "Number of Stories": "4" }
                ]
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["profiles"][0]["Property Name"], "Dock 7");
    assert_eq!(body["profiles"][0]["Red Flags"], json!([]));
    assert_eq!(
        body["profiles"][1]["Red Flags"],
        json!(["No sprinkler system", "Multi-story building"])
    );
    assert_eq!(body["summary"]["properties_assessed"], 2);
    assert_eq!(body["summary"]["properties_with_flags"], 1);
    assert!(body["assessed_at"].is_string());
}

#[tokio::test]
async fn profiles_route_rejects_payload_without_submissions() {
    let router = underwriting_router(Arc::new(build_service(FakeExtractor::default())));

    let response = router
        .oneshot(post_json(
            "/api/v1/underwriting/profiles",
            json!({ "submission": {} }),
        ))
        .await
        .expect("response");

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn extract_route_returns_profile() {
    let extractor = FakeExtractor::returning(json!({ "State": "FL", "Prior Claims (Y/N)": "Yes" }));
    let service = Arc::new(build_service(extractor));
    let router = underwriting_router(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/underwriting/extract",
            json!({ "text": "Coastal retail strip in Florida with prior claims." }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["profile"]["State"], "FL");
    assert_eq!(body["profile"]["Prior Claims (Y/N)"], "Yes");
    assert!(body.get("extraction_error").is_none());
}

#[tokio::test]
async fn extract_handler_rejects_empty_text() {
    let service = Arc::new(build_service(FakeExtractor::default()));

    let response = extract_handler::<FakeExtractor>(
        State(service),
        axum::Json(ExtractRequest {
            text: String::new(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["error"], "submission text is empty");
}
