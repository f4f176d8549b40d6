use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::extraction::SubmissionExtractor;
use super::service::{UnderwritingService, UnderwritingServiceError};

#[derive(Debug, Deserialize)]
pub(crate) struct BatchRequest {
    pub(crate) submissions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExtractRequest {
    #[serde(default)]
    pub(crate) text: String,
}

/// Router builder exposing batch assessment and free-text extraction.
pub fn underwriting_router<E>(service: Arc<UnderwritingService<E>>) -> Router
where
    E: SubmissionExtractor + 'static,
{
    Router::new()
        .route("/api/v1/underwriting/profiles", post(assess_handler::<E>))
        .route("/api/v1/underwriting/extract", post(extract_handler::<E>))
        .with_state(service)
}

pub(crate) async fn assess_handler<E>(
    State(service): State<Arc<UnderwritingService<E>>>,
    axum::Json(request): axum::Json<BatchRequest>,
) -> Response
where
    E: SubmissionExtractor + 'static,
{
    let assessment = service.assess_batch(&request.submissions);
    (StatusCode::OK, axum::Json(assessment)).into_response()
}

pub(crate) async fn extract_handler<E>(
    State(service): State<Arc<UnderwritingService<E>>>,
    axum::Json(request): axum::Json<ExtractRequest>,
) -> Response
where
    E: SubmissionExtractor + 'static,
{
    match service.assess_text(&request.text).await {
        Ok(assessment) => (StatusCode::OK, axum::Json(assessment)).into_response(),
        Err(error @ UnderwritingServiceError::EmptyText) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}
