use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::api::error::AppError;
use crate::api::request::{PredictRequest, PredictResponse};
use crate::api::AppState;

/// POST /predict — Score one token.
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let input = request.into_input()?;

    // Forward passes are CPU/GPU bound; keep them off the async workers
    let scorer = state.scorer.clone();
    let scam_probability = tokio::task::spawn_blocking(move || scorer.score(&input))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    tracing::info!("Scored request: p={:.4}", scam_probability);
    Ok(Json(PredictResponse { scam_probability }))
}

/// GET /health — Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
