use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

pub fn create_router(state: AppState) -> Router {
    // The dashboard is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/predict", post(handlers::predict))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::records::ScoringInput;
    use crate::domain::traits::ScamScorer;

    /// Returns a fixed probability, or fails when asked to.
    struct StubScorer {
        fail: bool,
    }

    impl ScamScorer for StubScorer {
        fn score(&self, input: &ScoringInput) -> Result<f32> {
            if self.fail {
                anyhow::bail!("model unavailable");
            }
            Ok(if input.contract_text.contains("rug") { 0.9 } else { 0.1 })
        }
    }

    fn app(fail: bool) -> Router {
        create_router(AppState::new(Arc::new(StubScorer { fail })))
    }

    async fn post_predict(app: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let resp = app(false)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_predict_returns_probability() {
        let (status, json) = post_predict(
            app(false),
            r#"{"time_series": [[1,2,3,4]], "csv_data": [0.1, 0.2], "contract_text": "rug pull"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let p = json["scam_probability"].as_f64().unwrap();
        assert!((p - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_predict_missing_field_is_400() {
        let (status, json) = post_predict(
            app(false),
            r#"{"time_series": [[1,2,3,4]], "contract_text": "x"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing required data");
    }

    #[tokio::test]
    async fn test_predict_bad_shape_is_400() {
        let (status, json) = post_predict(
            app(false),
            r#"{"time_series": [[1,2,3]], "csv_data": [0, 0], "contract_text": ""}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("expected 4"));
    }

    #[tokio::test]
    async fn test_predict_malformed_json_is_400() {
        let (status, json) = post_predict(app(false), r#"{"time_series": "#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_scorer_failure_is_500() {
        let (status, json) = post_predict(
            app(true),
            r#"{"time_series": [], "csv_data": [0, 0], "contract_text": ""}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
    }
}
