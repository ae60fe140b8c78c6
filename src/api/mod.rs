// ============================================================
// Layer 1 — HTTP API
// ============================================================
// A small axum service in front of one shared scorer:
//
//   POST /predict  → {"scam_probability": p}
//   GET  /health   → {"status": "ok"}
//
//   error.rs     — AppError → JSON error bodies with status codes
//   request.rs   — request body + validation into ScoringInput
//   handlers.rs  — async handlers; scoring runs on a blocking thread
//   router.rs    — routes, CORS and request tracing
//
// Reference: axum 0.7 documentation

pub mod error;
pub mod handlers;
pub mod request;
pub mod router;

use std::sync::Arc;

use crate::domain::traits::ScamScorer;

/// Shared by every handler. Cloning only bumps the Arc.
#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<dyn ScamScorer>,
}

impl AppState {
    pub fn new(scorer: Arc<dyn ScamScorer>) -> Self {
        Self { scorer }
    }
}
