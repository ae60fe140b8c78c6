// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application and API layers program against these traits,
// never against the concrete CSV loaders or the Burn inferencer.
// That keeps the HTTP handlers testable with a stub scorer and
// lets a new data source slot in without touching the pipeline.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::records::ScoringInput;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can load a full table of records.
///
/// Implementations:
///   - TokenomicsLoader → labelled rows from the rugpull CSV
///   - TimeSeriesLoader → activity rows from the time-series CSV
///   - ContractLoader   → contract texts from the JSON map
pub trait RecordSource<T> {
    fn load_all(&self) -> Result<Vec<T>>;
}

// ─── ScamScorer ───────────────────────────────────────────────────────────────
/// Any component that can turn one joined input into a
/// scam probability in [0, 1].
///
/// Send + Sync so a single scorer can be shared by every
/// request handler behind an `Arc`.
pub trait ScamScorer: Send + Sync {
    fn score(&self, input: &ScoringInput) -> Result<f32>;
}
