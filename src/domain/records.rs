// ============================================================
// Layer 3 — Token Records
// ============================================================
// One struct per input source, all keyed by the token symbol:
//
//   TokenomicsRecord  ← rugpull CSV   (price, volume, label)
//   TimeSeriesPoint   ← activity CSV  (one row per symbol per date)
//   ContractRecord    ← contracts JSON (free-form source text)
//
// plus ScoringInput, the already-joined shape a single
// prediction request arrives in.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// Number of numeric features per time-series step:
/// tx_count, total_volume, unique_senders, unique_receivers
pub const TIME_SERIES_FEATURES: usize = 4;

/// Number of scalar tokenomics features: price, volume
pub const TOKENOMICS_FEATURES: usize = 2;

/// Text substituted for a token with no (or blank) contract source
pub const NO_CONTRACT_TEXT: &str = "No contract data available";

/// One labelled row of the tokenomics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenomicsRecord {
    pub symbol:   String,
    pub price:    f64,
    pub volume:   f64,
    /// Outcome label: true when the token turned out to be a rug pull
    pub was_rekt: bool,
}

impl TokenomicsRecord {
    pub fn new(symbol: impl Into<String>, price: f64, volume: f64, was_rekt: bool) -> Self {
        Self { symbol: symbol.into(), price, volume, was_rekt }
    }

    /// The scalar pair fed to the feature branch, in column order
    pub fn features(&self) -> [f64; TOKENOMICS_FEATURES] {
        [self.price, self.volume]
    }

    pub fn label(&self) -> u8 {
        u8::from(self.was_rekt)
    }
}

/// One day of on-chain activity for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub symbol:           String,
    /// ISO date string; ordering is lexicographic
    pub date:             String,
    pub tx_count:         f32,
    pub total_volume:     f32,
    pub unique_senders:   f32,
    pub unique_receivers: f32,
}

impl TimeSeriesPoint {
    pub fn values(&self) -> [f32; TIME_SERIES_FEATURES] {
        [self.tx_count, self.total_volume, self.unique_senders, self.unique_receivers]
    }
}

/// Contract source text (or metadata) for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub symbol: String,
    pub text:   String,
}

/// Everything needed to score one token, already joined.
///
/// `time_series` may have any number of steps; it is fitted to
/// the trained sequence length before the forward pass.
/// `features` are expected to be normalized the same way as
/// the training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringInput {
    pub time_series:   Vec<[f32; TIME_SERIES_FEATURES]>,
    pub features:      [f32; TOKENOMICS_FEATURES],
    pub contract_text: String,
}
