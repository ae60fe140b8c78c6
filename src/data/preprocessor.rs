// ============================================================
// Layer 4 — Preprocessor
// ============================================================
// Turns raw records into the fixed shapes the model consumes:
//
//   Normalizer        price/volume → z-scores (fit once on the
//                     full tokenomics table, persisted for reuse)
//   group_series      activity rows → per-symbol, date-ordered steps
//   fit_sequence      any number of steps → exactly `seq_len` steps
//                     (zero-pad at the end, or keep the most recent)
//   ContractEncoder   contract text → fixed-length token ids + mask
//                     in RoBERTa layout: <s> ids... </s> <pad>...
//
// Every function here is deterministic and burn-free so the
// training pipeline and the inference path share it verbatim.
//
// Reference: Rust Book §8 (Collections), §13 (Iterators)

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokenizers::Tokenizer;

use crate::domain::records::{
    TimeSeriesPoint, TokenomicsRecord, NO_CONTRACT_TEXT, TIME_SERIES_FEATURES,
    TOKENOMICS_FEATURES,
};

// ─── Normalizer ───────────────────────────────────────────────────────────────
/// Per-column z-score statistics for the tokenomics features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    pub mean: [f64; TOKENOMICS_FEATURES],
    pub std:  [f64; TOKENOMICS_FEATURES],
}

impl Normalizer {
    /// Fit mean and sample standard deviation (n - 1) per column.
    /// A column with fewer than two rows or zero spread gets std 1.0
    /// so normalised values stay finite.
    pub fn fit(records: &[TokenomicsRecord]) -> Self {
        let n = records.len();
        let mut mean = [0.0f64; TOKENOMICS_FEATURES];
        let mut std  = [1.0f64; TOKENOMICS_FEATURES];

        if n == 0 {
            return Self { mean, std };
        }

        for r in records {
            for (m, x) in mean.iter_mut().zip(r.features()) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n as f64);

        if n > 1 {
            let mut sq = [0.0f64; TOKENOMICS_FEATURES];
            for r in records {
                for (i, x) in r.features().into_iter().enumerate() {
                    sq[i] += (x - mean[i]).powi(2);
                }
            }
            for (s, total) in std.iter_mut().zip(sq) {
                let sd = (total / (n - 1) as f64).sqrt();
                *s = if sd.is_finite() && sd > f64::EPSILON { sd } else { 1.0 };
            }
        }

        Self { mean, std }
    }

    pub fn apply(&self, features: [f64; TOKENOMICS_FEATURES]) -> [f64; TOKENOMICS_FEATURES] {
        let mut out = features;
        for (i, x) in out.iter_mut().enumerate() {
            *x = (*x - self.mean[i]) / self.std[i];
        }
        out
    }

    /// Rewrite price and volume of every record in place.
    pub fn normalize_all(&self, records: &mut [TokenomicsRecord]) {
        for r in records.iter_mut() {
            let [price, volume] = self.apply(r.features());
            r.price  = price;
            r.volume = volume;
        }
    }
}

// ─── Time series shaping ──────────────────────────────────────────────────────

/// Group activity rows by symbol, each group ordered by date.
pub fn group_series(points: Vec<TimeSeriesPoint>) -> HashMap<String, Vec<[f32; TIME_SERIES_FEATURES]>> {
    let mut by_symbol: HashMap<String, Vec<TimeSeriesPoint>> = HashMap::new();
    for p in points {
        by_symbol.entry(p.symbol.clone()).or_default().push(p);
    }

    by_symbol
        .into_iter()
        .map(|(symbol, mut rows)| {
            // stable: same-date rows keep file order
            rows.sort_by(|a, b| a.date.cmp(&b.date));
            (symbol, rows.iter().map(TimeSeriesPoint::values).collect())
        })
        .collect()
}

/// Bring a sequence to exactly `seq_len` steps.
///
/// Shorter input is zero-padded at the end; longer input keeps
/// the last `seq_len` (most recent) steps. Empty input yields
/// an all-zero sequence.
pub fn fit_sequence(
    steps:   &[[f32; TIME_SERIES_FEATURES]],
    seq_len: usize,
) -> Vec<[f32; TIME_SERIES_FEATURES]> {
    let tail = &steps[steps.len().saturating_sub(seq_len)..];
    let mut out = tail.to_vec();
    out.resize(seq_len, [0.0; TIME_SERIES_FEATURES]);
    out
}

// ─── Contract text ────────────────────────────────────────────────────────────

pub fn contract_text_or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() { NO_CONTRACT_TEXT } else { text }
}

/// Fixed-length token ids plus attention mask for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedText {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
}

/// Wraps a subword tokenizer with RoBERTa framing and
/// fixed-length truncation/padding.
#[derive(Clone)]
pub struct ContractEncoder {
    tokenizer: Tokenizer,
    max_len:   usize,
    cls_id:    u32,
    sep_id:    u32,
    pad_id:    u32,
}

impl ContractEncoder {
    pub fn new(tokenizer: Tokenizer, max_len: usize) -> Result<Self> {
        if max_len < 2 {
            return Err(anyhow!("max_len must leave room for <s> and </s> (got {max_len})"));
        }
        // Fall back to the RoBERTa vocabulary ids when a token is absent
        let cls_id = tokenizer.token_to_id("<s>").unwrap_or(0);
        let pad_id = tokenizer.token_to_id("<pad>").unwrap_or(1);
        let sep_id = tokenizer.token_to_id("</s>").unwrap_or(2);
        Ok(Self { tokenizer, max_len, cls_id, sep_id, pad_id })
    }

    /// <s> + first (max_len - 2) subword ids + </s>, padded to max_len.
    pub fn encode(&self, text: &str) -> Result<EncodedText> {
        let enc = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;

        let body = enc.get_ids();
        let body = &body[..body.len().min(self.max_len - 2)];

        let mut input_ids = Vec::with_capacity(self.max_len);
        input_ids.push(self.cls_id);
        input_ids.extend_from_slice(body);
        input_ids.push(self.sep_id);

        let mut attention_mask = vec![1u32; input_ids.len()];
        input_ids.resize(self.max_len, self.pad_id);
        attention_mask.resize(self.max_len, 0);

        Ok(EncodedText { input_ids, attention_mask })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn rec(price: f64, volume: f64) -> TokenomicsRecord {
        TokenomicsRecord::new("X", price, volume, false)
    }

    #[test]
    fn test_normalized_columns_have_zero_mean_unit_std() {
        let mut records = vec![rec(1.0, 10.0), rec(2.0, 20.0), rec(3.0, 60.0), rec(6.0, 10.0)];
        let norm = Normalizer::fit(&records);
        norm.normalize_all(&mut records);

        for col in 0..2 {
            let xs: Vec<f64> = records.iter().map(|r| r.features()[col]).collect();
            let mean = xs.iter().sum::<f64>() / xs.len() as f64;
            let var  = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
            assert!(mean.abs() < 1e-9);
            assert!((var.sqrt() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_constant_column_stays_finite() {
        let mut records = vec![rec(5.0, 1.0), rec(5.0, 2.0)];
        let norm = Normalizer::fit(&records);
        norm.normalize_all(&mut records);
        assert_eq!(records[0].price, 0.0);
        assert_eq!(records[1].price, 0.0);
        assert!(records.iter().all(|r| r.volume.is_finite()));
    }

    #[test]
    fn test_single_row_normalizer() {
        let norm = Normalizer::fit(&[rec(4.0, 8.0)]);
        assert_eq!(norm.std, [1.0, 1.0]);
        assert_eq!(norm.apply([4.0, 8.0]), [0.0, 0.0]);
    }

    #[test]
    fn test_short_sequence_is_padded_at_end() {
        let steps = vec![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]];
        let out   = fit_sequence(&steps, 10);
        assert_eq!(out.len(), 10);
        assert_eq!(out[0], [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out[1], [5.0, 6.0, 7.0, 8.0]);
        assert!(out[2..].iter().all(|s| *s == [0.0; 4]));
    }

    #[test]
    fn test_long_sequence_keeps_most_recent() {
        let steps: Vec<[f32; 4]> = (0..15).map(|i| [i as f32; 4]).collect();
        let out = fit_sequence(&steps, 10);
        assert_eq!(out.len(), 10);
        assert_eq!(out[0], [5.0; 4]);
        assert_eq!(out[9], [14.0; 4]);
    }

    #[test]
    fn test_missing_sequence_is_all_zero() {
        let out = fit_sequence(&[], 10);
        assert_eq!(out, vec![[0.0; 4]; 10]);
    }

    #[test]
    fn test_group_series_orders_by_date() {
        let point = |symbol: &str, date: &str, v: f32| TimeSeriesPoint {
            symbol: symbol.into(),
            date: date.into(),
            tx_count: v,
            total_volume: v,
            unique_senders: v,
            unique_receivers: v,
        };
        let grouped = group_series(vec![
            point("A", "2024-03-01", 3.0),
            point("B", "2024-01-01", 9.0),
            point("A", "2024-01-01", 1.0),
            point("A", "2024-02-01", 2.0),
        ]);
        assert_eq!(grouped["A"], vec![[1.0; 4], [2.0; 4], [3.0; 4]]);
        assert_eq!(grouped["B"].len(), 1);
    }

    #[test]
    fn test_placeholder_for_blank_text() {
        assert_eq!(contract_text_or_placeholder("   \n"), NO_CONTRACT_TEXT);
        assert_eq!(contract_text_or_placeholder("pragma solidity"), "pragma solidity");
    }
}
