// ============================================================
// Layer 4 — Scam Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<ScamSample>
// into one set of device tensors, one per model input:
//
//   time_series    [N, S, 4]    Float
//   features       [N, 2]       Float
//   input_ids      [N, T]       Int
//   attention_mask [N, T]       Int
//   labels         [N]          Int
//
// Every sample is already fixed-length (S steps, T tokens), so
// batching is flatten-then-reshape with no dynamic padding.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ScamSample;
use crate::domain::records::{TIME_SERIES_FEATURES, TOKENOMICS_FEATURES};

#[derive(Debug, Clone)]
pub struct ScamBatch<B: Backend> {
    pub time_series:    Tensor<B, 3>,
    pub features:       Tensor<B, 2>,
    pub input_ids:      Tensor<B, 2, Int>,
    pub attention_mask: Tensor<B, 2, Int>,
    pub labels:         Tensor<B, 1, Int>,
}

impl<B: Backend> ScamBatch<B> {
    pub fn size(&self) -> usize {
        self.labels.dims()[0]
    }
}

/// Holds the target device so tensors are created on the
/// correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct ScamBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ScamBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ScamSample, ScamBatch<B>> for ScamBatcher<B> {
    fn batch(&self, items: Vec<ScamSample>) -> ScamBatch<B> {
        let batch_size = items.len();
        let seq_len    = items[0].seq_len();
        let text_len   = items[0].input_ids.len();

        // ── Flatten every field in sample order ───────────────────────────────
        let series_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.time_series.iter().copied())
            .collect();

        let features_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features)
            .collect();

        // Burn Int tensors take i32 input
        let ids_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i32))
            .collect();

        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        // ── Create tensors and restore shapes ─────────────────────────────────
        let time_series = Tensor::<B, 1>::from_floats(series_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len, TIME_SERIES_FEATURES]);

        let features = Tensor::<B, 1>::from_floats(features_flat.as_slice(), &self.device)
            .reshape([batch_size, TOKENOMICS_FEATURES]);

        let input_ids = Tensor::<B, 1, Int>::from_ints(ids_flat.as_slice(), &self.device)
            .reshape([batch_size, text_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(mask_flat.as_slice(), &self.device)
            .reshape([batch_size, text_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ScamBatch { time_series, features, input_ids, attention_mask, labels }
    }
}
