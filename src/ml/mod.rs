// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds, trains or runs the network lives here.
//
//   backend.rs      — Wgpu / NdArray selection (feature `cpu`)
//
//   text_encoder.rs — RoBERTa-style encoder for contract text
//                     • token + position embeddings
//                     • post-LN self-attention layers (GELU FFN)
//                     • <s> embedding as the sequence summary
//
//   model.rs        — Hybrid scam classifier
//                     • stacked LSTM over the activity series
//                     • two-layer MLP over price/volume
//                     • frozen text encoder + trainable projection
//                     • fusion head → one logit per sample
//
//   trainer.rs      — Adam + BCE loop, validation, best/epoch
//                     checkpoints, final test evaluation
//
//   inferencer.rs   — Loads a checkpoint and scores one input
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Hochreiter & Schmidhuber (1997) LSTM
//            Liu et al. (2019) RoBERTa

pub mod backend;

/// RoBERTa-compatible transformer encoder
pub mod text_encoder;

/// Hybrid LSTM + MLP + text model
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Inference engine
pub mod inferencer;
