// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence and external formats used by several layers:
//
//   checkpoint.rs      — Model weights via CompactRecorder plus
//                        the JSON side files (configs, normalizer,
//                        epoch pointers) inference needs to rebuild
//                        the model.
//
//   tokenizer_store.rs — Keeps the contract tokenizer next to the
//                        checkpoints, preparing it from the
//                        pretrained vocabulary on first use.
//
//   pretrained.rs      — HuggingFace config.json and PyTorch
//                        weights → the frozen text encoder.
//
//   metrics.rs         — Per-epoch metrics appended to a CSV file.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer preparation, saving, and loading
pub mod tokenizer_store;

/// Pretrained encoder import
pub mod pretrained;

/// Training metrics CSV logger
pub mod metrics;
