// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// GPU (wgpu) by default; `--features cpu` swaps in NdArray for
// machines without a usable adapter. Training wraps the same
// backend in Autodiff.

#[cfg(not(feature = "cpu"))]
pub type InferBackend = burn::backend::Wgpu;

#[cfg(feature = "cpu")]
pub type InferBackend = burn::backend::NdArray;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;
