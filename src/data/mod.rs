// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw input files to device-ready batches.
//
//   rugpull CSV ──► TokenomicsLoader ──► Normalizer ───────┐
//   activity CSV ─► TimeSeriesLoader ──► group_series ─────┤
//   contracts JSON► ContractLoader ────► ContractEncoder ──┤
//                                                          ▼
//                                              build_samples (join on symbol)
//                                                          │
//                                                          ▼
//                                     split_three_way → ScamDataset
//                                                          │
//                                                          ▼
//                                             ScamBatcher → DataLoader
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads the tokenomics CSV, time-series CSV and contract JSON
pub mod loader;

/// Normalization, sequence fitting and contract text encoding
pub mod preprocessor;

/// Implements Burn's Dataset trait for joined samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded train/validation/test split
pub mod splitter;
