// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load tokenomics rows           (Layer 4 - data)
//   Step 2: Fit + apply the normalizer     (Layer 4 - data)
//   Step 3: Load and group time series     (Layer 4 - data)
//   Step 4: Load contract texts            (Layer 4 - data)
//   Step 5: Prepare the tokenizer          (Layer 6 - infra)
//   Step 6: Build samples                  (Layer 4 - data)
//   Step 7: Split train/validation/test    (Layer 4 - data)
//   Step 8: Save configs for inference     (Layer 6 - infra)
//   Step 9: Run training loop              (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};

use crate::data::{
    dataset::{build_samples, ScamDataset},
    loader::{ContractLoader, TimeSeriesLoader, TokenomicsLoader},
    preprocessor::{group_series, ContractEncoder, Normalizer},
    splitter::split_three_way,
};
use crate::domain::traits::RecordSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    pretrained::load_encoder_config,
    tokenizer_store::TokenizerStore,
};
use crate::ml::model::HybridModelConfig;
use crate::ml::text_encoder::TextEncoderConfig;
use crate::ml::trainer::{run_training, TrainData, TrainingSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// Input paths and hyperparameters for a training run.
// Saved next to the checkpoints so inference shapes its inputs
// exactly the way training did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub tokenomics_csv:    String,
    pub time_series_csv:   String,
    pub contracts_json:    String,
    pub pretrained_dir:    String,
    pub checkpoint_dir:    String,
    pub seq_len:           usize,
    pub max_text_len:      usize,
    pub batch_size:        usize,
    pub epochs:            usize,
    pub lr:                f64,
    pub rnn_hidden_size:   usize,
    pub rnn_layers:        usize,
    pub fnn_hidden_size:   usize,
    pub final_hidden_size: usize,
    pub dropout:           f64,
    pub train_fraction:    f64,
    pub val_fraction:      f64,
    pub seed:              u64,
    pub log_every:         usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            tokenomics_csv:    "rugpullD2.csv".to_string(),
            time_series_csv:   "time_series_data_checkpoint_cleaned.csv".to_string(),
            contracts_json:    "ethereum_contracts_filtered.json".to_string(),
            pretrained_dir:    "models/codebert-base".to_string(),
            checkpoint_dir:    "checkpoints".to_string(),
            seq_len:           10,
            max_text_len:      512,
            batch_size:        16,
            epochs:            10,
            lr:                1e-3,
            rnn_hidden_size:   64,
            rnn_layers:        2,
            fnn_hidden_size:   64,
            final_hidden_size: 32,
            dropout:           0.2,
            train_fraction:    0.7,
            val_fraction:      0.15,
            seed:              42,
            log_every:         5,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.seq_len == 0 {
            anyhow::bail!("seq_len must be at least 1");
        }
        if self.max_text_len < 2 {
            anyhow::bail!("max_text_len must be at least 2");
        }
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be at least 1");
        }
        let fractions = self.train_fraction + self.val_fraction;
        if self.train_fraction <= 0.0 || self.val_fraction < 0.0 || fractions > 1.0 {
            anyhow::bail!(
                "invalid split fractions: train={} val={}",
                self.train_fraction,
                self.val_fraction
            );
        }
        Ok(())
    }

    /// RoBERTa positions run from pad_token_id + 1, so the text
    /// length is bounded by the encoder's position table.
    pub fn check_encoder_fit(&self, encoder: &TextEncoderConfig) -> Result<()> {
        let longest = encoder.max_text_len();
        if self.max_text_len > longest {
            anyhow::bail!(
                "max_text_len {} exceeds the encoder limit of {} tokens \
                 (max_position_embeddings {}, pad_token_id {})",
                self.max_text_len,
                longest,
                encoder.max_position_embeddings,
                encoder.pad_token_id,
            );
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        let pretrained_dir = Path::new(&cfg.pretrained_dir);
        let encoder_cfg = load_encoder_config(pretrained_dir)?;
        cfg.check_encoder_fit(&encoder_cfg)?;

        // ── Step 1: Load tokenomics rows ──────────────────────────────────────
        tracing::info!("Loading tokenomics from '{}'", cfg.tokenomics_csv);
        let mut records = TokenomicsLoader::new(&cfg.tokenomics_csv).load_all()?;
        let positives = records.iter().filter(|r| r.was_rekt).count();
        tracing::info!("Loaded {} tokens ({} labelled as scams)", records.len(), positives);

        // ── Step 2: Normalise price/volume ────────────────────────────────────
        // Statistics come from the whole table and are persisted so
        // callers can apply the same transform before scoring.
        let normalizer = Normalizer::fit(&records);
        normalizer.normalize_all(&mut records);
        tracing::debug!("Normalizer: mean={:?} std={:?}", normalizer.mean, normalizer.std);

        // ── Step 3: Time series ───────────────────────────────────────────────
        tracing::info!("Loading time series from '{}'", cfg.time_series_csv);
        let series = group_series(TimeSeriesLoader::new(&cfg.time_series_csv).load_all()?);
        tracing::info!("Time series available for {} symbols", series.len());

        // ── Step 4: Contract texts ────────────────────────────────────────────
        tracing::info!("Loading contracts from '{}'", cfg.contracts_json);
        let contracts: HashMap<String, String> = ContractLoader::new(&cfg.contracts_json)
            .load_all()?
            .into_iter()
            .map(|c| (c.symbol, c.text))
            .collect();
        tracing::info!("Loaded {} contract entries", contracts.len());

        // ── Step 5: Tokenizer ─────────────────────────────────────────────────
        let tokenizer = TokenizerStore::new(&cfg.checkpoint_dir).load_or_build(pretrained_dir)?;
        let encoder   = ContractEncoder::new(tokenizer, cfg.max_text_len)?;

        // ── Step 6: Build samples ─────────────────────────────────────────────
        let samples = build_samples(&records, &series, &contracts, &encoder, cfg.seq_len)?;
        tracing::info!("Built {} samples", samples.len());

        // ── Step 7: Train / validation / test split ───────────────────────────
        let splits = split_three_way(samples, cfg.train_fraction, cfg.val_fraction, cfg.seed);
        tracing::info!(
            "Split: {} train, {} validation, {} test",
            splits.train.len(),
            splits.val.len(),
            splits.test.len(),
        );

        let data = TrainData {
            train: ScamDataset::new(splits.train),
            val:   ScamDataset::new(splits.val),
            test:  ScamDataset::new(splits.test),
        };
        tracing::info!("Training set has {} positive samples", data.train.positive_count());

        // ── Step 8: Save configs for inference ────────────────────────────────
        let model_cfg = HybridModelConfig::new(encoder_cfg)
            .with_rnn_hidden_size(cfg.rnn_hidden_size)
            .with_rnn_layers(cfg.rnn_layers)
            .with_fnn_hidden_size(cfg.fnn_hidden_size)
            .with_final_hidden_size(cfg.final_hidden_size)
            .with_dropout(cfg.dropout);

        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt.save_config(cfg)?;
        ckpt.save_model_config(&model_cfg)?;
        ckpt.save_normalizer(&normalizer)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 9: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, &model_cfg, data, &ckpt, &metrics)
    }
}
