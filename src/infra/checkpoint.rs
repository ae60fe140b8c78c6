// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores everything a later `predict`/`serve` run
// needs, using Burn's CompactRecorder for weights:
//
//   checkpoints/
//     model_epoch_1.mpk      ← weights after epoch 1
//     model_epoch_2.mpk
//     ...
//     best_model.mpk         ← lowest validation loss so far
//     latest_epoch.json      ← number of the last saved epoch
//     best_epoch.json        ← {"epoch": n, "loss": x}
//     model_config.json      ← HybridModelConfig (architecture)
//     train_config.json      ← full TrainConfig of the run
//     normalizer.json        ← tokenomics mean/std
//     tokenizer.json         ← written by TokenizerStore
//
// CompactRecorder stores half precision named MessagePack.
// Loading fails if the architecture does not match.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, FileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::application::train_use_case::TrainConfig;
use crate::data::preprocessor::Normalizer;
use crate::ml::model::{HybridModel, HybridModelConfig};

const BEST_MODEL:   &str = "best_model";
const LATEST_EPOCH: &str = "latest_epoch.json";
const BEST_EPOCH:   &str = "best_epoch.json";
const MODEL_CONFIG: &str = "model_config.json";
const TRAIN_CONFIG: &str = "train_config.json";
const NORMALIZER:   &str = "normalizer.json";

/// Contents of best_epoch.json.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestCheckpoint {
    pub epoch: usize,
    pub loss:  f64,
}

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ─── Weights ──────────────────────────────────────────────────────────────

    /// Write {dir}/model_epoch_{epoch}.mpk and move the
    /// latest-epoch pointer.
    pub fn save_model<B: Backend>(&self, model: &HybridModel<B>, epoch: usize) -> Result<()> {
        self.record(model, &format!("model_epoch_{epoch}"))?;

        fs::write(self.dir.join(LATEST_EPOCH), serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {LATEST_EPOCH}"))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Overwrite {dir}/best_model.mpk and record which epoch it came from.
    pub fn save_best<B: Backend>(&self, model: &HybridModel<B>, best: BestCheckpoint) -> Result<()> {
        self.record(model, BEST_MODEL)?;

        fs::write(self.dir.join(BEST_EPOCH), serde_json::to_string_pretty(&best)?)
            .with_context(|| format!("Failed to write {BEST_EPOCH}"))?;

        tracing::info!("New best model: epoch {} (loss {:.4})", best.epoch, best.loss);
        Ok(())
    }

    /// Load the weights of the latest saved epoch.
    pub fn load_model<B: Backend>(&self, model: HybridModel<B>, device: &B::Device) -> Result<HybridModel<B>> {
        let epoch = self.latest_epoch()?;
        tracing::info!("Loading checkpoint from epoch {}", epoch);
        self.load_weights(model, self.dir.join(format!("model_epoch_{epoch}")), device)
    }

    /// Load the best model, falling back to the latest epoch
    /// when no best model was ever written.
    pub fn load_best<B: Backend>(&self, model: HybridModel<B>, device: &B::Device) -> Result<HybridModel<B>> {
        let path = self.dir.join(BEST_MODEL);
        if !Self::weights_file::<B>(&path).exists() {
            tracing::warn!("No best model in '{}'; using latest epoch", self.dir.display());
            return self.load_model(model, device);
        }

        if let Some(best) = self.best_checkpoint()? {
            tracing::info!("Loading best model from epoch {} (loss {:.4})", best.epoch, best.loss);
        }
        self.load_weights(model, path, device)
    }

    /// Path the recorder actually writes for `stem`.
    pub fn weights_file<B: Backend>(stem: &Path) -> PathBuf {
        stem.with_extension(<CompactRecorder as FileRecorder<B>>::file_extension())
    }

    fn record<B: Backend>(&self, model: &HybridModel<B>, name: &str) -> Result<()> {
        // The recorder appends its own extension
        let path = self.dir.join(name);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;
        Ok(())
    }

    fn load_weights<B: Backend>(
        &self,
        model:  HybridModel<B>,
        path:   PathBuf,
        device: &B::Device,
    ) -> Result<HybridModel<B>> {
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;
        Ok(model.load_record(record))
    }

    /// Read latest_epoch.json. Errors if training hasn't been run yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        let s = fs::read_to_string(self.dir.join(LATEST_EPOCH))
            .with_context(|| format!("Cannot find '{LATEST_EPOCH}'. Have you run 'train' first?"))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    pub fn best_checkpoint(&self) -> Result<Option<BestCheckpoint>> {
        let path = self.dir.join(BEST_EPOCH);
        if !path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&s)?))
    }

    // ─── Configuration ────────────────────────────────────────────────────────

    /// Save the architecture so inference can rebuild the model
    /// before loading weights into it.
    pub fn save_model_config(&self, cfg: &HybridModelConfig) -> Result<()> {
        self.write_json(MODEL_CONFIG, cfg)
    }

    pub fn load_model_config(&self) -> Result<HybridModelConfig> {
        self.read_json(MODEL_CONFIG)
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(TRAIN_CONFIG, cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(TRAIN_CONFIG)
    }

    pub fn save_normalizer(&self, normalizer: &Normalizer) -> Result<()> {
        self.write_json(NORMALIZER, normalizer)
    }

    pub fn load_normalizer(&self) -> Result<Normalizer> {
        self.read_json(NORMALIZER)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read '{}'. Make sure you have run 'train' first.",
                    path.display()
                )
            })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid JSON in '{}'", path.display()))
    }
}
