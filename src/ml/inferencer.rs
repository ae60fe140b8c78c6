// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the trained model from a checkpoint directory and
// scores single inputs:
//
//   model_config.json  → HybridModelConfig (dropout forced to 0)
//   best_model.mpk     → weights (latest epoch as fallback)
//   tokenizer.json     → ContractEncoder
//   train_config.json  → seq_len / max_text_len
//
// The model sits behind a Mutex so one instance can be shared
// across server threads; forward passes are serialised.

use anyhow::{anyhow, Result};
use burn::prelude::*;
use std::sync::Mutex;

use crate::data::{
    batcher::ScamBatcher,
    dataset::ScamSample,
    preprocessor::ContractEncoder,
};
use crate::domain::{records::ScoringInput, traits::ScamScorer};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::backend::InferBackend;
use crate::ml::model::{probabilities, HybridModel};
use burn::data::dataloader::batcher::Batcher;

pub struct Inferencer<B: Backend = InferBackend> {
    model:   Mutex<HybridModel<B>>,
    encoder: ContractEncoder,
    seq_len: usize,
    device:  B::Device,
}

impl Inferencer<InferBackend> {
    pub fn from_checkpoint(ckpt: &CheckpointManager) -> Result<Self> {
        let device = <InferBackend as Backend>::Device::default();
        Self::load(ckpt, device)
    }
}

impl<B: Backend> Inferencer<B> {
    pub fn load(ckpt: &CheckpointManager, device: B::Device) -> Result<Self> {
        let train_cfg = ckpt.load_config()?;
        let model_cfg = ckpt.load_model_config()?.with_dropout(0.0);

        let model: HybridModel<B> = model_cfg.init(&device);
        let model = ckpt.load_best(model, &device)?;

        let tokenizer = TokenizerStore::new(ckpt.dir()).load()?;
        let encoder   = ContractEncoder::new(tokenizer, train_cfg.max_text_len)?;

        tracing::info!("Model loaded from '{}'", ckpt.dir().display());
        Ok(Self::new(model, encoder, train_cfg.seq_len, device))
    }

    pub fn new(model: HybridModel<B>, encoder: ContractEncoder, seq_len: usize, device: B::Device) -> Self {
        Self { model: Mutex::new(model), encoder, seq_len, device }
    }

    /// Scam probability for one input, in [0, 1].
    pub fn predict(&self, input: &ScoringInput) -> Result<f32> {
        let sample = ScamSample::from_input(input, &self.encoder, self.seq_len)?;
        let batch  = ScamBatcher::<B>::new(self.device.clone()).batch(vec![sample]);

        let logits = {
            let model = self.model.lock().map_err(|_| anyhow!("Model lock poisoned"))?;
            model.forward(batch)
        };

        let probs: Vec<f32> = probabilities(logits)
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read model output: {e:?}"))?;

        let p = probs.first().copied().ok_or_else(|| anyhow!("Model returned no output"))?;
        tracing::debug!("Scam probability {:.4}", p);
        Ok(p)
    }
}

impl<B: Backend> ScamScorer for Inferencer<B> {
    fn score(&self, input: &ScoringInput) -> Result<f32> {
        self.predict(input)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::test_support::{tiny_encoder, tiny_model_config, TestBackend};

    fn input(steps: usize, text: &str) -> ScoringInput {
        ScoringInput {
            time_series:   vec![[1.0, 2.0, 3.0, 4.0]; steps],
            features:      [0.5, -1.2],
            contract_text: text.to_string(),
        }
    }

    #[test]
    fn test_probability_in_unit_interval_for_any_series_length() {
        let device       = Default::default();
        let (_dir, enc)  = tiny_encoder(16);
        let model        = tiny_model_config().with_dropout(0.0).init::<TestBackend>(&device);
        let inferencer   = Inferencer::new(model, enc, 10, device);

        for steps in [0, 3, 10, 25] {
            let p = inferencer.predict(&input(steps, "contract Hello {}")).unwrap();
            assert!((0.0..=1.0).contains(&p), "steps={steps} p={p}");
        }
    }

    #[test]
    fn test_empty_text_scores_like_placeholder() {
        let device      = Default::default();
        let (_dir, enc) = tiny_encoder(32);
        let model       = tiny_model_config().with_dropout(0.0).init::<TestBackend>(&device);
        let inferencer  = Inferencer::new(model, enc, 10, device);

        let empty       = inferencer.predict(&input(4, "   ")).unwrap();
        let placeholder = inferencer
            .predict(&input(4, crate::domain::records::NO_CONTRACT_TEXT))
            .unwrap();
        assert!((empty - placeholder).abs() < 1e-6);
    }

    #[test]
    fn test_load_rebuilds_from_checkpoint_dir() {
        let (dir, enc) = tiny_encoder(16);
        let ckpt_dir   = dir.path().join("ckpt");
        let ckpt       = CheckpointManager::new(&ckpt_dir);
        let device     = Default::default();

        let cfg = TrainConfig { seq_len: 10, max_text_len: 16, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        ckpt.save_model_config(&tiny_model_config()).unwrap();
        ckpt.save_model(&tiny_model_config().init::<TestBackend>(&device), 1).unwrap();

        // tiny_encoder already stored tokenizer.json in {dir}/ckpt
        let inferencer = Inferencer::<TestBackend>::load(&ckpt, device).unwrap();
        assert_eq!(inferencer.seq_len, 10);

        let p = inferencer.score(&input(12, "")).unwrap();
        assert!((0.0..=1.0).contains(&p));
        drop(enc);
    }
}
