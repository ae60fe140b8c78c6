// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and Adam,
// followed by one pass over the held-out test split.
//
//   - Training runs on an AutodiffBackend; the frozen text
//     encoder has no gradients, so Adam only moves the LSTM,
//     tokenomics, projection and head parameters
//   - model.valid() returns the model on the inner backend
//     with dropout off; validation/test batchers use it too
//   - A prediction counts as positive when logit >= 0 (p >= 0.5)
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::path::Path;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{ScamBatch, ScamBatcher},
    dataset::ScamDataset,
};
use crate::infra::{
    checkpoint::{BestCheckpoint, CheckpointManager},
    metrics::{EpochMetrics, MetricsLogger},
    pretrained::load_encoder_weights,
};
use crate::ml::backend::TrainBackend;
use crate::ml::model::{HybridModel, HybridModelConfig};

/// Loss and accuracy over one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalReport {
    pub loss:     f64,
    pub accuracy: f64,
    pub samples:  usize,
}

#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epochs: usize,
    pub last:   EpochMetrics,
    pub best:   Option<BestCheckpoint>,
    /// None when the test split is empty
    pub test:   Option<EvalReport>,
}

/// The three datasets a run consumes.
pub struct TrainData {
    pub train: ScamDataset,
    pub val:   ScamDataset,
    pub test:  ScamDataset,
}

pub fn run_training(
    cfg:       &TrainConfig,
    model_cfg: &HybridModelConfig,
    data:      TrainData,
    ckpt:      &CheckpointManager,
    metrics:   &MetricsLogger,
) -> Result<TrainingSummary> {
    let device = <TrainBackend as Backend>::Device::default();
    tracing::info!("Using device: {:?}", device);

    // ── Build model, then swap in the pretrained encoder ──────────────────────
    let mut model: HybridModel<TrainBackend> = model_cfg.init(&device);
    model.text_encoder = load_encoder_weights(model.text_encoder, Path::new(&cfg.pretrained_dir), &device)?;
    tracing::info!(
        "Model ready: {} LSTM layers (hidden {}), encoder with {} layers (hidden {}) frozen",
        model_cfg.rnn_layers,
        model_cfg.rnn_hidden_size,
        model_cfg.text_encoder.num_hidden_layers,
        model_cfg.text_encoder.hidden_size,
    );

    train_loop(cfg, model, data, ckpt, metrics, &device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:     &TrainConfig,
    mut model: HybridModel<B>,
    data:    TrainData,
    ckpt:    &CheckpointManager,
    metrics: &MetricsLogger,
    device:  &B::Device,
) -> Result<TrainingSummary> {
    if data.train.sample_count() == 0 {
        bail!("No training samples; check the input files");
    }
    if cfg.epochs == 0 {
        bail!("epochs must be at least 1");
    }

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().init();

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_loader = DataLoaderBuilder::new(ScamBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(data.train);

    let val_loader = eval_loader::<B::InnerBackend>(cfg.batch_size, device, data.val);
    let test_loader = eval_loader::<B::InnerBackend>(cfg.batch_size, device, data.test);

    let log_every = cfg.log_every.max(1);
    let mut best: Option<BestCheckpoint> = None;
    let mut last: Option<EpochMetrics>   = None;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _, _) = model.forward_loss(batch);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            if train_batches % log_every == 0 {
                tracing::info!("Epoch {} batch {}: loss={:.4}", epoch, train_batches, loss_val);
            }

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let val = evaluate(&model.valid(), val_loader.as_ref());
        let epoch_metrics = EpochMetrics::new(
            epoch,
            avg_train_loss,
            val.map_or(f64::NAN, |r| r.loss),
            val.map_or(0.0, |r| r.accuracy),
        );

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs, epoch_metrics.train_loss, epoch_metrics.val_loss,
            epoch_metrics.val_accuracy * 100.0,
        );
        metrics.log(&epoch_metrics)?;

        // ── Checkpoints ───────────────────────────────────────────────────────
        let best_loss = best.map_or(f64::INFINITY, |b| b.loss);
        if epoch_metrics.is_improvement(best_loss) {
            let record = BestCheckpoint { epoch, loss: epoch_metrics.selection_loss() };
            ckpt.save_best(&model, record)?;
            best = Some(record);
        }

        ckpt.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
        last = Some(epoch_metrics);
    }

    // ── Test phase ────────────────────────────────────────────────────────────
    let test = evaluate(&model.valid(), test_loader.as_ref());
    match test {
        Some(r) => println!(
            "Test | loss={:.4} | acc={:.1}% | {} samples",
            r.loss, r.accuracy * 100.0, r.samples,
        ),
        None => tracing::warn!("Test split is empty; skipping test evaluation"),
    }

    tracing::info!("Training complete! Metrics in '{}'", metrics.csv_path().display());
    let Some(last) = last else {
        bail!("Training ran no epochs");
    };
    Ok(TrainingSummary { epochs: cfg.epochs, last, best, test })
}

fn eval_loader<B: Backend>(
    batch_size: usize,
    device:     &B::Device,
    dataset:    ScamDataset,
) -> std::sync::Arc<dyn DataLoader<ScamBatch<B>>> {
    DataLoaderBuilder::new(ScamBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .num_workers(1)
        .build(dataset)
}

/// Mean batch BCE and 0.5-threshold accuracy. None when the
/// loader yields no batches.
pub fn evaluate<B: Backend>(
    model:  &HybridModel<B>,
    loader: &dyn DataLoader<ScamBatch<B>>,
) -> Option<EvalReport> {
    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;
    let mut correct  = 0usize;
    let mut total    = 0usize;

    for batch in loader.iter() {
        total += batch.size();
        let (loss, logits, labels) = model.forward_loss(batch);

        loss_sum += loss.into_scalar().elem::<f64>();
        batches  += 1;

        let hits: i64 = logits
            .greater_equal_elem(0.0)
            .int()
            .equal(labels)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();
        correct += hits as usize;
    }

    if batches == 0 {
        return None;
    }
    Some(EvalReport {
        loss:     loss_sum / batches as f64,
        accuracy: correct as f64 / total as f64,
        samples:  total,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample, tiny_model_config, TestAutodiff, TestBackend};
    use burn::data::dataloader::batcher::Batcher;

    fn dataset(n: usize) -> ScamDataset {
        ScamDataset::new(
            (0..n).map(|i| sample((i % 2) as u8, i as f32 / n as f32)).collect(),
        )
    }

    fn head_bias<B: Backend>(model: &HybridModel<B>) -> Vec<f32> {
        model.head_out.bias.as_ref().unwrap().val().into_data().to_vec().unwrap()
    }

    fn small_config(dir: &Path) -> TrainConfig {
        TrainConfig {
            checkpoint_dir: dir.display().to_string(),
            batch_size:     4,
            epochs:         2,
            log_every:      1,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_step_keeps_encoder_frozen_and_moves_head() {
        let device = Default::default();
        let model  = tiny_model_config().init::<TestAutodiff>(&device);

        let encoder_before: Vec<f32> = model.text_encoder.embeddings.word_embeddings
            .weight.val().into_data().to_vec().unwrap();
        // The output bias always has a nonzero BCE gradient, unlike
        // weights fed by hidden units that may all be inactive
        let head_before = head_bias(&model);

        let batch = ScamBatcher::<TestAutodiff>::new(device)
            .batch(vec![sample(1, 0.4), sample(0, 0.8)]);
        let (loss, _, _) = model.forward_loss(batch);
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        let model = AdamConfig::new().init().step(0.1, model, grads);

        let encoder_after: Vec<f32> = model.text_encoder.embeddings.word_embeddings
            .weight.val().into_data().to_vec().unwrap();
        let head_after = head_bias(&model);

        assert_eq!(encoder_before, encoder_after);
        assert_ne!(head_before, head_after);
    }

    #[test]
    fn test_evaluate_counts_every_sample() {
        let device = Default::default();
        let model  = tiny_model_config().init::<TestBackend>(&device);
        let loader = eval_loader::<TestBackend>(3, &device, dataset(7));

        let report = evaluate(&model, loader.as_ref()).unwrap();
        assert_eq!(report.samples, 7);
        assert!(report.loss.is_finite());
        assert!((0.0..=1.0).contains(&report.accuracy));
    }

    #[test]
    fn test_evaluate_empty_is_none() {
        let device = Default::default();
        let model  = tiny_model_config().init::<TestBackend>(&device);
        let loader = eval_loader::<TestBackend>(4, &device, dataset(0));
        assert!(evaluate(&model, loader.as_ref()).is_none());
    }

    #[test]
    fn test_train_loop_writes_checkpoints_and_metrics() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = small_config(dir.path());
        let ckpt    = CheckpointManager::new(dir.path());
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let device  = Default::default();

        let model = tiny_model_config().init::<TestAutodiff>(&device);
        let data  = TrainData { train: dataset(8), val: dataset(2), test: dataset(2) };

        let summary = train_loop(&cfg, model, data, &ckpt, &metrics, &device).unwrap();

        assert_eq!(summary.epochs, 2);
        assert_eq!(summary.last.epoch, 2);
        assert!(summary.best.is_some());
        assert_eq!(summary.test.map(|r| r.samples), Some(2));

        for name in ["model_epoch_1.mpk", "model_epoch_2.mpk", "best_model.mpk", "best_epoch.json"] {
            assert!(dir.path().join(name).exists(), "missing {name}");
        }
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_empty_validation_selects_on_train_loss() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = TrainConfig { epochs: 1, ..small_config(dir.path()) };
        let ckpt    = CheckpointManager::new(dir.path());
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let device  = Default::default();

        let model = tiny_model_config().init::<TestAutodiff>(&device);
        let data  = TrainData { train: dataset(4), val: dataset(0), test: dataset(0) };

        let summary = train_loop(&cfg, model, data, &ckpt, &metrics, &device).unwrap();
        let best    = summary.best.unwrap();
        assert_eq!(best.epoch, 1);
        assert_eq!(best.loss, summary.last.train_loss);
        assert!(summary.test.is_none());
    }

    #[test]
    fn test_no_training_samples_is_error() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = small_config(dir.path());
        let ckpt    = CheckpointManager::new(dir.path());
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let device  = Default::default();

        let model = tiny_model_config().init::<TestAutodiff>(&device);
        let data  = TrainData { train: dataset(0), val: dataset(2), test: dataset(2) };
        assert!(train_loop(&cfg, model, data, &ckpt, &metrics, &device).is_err());
    }
}
