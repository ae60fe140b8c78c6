// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Offline scoring of one JSON sample, using the same body
// format and validation as POST /predict:
//
//   Step 1: Rebuild the model from the checkpoint dir  (Layer 5)
//   Step 2: Read + validate the sample file            (Layer 1)
//   Step 3: Optionally z-score raw csv_data with the
//           normalizer saved at training time          (Layer 4)
//   Step 4: Score it                                    (Layer 5)

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::api::request::PredictRequest;
use crate::data::preprocessor::Normalizer;
use crate::domain::traits::ScamScorer;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

pub struct PredictUseCase {
    scorer:     Box<dyn ScamScorer>,
    /// Set when the sample carries raw price/volume
    normalizer: Option<Normalizer>,
}

impl PredictUseCase {
    pub fn new(checkpoint_dir: &str, raw_csv_data: bool) -> Result<Self> {
        let ckpt = CheckpointManager::new(checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt)?;
        let normalizer = if raw_csv_data { Some(ckpt.load_normalizer()?) } else { None };
        Ok(Self::with_scorer(Box::new(inferencer), normalizer))
    }

    pub fn with_scorer(scorer: Box<dyn ScamScorer>, normalizer: Option<Normalizer>) -> Self {
        Self { scorer, normalizer }
    }

    /// Scam probability for the sample stored at `path`.
    pub fn predict_file(&self, path: &Path) -> Result<f32> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read sample '{}'", path.display()))?;
        let request: PredictRequest = serde_json::from_str(&json)
            .with_context(|| format!("Invalid sample JSON in '{}'", path.display()))?;
        let mut input = request.into_input()?;

        if let Some(normalizer) = &self.normalizer {
            let [price, volume] = input.features.map(f64::from);
            let [price, volume] = normalizer.apply([price, volume]);
            input.features = [price as f32, volume as f32];
        }

        tracing::info!(
            "Scoring sample with {} time steps and {} chars of contract text",
            input.time_series.len(),
            input.contract_text.len(),
        );
        self.scorer.score(&input)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::ScoringInput;

    struct FixedScorer(f32);

    impl ScamScorer for FixedScorer {
        fn score(&self, _input: &ScoringInput) -> Result<f32> {
            Ok(self.0)
        }
    }

    /// Echoes the first feature so tests can see what was scored.
    struct EchoScorer;

    impl ScamScorer for EchoScorer {
        fn score(&self, input: &ScoringInput) -> Result<f32> {
            Ok(input.features[0])
        }
    }

    #[test]
    fn test_predict_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        fs::write(&path, r#"{"time_series": [[1,2,3,4]], "csv_data": [0, 1], "contract_text": "x"}"#).unwrap();

        let use_case = PredictUseCase::with_scorer(Box::new(FixedScorer(0.25)), None);
        assert_eq!(use_case.predict_file(&path).unwrap(), 0.25);
    }

    #[test]
    fn test_predict_file_missing_key() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        fs::write(&path, r#"{"csv_data": [0, 1], "contract_text": "x"}"#).unwrap();

        let use_case = PredictUseCase::with_scorer(Box::new(FixedScorer(0.25)), None);
        let err = use_case.predict_file(&path).unwrap_err();
        assert!(err.to_string().contains("Missing required data"));
    }

    #[test]
    fn test_raw_csv_data_is_normalized() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        fs::write(&path, r#"{"time_series": [], "csv_data": [14, 3], "contract_text": ""}"#).unwrap();

        let normalizer = Normalizer { mean: [10.0, 0.0], std: [2.0, 1.0] };
        let use_case   = PredictUseCase::with_scorer(Box::new(EchoScorer), Some(normalizer));
        assert_eq!(use_case.predict_file(&path).unwrap(), 2.0);

        let use_case = PredictUseCase::with_scorer(Box::new(EchoScorer), None);
        assert_eq!(use_case.predict_file(&path).unwrap(), 14.0);
    }
}
