use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::data::preprocessor::{contract_text_or_placeholder, fit_sequence, ContractEncoder};
use crate::domain::records::{
    ScoringInput, TokenomicsRecord, TIME_SERIES_FEATURES, TOKENOMICS_FEATURES,
};

/// One fully prepared sample: fixed-length series, normalized
/// tokenomics pair, encoded contract text and the 0/1 label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScamSample {
    /// Row-major `[seq_len, 4]`
    pub time_series:    Vec<f32>,
    pub features:       [f32; TOKENOMICS_FEATURES],
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          u8,
}

impl ScamSample {
    pub fn seq_len(&self) -> usize {
        self.time_series.len() / TIME_SERIES_FEATURES
    }

    /// Build an unlabelled sample from a scoring request, applying
    /// the same shaping as the training pipeline.
    pub fn from_input(
        input:   &ScoringInput,
        encoder: &ContractEncoder,
        seq_len: usize,
    ) -> Result<Self> {
        let encoded = encoder.encode(contract_text_or_placeholder(&input.contract_text))?;
        Ok(Self {
            time_series:    flatten(&fit_sequence(&input.time_series, seq_len)),
            features:       input.features,
            input_ids:      encoded.input_ids,
            attention_mask: encoded.attention_mask,
            label:          0,
        })
    }
}

/// Join the three sources on symbol. The tokenomics rows drive the
/// sample set; a missing series becomes all zeros and missing
/// contract text becomes the placeholder.
pub fn build_samples(
    records:   &[TokenomicsRecord],
    series:    &HashMap<String, Vec<[f32; TIME_SERIES_FEATURES]>>,
    contracts: &HashMap<String, String>,
    encoder:   &ContractEncoder,
    seq_len:   usize,
) -> Result<Vec<ScamSample>> {
    let mut missing_series = 0usize;
    let mut samples = Vec::with_capacity(records.len());

    for r in records {
        let steps: &[[f32; TIME_SERIES_FEATURES]] = match series.get(&r.symbol) {
            Some(steps) => steps,
            None => {
                missing_series += 1;
                &[]
            }
        };
        let text    = contracts.get(&r.symbol).map(String::as_str).unwrap_or_default();
        let encoded = encoder.encode(contract_text_or_placeholder(text))?;
        let [price, volume] = r.features();

        samples.push(ScamSample {
            time_series:    flatten(&fit_sequence(steps, seq_len)),
            features:       [price as f32, volume as f32],
            input_ids:      encoded.input_ids,
            attention_mask: encoded.attention_mask,
            label:          r.label(),
        });
    }

    if missing_series > 0 {
        tracing::warn!("{} symbols have no time series; using zeros", missing_series);
    }
    Ok(samples)
}

fn flatten(steps: &[[f32; TIME_SERIES_FEATURES]]) -> Vec<f32> {
    steps.iter().flatten().copied().collect()
}

pub struct ScamDataset {
    samples: Vec<ScamSample>,
}

impl ScamDataset {
    pub fn new(samples: Vec<ScamSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn positive_count(&self) -> usize {
        self.samples.iter().filter(|s| s.label == 1).count()
    }
}

impl Dataset<ScamSample> for ScamDataset {
    fn get(&self, index: usize) -> Option<ScamSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
