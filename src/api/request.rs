// ============================================================
// Layer 1 — Prediction Request
// ============================================================
// The JSON body accepted by POST /predict (and by the
// `predict --input` file):
//
//   {
//     "time_series":   [[tx_count, total_volume, senders, receivers], ...],
//     "csv_data":      [price_z, volume_z],
//     "contract_text": "pragma solidity ..."
//   }
//
// Every key must be present and non-null. Empty lists and
// empty text are allowed; shaping happens in the preprocessor.

use serde::{Deserialize, Serialize};

use crate::domain::records::{ScoringInput, TIME_SERIES_FEATURES, TOKENOMICS_FEATURES};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RequestError {
    #[error("Missing required data")]
    MissingData,

    #[error("time_series row {row} has {len} values, expected 4")]
    RowWidth { row: usize, len: usize },

    #[error("csv_data has {0} values, expected 2")]
    CsvWidth(usize),

    #[error("{0} contains a non-finite number")]
    NotFinite(&'static str),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictRequest {
    pub time_series:   Option<Vec<Vec<f64>>>,
    pub csv_data:      Option<Vec<f64>>,
    pub contract_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub scam_probability: f32,
}

impl PredictRequest {
    pub fn into_input(self) -> Result<ScoringInput, RequestError> {
        let (Some(series), Some(csv), Some(contract_text)) =
            (self.time_series, self.csv_data, self.contract_text)
        else {
            return Err(RequestError::MissingData);
        };

        let mut time_series = Vec::with_capacity(series.len());
        for (row, values) in series.iter().enumerate() {
            let step: [f32; TIME_SERIES_FEATURES] = to_array(values)
                .ok_or(RequestError::RowWidth { row, len: values.len() })?;
            if step.iter().any(|v| !v.is_finite()) {
                return Err(RequestError::NotFinite("time_series"));
            }
            time_series.push(step);
        }

        let features: [f32; TOKENOMICS_FEATURES] =
            to_array(&csv).ok_or(RequestError::CsvWidth(csv.len()))?;
        if features.iter().any(|v| !v.is_finite()) {
            return Err(RequestError::NotFinite("csv_data"));
        }

        Ok(ScoringInput { time_series, features, contract_text })
    }
}

fn to_array<const N: usize>(values: &[f64]) -> Option<[f32; N]> {
    if values.len() != N {
        return None;
    }
    let mut out = [0.0f32; N];
    for (o, v) in out.iter_mut().zip(values) {
        *o = *v as f32;
    }
    Some(out)
}
