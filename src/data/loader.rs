// ============================================================
// Layer 4 — Record Loaders
// ============================================================
// Reads the three raw input sources into domain records:
//
//   TokenomicsLoader → rugpull CSV     (symbol, price_float, volume, wasrekt)
//   TimeSeriesLoader → activity CSV    (symbol, date, tx_count, total_volume,
//                                       unique_senders, unique_receivers)
//   ContractLoader   → contracts JSON  { symbol: { source_code_or_metadata } }
//
// Columns are located by header name, so extra columns and any
// column order are accepted. Numeric cells that fail to parse
// (or parse to NaN / inf) make the whole row unusable; such rows
// are dropped and counted rather than failing the load.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use serde_json::Value;
use std::{fs, path::PathBuf};

use crate::domain::records::{ContractRecord, TimeSeriesPoint, TokenomicsRecord};
use crate::domain::traits::RecordSource;

/// Key inside each contract entry that holds the text we tokenise
const CONTRACT_TEXT_KEY: &str = "source_code_or_metadata";

// ─── TokenomicsLoader ─────────────────────────────────────────────────────────
pub struct TokenomicsLoader {
    path: PathBuf,
}

impl TokenomicsLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource<TokenomicsRecord> for TokenomicsLoader {
    fn load_all(&self) -> Result<Vec<TokenomicsRecord>> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open tokenomics CSV '{}'", self.path.display()))?;

        let headers    = reader.headers()?.clone();
        let symbol_col = column_index(&headers, "symbol")?;
        let price_col  = column_index(&headers, "price_float")?;
        let volume_col = column_index(&headers, "volume")?;
        let label_col  = column_index(&headers, "wasrekt")?;

        let mut records = Vec::new();
        let mut dropped = 0usize;

        for row in reader.records() {
            let row = row.with_context(|| {
                format!("Malformed row in '{}'", self.path.display())
            })?;

            let price  = parse_finite(row.get(price_col));
            let volume = parse_finite(row.get(volume_col));

            match (price, volume) {
                (Some(price), Some(volume)) => records.push(TokenomicsRecord::new(
                    row.get(symbol_col).unwrap_or_default().trim(),
                    price,
                    volume,
                    parse_flag(row.get(label_col).unwrap_or_default()),
                )),
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::warn!(
                "Dropped {} tokenomics rows with non-numeric price/volume",
                dropped
            );
        }
        tracing::info!("Loaded {} tokenomics rows from '{}'", records.len(), self.path.display());
        Ok(records)
    }
}

// ─── TimeSeriesLoader ─────────────────────────────────────────────────────────
pub struct TimeSeriesLoader {
    path: PathBuf,
}

impl TimeSeriesLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource<TimeSeriesPoint> for TimeSeriesLoader {
    fn load_all(&self) -> Result<Vec<TimeSeriesPoint>> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open time-series CSV '{}'", self.path.display()))?;

        let headers = reader.headers()?.clone();
        let symbol_col = column_index(&headers, "symbol")?;
        let date_col   = column_index(&headers, "date")?;
        let value_cols = [
            column_index(&headers, "tx_count")?,
            column_index(&headers, "total_volume")?,
            column_index(&headers, "unique_senders")?,
            column_index(&headers, "unique_receivers")?,
        ];

        let mut points  = Vec::new();
        let mut skipped = 0usize;

        for row in reader.records() {
            let row = row.with_context(|| {
                format!("Malformed row in '{}'", self.path.display())
            })?;

            let values: Option<Vec<f32>> = value_cols
                .iter()
                .map(|&col| parse_finite(row.get(col)).map(|v| v as f32))
                .collect();

            let Some(values) = values else {
                skipped += 1;
                continue;
            };

            points.push(TimeSeriesPoint {
                symbol:           row.get(symbol_col).unwrap_or_default().trim().to_string(),
                date:             row.get(date_col).unwrap_or_default().trim().to_string(),
                tx_count:         values[0],
                total_volume:     values[1],
                unique_senders:   values[2],
                unique_receivers: values[3],
            });
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} time-series rows with non-numeric values", skipped);
        }
        tracing::info!("Loaded {} time-series rows from '{}'", points.len(), self.path.display());
        Ok(points)
    }
}

// ─── ContractLoader ───────────────────────────────────────────────────────────
pub struct ContractLoader {
    path: PathBuf,
}

impl ContractLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource<ContractRecord> for ContractLoader {
    /// Entries that are not objects, or objects without the text key,
    /// yield an empty text; the preprocessor substitutes a placeholder.
    /// Any other non-string value (null included) keeps its JSON form.
    fn load_all(&self) -> Result<Vec<ContractRecord>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read contract JSON '{}'", self.path.display()))?;
        let json: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in '{}'", self.path.display()))?;

        let Value::Object(entries) = json else {
            return Err(anyhow!(
                "Contract JSON '{}' must be an object keyed by symbol",
                self.path.display()
            ));
        };

        let records: Vec<ContractRecord> = entries
            .into_iter()
            .map(|(symbol, entry)| ContractRecord { symbol, text: contract_text(&entry) })
            .collect();

        tracing::info!("Loaded {} contract entries from '{}'", records.len(), self.path.display());
        Ok(records)
    }
}

fn contract_text(entry: &Value) -> String {
    match entry {
        Value::Object(fields) => match fields.get(CONTRACT_TEXT_KEY) {
            Some(Value::String(text)) => text.clone(),
            Some(other)               => other.to_string(),
            None                      => String::new(),
        },
        _ => String::new(),
    }
}

// ─── Cell parsing helpers ─────────────────────────────────────────────────────

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| anyhow!("Missing required column '{name}'"))
}

/// Parse a numeric cell; None for blanks, garbage, NaN and infinities.
fn parse_finite(cell: Option<&str>) -> Option<f64> {
    cell?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Interpret a label cell as a boolean outcome.
fn parse_flag(cell: &str) -> bool {
    let cell = cell.trim().to_ascii_lowercase();
    match cell.as_str() {
        "true" | "t" | "yes" | "y" => true,
        _ => cell.parse::<f64>().map(|v| v.is_finite() && v != 0.0).unwrap_or(false),
    }
}
