// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `predict` and `serve`
// and all their configurable flags. Most flags also read a
// SCAMSCOPE_* environment variable (or .env entry).
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the hybrid scam classifier
    Train(TrainArgs),

    /// Score one JSON sample with a trained checkpoint
    Predict(PredictArgs),

    /// Serve POST /predict over HTTP
    Serve(ServeArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Tokenomics CSV (symbol, price_float, volume, wasrekt)
    #[arg(long, env = "SCAMSCOPE_TOKENOMICS_CSV", default_value = "rugpullD2.csv")]
    pub tokenomics_csv: String,

    /// Daily on-chain activity CSV
    #[arg(long, env = "SCAMSCOPE_TIME_SERIES_CSV", default_value = "time_series_data_checkpoint_cleaned.csv")]
    pub time_series_csv: String,

    /// JSON map of symbol → contract entry
    #[arg(long, env = "SCAMSCOPE_CONTRACTS_JSON", default_value = "ethereum_contracts_filtered.json")]
    pub contracts_json: String,

    /// HuggingFace model directory (config.json, vocab.json,
    /// merges.txt, pytorch_model.bin)
    #[arg(long, env = "SCAMSCOPE_PRETRAINED_DIR", default_value = "models/codebert-base")]
    pub pretrained_dir: String,

    /// Directory to save checkpoints, configs and the tokenizer
    #[arg(long, env = "SCAMSCOPE_CHECKPOINT_DIR", default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Time steps per token; shorter series are zero-padded
    #[arg(long, default_value_t = 10)]
    pub seq_len: usize,

    /// Tokens per contract text, including <s> and </s>
    #[arg(long, default_value_t = 512)]
    pub max_text_len: usize,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// LSTM hidden size
    #[arg(long, default_value_t = 64)]
    pub rnn_hidden_size: usize,

    /// Stacked LSTM layers
    #[arg(long, default_value_t = 2)]
    pub rnn_layers: usize,

    /// Width of the tokenomics branch and the text projection
    #[arg(long, default_value_t = 64)]
    pub fnn_hidden_size: usize,

    /// Hidden width of the fusion head
    #[arg(long, default_value_t = 32)]
    pub final_hidden_size: usize,

    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    #[arg(long, default_value_t = 0.7)]
    pub train_fraction: f64,

    #[arg(long, default_value_t = 0.15)]
    pub val_fraction: f64,

    /// Seed for the split and batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Log the batch loss every N batches
    #[arg(long, default_value_t = 5)]
    pub log_every: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            tokenomics_csv:    a.tokenomics_csv,
            time_series_csv:   a.time_series_csv,
            contracts_json:    a.contracts_json,
            pretrained_dir:    a.pretrained_dir,
            checkpoint_dir:    a.checkpoint_dir,
            seq_len:           a.seq_len,
            max_text_len:      a.max_text_len,
            batch_size:        a.batch_size,
            epochs:            a.epochs,
            lr:                a.lr,
            rnn_hidden_size:   a.rnn_hidden_size,
            rnn_layers:        a.rnn_layers,
            fnn_hidden_size:   a.fnn_hidden_size,
            final_hidden_size: a.final_hidden_size,
            dropout:           a.dropout,
            train_fraction:    a.train_fraction,
            val_fraction:      a.val_fraction,
            seed:              a.seed,
            log_every:         a.log_every,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// JSON file with time_series, csv_data and contract_text
    #[arg(long)]
    pub input: PathBuf,

    /// csv_data holds raw price/volume; normalize it with the
    /// statistics saved at training time
    #[arg(long)]
    pub raw_csv_data: bool,

    /// Directory where checkpoints were saved during training
    #[arg(long, env = "SCAMSCOPE_CHECKPOINT_DIR", default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

/// All arguments for the `serve` command
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "SCAMSCOPE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "SCAMSCOPE_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory where checkpoints were saved during training
    #[arg(long, env = "SCAMSCOPE_CHECKPOINT_DIR", default_value = "checkpoints")]
    pub checkpoint_dir: String,
}
