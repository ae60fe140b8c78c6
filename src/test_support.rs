// Shared fixtures for unit tests: a tiny byte-level BPE vocabulary
// and a small text-encoder configuration that runs fast on NdArray.

use serde_json::{Map, Value};
use std::{fs, path::Path};
use tempfile::TempDir;

use crate::data::dataset::ScamSample;
use crate::data::preprocessor::ContractEncoder;
use crate::infra::tokenizer_store::TokenizerStore;
use crate::ml::model::HybridModelConfig;
use crate::ml::text_encoder::TextEncoderConfig;

pub type TestBackend     = burn::backend::NdArray;
pub type TestAutodiff    = burn::backend::Autodiff<TestBackend>;

/// Writes vocab.json + merges.txt covering ASCII letters, digits,
/// the byte-level space marker and two merges ("he", "ll").
pub fn write_tiny_vocab(dir: &Path) {
    let mut vocab = Map::new();
    let mut next  = 0u64;
    let mut add = |tok: String, vocab: &mut Map<String, Value>| {
        vocab.insert(tok, Value::from(next));
        next += 1;
    };

    for tok in ["<s>", "<pad>", "</s>", "<unk>"] {
        add(tok.to_string(), &mut vocab);
    }
    for c in ('a'..='z').chain('A'..='Z').chain('0'..='9') {
        add(c.to_string(), &mut vocab);
    }
    for tok in ["\u{0120}", "{", "}", ";", "(", ")", "he", "ll", "<mask>"] {
        add(tok.to_string(), &mut vocab);
    }

    fs::write(dir.join("vocab.json"), serde_json::to_string(&vocab).unwrap()).unwrap();
    fs::write(dir.join("merges.txt"), "#version: 0.2\nh e\nl l\n").unwrap();
}

pub fn tiny_vocab_size() -> usize {
    4 + 26 + 26 + 10 + 9
}

/// A ContractEncoder over the tiny vocabulary. The TempDir must be
/// kept alive for as long as the encoder's source files matter.
pub fn tiny_encoder(max_len: usize) -> (TempDir, ContractEncoder) {
    let dir = tempfile::tempdir().unwrap();
    let pretrained = dir.path().join("pretrained");
    fs::create_dir_all(&pretrained).unwrap();
    write_tiny_vocab(&pretrained);

    let tokenizer = TokenizerStore::new(dir.path().join("ckpt"))
        .load_or_build(&pretrained)
        .unwrap();
    (dir, ContractEncoder::new(tokenizer, max_len).unwrap())
}

pub fn tiny_text_config() -> TextEncoderConfig {
    TextEncoderConfig::new()
        .with_vocab_size(tiny_vocab_size())
        .with_hidden_size(16)
        .with_num_hidden_layers(2)
        .with_num_attention_heads(2)
        .with_intermediate_size(32)
        .with_max_position_embeddings(40)
        .with_hidden_dropout_prob(0.0)
}

pub fn tiny_model_config() -> HybridModelConfig {
    HybridModelConfig::new(tiny_text_config())
        .with_rnn_hidden_size(8)
        .with_fnn_hidden_size(8)
        .with_final_hidden_size(4)
}

/// A labelled sample shaped for `tiny_model_config` with 10 steps
/// and 8 text positions; `seed` varies the numeric inputs.
pub fn sample(label: u8, seed: f32) -> ScamSample {
    ScamSample {
        time_series:    (0..40).map(|i| seed * i as f32 / 40.0).collect(),
        features:       [seed, -seed],
        input_ids:      vec![0, 5, 6, 7, 2, 1, 1, 1],
        attention_mask: vec![1, 1, 1, 1, 1, 0, 0, 0],
        label,
    }
}
