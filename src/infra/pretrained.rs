// ============================================================
// Layer 6 — Pretrained Encoder Import
// ============================================================
// Reads a HuggingFace RoBERTa-family model directory
// (e.g. microsoft/codebert-base) into Burn:
//
//   config.json        → TextEncoderConfig
//   pytorch_model.bin  → TextEncoderRecord via burn-import
//
// HF parameter names are mapped onto our module tree:
//   roberta.embeddings.*        → embeddings.*
//   *.attention.self.*          → *.attention.self_attn.*
//   *.LayerNorm.*               → *.layer_norm.*
// Keys we have no field for (pooler.*) are ignored.
//
// Reference: burn-import PyTorch recorder documentation

use anyhow::{Context, Result};
use burn::{
    module::Module,
    prelude::*,
    record::{FullPrecisionSettings, Recorder},
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::ml::text_encoder::{TextEncoder, TextEncoderConfig};

const WEIGHTS_FILE: &str = "pytorch_model.bin";

/// (pattern, replacement) pairs applied to every HF parameter key.
const KEY_REMAPS: [(&str, &str); 3] = [
    (r"^roberta\.", ""),
    (r"attention\.self\.", "attention.self_attn."),
    ("LayerNorm", "layer_norm"),
];

/// The subset of a HF config.json we read; absent keys fall
/// back to the roberta-base values.
#[derive(Debug, Default, Deserialize)]
struct HfEncoderConfig {
    vocab_size:              Option<usize>,
    hidden_size:             Option<usize>,
    num_hidden_layers:       Option<usize>,
    num_attention_heads:     Option<usize>,
    intermediate_size:       Option<usize>,
    max_position_embeddings: Option<usize>,
    type_vocab_size:         Option<usize>,
    layer_norm_eps:          Option<f64>,
    pad_token_id:            Option<usize>,
    hidden_dropout_prob:     Option<f64>,
}

impl From<HfEncoderConfig> for TextEncoderConfig {
    fn from(hf: HfEncoderConfig) -> Self {
        let base = TextEncoderConfig::new();
        TextEncoderConfig {
            vocab_size:              hf.vocab_size.unwrap_or(base.vocab_size),
            hidden_size:             hf.hidden_size.unwrap_or(base.hidden_size),
            num_hidden_layers:       hf.num_hidden_layers.unwrap_or(base.num_hidden_layers),
            num_attention_heads:     hf.num_attention_heads.unwrap_or(base.num_attention_heads),
            intermediate_size:       hf.intermediate_size.unwrap_or(base.intermediate_size),
            max_position_embeddings: hf.max_position_embeddings.unwrap_or(base.max_position_embeddings),
            type_vocab_size:         hf.type_vocab_size.unwrap_or(base.type_vocab_size),
            layer_norm_eps:          hf.layer_norm_eps.unwrap_or(base.layer_norm_eps),
            pad_token_id:            hf.pad_token_id.unwrap_or(base.pad_token_id),
            hidden_dropout_prob:     hf.hidden_dropout_prob.unwrap_or(base.hidden_dropout_prob),
        }
    }
}

/// Read `{dir}/config.json`. A missing file yields the defaults.
pub fn load_encoder_config(dir: &Path) -> Result<TextEncoderConfig> {
    let path = dir.join("config.json");
    if !path.exists() {
        tracing::warn!("No '{}'; assuming roberta-base architecture", path.display());
        return Ok(TextEncoderConfig::new());
    }

    let json = fs::read_to_string(&path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    let hf: HfEncoderConfig = serde_json::from_str(&json)
        .with_context(|| format!("Invalid encoder config '{}'", path.display()))?;

    let cfg = TextEncoderConfig::from(hf);
    if cfg.hidden_size % cfg.num_attention_heads != 0 {
        anyhow::bail!(
            "hidden_size ({}) must be divisible by num_attention_heads ({})",
            cfg.hidden_size,
            cfg.num_attention_heads
        );
    }
    Ok(cfg)
}

/// Load pretrained weights into `encoder` and freeze it.
pub fn load_encoder_weights<B: Backend>(
    encoder: TextEncoder<B>,
    dir:     &Path,
    device:  &B::Device,
) -> Result<TextEncoder<B>> {
    let path = dir.join(WEIGHTS_FILE);
    tracing::info!("Importing pretrained encoder weights from '{}'", path.display());

    let args = KEY_REMAPS
        .iter()
        .fold(LoadArgs::new(path.clone()), |args, (pattern, to)| args.with_key_remap(pattern, to));

    let record = PyTorchFileRecorder::<FullPrecisionSettings>::default()
        .load(args, device)
        .with_context(|| format!("Cannot import encoder weights from '{}'", path.display()))?;

    Ok(encoder.load_record(record).no_grad())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::record::Record;
    use regex::Regex;
    use serde_json::Value;
    use std::collections::BTreeSet;

    use crate::test_support::{tiny_text_config, TestBackend};

    /// Parameter names of a one-layer HF RobertaModel checkpoint.
    fn hf_keys() -> Vec<String> {
        let mut keys: Vec<String> = [
            "embeddings.word_embeddings.weight",
            "embeddings.position_embeddings.weight",
            "embeddings.token_type_embeddings.weight",
            "embeddings.LayerNorm.weight",
            "embeddings.LayerNorm.bias",
            "pooler.dense.weight",
            "pooler.dense.bias",
        ]
        .iter()
        .map(|k| format!("roberta.{k}"))
        .collect();

        for module in [
            "attention.self.query",
            "attention.self.key",
            "attention.self.value",
            "attention.output.dense",
            "attention.output.LayerNorm",
            "intermediate.dense",
            "output.dense",
            "output.LayerNorm",
        ] {
            for param in ["weight", "bias"] {
                keys.push(format!("roberta.encoder.layer.0.{module}.{param}"));
            }
        }
        keys
    }

    /// Dotted paths of every parameter in a serialized record.
    fn param_paths(value: &Value, prefix: &str, out: &mut BTreeSet<String>) {
        let join = |k: &str| if prefix.is_empty() { k.to_string() } else { format!("{prefix}.{k}") };
        match value {
            Value::Object(map) if map.contains_key("param") => {
                out.insert(prefix.to_string());
            }
            Value::Object(map) => {
                for (k, v) in map {
                    param_paths(v, &join(k), out);
                }
            }
            Value::Array(items) => {
                for (i, v) in items.iter().enumerate() {
                    param_paths(v, &join(&i.to_string()), out);
                }
            }
            _ => {}
        }
    }

    #[test]
    fn test_key_remaps_cover_every_encoder_parameter() {
        let remaps: Vec<(Regex, &str)> = KEY_REMAPS
            .iter()
            .map(|(pattern, to)| (Regex::new(pattern).unwrap(), *to))
            .collect();

        let remapped: BTreeSet<String> = hf_keys()
            .into_iter()
            .filter(|k| !k.starts_with("roberta.pooler."))
            .map(|k| {
                let k = remaps
                    .iter()
                    .fold(k, |k, (re, to)| re.replace_all(&k, *to).into_owned());
                // burn-import renames LayerNorm weight/bias to gamma/beta
                k.replace("layer_norm.weight", "layer_norm.gamma")
                    .replace("layer_norm.bias", "layer_norm.beta")
            })
            .collect();

        let device  = Default::default();
        let encoder = tiny_text_config()
            .with_num_hidden_layers(1)
            .init::<TestBackend>(&device);
        let item = serde_json::to_value(
            encoder.into_record().into_item::<FullPrecisionSettings>(),
        )
        .unwrap();
        let mut expected = BTreeSet::new();
        param_paths(&item, "", &mut expected);

        assert_eq!(remapped, expected);
    }

    #[test]
    fn test_reads_hf_config_and_ignores_extra_keys() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{
                "architectures": ["RobertaModel"],
                "hidden_size": 32,
                "num_attention_heads": 4,
                "num_hidden_layers": 3,
                "intermediate_size": 64,
                "vocab_size": 100,
                "model_type": "roberta"
            }"#,
        )
        .unwrap();

        let cfg = load_encoder_config(dir.path()).unwrap();
        assert_eq!(cfg.hidden_size, 32);
        assert_eq!(cfg.num_hidden_layers, 3);
        assert_eq!(cfg.vocab_size, 100);
        // untouched keys keep roberta-base values
        assert_eq!(cfg.max_position_embeddings, 514);
        assert_eq!(cfg.pad_token_id, 1);
    }

    #[test]
    fn test_rejects_indivisible_heads() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"hidden_size": 30, "num_attention_heads": 4}"#,
        )
        .unwrap();
        assert!(load_encoder_config(dir.path()).is_err());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_encoder_config(dir.path()).unwrap();
        assert_eq!(cfg.hidden_size, 768);
    }

    #[test]
    fn test_missing_weights_is_error() {
        let dir     = tempfile::tempdir().unwrap();
        let device  = Default::default();
        let encoder = tiny_text_config().init::<TestBackend>(&device);
        assert!(load_encoder_weights(encoder, dir.path(), &device).is_err());
    }
}
