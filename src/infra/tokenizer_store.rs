// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Keeps the contract-text tokenizer next to the checkpoints so
// training and inference always tokenise identically.
//
// Resolution order for `load_or_build`:
//   1. {checkpoint_dir}/tokenizer.json        (already prepared)
//   2. {pretrained_dir}/tokenizer.json        (copied across)
//   3. {pretrained_dir}/vocab.json + merges.txt
//        → a byte-level BPE tokenizer JSON is written by hand
//          in HuggingFace format and loaded back
//
// Writing the JSON directly keeps us independent of the
// tokenizers builder API, which shifts between releases.
//
// Reference: Sennrich et al. (2016) BPE paper
//            Radford et al. (2019) byte-level BPE

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Map, Value};
use std::{fs, path::{Path, PathBuf}};
use tokenizers::Tokenizer;

const TOKENIZER_FILE: &str = "tokenizer.json";

/// RoBERTa special tokens, in the order they are registered
const SPECIAL_TOKENS: [&str; 5] = ["<s>", "<pad>", "</s>", "<unk>", "<mask>"];

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the stored tokenizer, or prepare one from the
    /// pretrained encoder directory and store it.
    pub fn load_or_build(&self, pretrained_dir: &Path) -> Result<Tokenizer> {
        let tok_path = self.dir.join(TOKENIZER_FILE);
        if tok_path.exists() {
            tracing::info!("Loading existing tokenizer from disk");
            return self.load();
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let shipped = pretrained_dir.join(TOKENIZER_FILE);
        if shipped.exists() {
            tracing::info!("Copying tokenizer from '{}'", shipped.display());
            fs::copy(&shipped, &tok_path)
                .with_context(|| format!("Cannot copy '{}'", shipped.display()))?;
            return self.load();
        }

        tracing::info!("Building byte-level BPE tokenizer from '{}'", pretrained_dir.display());
        self.build_and_save(pretrained_dir)
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join(TOKENIZER_FILE);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
    }

    fn build_and_save(&self, pretrained_dir: &Path) -> Result<Tokenizer> {
        // ── Step 1: Vocabulary (token → id) ───────────────────────────────────
        let vocab_path = pretrained_dir.join("vocab.json");
        let vocab: Map<String, Value> = serde_json::from_str(
            &fs::read_to_string(&vocab_path)
                .with_context(|| format!("Cannot read '{}'", vocab_path.display()))?,
        )
        .with_context(|| format!("'{}' is not a JSON object", vocab_path.display()))?;

        // ── Step 2: Merge rules, one "left right" pair per line ───────────────
        let merges_path = pretrained_dir.join("merges.txt");
        let merges: Vec<String> = fs::read_to_string(&merges_path)
            .with_context(|| format!("Cannot read '{}'", merges_path.display()))?
            .lines()
            .filter(|l| !l.starts_with("#version") && !l.trim().is_empty())
            .map(str::to_string)
            .collect();

        // ── Step 3: Register whichever special tokens the vocab defines ───────
        let added_tokens: Vec<Value> = SPECIAL_TOKENS
            .iter()
            .filter_map(|tok| {
                vocab.get(*tok).and_then(Value::as_u64).map(|id| json!({
                    "id": id, "content": tok, "single_word": false,
                    "lstrip": *tok == "<mask>", "rstrip": false,
                    "normalized": false, "special": true
                }))
            })
            .collect();

        let unk_token = vocab.contains_key("<unk>").then_some("<unk>");

        // ── Step 4: HuggingFace tokenizer.json layout ─────────────────────────
        let tokenizer_json = json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": null,
            "pre_tokenizer": {
                "type": "ByteLevel",
                "add_prefix_space": false,
                "trim_offsets": true,
                "use_regex": true
            },
            "post_processor": null,
            "decoder": {
                "type": "ByteLevel",
                "add_prefix_space": true,
                "trim_offsets": true,
                "use_regex": true
            },
            "model": {
                "type": "BPE",
                "dropout": null,
                "unk_token": unk_token,
                "continuing_subword_prefix": "",
                "end_of_word_suffix": "",
                "fuse_unk": false,
                "byte_fallback": false,
                "vocab": vocab,
                "merges": merges
            }
        });

        let tok_path = self.dir.join(TOKENIZER_FILE);
        fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| "Cannot write tokenizer JSON")?;

        tracing::info!(
            "Tokenizer built with {} merges, saved to '{}'",
            merges.len(),
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow!("Cannot reload tokenizer: {e}"))
    }
}
